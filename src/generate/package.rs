/// Package clause and import entries of a Go source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    /// Verbatim entries, in source order.
    pub imports: Vec<String>,
}

/// Line-oriented scan; no parsing beyond the package and import syntax.
pub fn extract_package_info(content: &str) -> PackageInfo {
    let mut info = PackageInfo::default();
    let mut in_block = false;

    for raw in content.lines() {
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix("package ") {
            if let Some(name) = rest.split_whitespace().next() {
                info.name = name.to_string();
            }
        }

        if line.starts_with("import (") {
            in_block = true;
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            if !line.is_empty() && !line.starts_with("//") {
                info.imports.push(line.to_string());
            }
        } else if let Some(single) = line.strip_prefix("import ") {
            info.imports.push(single.to_string());
        }
    }

    info
}
