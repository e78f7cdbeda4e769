const TESTING_IMPORT: &str = "\"testing\"";

/// Normalizes raw model output into a Go test file: no fences, exactly one
/// package clause, and the testing package imported.
pub fn cleanup(generated: &str, package: &str) -> String {
    let mut seen_package = false;
    let mut lines: Vec<String> = Vec::new();

    for raw in generated.lines() {
        let line = strip_fences(raw);
        if line.len() != raw.len() && line.trim().is_empty() {
            continue;
        }
        if is_package_clause(&line) {
            if seen_package {
                continue;
            }
            seen_package = true;
        }
        lines.push(line);
    }

    if !seen_package {
        let name = if package.is_empty() { "main" } else { package };
        lines.insert(0, String::new());
        lines.insert(0, format!("package {name}"));
    }

    if !lines.iter().any(|l| l.contains(TESTING_IMPORT)) {
        if let Some(pos) = lines.iter().position(|l| is_package_clause(l)) {
            lines.insert(pos + 1, format!("import {TESTING_IMPORT}"));
            lines.insert(pos + 1, String::new());
        }
    }

    lines.join("\n").trim().to_string()
}

/// Fences can trail code or prose on the same line.
fn strip_fences(line: &str) -> String {
    line.replace("```go", "").replace("```", "")
}

fn is_package_clause(line: &str) -> bool {
    line.trim_start().starts_with("package ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_lines(s: &str) -> usize {
        s.lines().filter(|l| is_package_clause(l)).count()
    }

    #[test]
    fn strips_fences_and_keeps_code() {
        let raw = "```go\npackage calc\n\nimport \"testing\"\n\nfunc TestAdd(t *testing.T) {}\n```\n";
        let out = cleanup(raw, "calc");
        assert_eq!(out, "package calc\n\nimport \"testing\"\n\nfunc TestAdd(t *testing.T) {}");
    }

    #[test]
    fn prepends_package_when_missing() {
        let out = cleanup("import \"testing\"\n\nfunc TestX(t *testing.T) {}", "calc");
        assert!(out.starts_with("package calc\n"));
        assert_eq!(package_lines(&out), 1);
    }

    #[test]
    fn inserts_testing_import_after_package() {
        let out = cleanup("package calc\nfunc TestExample() {}\n", "calc");
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines[0], "package calc");
        assert_eq!(lines[2], "import \"testing\"");
        assert!(out.contains("func TestExample() {}"));
    }

    #[test]
    fn drops_duplicate_package_clauses() {
        let raw = "package calc\n\nfunc TestA(t *testing.T) {}\n```\n```go\npackage calc\nimport \"testing\"\n";
        let out = cleanup(raw, "calc");
        assert_eq!(package_lines(&out), 1);
    }

    #[test]
    fn always_one_package_and_a_testing_reference() {
        let inputs = [
            "",
            "func TestExample() {}",
            "package main\nfunc TestExample() {}",
            "```go\nfunc TestExample(t *testing.T) {}\n```",
            "Here are your tests:\n```go\npackage x\nimport (\n\t\"testing\"\n)\n```",
            "package a\npackage b\n",
            "```go\npackage calc\n\nimport \"testing\"\n\nfunc TestA(t *testing.T) {}```",
            "Here are the tests:```go\npackage calc\nfunc TestA(t *testing.T) {}\n```",
        ];
        for raw in inputs {
            let out = cleanup(raw, "calc");
            assert_eq!(package_lines(&out), 1, "{raw:?} -> {out:?}");
            assert!(out.contains("\"testing\""), "{raw:?} -> {out:?}");
            assert!(!out.contains("```"), "{raw:?} -> {out:?}");
        }
    }

    #[test]
    fn inline_fences_are_removed_from_code_lines() {
        let raw = "```go\npackage calc\n\nimport \"testing\"\n\nfunc TestA(t *testing.T) {}```";
        let out = cleanup(raw, "calc");
        assert_eq!(out, "package calc\n\nimport \"testing\"\n\nfunc TestA(t *testing.T) {}");
    }

    #[test]
    fn empty_package_name_falls_back_to_main() {
        let out = cleanup("func TestX(t *testing.T) {}", "");
        assert!(out.starts_with("package main"));
    }
}
