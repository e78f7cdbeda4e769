use crate::extract::FunctionDescriptor;
use crate::generate::package::PackageInfo;

/// Builds the single user prompt sent to the model.
pub fn build_prompt(
    file: &str,
    original: &str,
    package: &PackageInfo,
    functions: &[FunctionDescriptor],
) -> String {
    let mut out = String::new();

    /* ---------- ROLE + RULES ---------- */
    out.push_str(
        "You are a Go unit test generator. Generate comprehensive unit tests for the following Go functions.\n\n",
    );
    out.push_str(
        "Requirements:\n\
         1. Use the standard Go testing package\n\
         2. Cover normal cases, edge cases, and error conditions\n\
         3. Use descriptive test names\n\
         4. Add comments explaining test scenarios\n\
         5. Make tests independent and repeatable\n\
         6. Do not hard-code magic values; name expected values\n\
         7. Produce a self-contained test file that compiles on its own\n\n",
    );

    /* ---------- CONTEXT ---------- */
    out.push_str(&format!("Original file: {file}\n"));
    out.push_str(&format!("Package: {}\n", package.name));

    if !package.imports.is_empty() {
        out.push_str("Imports used by the file:\n");
        for imp in &package.imports {
            out.push_str(&format!("- {imp}\n"));
        }
    }
    out.push('\n');

    out.push_str("Original file content for context:\n```go\n");
    out.push_str(original);
    if !original.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n\n");

    /* ---------- TARGETS ---------- */
    out.push_str("Generate unit tests for these functions:\n");
    for f in functions {
        out.push_str(&format!("\nFunction: {}\n```go\n", f.name));
        out.push_str(&f.source);
        if !f.source.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("```\n");
    }

    out.push_str(
        "\nGenerate ONLY the Go test file content. Start with the package declaration and imports, then the test functions.",
    );

    out
}
