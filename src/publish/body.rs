pub fn pr_title(original_file: &str) -> String {
    format!("🧪 Auto-generated tests for {original_file}")
}

pub fn pr_body(original_file: &str, coverage: f64, threshold: f64) -> String {
    let mut body = String::new();

    body.push_str("## 🤖 Auto-Generated Unit Tests\n\n");
    body.push_str(&format!(
        "This PR contains automatically generated unit tests for `{original_file}`.\n\n"
    ));

    body.push_str("### 📊 Coverage Information\n");
    body.push_str(&format!("- **Original Coverage**: {coverage:.2}%\n"));
    body.push_str(&format!("- **Coverage Threshold**: {threshold:.2}%\n"));
    body.push_str("- **Status**: ⚠️ Below threshold, tests generated\n\n");

    body.push_str(
        "### 🧪 Generated Tests Include\n\
         - Basic functionality tests\n\
         - Edge case handling\n\
         - Error condition testing\n\
         - Input validation tests\n\n",
    );

    body.push_str(
        "### ✅ Review Checklist\n\
         - [ ] Tests cover the main functionality\n\
         - [ ] Tests include proper error handling\n\
         - [ ] Test names are descriptive\n\
         - [ ] Tests are independent and repeatable\n\
         - [ ] No hardcoded values in tests\n\n",
    );

    body.push_str(
        "### 🔧 Next Steps\n\
         1. Review the generated tests\n\
         2. Run `go test` to ensure all tests pass\n\
         3. Modify or add additional tests if needed\n\
         4. Merge when tests are satisfactory\n\n",
    );

    body.push_str("---\n");
    body.push_str("*This PR was automatically created by the Auto Test Generator workflow.*");

    body
}
