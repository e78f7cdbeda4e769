//! probe.rs
//!
//! Decides whether a changed file needs generated tests.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::coverage::runner::TestRunner;
use crate::deadline::Deadline;
use crate::error::PipelineError;

/// Profile written by the runner inside the unit directory. Always removed.
pub const COVERAGE_REPORT: &str = "coverage.out";

const NO_TEST_FILES: &str = "no test files";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageVerdict {
    pub needs_tests: bool,
    pub coverage: f64,
}

impl CoverageVerdict {
    fn untested() -> Self {
        Self {
            needs_tests: true,
            coverage: 0.0,
        }
    }

    fn measured(coverage: f64, threshold: f64) -> Self {
        Self {
            needs_tests: coverage < threshold,
            coverage,
        }
    }
}

pub struct Prober {
    runner: Box<dyn TestRunner>,
    repo_root: PathBuf,
}

impl Prober {
    pub fn new(runner: Box<dyn TestRunner>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo_root: repo_root.into(),
        }
    }

    pub fn probe(
        &self,
        file: &str,
        threshold: f64,
        deadline: &Deadline,
    ) -> Result<CoverageVerdict, PipelineError> {
        let source = self.repo_root.join(file);
        let adjacent = self.repo_root.join(test_file_for(file));

        if !adjacent.exists() {
            debug!(file, test_file = %adjacent.display(), "no adjacent test file");
            return Ok(CoverageVerdict::untested());
        }

        let unit_dir = unit_dir(&source, &self.repo_root);
        let _report = ReportGuard(unit_dir.join(COVERAGE_REPORT));

        let run = self
            .runner
            .run_coverage(&unit_dir, COVERAGE_REPORT, deadline)
            .map_err(PipelineError::ToolFailure)?;

        // `go test` exits 0 on `[no test files]`, e.g. when build tags exclude them.
        if run.output.contains(NO_TEST_FILES) {
            return Ok(CoverageVerdict::untested());
        }

        if !run.success {
            return Err(PipelineError::ToolFailure(format!(
                "exit code {}, output: {}",
                run.exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".into()),
                run.output.trim()
            )));
        }

        let coverage = parse_coverage_output(&run.output).unwrap_or(0.0);
        Ok(CoverageVerdict::measured(coverage, threshold))
    }
}

/// `pkg/factorial.go` -> `pkg/factorial_test.go`
pub fn test_file_for(file: &str) -> String {
    let stem = file.strip_suffix(".go").unwrap_or(file);
    format!("{stem}_test.go")
}

/// Extracts `NN.N` from `coverage: NN.N% of statements`.
pub fn parse_coverage_output(output: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"coverage: (\d+\.?\d*)% of statements").unwrap());

    re.captures(output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn unit_dir(source: &Path, repo_root: &Path) -> PathBuf {
    match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => repo_root.to_path_buf(),
    }
}

struct ReportGuard(PathBuf);

impl Drop for ReportGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.0) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.0.display(), error = %e, "failed to remove coverage report");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::runner::RunOutput;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Default)]
    struct Calls {
        dirs: Vec<PathBuf>,
    }

    struct StubRunner {
        calls: Rc<RefCell<Calls>>,
        result: Result<RunOutput, String>,
        write_report: bool,
    }

    impl TestRunner for StubRunner {
        fn run_coverage(
            &self,
            dir: &Path,
            report: &str,
            _deadline: &Deadline,
        ) -> Result<RunOutput, String> {
            self.calls.borrow_mut().dirs.push(dir.to_path_buf());
            if self.write_report {
                fs::write(dir.join(report), "mode: set\n").unwrap();
            }
            self.result.clone()
        }
    }

    fn ok(output: &str) -> Result<RunOutput, String> {
        Ok(RunOutput {
            success: true,
            exit_code: Some(0),
            output: output.into(),
        })
    }

    fn failed(output: &str) -> Result<RunOutput, String> {
        Ok(RunOutput {
            success: false,
            exit_code: Some(1),
            output: output.into(),
        })
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    fn repo_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for f in files {
            let path = dir.path().join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "package pkg\n").unwrap();
        }
        dir
    }

    fn prober(
        root: &Path,
        result: Result<RunOutput, String>,
        write_report: bool,
    ) -> (Prober, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let runner = StubRunner {
            calls: calls.clone(),
            result,
            write_report,
        };
        (Prober::new(Box::new(runner), root), calls)
    }

    #[test]
    fn missing_test_file_needs_tests_without_running() {
        let repo = repo_with(&["pkg/factorial.go"]);
        let (prober, calls) = prober(repo.path(), ok("coverage: 99.0% of statements"), false);

        let verdict = prober.probe("pkg/factorial.go", 40.0, &deadline()).unwrap();

        assert_eq!(
            verdict,
            CoverageVerdict {
                needs_tests: true,
                coverage: 0.0
            }
        );
        assert!(calls.borrow().dirs.is_empty());
    }

    #[test]
    fn coverage_above_threshold_does_not_need_tests() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let (prober, calls) = prober(
            repo.path(),
            ok("ok  \tpkg\t0.002s\tcoverage: 55.5% of statements\n"),
            false,
        );

        let verdict = prober.probe("pkg/calc.go", 40.0, &deadline()).unwrap();

        assert!(!verdict.needs_tests);
        assert_eq!(verdict.coverage, 55.5);
        assert_eq!(calls.borrow().dirs, vec![repo.path().join("pkg")]);
    }

    #[test]
    fn needs_tests_matches_threshold_comparison() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        for (coverage, threshold) in [(10.0, 40.0), (40.0, 40.0), (39.9, 40.0), (80.0, 90.0), (0.0, 0.0)] {
            let output = format!("coverage: {coverage:.1}% of statements");
            let (prober, _) = prober(repo.path(), ok(&output), false);

            let verdict = prober.probe("pkg/calc.go", threshold, &deadline()).unwrap();

            assert_eq!(verdict.needs_tests, coverage < threshold, "{coverage} vs {threshold}");
            assert_eq!(verdict.coverage, coverage);
        }
    }

    #[test]
    fn no_test_files_marker_is_not_an_error() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let (prober, _) = prober(repo.path(), failed("?   \tpkg\t[no test files]"), false);

        let verdict = prober.probe("pkg/calc.go", 40.0, &deadline()).unwrap();

        assert!(verdict.needs_tests);
        assert_eq!(verdict.coverage, 0.0);
    }

    #[test]
    fn no_test_files_on_clean_exit_needs_tests_even_at_zero_threshold() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let (prober, _) = prober(repo.path(), ok("?   \tpkg\t[no test files]"), false);

        let verdict = prober.probe("pkg/calc.go", 0.0, &deadline()).unwrap();

        assert_eq!(verdict, CoverageVerdict::untested());
    }

    #[test]
    fn runner_failure_is_a_tool_failure() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let (prober, _) = prober(repo.path(), failed("calc.go:3:1: syntax error"), false);

        let err = prober.probe("pkg/calc.go", 40.0, &deadline()).unwrap_err();

        assert!(matches!(err, PipelineError::ToolFailure(ref m) if m.contains("syntax error")));
    }

    #[test]
    fn spawn_failure_is_a_tool_failure() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let (prober, _) = prober(repo.path(), Err("deadline exceeded".into()), false);

        let err = prober.probe("pkg/calc.go", 40.0, &deadline()).unwrap_err();

        assert!(matches!(err, PipelineError::ToolFailure(_)));
    }

    #[test]
    fn clean_run_without_percentage_defaults_to_zero() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let (prober, _) = prober(repo.path(), ok("ok  \tpkg\t0.001s"), false);

        let verdict = prober.probe("pkg/calc.go", 40.0, &deadline()).unwrap();

        assert!(verdict.needs_tests);
        assert_eq!(verdict.coverage, 0.0);
    }

    #[test]
    fn coverage_report_is_removed_on_success_and_failure() {
        let repo = repo_with(&["pkg/calc.go", "pkg/calc_test.go"]);
        let report = repo.path().join("pkg").join(COVERAGE_REPORT);

        let (p, _) = prober(repo.path(), ok("coverage: 50.0% of statements"), true);
        p.probe("pkg/calc.go", 40.0, &deadline()).unwrap();
        assert!(!report.exists());

        let (p, _) = prober(repo.path(), failed("build failed"), true);
        p.probe("pkg/calc.go", 40.0, &deadline()).unwrap_err();
        assert!(!report.exists());
    }

    #[test]
    fn root_level_file_runs_in_repo_root() {
        let repo = repo_with(&["main.go", "main_test.go"]);
        let (prober, calls) = prober(repo.path(), ok("coverage: 70.0% of statements"), false);

        prober.probe("main.go", 40.0, &deadline()).unwrap();

        assert_eq!(calls.borrow().dirs, vec![repo.path().to_path_buf()]);
    }

    #[test]
    fn test_file_naming() {
        assert_eq!(test_file_for("pkg/factorial.go"), "pkg/factorial_test.go");
        assert_eq!(test_file_for("main.go"), "main_test.go");
    }

    #[test]
    fn parses_integer_and_fractional_percentages() {
        assert_eq!(parse_coverage_output("coverage: 100% of statements"), Some(100.0));
        assert_eq!(parse_coverage_output("coverage: 12.75% of statements"), Some(12.75));
        assert_eq!(parse_coverage_output("coverage: [no statements]"), None);
    }
}
