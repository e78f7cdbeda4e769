// Spawns the local test runner and returns its combined output.
// Parsing happens in probe.rs only.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;

use crate::deadline::Deadline;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// stdout followed by stderr, unparsed.
    pub output: String,
}

/// Local test-runner collaborator.
pub trait TestRunner {
    /// Run the unit's tests with coverage, writing the profile to `report`
    /// (relative to `dir`).
    fn run_coverage(&self, dir: &Path, report: &str, deadline: &Deadline)
        -> Result<RunOutput, String>;
}

/// `go test -cover -coverprofile=<report> .`
pub struct GoTestRunner {
    program: String,
}

impl GoTestRunner {
    pub fn new() -> Self {
        Self {
            program: "go".into(),
        }
    }

    #[cfg(test)]
    fn with_program(program: &str) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GoTestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner for GoTestRunner {
    fn run_coverage(
        &self,
        dir: &Path,
        report: &str,
        deadline: &Deadline,
    ) -> Result<RunOutput, String> {
        let args = vec![
            "test".to_string(),
            "-cover".to_string(),
            format!("-coverprofile={report}"),
            ".".to_string(),
        ];
        run_command(&self.program, &args, dir, deadline)
    }
}

pub(crate) fn run_command(
    program: &str,
    args: &[String],
    dir: &Path,
    deadline: &Deadline,
) -> Result<RunOutput, String> {
    if deadline.expired() {
        return Err(format!("deadline exceeded before running {program}"));
    }

    debug!(program, ?args, dir = %dir.display(), "spawning test runner");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to spawn {program}: {e}"))?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status: ExitStatus = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if deadline.expired() {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("deadline exceeded while running {program}"));
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => return Err(e.to_string()),
        }
    };

    let stdout = collect(stdout);
    let stderr = collect(stderr);

    let mut output = String::new();
    output.push_str(&String::from_utf8_lossy(&stdout));
    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&String::from_utf8_lossy(&stderr));
    }

    Ok(RunOutput {
        success: status.success(),
        exit_code: status.code(),
        output,
    })
}

// Pipes are drained on their own threads so a chatty child never blocks on a full pipe.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
