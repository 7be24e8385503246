//! Bounded execution of external tools.
//!
//! Output pipes are drained on helper threads while the child is polled, so a
//! chatty tool cannot deadlock on a full pipe. On timeout the child is killed
//! and the reader threads are left to finish on their own.

use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured output of a finished tool.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, `None` if killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl ToolOutput {
    /// Returns true if the tool exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        out.push_str(&self.stderr);
        out
    }

    /// Returns true if Python reported that `module` is not installed.
    #[must_use]
    pub fn missing_module(&self, module: &str) -> bool {
        self.combined().contains(&format!("No module named {module}"))
    }
}

/// What happened when a tool was run.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// The tool ran to completion.
    Completed(ToolOutput),
    /// The program could not be found.
    NotInstalled,
    /// The tool exceeded its timeout and was killed.
    TimedOut,
}

/// Runs `program` with `args` in `cwd`, waiting at most `timeout`.
///
/// # Errors
///
/// Returns an IO error if the process cannot be spawned for a reason other
/// than the program being missing, or cannot be waited on.
pub fn run_tool(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> std::io::Result<ToolOutcome> {
    debug!("Running {program} {}", args.join(" "));

    let spawned = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{program} not found");
            return Ok(ToolOutcome::NotInstalled);
        }
        Err(e) => return Err(e),
    };

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            warn!("{program} timed out after {}s", timeout.as_secs());
            let _ = child.kill();
            let _ = child.wait();
            return Ok(ToolOutcome::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(ToolOutcome::Completed(ToolOutput {
        code: status.code(),
        stdout: collect(stdout),
        stderr: collect(stderr),
    }))
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
