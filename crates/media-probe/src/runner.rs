//! External command execution with an optional timeout.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use dashsub_common::error::{DashsubError, DashsubResult};

/// Runs an external program and returns its stdout.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String]) -> DashsubResult<String>;
}

/// Runs commands as child processes.
///
/// Without a timeout the call blocks until the child exits.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn run_blocking(&self, program: &str, args: &[String]) -> DashsubResult<String> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| DashsubError::probe(format!("Failed to run {program}: {e}")))?;

        if !output.status.success() {
            return Err(DashsubError::probe(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| DashsubError::probe(format!("{program} produced non-UTF-8 output: {e}")))
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> DashsubResult<String> {
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DashsubError::probe(format!("Failed to run {program}: {e}")))?;

        // Drain pipes on threads so a chatty child cannot block on a full pipe.
        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();
        let stdout_thread = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut out) = stdout_handle {
                out.read_to_end(&mut buf).ok();
            }
            buf
        });
        let stderr_thread = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut err) = stderr_handle {
                err.read_to_end(&mut buf).ok();
            }
            buf
        });

        let start = Instant::now();
        let status = loop {
            if start.elapsed() > timeout {
                error!(
                    "{program} timed out after {:.1}s, killing",
                    timeout.as_secs_f64()
                );
                let _ = child.kill();
                let _ = child.wait();
                // Pipes close with the child, so the readers finish.
                let _ = stdout_thread.join();
                let stderr = stderr_thread.join().unwrap_or_default();
                let stderr = String::from_utf8_lossy(&stderr);
                let mut message = format!(
                    "{program} timed out after {:.1}s",
                    timeout.as_secs_f64()
                );
                if !stderr.trim().is_empty() {
                    message.push_str(": ");
                    message.push_str(stderr.trim());
                }
                return Err(DashsubError::probe(message));
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(
                        "{program} completed after {:.2}s",
                        start.elapsed().as_secs_f64()
                    );
                    break status;
                }
                Ok(None) => thread::sleep(Duration::from_millis(20)),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_thread.join();
                    let _ = stderr_thread.join();
                    return Err(DashsubError::probe(format!(
                        "Failed to wait for {program}: {e}"
                    )));
                }
            }
        };

        let stdout = stdout_thread
            .join()
            .map_err(|_| DashsubError::probe("Failed to join stdout reader"))?;
        let stderr = stderr_thread
            .join()
            .map_err(|_| DashsubError::probe("Failed to join stderr reader"))?;

        if !status.success() {
            return Err(DashsubError::probe(format!(
                "{program} exited with {status}: {}",
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        String::from_utf8(stdout)
            .map_err(|e| DashsubError::probe(format!("{program} produced non-UTF-8 output: {e}")))
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> DashsubResult<String> {
        debug!("Running {program} {}", args.join(" "));
        match self.timeout {
            Some(timeout) => self.run_with_timeout(program, args, timeout),
            None => self.run_blocking(program, args),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_blocking_run_captures_stdout() {
        let out = ProcessRunner::new(None).run("sh", &sh("echo 30/1")).unwrap();
        assert_eq!(out.trim(), "30/1");
    }

    #[test]
    fn test_nonzero_exit_is_probe_error() {
        let err = ProcessRunner::new(None)
            .run("sh", &sh("echo boom >&2; exit 3"))
            .unwrap_err();
        match err {
            DashsubError::Probe { message } => assert!(message.contains("boom")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_probe_error() {
        let err = ProcessRunner::new(None)
            .run("dashsub-definitely-not-a-binary", &[])
            .unwrap_err();
        assert!(matches!(err, DashsubError::Probe { .. }));
    }

    #[test]
    fn test_timeout_kills_hung_process() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let start = Instant::now();
        let err = runner.run("sh", &sh("exec sleep 5")).unwrap_err();
        assert!(matches!(err, DashsubError::Probe { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_collects_stderr_before_returning() {
        let runner = ProcessRunner::new(Some(Duration::from_millis(200)));
        let start = Instant::now();
        let err = runner
            .run("sh", &sh("echo 'stuck decoding' >&2; exec sleep 5"))
            .unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(4));
        match err {
            DashsubError::Probe { message } => {
                assert!(message.contains("timed out"), "{message}");
                assert!(message.contains("stuck decoding"), "{message}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_timeout_run_returns_output_when_fast() {
        let runner = ProcessRunner::new(Some(Duration::from_secs(5)));
        let out = runner.run("sh", &sh("echo 1200")).unwrap();
        assert_eq!(out.trim(), "1200");
    }
}
