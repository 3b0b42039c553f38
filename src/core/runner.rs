/// Subprocess execution with full output capture
///
/// The exit code is the authoritative success signal: the backup tool writes
/// progress chatter to stderr even on successful runs, so stderr content
/// alone never fails a command that also produced stdout and exited zero.
/// Stderr-only output is the one exception and is surfaced as an error.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::error::{Error, Result};

/// Captured result of a finished subprocess
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Run a command to completion, capturing both streams.
    ///
    /// Exceeding the configured timeout kills the process (kill_on_drop)
    /// and reports Timeout.
    pub async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| Error::Timeout(timeout))??,
            None => cmd.output().await?,
        };

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::Parse(format!("stdout is not valid UTF-8: {}", e)))?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|e| Error::Parse(format!("stderr is not valid UTF-8: {}", e)))?;
        let exit_code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            return Err(Error::Execution {
                code: exit_code,
                stderr,
            });
        }

        // Clean exit but nothing on stdout and complaints on stderr is a
        // definite error (the tool's wrapper scripts exit 0 in this case)
        if stdout.trim().is_empty() && !stderr.trim().is_empty() {
            return Err(Error::Execution {
                code: exit_code,
                stderr,
            });
        }

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_keeps_stderr_content() {
        let runner = ProcessRunner::new();
        let output = runner
            .run("sh", &["-c", "echo out; echo warn >&2"])
            .await
            .unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "warn");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_execution_error() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("sh", &["-c", "echo broken >&2; exit 3"])
            .await
            .unwrap_err();

        match err {
            Error::Execution { code, stderr } => {
                assert_eq!(code, 3);
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected Execution error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stderr_only_output_is_an_error() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("sh", &["-c", "echo nothing good >&2; exit 0"])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Execution { code: 0, .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_the_process() {
        let runner = ProcessRunner::with_timeout(Duration::from_millis(100));
        let err = runner.run("sh", &["-c", "sleep 5"]).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
    }
}
