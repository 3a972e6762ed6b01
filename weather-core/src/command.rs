use std::{fmt::Debug, io, process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
};
use tracing::{debug, warn};

use crate::error::WeatherError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// External program to run for one acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub executable: String,
    pub arguments: Vec<String>,
    pub timeout: Duration,
    /// Exit code the program uses to report that the network is unreachable.
    pub no_connectivity_exit_code: Option<i32>,
}

impl CommandSpec {
    pub fn new(executable: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            arguments,
            timeout: DEFAULT_TIMEOUT,
            no_connectivity_exit_code: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_no_connectivity_exit_code(mut self, code: Option<i32>) -> Self {
        self.no_connectivity_exit_code = code;
        self
    }

    /// Command line as it would be typed in a shell, for diagnostics.
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_str())
            .chain(self.arguments.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished process left behind, before any classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Successful run with stdout decoded, trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExecutionResult {
    pub stdout: String,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

/// Launches a program and waits for it.
///
/// Implementations only report launch failures (`CommandNotFound`) and timeouts
/// (`CommandTimedOut`); exit status and output are judged by [`execute`].
#[async_trait]
pub trait ProcessRunner: Send + Sync + Debug {
    async fn run(&self, spec: &CommandSpec) -> Result<RawOutput, WeatherError>;
}

/// Runs commands as real OS child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<RawOutput, WeatherError> {
        debug!(command = %spec.command_line(), timeout = ?spec.timeout, "Spawning command");

        let mut child = Command::new(&spec.executable)
            .args(&spec.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WeatherError::CommandNotFound {
                executable: spec.executable.clone(),
                source,
            })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut status = None;
        let mut pipes_closed = false;

        // Completion means the child exited. Pipes are drained alongside and until the
        // same deadline, since a background grandchild may keep them open.
        let waited = {
            let pipes = async {
                tokio::try_join!(
                    drain(stdout_pipe.as_mut(), &mut stdout),
                    drain(stderr_pipe.as_mut(), &mut stderr),
                )
            };
            tokio::pin!(pipes);

            tokio::time::timeout(spec.timeout, async {
                while status.is_none() || !pipes_closed {
                    tokio::select! {
                        exited = child.wait(), if status.is_none() => status = Some(exited?),
                        drained = &mut pipes, if !pipes_closed => {
                            drained?;
                            pipes_closed = true;
                        }
                    }
                }
                Ok::<_, io::Error>(())
            })
            .await
        };

        let status = match (waited, status) {
            (Ok(Err(err)), _) => {
                return Err(WeatherError::CommandExecutionFailed {
                    command: spec.command_line(),
                    exit_code: None,
                    stderr: err.to_string(),
                });
            }
            (_, Some(status)) => status,
            (_, None) => {
                warn!(command = %spec.command_line(), timeout = ?spec.timeout, "Command timed out, killing it");
                // kill() also waits, so the child is reaped before we return.
                if let Err(err) = child.kill().await {
                    warn!(error = %err, "Failed to kill timed out command");
                }
                return Err(WeatherError::CommandTimedOut {
                    command: spec.command_line(),
                    timeout: spec.timeout,
                });
            }
        };

        if !pipes_closed {
            debug!(command = %spec.command_line(), "Command exited but its output pipes stayed open");
        }
        debug!(
            command = %spec.command_line(),
            exit_code = ?status.code(),
            "Command finished"
        );

        Ok(RawOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Read `pipe` to EOF in chunks, so whatever arrived stays in `buf` if this is cancelled.
async fn drain<R: AsyncRead + Unpin>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> io::Result<()> {
    let Some(pipe) = pipe else {
        return Ok(());
    };
    let mut chunk = [0u8; 4096];
    loop {
        let read = pipe.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..read]);
    }
}

/// Run `spec` through `runner` and classify the outcome.
///
/// Checked in order: launch failure, timeout (both from the runner), the no-connectivity
/// exit code, a non-zero exit code or non-empty stderr, and finally stdout decoding.
pub async fn execute(
    runner: &dyn ProcessRunner,
    spec: &CommandSpec,
) -> Result<ProcessExecutionResult, WeatherError> {
    let raw = runner.run(spec).await?;
    classify(spec, raw)
}

fn classify(spec: &CommandSpec, raw: RawOutput) -> Result<ProcessExecutionResult, WeatherError> {
    let stderr_text = String::from_utf8_lossy(&raw.stderr).trim().to_string();

    if let Some(code) = raw
        .exit_code
        .filter(|code| spec.no_connectivity_exit_code == Some(*code))
    {
        return Err(WeatherError::NoConnectivity {
            command: spec.command_line(),
            exit_code: code,
            stderr: stderr_text,
        });
    }

    let exit_code = match raw.exit_code {
        Some(0) if stderr_text.is_empty() => 0,
        exit_code => {
            return Err(WeatherError::CommandExecutionFailed {
                command: spec.command_line(),
                exit_code,
                stderr: stderr_text,
            });
        }
    };

    let stdout = String::from_utf8(raw.stdout).map_err(|source| WeatherError::OutputUndecodable {
        command: spec.command_line(),
        source,
    })?;

    Ok(ProcessExecutionResult {
        stdout: stdout.trim().to_lowercase(),
        stderr: raw.stderr,
        exit_code,
    })
}

/// In-memory runner for exercising code that spawns commands.
#[cfg(any(test, feature = "testing-support"))]
pub mod testing {
    use std::{collections::VecDeque, sync::Mutex};

    use async_trait::async_trait;

    use super::{CommandSpec, ProcessRunner, RawOutput};
    use crate::error::WeatherError;

    /// Hands out queued outcomes in order and records every spec it was asked to run.
    #[derive(Debug, Default)]
    pub struct ScriptedRunner {
        outcomes: Mutex<VecDeque<Result<RawOutput, WeatherError>>>,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl ScriptedRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(self, outcome: Result<RawOutput, WeatherError>) -> Self {
            self.outcomes
                .lock()
                .expect("outcomes lock poisoned")
                .push_back(outcome);
            self
        }

        /// Queue a clean exit printing `stdout`.
        pub fn with_stdout(self, stdout: &str) -> Self {
            self.push(Ok(RawOutput {
                exit_code: Some(0),
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            }))
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().expect("calls lock poisoned").clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<RawOutput, WeatherError> {
            self.calls
                .lock()
                .expect("calls lock poisoned")
                .push(spec.clone());
            self.outcomes
                .lock()
                .expect("outcomes lock poisoned")
                .pop_front()
                .expect("ScriptedRunner ran out of outcomes")
        }
    }
}
