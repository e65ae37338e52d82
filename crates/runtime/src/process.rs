//! External process execution.
//!
//! This module provides the `ProcessRunner` trait, a tokio-backed
//! implementation that spawns the runtime executable, and a scripted mock
//! used by tests. A runner never interprets a nonzero exit on its own; the
//! caller decides what a failed invocation means.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use cpcontainer_core::{Error, Result};

// =============================================================================
// Process Types
// =============================================================================

/// Captured result of one external invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// =============================================================================
// Process Runner Trait
// =============================================================================

/// Executes an argument vector and waits for it to exit.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `args[0]` with the remaining elements as its arguments.
    ///
    /// A nonzero exit is reported through [`ProcessOutput::exit_code`], not as
    /// an error. Errors are reserved for spawn failures and timeouts.
    async fn run(&self, args: &[String]) -> Result<ProcessOutput>;

    /// Like [`ProcessRunner::run`], but a nonzero exit becomes
    /// [`Error::Invocation`] carrying stderr.
    async fn run_checked(&self, args: &[String]) -> Result<ProcessOutput> {
        let output = self.run(args).await?;
        if !output.success() {
            return Err(Error::invocation(args, output.exit_code, output.stderr));
        }
        Ok(output)
    }
}

// =============================================================================
// Tokio Process Runner
// =============================================================================

/// Runs commands as child processes through `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner {
    timeout: Option<Duration>,
}

impl TokioProcessRunner {
    /// Create a runner that waits for each child for as long as it takes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child and fail with [`Error::Timeout`] once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, args: &[String]) -> Result<ProcessOutput> {
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| Error::validation("cannot run an empty argument vector"))?;

        tracing::debug!(command = ?args, "Invoking container runtime");

        let child = tokio::process::Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output?,
                Err(_) => {
                    tracing::warn!(command = ?args, timeout = ?limit, "Container runtime call timed out");
                    return Err(Error::timeout(format!(
                        "`{}` did not exit within {:?}",
                        args.join(" "),
                        limit
                    )));
                }
            },
            None => child.wait_with_output().await?,
        };

        let result = ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        };

        if !result.success() {
            tracing::debug!(
                command = ?args,
                exit_code = ?result.exit_code,
                stderr = %result.stderr.trim(),
                "Container runtime exited unsuccessfully"
            );
        }

        Ok(result)
    }
}

// =============================================================================
// Mock Process Runner (for testing without a runtime)
// =============================================================================

/// Scripted runner for unit testing.
///
/// Answers each call with the next queued response and records every argument
/// vector it receives. An exhausted script answers with an empty success.
#[derive(Default, Clone)]
pub struct MockProcessRunner {
    pub responses: Arc<tokio::sync::Mutex<Vec<ProcessOutput>>>,
    pub calls: Arc<tokio::sync::Mutex<Vec<Vec<String>>>>,
}

impl MockProcessRunner {
    /// Create a mock runner with predefined responses, answered in order.
    pub fn new(responses: Vec<ProcessOutput>) -> Self {
        Self {
            responses: Arc::new(tokio::sync::Mutex::new(responses)),
            calls: Default::default(),
        }
    }

    /// Argument vectors received so far.
    pub async fn recorded_calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(&self, args: &[String]) -> Result<ProcessOutput> {
        self.calls.lock().await.push(args.to_vec());

        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            Ok(ProcessOutput::ok(""))
        } else {
            Ok(responses.remove(0))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
