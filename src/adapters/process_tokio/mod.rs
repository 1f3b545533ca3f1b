//! Tokio process adapter
//!
//! Runs external tools with `tokio::process::Command`, so a worker waiting
//! on ffmpeg parks its task instead of an executor thread.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::domain::errors::*;
use crate::ports::*;

/// Process adapter backed by `tokio::process`
#[derive(Debug, Default, Clone)]
pub struct TokioProcessAdapter;

impl TokioProcessAdapter {
    /// Create new process adapter
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessPort for TokioProcessAdapter {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DomainError> {
        debug!(command = %invocation, "Spawning external tool");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DomainError::Spawn {
                program: invocation.program.clone(),
                message: e.to_string(),
            })?;

        let result = ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(program = %invocation.program, code = ?result.code, "External tool finished");
        Ok(result)
    }
}
