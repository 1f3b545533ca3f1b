// Ports - Interface definitions (contracts)

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// An external program plus its argument vector
///
/// Arguments are passed to the program as-is; nothing is ever routed through
/// a shell, so paths with spaces or quotes need no escaping.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl Invocation {
    /// Create an invocation without arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Arguments as lossy strings, mostly useful for assertions and logs
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished external process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Whether the process exited with code 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// Port for running external programs
#[async_trait]
pub trait ProcessPort: Send + Sync {
    /// Run the invocation to completion, capturing its output
    ///
    /// A non-zero exit is reported through [`ProcessOutput::code`]; `Err` is
    /// reserved for programs that could not be started at all.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, DomainError>;
}

/// Port for probing single stream fields of media files
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe one field of the first video stream
    ///
    /// Returns `Ok(None)` when the tool could not provide the value, and
    /// `Err(DomainError::NotFound)` when the path does not exist.
    async fn probe(&self, path: &Path, field: &ProbeField)
        -> Result<Option<ProbeValue>, DomainError>;
}

/// Frame-sequence extraction request
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDumpRequest {
    pub input: PathBuf,
    pub frame_dir: PathBuf,
    /// printf-style frame name, e.g. `%06d.jpg`
    pub frame_format: String,
    pub filters: Vec<String>,
}

/// Filter-driven re-encode of one file
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub filters: Vec<String>,
}

/// Final placement of a downloaded clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub operation: ClipOperation,
}

/// Port for the transcode tool
///
/// Tool failures are never returned as errors: the outcome carries the
/// failure message so a batch can move on to the next item.
#[async_trait]
pub trait TransformPort: Send + Sync {
    /// Dump a video into an image sequence
    async fn extract_frames(&self, request: &FrameDumpRequest) -> TransformOutcome;

    /// Re-encode a video with user filters
    async fn edit(&self, request: &EditRequest) -> TransformOutcome;

    /// Move, normalize or trim a downloaded clip into place
    async fn clip(&self, request: &ClipRequest) -> TransformOutcome;
}

/// Port for downloading remote videos
#[async_trait]
pub trait FetchPort: Send + Sync {
    /// Download `identifier` into `workdir`
    async fn fetch(&self, identifier: &str, workdir: &Path) -> FetchOutcome;
}
