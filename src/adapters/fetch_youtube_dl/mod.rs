//! youtube-dl download adapter
//!
//! Downloads one video per call into a caller-provided working directory,
//! retrying failed attempts with capped exponential backoff.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::model::*;
use crate::domain::rules::last_message_line;
use crate::ports::*;

/// Default base URL a video identifier is appended to
pub const DEFAULT_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Retry budget for remote downloads
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `failed`-th failed attempt (1-based)
    pub fn delay_after(&self, failed: u32) -> Duration {
        let exponent = failed.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// youtube-dl based fetch adapter
pub struct YoutubeDlAdapter {
    runner: Arc<dyn ProcessPort>,
    binary: String,
    url_base: String,
    retry: RetryPolicy,
}

impl YoutubeDlAdapter {
    /// Create new youtube-dl adapter
    pub fn new(
        runner: Arc<dyn ProcessPort>,
        binary: impl Into<String>,
        url_base: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            runner,
            binary: binary.into(),
            url_base: url_base.into(),
            retry,
        }
    }

    /// Argument vector downloading `identifier` to `<workdir>/<name>.<ext>`
    pub fn invocation(&self, identifier: &str, workdir: &Path, name: &str) -> Invocation {
        Invocation::new(&self.binary)
            .args(["--quiet", "--no-warnings", "-f", "mp4", "-o"])
            .arg(workdir.join(format!("{}.%(ext)s", name)))
            .arg(format!("{}{}", self.url_base, identifier))
    }

    /// Locate the artifact; the downloader picks the final extension
    fn locate(workdir: &Path, name: &str) -> Option<PathBuf> {
        let pattern = PathBuf::from(glob::Pattern::escape(&workdir.to_string_lossy()))
            .join(format!("{}.*", name));
        glob::glob(&pattern.to_string_lossy())
            .ok()?
            .filter_map(Result::ok)
            .find(|p| p.is_file())
    }
}

#[async_trait]
impl FetchPort for YoutubeDlAdapter {
    async fn fetch(&self, identifier: &str, workdir: &Path) -> FetchOutcome {
        let name = Uuid::new_v4().to_string();
        let invocation = self.invocation(identifier, workdir, &name);
        let attempts = self.retry.attempts.max(1);
        let mut last_message = String::new();

        for attempt in 1..=attempts {
            debug!(identifier, attempt, "Downloading");
            match self.runner.run(&invocation).await {
                Ok(output) if output.success() => {
                    return match Self::locate(workdir, &name) {
                        Some(path) => FetchOutcome::Downloaded(path),
                        None => FetchOutcome::Failed(format!(
                            "download reported success but no file matching {}.* was written",
                            name
                        )),
                    };
                }
                Ok(output) => last_message = last_message_line(&output.combined()),
                Err(e) => last_message = e.to_string(),
            }

            if attempt < attempts {
                let delay = self.retry.delay_after(attempt);
                warn!(
                    identifier,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Download failed, retrying: {}",
                    last_message
                );
                tokio::time::sleep(delay).await;
            }
        }

        FetchOutcome::Failed(last_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fake_process::FakeProcess;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    fn quick_retry(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    /// Fake downloader writing `<template with ext=mp4>` on success
    fn downloader(fail_first: u32) -> FakeProcess {
        let calls = AtomicU32::new(0);
        FakeProcess::new(move |inv| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < fail_first {
                return Ok(ProcessOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "ERROR: HTTP Error 429: Too Many Requests".to_string(),
                });
            }
            let args = inv.args_lossy();
            let template = &args[args.len() - 2];
            fs::write(template.replace("%(ext)s", "mp4"), b"video").unwrap();
            Ok(ProcessOutput {
                code: Some(0),
                ..Default::default()
            })
        })
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
        assert_eq!(policy.delay_after(4), Duration::from_secs(5));
        assert_eq!(policy.delay_after(40), Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn test_invocation_shape() {
        let adapter = YoutubeDlAdapter::new(
            Arc::new(FakeProcess::replying(0, "")),
            "youtube-dl",
            DEFAULT_URL_BASE,
            RetryPolicy::default(),
        );
        let invocation = adapter.invocation("dQw4w9WgXcQ", Path::new("/tmp/work"), "name");
        assert_eq!(
            invocation.args_lossy(),
            vec![
                "--quiet",
                "--no-warnings",
                "-f",
                "mp4",
                "-o",
                "/tmp/work/name.%(ext)s",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_locates_downloaded_file() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(downloader(0));
        let adapter =
            YoutubeDlAdapter::new(fake.clone(), "youtube-dl", DEFAULT_URL_BASE, quick_retry(5));

        match adapter.fetch("dQw4w9WgXcQ", dir.path()).await {
            FetchOutcome::Downloaded(path) => {
                assert!(path.is_file());
                assert_eq!(path.extension().unwrap(), "mp4");
                assert!(path.starts_with(dir.path()));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(fake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_retries_then_succeeds() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(downloader(2));
        let adapter =
            YoutubeDlAdapter::new(fake.clone(), "youtube-dl", DEFAULT_URL_BASE, quick_retry(5));

        let outcome = adapter.fetch("dQw4w9WgXcQ", dir.path()).await;
        assert!(matches!(outcome, FetchOutcome::Downloaded(_)));
        assert_eq!(fake.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_exhausts_attempts() {
        let dir = TempDir::new().unwrap();
        let fake = Arc::new(downloader(u32::MAX));
        let adapter =
            YoutubeDlAdapter::new(fake.clone(), "youtube-dl", DEFAULT_URL_BASE, quick_retry(3));

        let outcome = adapter.fetch("dQw4w9WgXcQ", dir.path()).await;
        assert_eq!(
            outcome,
            FetchOutcome::Failed("ERROR: HTTP Error 429: Too Many Requests".to_string())
        );
        assert_eq!(fake.calls().len(), 3);
    }
}
