// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fetch_youtube_dl;
pub mod probe_ffprobe;
pub mod process_tokio;
pub mod toml_config;

#[cfg(test)]
pub mod fake_process;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use fetch_youtube_dl::{RetryPolicy, YoutubeDlAdapter};
pub use probe_ffprobe::FFprobeAdapter;
pub use process_tokio::TokioProcessAdapter;
pub use toml_config::{Settings, TomlConfigAdapter};
