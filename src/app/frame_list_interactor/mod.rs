// Frame-list interactor - Maps a list of video files to frame directories

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::errors::*;
use crate::utils::path::PathUtils;

/// Interactor for the frame-list command
pub struct FrameListInteractor {
    dirname: PathBuf,
}

impl FrameListInteractor {
    /// Create a frame-list interactor rooted at `dirname`
    pub fn new(dirname: impl Into<PathBuf>) -> Self {
        Self {
            dirname: dirname.into(),
        }
    }

    /// Map every non-empty line of `content`
    pub fn map_lines(&self, content: &str) -> Vec<PathBuf> {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| PathUtils::frame_list_entry(&self.dirname, line.trim()))
            .collect()
    }

    /// Read `source`, write the mapped list to `output`, return the entry count
    pub fn execute(&self, source: &Path, output: &Path) -> Result<usize, DomainError> {
        if !source.is_file() {
            return Err(DomainError::NotFound(source.to_path_buf()));
        }
        let content = std::fs::read_to_string(source)?;
        let entries = self.map_lines(&content);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(output)?);
        for entry in &entries {
            writeln!(file, "{}", entry.display())?;
        }
        file.flush()?;

        info!(
            source = %source.display(),
            output = %output.display(),
            entries = entries.len(),
            "Frame list written"
        );
        Ok(entries.len())
    }
}
