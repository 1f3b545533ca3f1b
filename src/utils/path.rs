//! Path utilities for manifest identifiers and output layouts

use std::path::{Component, Path, PathBuf};

/// Path helpers shared by the batch tasks
pub struct PathUtils;

impl PathUtils {
    /// Resolve a manifest identifier to an input path
    ///
    /// Absolute identifiers pass through untouched; relative ones are joined
    /// to `root` when one is configured.
    pub fn resolve_input(root: Option<&Path>, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        match root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Relative location, extension kept, under which the output for an
    /// identifier is placed
    ///
    /// Relative identifiers keep their directory tree. Absolute identifiers
    /// keep the part below `root` when they live under it, and their whole
    /// path otherwise. `..` and root components are dropped so the result
    /// never escapes the output directory.
    pub fn output_relative(root: Option<&Path>, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        let relative = match root.and_then(|r| path.strip_prefix(r).ok()) {
            Some(below) if path.is_absolute() => below,
            _ => path,
        };
        relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect()
    }

    /// [`PathUtils::output_relative`] without the final extension
    pub fn output_key(root: Option<&Path>, identifier: &str) -> PathBuf {
        Self::output_relative(root, identifier).with_extension("")
    }

    /// Identifier with its extension removed, as shown in reports
    pub fn strip_extension(identifier: &str) -> String {
        let path = Path::new(identifier);
        match path.extension() {
            Some(_) => path.with_extension("").to_string_lossy().into_owned(),
            None => identifier.to_string(),
        }
    }

    /// Final path component of an identifier
    pub fn basename(identifier: &str) -> String {
        Path::new(identifier)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| identifier.to_string())
    }

    /// Render the `n`-th name of a printf-style frame sequence (`%06d.jpg`)
    pub fn render_frame_name(format: &str, n: u64) -> String {
        let Some(percent) = format.find('%') else {
            return format.to_string();
        };
        let rest = &format[percent + 1..];
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !rest[digits.len()..].starts_with('d') {
            return format.to_string();
        }

        let width = digits.parse::<usize>().unwrap_or(0);
        let number = if digits.starts_with('0') {
            format!("{:0width$}", n, width = width)
        } else {
            format!("{:width$}", n, width = width)
        };
        format!(
            "{}{}{}",
            &format[..percent],
            number,
            &rest[digits.len() + 1..]
        )
    }

    /// Glob matching every name of a frame sequence (`%06d.jpg` -> `*.jpg`)
    pub fn frame_glob(format: &str) -> String {
        let Some(percent) = format.find('%') else {
            return format.to_string();
        };
        let rest = &format[percent + 1..];
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if !rest[digits..].starts_with('d') {
            return format.to_string();
        }
        format!("{}*{}", &format[..percent], &rest[digits + 1..])
    }

    /// Split a filter string such as `-vf scale=320:240` into arguments
    pub fn split_filters(filters: &str) -> Vec<String> {
        filters.split_whitespace().map(str::to_string).collect()
    }

    /// Map a source file path to `<dirname>/<parent-dir-name>/<stem>`
    ///
    /// Only one level of the source hierarchy is kept.
    pub fn frame_list_entry(dirname: &Path, source: &str) -> PathBuf {
        let source = Path::new(source.trim_end());
        let stem = source
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        let parent = source
            .parent()
            .and_then(Path::file_name)
            .map(|p| p.to_os_string())
            .unwrap_or_default();
        dirname.join(parent).join(stem)
    }
}
