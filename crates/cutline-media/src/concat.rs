//! Concat demuxer manifests.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::MediaResult;

/// Normalize a path for a concat manifest entry.
///
/// Backslashes become forward slashes and each `'` becomes `'\''` (close the
/// quote, emit an escaped quote, reopen).
pub fn safe_path_for_concat(path: &str) -> String {
    path.replace('\\', "/").replace('\'', "'\\''")
}

/// Reverse of [`safe_path_for_concat`]'s quote escaping.
pub fn unescape_concat_path(escaped: &str) -> String {
    escaped.replace("'\\''", "'")
}

/// One manifest line for `path`.
///
/// Single quotes, since the concat demuxer only honors `'\''` inside single-quoted tokens.
pub fn manifest_entry(path: &Path) -> String {
    format!("file '{}'", safe_path_for_concat(&path.to_string_lossy()))
}

/// Manifest text listing `paths` in order.
pub fn build_manifest(paths: &[PathBuf]) -> String {
    let mut manifest = String::new();
    for path in paths {
        manifest.push_str(&manifest_entry(path));
        manifest.push('\n');
    }
    manifest
}

/// Write a manifest for `paths` to `manifest_path`.
pub async fn write_manifest(manifest_path: &Path, paths: &[PathBuf]) -> MediaResult<()> {
    fs::write(manifest_path, build_manifest(paths)).await?;
    Ok(())
}
