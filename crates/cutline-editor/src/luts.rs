//! LUT discovery.

use std::path::Path;
use tracing::debug;

/// File extension of 3D LUTs ffmpeg's `lut3d` can read.
pub const LUT_EXTENSION: &str = "cube";

/// Names of the `.cube` files in `dir`, sorted. A missing directory has none.
pub async fn list_luts(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), "No LUT directory: {}", e);
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_lut = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case(LUT_EXTENSION))
            .unwrap_or(false);
        if !is_lut || !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }

    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lists_only_cube_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["warm.cube", "Cold.CUBE", "notes.txt", "teal.3dl"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.cube")).unwrap();

        assert_eq!(list_luts(dir.path()).await, vec!["Cold.CUBE", "warm.cube"]);
    }

    #[tokio::test]
    async fn test_missing_directory() {
        assert!(list_luts(Path::new("/nonexistent/luts")).await.is_empty());
    }
}
