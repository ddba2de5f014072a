//! Imported media assets.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use cutline_media::probe_duration;
use cutline_models::{MediaAsset, MediaKind};

use crate::error::{EditorError, EditorResult};

/// Every asset imported into the session, in import order.
///
/// Each path is probed once; later imports of the same path return the
/// shared asset.
#[derive(Debug, Default, Clone)]
pub struct MediaLibrary {
    assets: Vec<Arc<MediaAsset>>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import `path`, probing its duration if it is timed media.
    pub async fn import(&mut self, path: impl AsRef<Path>, probe_timeout_secs: u64) -> EditorResult<Arc<MediaAsset>> {
        let path = path.as_ref();
        if let Some(existing) = self.get(path) {
            return Ok(existing);
        }

        if !path.exists() {
            return Err(EditorError::MediaNotFound(path.to_path_buf()));
        }

        let kind = MediaKind::from_path(path);
        let duration = if kind.is_timed() {
            probe_duration(path, probe_timeout_secs).await
        } else {
            None
        };
        if kind.is_timed() && duration.is_none() {
            warn!(asset = %path.display(), "Duration unknown, using defaults");
        }

        let asset = Arc::new(MediaAsset::new(path, duration));
        info!(asset = %path.display(), kind = %kind, duration = ?duration, "Imported media");
        self.assets.push(asset.clone());
        Ok(asset)
    }

    /// Add an already-probed asset, returning the shared instance for its path.
    pub fn insert(&mut self, asset: MediaAsset) -> Arc<MediaAsset> {
        if let Some(existing) = self.get(asset.path()) {
            return existing;
        }
        let asset = Arc::new(asset);
        self.assets.push(asset.clone());
        asset
    }

    pub fn get(&self, path: &Path) -> Option<Arc<MediaAsset>> {
        self.assets.iter().find(|a| a.path() == path).cloned()
    }

    pub fn assets(&self) -> &[Arc<MediaAsset>] {
        &self.assets
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.assets.iter().map(|a| a.path().to_path_buf()).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn clear(&mut self) {
        self.assets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_import_missing_file() {
        let mut library = MediaLibrary::new();
        let err = library.import("/nonexistent/clip.mp4", 1).await.unwrap_err();
        assert!(matches!(err, EditorError::MediaNotFound(_)));
        assert!(library.is_empty());
    }

    #[tokio::test]
    async fn test_import_image_is_not_probed_and_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("still.png");
        std::fs::write(&image, b"not really a png").unwrap();

        let mut library = MediaLibrary::new();
        let first = library.import(&image, 1).await.unwrap();
        let second = library.import(&image, 1).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.duration(), None);
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_insert_reuses_path() {
        let mut library = MediaLibrary::new();
        let a = library.insert(MediaAsset::new("/m/a.mp4", Some(4.0)));
        let again = library.insert(MediaAsset::new("/m/a.mp4", Some(9.0)));

        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(again.duration(), Some(4.0));
        assert_eq!(library.paths(), vec![PathBuf::from("/m/a.mp4")]);
    }
}
