//! Artifact cache keyed by source asset path.
//!
//! Thumbnails, waveforms and proxies depend only on the asset, so every
//! clip of an asset shares one entry. An entry is only served while all of
//! its files are still on disk; otherwise it is evicted and recomputed.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::metrics::record_cache_lookup;

fn is_present(files: &[PathBuf]) -> bool {
    !files.is_empty() && files.iter().all(|f| f.exists())
}

/// One kind of cached artifact.
#[derive(Debug)]
struct Store {
    artifact: &'static str,
    entries: RwLock<HashMap<PathBuf, Vec<PathBuf>>>,
}

impl Store {
    fn new(artifact: &'static str) -> Self {
        Self {
            artifact,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get(&self, asset: &Path) -> Option<Vec<PathBuf>> {
        let cached = self.entries.read().await.get(asset).cloned();

        let hit = match cached {
            Some(files) if is_present(&files) => Some(files),
            Some(_) => {
                debug!(asset = %asset.display(), artifact = self.artifact, "Cached artifact missing on disk");
                self.evict_if_stale(asset).await;
                None
            }
            None => None,
        };

        record_cache_lookup(self.artifact, hit.is_some());
        hit
    }

    /// Drop the entry unless a concurrent put already replaced it with live files.
    async fn evict_if_stale(&self, asset: &Path) {
        let mut entries = self.entries.write().await;
        if entries.get(asset).is_some_and(|files| !is_present(files)) {
            entries.remove(asset);
        }
    }

    async fn put(&self, asset: &Path, files: Vec<PathBuf>) {
        if files.is_empty() {
            return;
        }
        self.entries.write().await.insert(asset.to_path_buf(), files);
    }

    async fn remove(&self, asset: &Path) -> Option<Vec<PathBuf>> {
        self.entries.write().await.remove(asset)
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Session-owned cache of per-asset preview artifacts.
///
/// Concurrent jobs for the same uncached asset may both compute; the last
/// writer wins, which is fine because the output is the same.
#[derive(Debug)]
pub struct ArtifactCache {
    thumbnails: Store,
    waveforms: Store,
    proxies: Store,
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self {
            thumbnails: Store::new("thumbnails"),
            waveforms: Store::new("waveform"),
            proxies: Store::new("proxy"),
        }
    }
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thumbnails(&self, asset: &Path) -> Option<Vec<PathBuf>> {
        self.thumbnails.get(asset).await
    }

    pub async fn put_thumbnails(&self, asset: &Path, thumbnails: Vec<PathBuf>) {
        self.thumbnails.put(asset, thumbnails).await;
    }

    pub async fn waveform(&self, asset: &Path) -> Option<PathBuf> {
        self.waveforms.get(asset).await.and_then(|mut files| files.pop())
    }

    pub async fn put_waveform(&self, asset: &Path, waveform: PathBuf) {
        self.waveforms.put(asset, vec![waveform]).await;
    }

    pub async fn proxy(&self, asset: &Path) -> Option<PathBuf> {
        self.proxies.get(asset).await.and_then(|mut files| files.pop())
    }

    pub async fn put_proxy(&self, asset: &Path, proxy: PathBuf) {
        self.proxies.put(asset, vec![proxy]).await;
    }

    /// Forget the asset's proxy, returning the path it pointed at.
    pub async fn remove_proxy(&self, asset: &Path) -> Option<PathBuf> {
        self.proxies.remove(asset).await.and_then(|mut files| files.pop())
    }

    /// Cached thumbnails, or the result of `compute` (cached when non-empty).
    pub async fn thumbnails_or_compute<F, Fut>(&self, asset: &Path, compute: F) -> Vec<PathBuf>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Vec<PathBuf>>,
    {
        if let Some(hit) = self.thumbnails(asset).await {
            return hit;
        }
        let computed = compute().await;
        self.put_thumbnails(asset, computed.clone()).await;
        computed
    }

    /// Cached waveform, or the result of `compute` (cached when present).
    pub async fn waveform_or_compute<F, Fut>(&self, asset: &Path, compute: F) -> Option<PathBuf>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<PathBuf>>,
    {
        if let Some(hit) = self.waveform(asset).await {
            return Some(hit);
        }
        let computed = compute().await?;
        self.put_waveform(asset, computed.clone()).await;
        Some(computed)
    }

    /// Cached proxy, or the result of `compute` (cached when present).
    pub async fn proxy_or_compute<F, Fut>(&self, asset: &Path, compute: F) -> Option<PathBuf>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<PathBuf>>,
    {
        if let Some(hit) = self.proxy(asset).await {
            return Some(hit);
        }
        let computed = compute().await?;
        self.put_proxy(asset, computed.clone()).await;
        Some(computed)
    }

    pub async fn clear(&self) {
        self.thumbnails.clear().await;
        self.waveforms.clear().await;
        self.proxies.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) -> PathBuf {
        std::fs::write(path, b"x").unwrap();
        path.to_path_buf()
    }

    #[tokio::test]
    async fn test_hit_requires_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new();
        let asset = Path::new("/media/a.mp4");

        let thumbs = vec![touch(&dir.path().join("t0.jpg")), touch(&dir.path().join("t1.jpg"))];
        cache.put_thumbnails(asset, thumbs.clone()).await;
        assert_eq!(cache.thumbnails(asset).await, Some(thumbs.clone()));

        std::fs::remove_file(&thumbs[1]).unwrap();
        assert_eq!(cache.thumbnails(asset).await, None);

        // Evicted, so restoring the file does not resurrect the entry
        touch(&thumbs[1]);
        assert_eq!(cache.thumbnails(asset).await, None);
    }

    #[tokio::test]
    async fn test_eviction_spares_a_fresh_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new("thumbnails");
        let asset = Path::new("/media/a.mp4");

        store.put(asset, vec![dir.path().join("gone.jpg")]).await;
        let fresh = vec![touch(&dir.path().join("t0.jpg"))];
        store.put(asset, fresh.clone()).await;

        store.evict_if_stale(asset).await;
        assert_eq!(store.get(asset).await, Some(fresh));

        std::fs::remove_file(dir.path().join("t0.jpg")).unwrap();
        store.evict_if_stale(asset).await;
        assert!(store.entries.read().await.get(asset).is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new();
        let asset = Path::new("/media/a.mp4");
        let wave = dir.path().join("wave.png");

        let first = cache
            .waveform_or_compute(asset, || async { Some(touch(&wave)) })
            .await;
        assert_eq!(first.as_ref(), Some(&wave));

        let mut recomputed = false;
        let cached = cache
            .waveform_or_compute(asset, || {
                recomputed = true;
                async { None::<PathBuf> }
            })
            .await;
        assert!(!recomputed);
        assert_eq!(cached.as_ref(), Some(&wave));

        std::fs::remove_file(&wave).unwrap();
        let mut computed = false;
        let again = cache
            .waveform_or_compute(asset, || {
                computed = true;
                async { Some(touch(&wave)) }
            })
            .await;
        assert!(computed);
        assert_eq!(again, Some(wave));
    }

    #[tokio::test]
    async fn test_empty_results_are_not_cached() {
        let cache = ArtifactCache::new();
        let asset = Path::new("/media/broken.mp4");

        let thumbs = cache.thumbnails_or_compute(asset, || async { Vec::<PathBuf>::new() }).await;
        assert!(thumbs.is_empty());
        assert_eq!(cache.thumbnails(asset).await, None);

        let proxy = cache.proxy_or_compute(asset, || async { None::<PathBuf> }).await;
        assert_eq!(proxy, None);
    }

    #[tokio::test]
    async fn test_remove_proxy() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::new();
        let asset = Path::new("/media/a.mp4");
        let proxy = touch(&dir.path().join("a_proxy_640w.mp4"));

        cache.put_proxy(asset, proxy.clone()).await;
        assert_eq!(cache.remove_proxy(asset).await, Some(proxy));
        assert_eq!(cache.proxy(asset).await, None);
        assert_eq!(cache.remove_proxy(asset).await, None);
    }
}
