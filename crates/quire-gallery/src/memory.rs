//! In-process gallery.
//!
//! Holds assets in memory and can be switched offline to rehearse the
//! failure paths of the asset picker without a network.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use quire_core::{Asset, AssetError, GalleryClient, LocalFile};
use tokio::sync::RwLock;
use tracing::debug;

/// Gallery that lives in memory. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryGallery {
    assets: Arc<RwLock<Vec<Asset>>>,
    offline: Arc<AtomicBool>,
    next_id: Arc<AtomicUsize>,
}

impl MemoryGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gallery preloaded with assets, newest first.
    pub fn with_assets(assets: Vec<Asset>) -> Self {
        Self {
            assets: Arc::new(RwLock::new(assets)),
            ..Self::default()
        }
    }

    /// While offline, every request fails like an unreachable service.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

#[async_trait]
impl GalleryClient for MemoryGallery {
    async fn list(&self) -> Result<Vec<Asset>, AssetError> {
        if self.is_offline() {
            return Err(AssetError::List("gallery is offline".into()));
        }
        Ok(self.assets.read().await.clone())
    }

    async fn upload(&self, file: &LocalFile) -> Result<Asset, AssetError> {
        if self.is_offline() {
            return Err(AssetError::Upload {
                name: file.name.clone(),
                reason: "gallery is offline".into(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let asset = Asset::new(format!("memory://{}/{}", id, file.name), None);
        self.assets.write().await.insert(0, asset.clone());
        debug!("Stored {} in memory gallery", asset.src);
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> LocalFile {
        LocalFile::new(name, "image/png", vec![0; 4])
    }

    #[tokio::test]
    async fn test_upload_prepends() {
        let gallery = MemoryGallery::with_assets(vec![Asset::new("memory://old.png", None)]);
        let a = gallery.upload(&file("a.png")).await.unwrap();
        let b = gallery.upload(&file("b.png")).await.unwrap();
        assert_ne!(a.src, b.src);

        let srcs: Vec<String> = gallery.list().await.unwrap().into_iter().map(|a| a.src).collect();
        assert_eq!(srcs, vec![b.src, a.src, "memory://old.png".to_string()]);
    }

    #[tokio::test]
    async fn test_offline() {
        let gallery = MemoryGallery::new();
        gallery.set_offline(true);
        assert!(matches!(gallery.list().await, Err(AssetError::List(_))));
        assert!(gallery.upload(&file("a.png")).await.is_err());
        assert!(gallery.is_empty().await);

        gallery.set_offline(false);
        assert!(gallery.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let gallery = MemoryGallery::new();
        let other = gallery.clone();
        other.upload(&file("a.png")).await.unwrap();
        assert_eq!(gallery.len().await, 1);
    }
}
