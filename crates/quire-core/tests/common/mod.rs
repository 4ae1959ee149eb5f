//! Shared fixtures for session tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quire_core::{Asset, AssetError, Config, EditorSession, GalleryClient, LocalFile};

/// In-process gallery that can be switched offline.
#[derive(Default)]
pub struct FakeGallery {
    assets: Mutex<Vec<Asset>>,
    offline: Mutex<bool>,
    uploads: Mutex<usize>,
}

impl FakeGallery {
    pub fn with_assets(assets: Vec<Asset>) -> Arc<Self> {
        Arc::new(Self {
            assets: Mutex::new(assets),
            ..Default::default()
        })
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn upload_calls(&self) -> usize {
        *self.uploads.lock().unwrap()
    }
}

#[async_trait]
impl GalleryClient for FakeGallery {
    async fn list(&self) -> Result<Vec<Asset>, AssetError> {
        if *self.offline.lock().unwrap() {
            return Err(AssetError::List("connection refused".into()));
        }
        Ok(self.assets.lock().unwrap().clone())
    }

    async fn upload(&self, file: &LocalFile) -> Result<Asset, AssetError> {
        *self.uploads.lock().unwrap() += 1;
        if *self.offline.lock().unwrap() {
            return Err(AssetError::Upload {
                name: file.name.clone(),
                reason: "connection refused".into(),
            });
        }
        let asset = Asset::new(format!("https://cdn.example.com/{}", file.name), None);
        self.assets.lock().unwrap().insert(0, asset.clone());
        Ok(asset)
    }
}

pub fn session_with(gallery: Arc<FakeGallery>) -> EditorSession {
    EditorSession::new(&Config::default(), gallery)
}

pub fn png(name: &str) -> LocalFile {
    LocalFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
}
