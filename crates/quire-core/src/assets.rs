//! Asset coordination between the editor and the media gallery.
//!
//! ## Learning: Shared State Across Tasks
//!
//! The coordinator is `Clone`, and every clone shares the same cache and
//! upload counter through `Arc`. A UI can move a clone into a spawned task
//! to run an upload while the session keeps editing; when the task
//! finishes, the session sees the new asset in the shared cache.
//!
//! Locks are `tokio::sync::RwLock`, and no guard is ever held across a
//! gallery request: requests run first, the cache is updated afterwards.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quire_model::Node;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::GalleryConfig;
use crate::event::{EditorEvent, EventBus};

/// A media item in the remote gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// URL of the media
    pub src: String,
    /// Alternative text, if the gallery has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl Asset {
    pub fn new(src: impl Into<String>, alt_text: Option<String>) -> Self {
        Self {
            src: src.into(),
            alt_text,
        }
    }
}

/// A file picked on the user's machine, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    /// MIME type, e.g. `image/png`
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for(path).to_string();
        Ok(Self {
            name,
            content_type,
            bytes,
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Asset errors.
///
/// Remote failures can be retried by the user; local validation failures
/// cannot, the file itself has to change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to list gallery assets: {0}")]
    List(String),

    #[error("Failed to upload {name}: {reason}")]
    Upload { name: String, reason: String },

    #[error("{name} is {size} bytes; the upload limit is {limit} bytes")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("{name} has unsupported type {content_type}")]
    UnsupportedType { name: String, content_type: String },

    #[error("{0} is not in the gallery")]
    NotInGallery(String),
}

impl AssetError {
    /// Returns true if trying again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AssetError::List(_) | AssetError::Upload { .. })
    }
}

/// Remote media gallery.
///
/// ## Learning: async_trait
///
/// Async functions in traits used as `dyn` objects still go through the
/// `async_trait` macro, which boxes the returned futures.
#[async_trait]
pub trait GalleryClient: Send + Sync {
    /// Fetches the full asset list.
    async fn list(&self) -> Result<Vec<Asset>, AssetError>;

    /// Uploads a file and returns the stored asset.
    async fn upload(&self, file: &LocalFile) -> Result<Asset, AssetError>;
}

/// Whether uploads are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Uploading(usize),
}

/// Local checks applied before a file is sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_bytes: usize,
    pub accepted_types: Vec<String>,
}

impl UploadLimits {
    pub fn check(&self, file: &LocalFile) -> Result<(), AssetError> {
        if file.len() > self.max_bytes {
            return Err(AssetError::TooLarge {
                name: file.name.clone(),
                size: file.len(),
                limit: self.max_bytes,
            });
        }
        let accepted = self
            .accepted_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&file.content_type));
        if !accepted {
            return Err(AssetError::UnsupportedType {
                name: file.name.clone(),
                content_type: file.content_type.clone(),
            });
        }
        Ok(())
    }
}

impl From<&GalleryConfig> for UploadLimits {
    fn from(config: &GalleryConfig) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
            accepted_types: config.accepted_types.clone(),
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::from(&GalleryConfig::default())
    }
}

/// Mediates between the editor and the gallery service.
#[derive(Clone)]
pub struct AssetCoordinator {
    client: Arc<dyn GalleryClient>,
    cache: Arc<RwLock<Vec<Asset>>>,
    uploading: Arc<AtomicUsize>,
    limits: UploadLimits,
    events: EventBus,
}

impl AssetCoordinator {
    pub fn new(client: Arc<dyn GalleryClient>, limits: UploadLimits, events: EventBus) -> Self {
        Self {
            client,
            cache: Arc::new(RwLock::new(Vec::new())),
            uploading: Arc::new(AtomicUsize::new(0)),
            limits,
            events,
        }
    }

    /// Fetches the gallery and replaces the cache.
    ///
    /// On failure the cache keeps its previous contents.
    pub async fn list_assets(&self) -> Result<Vec<Asset>, AssetError> {
        debug!("Refreshing gallery asset list");
        match self.client.list().await {
            Ok(assets) => {
                *self.cache.write().await = assets.clone();
                info!("Gallery holds {} assets", assets.len());
                self.events.emit(EditorEvent::AssetsRefreshed {
                    count: assets.len(),
                });
                Ok(assets)
            }
            Err(e) => {
                warn!("Gallery listing failed: {}", e);
                self.events.emit(EditorEvent::AssetListFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Uploads a file and prepends the new asset to the cache.
    ///
    /// The file is checked against the upload limits first. Failures are
    /// reported and never retried here.
    pub async fn upload_asset(&self, file: LocalFile) -> Result<Asset, AssetError> {
        if let Err(e) = self.limits.check(&file) {
            warn!("Rejected upload: {}", e);
            self.events.emit(EditorEvent::UploadFailed {
                name: file.name.clone(),
                reason: e.to_string(),
            });
            return Err(e);
        }

        let _guard = UploadGuard::start(&self.uploading);
        info!("Uploading {} ({} bytes)", file.name, file.len());
        self.events.emit(EditorEvent::UploadStarted {
            name: file.name.clone(),
        });

        match self.client.upload(&file).await {
            Ok(asset) => {
                self.cache.write().await.insert(0, asset.clone());
                info!("Uploaded {} as {}", file.name, asset.src);
                self.events.emit(EditorEvent::UploadFinished {
                    src: asset.src.clone(),
                });
                Ok(asset)
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", file.name, e);
                self.events.emit(EditorEvent::UploadFailed {
                    name: file.name.clone(),
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Returns the cached asset list.
    pub async fn cached(&self) -> Vec<Asset> {
        self.cache.read().await.clone()
    }

    /// Resolves a gallery choice to its cached asset.
    pub async fn select(&self, src: &str) -> Result<Asset, AssetError> {
        self.cache
            .read()
            .await
            .iter()
            .find(|a| a.src == src)
            .cloned()
            .ok_or_else(|| AssetError::NotInGallery(src.to_string()))
    }

    pub fn upload_state(&self) -> UploadState {
        match self.uploading.load(Ordering::SeqCst) {
            0 => UploadState::Idle,
            n => UploadState::Uploading(n),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.upload_state() != UploadState::Idle
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }
}

impl fmt::Debug for AssetCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetCoordinator")
            .field("upload_state", &self.upload_state())
            .field("limits", &self.limits)
            .finish()
    }
}

/// Counts an upload as in flight until dropped, even if the future is cancelled.
struct UploadGuard<'a>(&'a AtomicUsize);

impl<'a> UploadGuard<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ==================== Asset to node ====================

/// Builds the block node that embeds an asset.
///
/// YouTube links become video embeds; everything else is an image.
pub fn asset_node(asset: &Asset) -> Node {
    match youtube_video_id(&asset.src) {
        Some(id) => Node::video(id),
        None => Node::image(asset.src.clone(), asset.alt_text.clone()),
    }
}

/// Extracts the video id from a YouTube URL.
///
/// Understands `youtube.com/watch?v=ID`, `youtu.be/ID` and `/embed/ID`.
pub fn youtube_video_id(url: &str) -> Option<String> {
    let rest = url
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    let candidate = if let Some(path) = rest.strip_prefix("youtu.be/") {
        path
    } else if let Some(path) = rest.strip_prefix("youtube.com/") {
        if let Some(id) = path.strip_prefix("embed/") {
            id
        } else {
            let (route, query) = path.split_once('?')?;
            if route != "watch" {
                return None;
            }
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("v="))?
        }
    } else {
        return None;
    };

    let id: String = candidate
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::NodeKind;
    use std::sync::Mutex;

    /// Gallery double that records calls and can be told to fail.
    #[derive(Default)]
    struct StubGallery {
        assets: Mutex<Vec<Asset>>,
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl GalleryClient for StubGallery {
        async fn list(&self) -> Result<Vec<Asset>, AssetError> {
            if *self.fail.lock().unwrap() {
                return Err(AssetError::List("offline".into()));
            }
            Ok(self.assets.lock().unwrap().clone())
        }

        async fn upload(&self, file: &LocalFile) -> Result<Asset, AssetError> {
            if *self.fail.lock().unwrap() {
                return Err(AssetError::Upload {
                    name: file.name.clone(),
                    reason: "offline".into(),
                });
            }
            let asset = Asset::new(format!("/media/{}", file.name), None);
            self.assets.lock().unwrap().insert(0, asset.clone());
            Ok(asset)
        }
    }

    fn coordinator(stub: Arc<StubGallery>) -> AssetCoordinator {
        AssetCoordinator::new(stub, UploadLimits::default(), EventBus::new())
    }

    fn png(name: &str) -> LocalFile {
        LocalFile::new(name, "image/png", vec![0; 16])
    }

    #[tokio::test]
    async fn test_list_failure_keeps_cache() {
        let stub = Arc::new(StubGallery::default());
        stub.assets.lock().unwrap().push(Asset::new("/a.png", None));
        let coord = coordinator(stub.clone());

        assert_eq!(coord.list_assets().await.unwrap().len(), 1);
        *stub.fail.lock().unwrap() = true;
        let err = coord.list_assets().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(coord.cached().await, vec![Asset::new("/a.png", None)]);
    }

    #[tokio::test]
    async fn test_upload_prepends_and_resets_state() {
        let stub = Arc::new(StubGallery::default());
        let coord = coordinator(stub);
        let mut rx = coord.events.subscribe();

        let asset = coord.upload_asset(png("cat.png")).await.unwrap();
        assert_eq!(asset.src, "/media/cat.png");
        assert_eq!(coord.cached().await[0], asset);
        assert_eq!(coord.upload_state(), UploadState::Idle);

        assert_eq!(
            rx.recv().await.unwrap(),
            EditorEvent::UploadStarted {
                name: "cat.png".into()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            EditorEvent::UploadFinished {
                src: "/media/cat.png".into()
            }
        );
    }

    #[tokio::test]
    async fn test_local_validation() {
        let coord = AssetCoordinator::new(
            Arc::new(StubGallery::default()),
            UploadLimits {
                max_bytes: 8,
                accepted_types: vec!["image/png".into()],
            },
            EventBus::new(),
        );
        let too_big = coord.upload_asset(png("big.png")).await.unwrap_err();
        assert!(matches!(too_big, AssetError::TooLarge { size: 16, .. }));
        assert!(!too_big.is_retryable());

        let pdf = LocalFile::new("doc.pdf", "application/pdf", vec![1]);
        assert!(matches!(
            coord.upload_asset(pdf).await,
            Err(AssetError::UnsupportedType { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_requires_cached_asset() {
        let coord = coordinator(Arc::new(StubGallery::default()));
        assert_eq!(
            coord.select("/missing.png").await,
            Err(AssetError::NotInGallery("/missing.png".into()))
        );
    }

    #[tokio::test]
    async fn test_from_path_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, b"jpeg").unwrap();
        let file = LocalFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "photo.JPG");
        assert_eq!(file.content_type, "image/jpeg");
        assert_eq!(file.len(), 4);
    }

    #[test]
    fn test_youtube_ids() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        ] {
            assert_eq!(youtube_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
        assert_eq!(youtube_video_id("https://vimeo.com/123"), None);
        assert_eq!(youtube_video_id("https://www.youtube.com/channel/abc"), None);
    }

    #[test]
    fn test_asset_node() {
        let video = asset_node(&Asset::new("https://youtu.be/abc123", None));
        assert_eq!(
            video.kind(),
            &NodeKind::Video {
                video_id: "abc123".into()
            }
        );
        let image = asset_node(&Asset::new("/cat.png", Some("a cat".into())));
        assert_eq!(
            image.kind(),
            &NodeKind::Image {
                src: "/cat.png".into(),
                alt: Some("a cat".into())
            }
        );
    }
}
