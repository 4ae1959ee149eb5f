//! # Quire Gallery
//!
//! Clients for the media gallery behind the editor's asset picker.
//!
//! ## Learning: One Trait, Several Backends
//!
//! The session only knows `dyn GalleryClient`. [`HttpGallery`] talks to
//! the real media service; [`MemoryGallery`] keeps everything in process
//! for previews, demos and tests. Swapping one for the other is a
//! constructor change, nothing else.
//!
//! ```ignore
//! let config = Config::load();
//! let gallery = Arc::new(HttpGallery::from_config(&config.gallery)?);
//! let session = EditorSession::new(&config, gallery);
//! ```

pub mod http;
pub mod memory;

pub use http::HttpGallery;
pub use memory::MemoryGallery;

/// Result type for gallery client setup
pub type GalleryResult<T> = Result<T, GalleryError>;

/// Errors raised while building a gallery client
#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("Invalid gallery URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
