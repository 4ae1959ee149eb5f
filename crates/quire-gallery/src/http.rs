//! HTTP client for the remote media gallery.
//!
//! The service exposes one collection:
//!
//! - `GET {base}/assets` returns `{ "assets": [ { "src": ..., "altText": ... } ] }`
//! - `POST {base}/assets` takes a multipart form with a `file` part and
//!   returns the stored asset
//!
//! Non-success statuses become errors carrying the status and body. Nothing
//! is retried here; retrying is the user's call.

use std::time::Duration;

use async_trait::async_trait;
use quire_core::config::GalleryConfig;
use quire_core::{Asset, AssetError, GalleryClient, LocalFile};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{GalleryError, GalleryResult};

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    assets: Vec<Asset>,
}

/// Gallery backed by the media service's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGallery {
    client: Client,
    assets_url: Url,
}

impl HttpGallery {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> GalleryResult<Self> {
        let assets_url = assets_url(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, assets_url })
    }

    pub fn from_config(config: &GalleryConfig) -> GalleryResult<Self> {
        Self::new(&config.base_url, config.request_timeout())
    }

    /// The collection URL requests go to.
    pub fn assets_url(&self) -> &Url {
        &self.assets_url
    }
}

#[async_trait]
impl GalleryClient for HttpGallery {
    async fn list(&self) -> Result<Vec<Asset>, AssetError> {
        debug!("GET {}", self.assets_url);
        let resp = self
            .client
            .get(self.assets_url.clone())
            .send()
            .await
            .map_err(|e| AssetError::List(e.to_string()))?;
        let resp = check_status(resp).await.map_err(AssetError::List)?;

        let body: ListResponse = resp
            .json()
            .await
            .map_err(|e| AssetError::List(format!("invalid response: {}", e)))?;
        debug!("Gallery returned {} assets", body.assets.len());
        Ok(body.assets)
    }

    async fn upload(&self, file: &LocalFile) -> Result<Asset, AssetError> {
        let upload_error = |reason: String| AssetError::Upload {
            name: file.name.clone(),
            reason,
        };

        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| upload_error(e.to_string()))?;
        let form = Form::new().part("file", part);

        debug!("POST {} ({} bytes)", self.assets_url, file.len());
        let resp = self
            .client
            .post(self.assets_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_error(e.to_string()))?;
        let resp = check_status(resp).await.map_err(upload_error)?;

        let asset: Asset = resp
            .json()
            .await
            .map_err(|e| upload_error(format!("invalid response: {}", e)))?;
        info!("Gallery stored {} at {}", file.name, asset.src);
        Ok(asset)
    }
}

/// Turns a non-success response into a message with status and body.
async fn check_status(resp: Response) -> Result<Response, String> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    warn!("Gallery answered {}: {}", status, body);
    Err(format!("{} - {}", status, body))
}

fn assets_url(base_url: &str) -> GalleryResult<Url> {
    let invalid = |reason: String| GalleryError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };
    let base = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", base.scheme())));
    }
    let joined = format!("{}/assets", base.as_str().trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| invalid(e.to_string()))
}
