//! Subsonic-compatible cover art source over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use tracing::{debug, warn};

use super::disk_store::DiskArtworkStore;
use crate::domain::entities::CacheKey;
use crate::domain::errors::{ArtworkError, ArtworkResult};
use crate::domain::ports::ArtworkSource;

/// REST API version sent with every request.
pub const API_VERSION: &str = "1.8.0";

const COVER_ART_PATH: &str = "rest/getCoverArt.view";

/// Credentials sent as query parameters.
#[derive(Clone)]
pub struct ServerCredentials {
    /// Account name.
    pub username: String,
    /// Account password, sent hex-encoded.
    pub password: String,
    /// Client identifier reported to the server.
    pub client_name: String,
}

impl std::fmt::Debug for ServerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_name", &self.client_name)
            .finish()
    }
}

/// Fetches cover art from a media server, optionally keeping large
/// renditions on disk.
#[derive(Debug)]
pub struct HttpArtworkSource {
    client: reqwest::Client,
    endpoint: String,
    credentials: ServerCredentials,
    store: Option<Arc<DiskArtworkStore>>,
}

impl HttpArtworkSource {
    /// Creates a source for the server at `server_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(
        server_url: &str,
        credentials: ServerCredentials,
        timeout: Duration,
        store: Option<Arc<DiskArtworkStore>>,
    ) -> ArtworkResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ArtworkError::fetch(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/{COVER_ART_PATH}", server_url.trim_end_matches('/')),
            credentials,
            store,
        })
    }

    fn query(&self, content_id: &str, size: u32) -> Vec<(&'static str, String)> {
        vec![
            ("id", content_id.to_string()),
            ("size", size.to_string()),
            ("u", self.credentials.username.clone()),
            ("p", format!("enc:{}", hex::encode(&self.credentials.password))),
            ("v", API_VERSION.to_string()),
            ("c", self.credentials.client_name.clone()),
        ]
    }

    async fn download(&self, content_id: &str, size: u32) -> ArtworkResult<Bytes> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&self.query(content_id, size))
            .send()
            .await
            .map_err(|e| ArtworkError::fetch(format!("Request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ArtworkError::NotFound(content_id.to_string()));
        }
        if !status.is_success() {
            return Err(ArtworkError::fetch(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        // errors come back as XML bodies with a 200 status
        let is_xml = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ctype| ctype.contains("xml"));
        if is_xml {
            return Err(ArtworkError::fetch(format!(
                "Server returned an error document for {content_id}"
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ArtworkError::fetch(format!("Failed to read body: {e}")))
    }
}

async fn decode(bytes: Bytes) -> ArtworkResult<DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| ArtworkError::decode(format!("Decode task failed: {e}")))?
        .map_err(ArtworkError::from)
}

#[async_trait]
impl ArtworkSource for HttpArtworkSource {
    async fn fetch(&self, content_id: &str, size: u32, persist: bool) -> ArtworkResult<DynamicImage> {
        let key = CacheKey::new(content_id, size);

        if let Some(store) = &self.store
            && let Some(bytes) = store.get(&key).await
        {
            match decode(Bytes::from(bytes)).await {
                Ok(image) => {
                    debug!(key = %key, "Serving artwork from disk");
                    return Ok(image);
                }
                Err(e) => warn!(key = %key, error = %e, "Stored artwork unreadable, refetching"),
            }
        }

        let bytes = self.download(content_id, size).await?;
        let image = decode(bytes.clone()).await?;

        if persist && let Some(store) = &self.store {
            if let Err(e) = store.put(&key, &bytes).await {
                warn!(key = %key, error = %e, "Failed to persist artwork");
            }
        }

        debug!(key = %key, bytes = bytes.len(), persist, "Downloaded artwork");
        Ok(image)
    }
}
