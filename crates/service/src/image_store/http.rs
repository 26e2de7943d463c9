use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::{ImageStore, ImageStoreError, StoredImage};
use crate::validation::ImagePayload;

/// JSON-over-HTTP client for the hosted image store.
///
/// Endpoints (relative to `base_url`, bearer-authenticated):
/// `POST /upload`, `POST /delete`, `POST /bulk-delete`, `POST /blurhash`,
/// `POST /dominant-color`.
#[derive(Clone)]
pub struct HttpImageStore {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct HashResponse { hash: String }

#[derive(Deserialize)]
struct ColorResponse { color: String }

impl HttpImageStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ImageStoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageStoreError::Network(e.to_string()))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key: api_key.to_string() })
    }

    pub fn from_config(cfg: &configs::ImageStoreConfig) -> Result<Self, ImageStoreError> {
        Self::new(&cfg.url, &cfg.api_key, Duration::from_secs(cfg.timeout_secs))
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<Response, ImageStoreError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let resp = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ImageStoreError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ImageStoreError::Status { status: status.as_u16(), body });
        }
        Ok(resp)
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    #[instrument(skip(self, image), fields(destination = %destination))]
    async fn upload(&self, image: &ImagePayload, destination: &str) -> Result<StoredImage, ImageStoreError> {
        let resp = self.post("upload", json!({"file": image.as_base64(), "path": destination})).await?;
        let stored: StoredImage = resp.json().await.map_err(|e| ImageStoreError::Parse(e.to_string()))?;
        debug!(path = %stored.path, "image uploaded");
        Ok(stored)
    }

    async fn delete_file(&self, path: &str) -> Result<(), ImageStoreError> {
        self.post("delete", json!({"path": path})).await.map(|_| ())
    }

    async fn bulk_delete_files(&self, paths: &[String]) -> Result<(), ImageStoreError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.post("bulk-delete", json!({"paths": paths})).await.map(|_| ())
    }

    async fn perceptual_hash(&self, image: &ImagePayload) -> Result<String, ImageStoreError> {
        let resp = self.post("blurhash", json!({"file": image.as_base64()})).await?;
        let body: HashResponse = resp.json().await.map_err(|e| ImageStoreError::Parse(e.to_string()))?;
        Ok(body.hash)
    }

    async fn dominant_color(&self, image: &ImagePayload) -> Result<String, ImageStoreError> {
        let resp = self.post("dominant-color", json!({"file": image.as_base64()})).await?;
        let body: ColorResponse = resp.json().await.map_err(|e| ImageStoreError::Parse(e.to_string()))?;
        Ok(body.color)
    }
}
