//! In-memory image store for tests and local development.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ImageStore, ImageStoreError, StoredImage};
use crate::validation::ImagePayload;

/// One recorded collaborator call, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCall {
    Upload(String),
    Delete(String),
    BulkDelete(Vec<String>),
    Hash,
    Color,
}

#[derive(Default)]
pub struct MockImageStore {
    files: Mutex<BTreeSet<String>>,
    calls: Mutex<Vec<ImageCall>>,
    fail_uploads: Mutex<bool>,
    fail_deletes: Mutex<bool>,
    fail_analysis: Mutex<bool>,
    rejected: Mutex<BTreeSet<String>>,
}

impl MockImageStore {
    pub fn new() -> Self { Self::default() }

    /// Make every subsequent delete / bulk delete fail.
    pub fn fail_deletes(&self, fail: bool) { *self.fail_deletes.lock().unwrap() = fail; }

    pub fn fail_uploads(&self, fail: bool) { *self.fail_uploads.lock().unwrap() = fail; }

    /// Make hash and colour extraction fail.
    pub fn fail_analysis(&self, fail: bool) { *self.fail_analysis.lock().unwrap() = fail; }

    /// Permanently refuse to delete `path`; a bulk call containing it fails as a whole.
    pub fn reject_path(&self, path: &str) { self.rejected.lock().unwrap().insert(path.to_string()); }

    pub fn calls(&self) -> Vec<ImageCall> { self.calls.lock().unwrap().clone() }

    pub fn files(&self) -> Vec<String> { self.files.lock().unwrap().iter().cloned().collect() }

    /// Seed a stored file without recording a call.
    pub fn put(&self, path: &str) { self.files.lock().unwrap().insert(path.to_string()); }

    fn record(&self, call: ImageCall) { self.calls.lock().unwrap().push(call); }

    fn delete_error(&self, paths: &[String]) -> Option<ImageStoreError> {
        let rejected = self.rejected.lock().unwrap();
        if let Some(p) = paths.iter().find(|p| rejected.contains(*p)) {
            return Some(ImageStoreError::Status { status: 422, body: format!("cannot delete {p}") });
        }
        if *self.fail_deletes.lock().unwrap() {
            Some(ImageStoreError::Status { status: 500, body: "delete failed".into() })
        } else {
            None
        }
    }
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(&self, _image: &ImagePayload, destination: &str) -> Result<StoredImage, ImageStoreError> {
        self.record(ImageCall::Upload(destination.to_string()));
        if *self.fail_uploads.lock().unwrap() {
            return Err(ImageStoreError::Network("upload refused".into()));
        }
        let path = format!("{destination}.webp");
        self.files.lock().unwrap().insert(path.clone());
        Ok(StoredImage { path })
    }

    async fn delete_file(&self, path: &str) -> Result<(), ImageStoreError> {
        self.record(ImageCall::Delete(path.to_string()));
        if let Some(e) = self.delete_error(&[path.to_string()]) {
            return Err(e);
        }
        self.files.lock().unwrap().remove(path);
        Ok(())
    }

    async fn bulk_delete_files(&self, paths: &[String]) -> Result<(), ImageStoreError> {
        self.record(ImageCall::BulkDelete(paths.to_vec()));
        if let Some(e) = self.delete_error(paths) {
            return Err(e);
        }
        let mut files = self.files.lock().unwrap();
        for p in paths {
            files.remove(p);
        }
        Ok(())
    }

    async fn perceptual_hash(&self, _image: &ImagePayload) -> Result<String, ImageStoreError> {
        self.record(ImageCall::Hash);
        if *self.fail_analysis.lock().unwrap() {
            return Err(ImageStoreError::Status { status: 500, body: "hash failed".into() });
        }
        Ok("L00000fQfQfQ".into())
    }

    async fn dominant_color(&self, _image: &ImagePayload) -> Result<String, ImageStoreError> {
        self.record(ImageCall::Color);
        if *self.fail_analysis.lock().unwrap() {
            return Err(ImageStoreError::Status { status: 500, body: "colour failed".into() });
        }
        Ok("#808080".into())
    }
}
