use super::AssetFetcher;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockAssetFetcher {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockAssetFetcher {
    pub fn new() -> Self {
        Self {
            bytes: Arc::new(Mutex::new(Some(vec![0x89, 0x50, 0x4E, 0x47]))),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_bytes(self, bytes: Vec<u8>) -> Self {
        *self.bytes.lock().unwrap() = Some(bytes);
        self
    }

    /// Every fetch fails as if the host returned 404.
    pub fn failing(self) -> Self {
        *self.bytes.lock().unwrap() = None;
        self
    }

    pub fn get_fetch_count(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn get_requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Default for MockAssetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetFetcher for MockAssetFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        self.requested.lock().unwrap().push(uri.to_string());

        self.bytes
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::AssetFetch {
                status: Some(404),
                reason: format!("{} not found", uri),
            })
    }
}
