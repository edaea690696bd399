use super::AssetHost;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory asset host, also used for `DRY_RUN`.
#[derive(Clone)]
pub struct MockAssetHost {
    files: Arc<Mutex<HashMap<String, (Vec<u8>, String)>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
}

impl MockAssetHost {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-cdn.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_file(self, key: &str, content: Vec<u8>, content_type: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (content, content_type.to_string()));
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }
}

impl Default for MockAssetHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetHost for MockAssetHost {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        *self.upload_count.lock().unwrap() += 1;

        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));
        Ok(format!("{}/{}", self.base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.files.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(Error::Storage(format!("Asset not found: {}", key))),
        }
    }
}
