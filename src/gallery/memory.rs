use super::GalleryStore;
use crate::models::ImageRecord;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryGalleryStore {
    records: Arc<Mutex<Vec<ImageRecord>>>,
}

impl MemoryGalleryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GalleryStore for MemoryGalleryStore {
    async fn create_image_record(
        &self,
        image_url: &str,
        feature_type: &str,
        user_id: &str,
    ) -> Result<ImageRecord> {
        let record = ImageRecord {
            id: Uuid::new_v4(),
            image_url: image_url.to_string(),
            feature_type: feature_type.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn list_image_records(&self, user_id: &str) -> Result<Vec<ImageRecord>> {
        let records = self.records.lock().unwrap();
        // Insertion order breaks ties between identical timestamps
        let mut owned: Vec<ImageRecord> = records
            .iter()
            .rev()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get_image_record(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn delete_image_record(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(Error::NotFound(format!("Image {} not found", id)));
        }
        Ok(())
    }
}
