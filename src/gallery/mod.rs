//! Gallery persistence collaborator
//!
//! Stores the edited images a user chose to keep.

pub mod memory;

pub use memory::MemoryGalleryStore;

use crate::models::ImageRecord;
use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn create_image_record(
        &self,
        image_url: &str,
        feature_type: &str,
        user_id: &str,
    ) -> Result<ImageRecord>;

    /// Records owned by `user_id`, newest first.
    async fn list_image_records(&self, user_id: &str) -> Result<Vec<ImageRecord>>;

    async fn get_image_record(&self, id: Uuid) -> Result<Option<ImageRecord>>;

    async fn delete_image_record(&self, id: Uuid) -> Result<()>;
}
