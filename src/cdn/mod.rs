//! Asset hosting collaborator
//!
//! Stores uploaded source images in S3-compatible storage and hands back a
//! durable public URL. Assets are addressed by an opaque key.

pub mod client;
pub mod mock;

pub use client::S3AssetHost;
pub use mock::MockAssetHost;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AssetHost: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
    async fn delete(&self, key: &str) -> Result<()>;
}
