//! Remote asset fetching
//!
//! Retrieves the source image an edit is applied to. One attempt per call;
//! failures surface as [`crate::Error::AssetFetch`].

pub mod client;
pub mod mock;

pub use client::HttpAssetFetcher;
pub use mock::MockAssetFetcher;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}
