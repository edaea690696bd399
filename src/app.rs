//! Application wiring: builds the collaborators from [`Config`] and serves
//! the HTTP router.

use crate::auth::MemorySessionStore;
use crate::cdn::{AssetHost, MockAssetHost, S3AssetHost};
use crate::edit::EditOrchestrator;
use crate::fetch::HttpAssetFetcher;
use crate::gallery::MemoryGalleryStore;
use crate::models::Config;
use crate::provider::StabilityClient;
use crate::server::{self, AppState};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub struct App {
    state: AppState,
    bind_addr: String,
}

impl App {
    /// Build an app from concrete collaborators.
    ///
    /// Integration tests and local harnesses use this to inject mocks.
    pub fn with_state(state: AppState, bind_addr: String) -> Self {
        Self { state, bind_addr }
    }

    /// Construct an app from configuration (see [`Config::from_env`]).
    pub async fn new(config: Config) -> Result<Self> {
        // One connection pool for the source-image fetches and provider calls.
        let http_client = reqwest::Client::new();

        let provider = StabilityClient::new_with_client(
            config.stability_api_key.clone(),
            config.provider_timeout,
            http_client.clone(),
        )
        .with_base_url(config.stability_base_url.clone());
        let fetcher = HttpAssetFetcher::new_with_client(http_client, config.provider_timeout);

        info!(
            "Edit provider: {} (generation {})",
            config.stability_base_url, config.generation
        );
        let editor =
            EditOrchestrator::new(config.generation, Arc::new(fetcher), Arc::new(provider));

        let assets: Arc<dyn AssetHost> = if config.dry_run {
            info!("DRY_RUN enabled, uploads are kept in memory");
            Arc::new(MockAssetHost::new().with_base_url(config.asset_base_url.clone()))
        } else {
            let missing = || Error::Config("asset hosting credentials not set".to_string());
            Arc::new(
                S3AssetHost::new(
                    config.asset_access_key_id.clone().ok_or_else(missing)?,
                    config.asset_secret_access_key.clone().ok_or_else(missing)?,
                    config.asset_endpoint.clone(),
                    config.asset_bucket.clone(),
                    config.asset_base_url.clone(),
                )
                .await?,
            )
        };

        if config.sessions.is_empty() {
            info!("No SESSION_TOKENS configured, authenticated routes will answer 401");
        }

        let state = AppState {
            editor: Arc::new(editor),
            sessions: Arc::new(MemorySessionStore::from_sessions(config.sessions.clone())),
            gallery: Arc::new(MemoryGalleryStore::new()),
            assets,
        };

        Ok(Self::with_state(state, config.bind_addr))
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn router(&self) -> axum::Router {
        server::router(self.state.clone())
    }

    /// Bind and serve until the process is stopped.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
