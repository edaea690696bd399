use super::AssetFetcher;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub struct HttpAssetFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpAssetFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self::new_with_client(Client::new(), timeout)
    }

    pub fn new_with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(uri)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch source image: {}", e);
                Error::AssetFetch {
                    status: e.status().map(|s| s.as_u16()),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Source image fetch returned status {}", status);
            return Err(Error::AssetFetch {
                status: Some(status.as_u16()),
                reason: format!("upstream returned {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| Error::AssetFetch {
            status: Some(status.as_u16()),
            reason: format!("failed reading body: {}", e),
        })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> HttpAssetFetcher {
        HttpAssetFetcher::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_fetch_returns_body_bytes() {
        let server = MockServer::start().await;
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A];

        Mock::given(method("GET"))
            .and(path("/cat.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = fetcher()
            .fetch(&format!("{}/cat.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(bytes, png);
    }

    #[tokio::test]
    async fn test_fetch_non_success_carries_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&format!("{}/missing.png", server.uri()))
            .await
            .unwrap_err();

        match err {
            Error::AssetFetch { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = fetcher()
            .fetch(&format!("http://127.0.0.1:{}/image.png", port))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AssetFetch { status: None, .. }));
    }
}
