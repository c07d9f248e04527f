//! Playback identifier provisioning with the video host.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{WorkerError, WorkerResult};

/// Registers an uploaded video with a hosting service.
#[async_trait]
pub trait PlaybackProvisioner: Send + Sync {
    /// Return the host's playback id for the media at `media_url`.
    async fn provision(&self, media_url: &str, part_id: &str) -> WorkerResult<String>;
}

/// Endpoint settings for [`HttpPlaybackProvisioner`].
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    pub endpoint: Url,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl PlaybackConfig {
    /// Read `HILITE_PLAYBACK_URL` and `HILITE_PLAYBACK_TOKEN`.
    ///
    /// Returns `Ok(None)` when no endpoint is configured.
    pub fn from_env() -> WorkerResult<Option<Self>> {
        let Some(endpoint) = std::env::var("HILITE_PLAYBACK_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
        else {
            return Ok(None);
        };

        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| WorkerError::config_error(format!("HILITE_PLAYBACK_URL: {}", e)))?;

        Ok(Some(Self {
            endpoint,
            api_token: std::env::var("HILITE_PLAYBACK_TOKEN").ok(),
            timeout: Duration::from_secs(
                std::env::var("HILITE_PLAYBACK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProvisionRequest<'a> {
    url: &'a str,
    passthrough: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProvisionResponse {
    #[serde(rename = "playbackId", alias = "playback_id")]
    playback_id: String,
}

/// POSTs `{url, passthrough}` as JSON and reads `playbackId` from the reply.
pub struct HttpPlaybackProvisioner {
    client: reqwest::Client,
    config: PlaybackConfig,
}

impl HttpPlaybackProvisioner {
    pub fn new(config: PlaybackConfig) -> WorkerResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PlaybackProvisioner for HttpPlaybackProvisioner {
    async fn provision(&self, media_url: &str, part_id: &str) -> WorkerResult<String> {
        let mut request = self
            .client
            .post(self.config.endpoint.clone())
            .json(&ProvisionRequest {
                url: media_url,
                passthrough: part_id,
            });
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkerError::playback_failed(e.to_string()))?
            .error_for_status()
            .map_err(|e| WorkerError::playback_failed(e.to_string()))?;

        let body: ProvisionResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::playback_failed(e.to_string()))?;

        if body.playback_id.trim().is_empty() {
            return Err(WorkerError::playback_failed("host returned an empty playback id"));
        }

        debug!(part_id, playback_id = %body.playback_id, "Provisioned playback id");
        Ok(body.playback_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provisioner(server: &MockServer, token: Option<&str>) -> HttpPlaybackProvisioner {
        HttpPlaybackProvisioner::new(PlaybackConfig {
            endpoint: Url::parse(&format!("{}/assets", server.uri())).unwrap(),
            api_token: token.map(str::to_string),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_provision_returns_playback_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/assets"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"url": "https://cdn.test/p1.mp4", "passthrough": "p1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"playbackId": "pb_123"})))
            .mount(&server)
            .await;

        let id = provisioner(&server, Some("secret"))
            .provision("https://cdn.test/p1.mp4", "p1")
            .await
            .unwrap();
        assert_eq!(id, "pb_123");
    }

    #[tokio::test]
    async fn test_provision_accepts_snake_case() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"playback_id": "pb_9"})))
            .mount(&server)
            .await;

        let id = provisioner(&server, None).provision("u", "p").await.unwrap();
        assert_eq!(id, "pb_9");
    }

    #[tokio::test]
    async fn test_provision_failure_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = provisioner(&server, None).provision("u", "p").await.unwrap_err();
        assert!(matches!(err, WorkerError::PlaybackFailed(_)));
    }
}
