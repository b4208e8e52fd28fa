use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Config,
    services::{ServiceError, ServiceResult},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadedAsset {
    pub asset_id: String,
    pub playback_id: Option<String>,
}

/// Remote video hosting. Implemented by the Mux client in production and by
/// fakes in tests.
#[async_trait]
pub trait VideoHost: Send + Sync + std::fmt::Debug {
    /// Asks the host to ingest `input_url` with public playback.
    async fn create_asset(&self, input_url: &str) -> ServiceResult<UploadedAsset>;

    async fn delete_asset(&self, asset_id: &str) -> ServiceResult<()>;
}

#[derive(Debug, Clone)]
pub struct MuxClient {
    http: reqwest::Client,
    api_base: String,
    token_id: String,
    token_secret: String,
}

#[derive(Debug, Deserialize)]
struct AssetEnvelope {
    data: AssetData,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    id: String,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
}

#[derive(Debug, Deserialize)]
struct PlaybackId {
    id: String,
}

impl MuxClient {
    pub fn new(config: &crate::config::Video) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base().to_string(),
            token_id: config.token_id().to_string(),
            token_secret: config.token_secret().to_string(),
        }
    }

    fn assets_url(&self) -> String {
        format!("{}/video/v1/assets", self.api_base)
    }

    async fn check(resp: reqwest::Response) -> ServiceResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(ServiceError::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl VideoHost for MuxClient {
    #[tracing::instrument(skip(self))]
    async fn create_asset(&self, input_url: &str) -> ServiceResult<UploadedAsset> {
        let resp = self
            .http
            .post(self.assets_url())
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&json!({
                "input": input_url,
                "playback_policy": ["public"],
            }))
            .send()
            .await?;

        let envelope: AssetEnvelope = Self::check(resp).await?.json().await?;
        Ok(UploadedAsset {
            asset_id: envelope.data.id,
            playback_id: envelope.data.playback_ids.into_iter().next().map(|p| p.id),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn delete_asset(&self, asset_id: &str) -> ServiceResult<()> {
        let resp = self
            .http
            .delete(format!("{}/{}", self.assets_url(), asset_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }
}

pub fn video_host_from_config(config: &Config) -> Option<Arc<dyn VideoHost>> {
    match config.video() {
        Some(video) => Some(Arc::new(MuxClient::new(video))),
        None => {
            tracing::warn!("no [video] section in config, video uploads are disabled");
            None
        }
    }
}
