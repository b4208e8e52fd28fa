mod client;
pub use client::{MuxClient, UploadedAsset, VideoHost, video_host_from_config};

mod embed;
pub use embed::{VideoEmbed, hosted_embed, resolve_embed};

use serde::Deserialize;

use crate::services::ServiceResult;

pub static ASSET_READY: &str = "video.asset.ready";
pub static SIGNATURE_HEADER: &str = "mux-signature";

/// Callback sent by the video host when an asset changes state.
#[derive(Debug, Deserialize)]
pub struct VideoEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: VideoEventData,
}

#[derive(Debug, Deserialize)]
pub struct VideoEventData {
    pub id: String,
}

impl VideoEvent {
    pub fn parse(payload: &[u8]) -> ServiceResult<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    pub fn is_asset_ready(&self) -> bool {
        self.event_type == ASSET_READY
    }
}
