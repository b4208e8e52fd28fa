use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct VideoUploadBody {
    /// Publicly reachable source file the host should ingest.
    pub video_url: Option<String>,
    /// Lesson that should play the uploaded video.
    pub lesson_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct VideoDeleteQuery {
    pub asset_id: Option<String>,
}
