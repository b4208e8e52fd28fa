use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
};

use crate::{
    model::{CrudRepository, ResourceType, entity::Lesson},
    services::{
        signature,
        video::{self, UploadedAsset, VideoEvent},
    },
    web::{
        AppState, AuthenticatedUser, JsonBody, QueryParams, RequestContext, WebError, WebResult,
        dto::{
            MessageResponse, ReceivedResponse, required,
            videos::{VideoDeleteQuery, VideoUploadBody},
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route(
            "/upload",
            post(videos_upload_handler).delete(videos_delete_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/webhook", post(videos_webhook_handler))
        .merge(protected)
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/upload",
    description = "Asks the video host to ingest a file. With `lesson_id` the lesson starts tracking the asset",
    request_body = VideoUploadBody,
    responses(
        (status = 200, description = "Asset created", body = UploadedAsset),
        (status = 400, description = "`video_url` missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Video host not configured or failing", body = ErrorResponse),
    ),
    tag = "videos",
    security(("cookie" = []), ("bearer" = []))
)]
async fn videos_upload_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<VideoUploadBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let video_url = required(payload.video_url, "Video URL").map_err(WebError::validation)?;

    let lesson = match payload.lesson_id {
        Some(id) => Some(
            Lesson::find_required(state.pool(), user, id)
                .await
                .map_err(WebError::database(ResourceType::Lesson))?,
        ),
        None => None,
    };

    let host = state.video_host().map_err(WebError::server_service_error)?;
    let asset = host
        .create_asset(&video_url)
        .await
        .map_err(WebError::server_service_error)?;

    if let Some(lesson) = lesson {
        lesson
            .attach_video(state.pool(), user, &asset.asset_id, asset.playback_id.as_deref())
            .await
            .map_err(WebError::database(ResourceType::Lesson))?;
    }

    tracing::info!(asset = %asset.asset_id, "video asset created");
    Ok((StatusCode::OK, Json(asset)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/upload",
    description = "Deletes an asset from the video host",
    params(VideoDeleteQuery),
    responses(
        (status = 200, description = "Asset deleted", body = MessageResponse),
        (status = 400, description = "`asset_id` missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 500, description = "Video host not configured or failing", body = ErrorResponse),
    ),
    tag = "videos",
    security(("cookie" = []), ("bearer" = []))
)]
async fn videos_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<VideoDeleteQuery>,
) -> WebResult<impl IntoResponse> {
    ctx.admin_user()?;
    let asset_id = required(query.asset_id, "Asset ID").map_err(WebError::validation)?;

    let host = state.video_host().map_err(WebError::server_service_error)?;
    host.delete_asset(&asset_id)
        .await
        .map_err(WebError::server_service_error)?;

    tracing::info!(asset = %asset_id, "video asset deleted");
    Ok((StatusCode::OK, Json(MessageResponse::new("Video deleted successfully"))))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos/webhook",
    request_body(content = String, content_type = "application/json"),
    description = "Asset state callbacks from the video host",
    responses(
        (status = 200, description = "Event accepted", body = ReceivedResponse),
        (status = 400, description = "Bad signature or payload", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "videos"
)]
async fn videos_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<impl IntoResponse> {
    if let Some(secret) = state.config().video().and_then(|v| v.webhook_secret()) {
        let header = headers
            .get(video::SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| WebError::validation("signature header is missing"))?;

        signature::verify(
            header,
            &body,
            secret,
            state.config().payments().tolerance_secs(),
            chrono::Utc::now(),
        )
        .map_err(WebError::invalid_signature)?;
    }

    let event = VideoEvent::parse(&body).map_err(|e| WebError::malformed_body(e.to_string()))?;

    if event.is_asset_ready() {
        let updated =
            Lesson::mark_video_ready(state.pool(), &AuthenticatedUser::admin(), &event.data.id)
                .await
                .map_err(WebError::database(ResourceType::Video))?;

        tracing::info!(asset = %event.data.id, lessons = updated, "video asset ready");
    } else {
        tracing::debug!(event = %event.event_type, "ignoring video event");
    }

    Ok((StatusCode::OK, Json(ReceivedResponse { received: true })))
}
