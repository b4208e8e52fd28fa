use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceType, check_full_access, check_visible,
        entity::{Lesson, LessonCreate, LessonUpdate, Module},
    },
    web::{
        AppState, JsonBody, PathParam, QueryParams, RequestContext, WebError, WebResult,
        dto::{
            MessageResponse,
            lessons::{
                LessonCreateBody, LessonListQuery, LessonReorderBody, LessonResponse,
                LessonUpdateBody,
            },
            modules::PublishBody,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(lessons_list_handler).post(lessons_create_handler))
        .route("/reorder", put(lessons_reorder_handler))
        .route(
            "/{id}",
            get(lessons_get_handler)
                .put(lessons_update_handler)
                .delete(lessons_delete_handler),
        )
        .route("/{id}/publish", put(lessons_publish_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons",
    description = "Lessons of a module in order. Students who have not paid get an outline without content or video",
    params(LessonListQuery),
    responses(
        (status = 200, description = "Lessons of the module", body = Vec<LessonResponse>),
        (status = 400, description = "`module_id` missing", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "Module not found or not published", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LessonListQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let module_id = query
        .module_id
        .ok_or_else(|| WebError::validation("Module ID is required"))?;

    let module = Module::find_required(state.pool(), user, module_id)
        .await
        .map_err(WebError::database(ResourceType::Module))?;
    check_visible(state.pool(), user, &module)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    let full_access = user.has_full_access();
    let lessons: Vec<LessonResponse> =
        Lesson::all_by_module(state.pool(), user, module_id, user.is_admin())
            .await
            .map_err(WebError::database(ResourceType::Lesson))?
            .into_iter()
            .map(|l| if full_access { l } else { l.into_preview() })
            .map(LessonResponse::from)
            .collect();

    Ok((StatusCode::OK, Json(lessons)))
}

#[utoipa::path(
    get,
    path = "/api/v1/lessons/{id}",
    description = "Full lesson including its content and a playable video embed",
    params(("id" = Uuid, Path, description = "ID of the lesson")),
    responses(
        (status = 200, description = "Lesson found", body = LessonResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Course not purchased", body = ErrorResponse),
        (status = 404, description = "Lesson not found or not published", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let lesson = Lesson::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;
    check_visible(state.pool(), user, &lesson)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;
    check_full_access(user).map_err(WebError::database(ResourceType::Lesson))?;

    Ok((StatusCode::OK, Json(LessonResponse::from(lesson))))
}

#[utoipa::path(
    post,
    path = "/api/v1/lessons",
    description = "Creates an unpublished lesson at the end of its module",
    request_body = LessonCreateBody,
    responses(
        (status = 201, description = "Lesson created", body = LessonResponse),
        (status = 400, description = "Title or module missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LessonCreateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let create = LessonCreate::try_from(payload).map_err(WebError::validation)?;

    let created = Lesson::create(state.pool(), user, create)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    tracing::info!(lesson = %created.id(), module = %created.module_id(), "lesson created");
    Ok((StatusCode::CREATED, Json(LessonResponse::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{id}",
    description = "Partial update. Omitted fields keep their value, empty strings clear optional text",
    params(("id" = Uuid, Path, description = "ID of the lesson")),
    request_body = LessonUpdateBody,
    responses(
        (status = 200, description = "Lesson updated", body = LessonResponse),
        (status = 400, description = "Invalid field", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<LessonUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let update = LessonUpdate::try_from(payload).map_err(WebError::validation)?;

    let found = Lesson::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    let updated = found
        .update(state.pool(), user, update)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    Ok((StatusCode::OK, Json(LessonResponse::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/lessons/{id}",
    params(("id" = Uuid, Path, description = "ID of the lesson")),
    responses(
        (status = 200, description = "Lesson deleted", body = MessageResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = Lesson::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    Ok((StatusCode::OK, Json(MessageResponse::new("Lesson deleted successfully"))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/{id}/publish",
    description = "Publishes or unpublishes a single lesson. Publishing needs a published module",
    params(("id" = Uuid, Path, description = "ID of the lesson")),
    request_body = PublishBody,
    responses(
        (status = 200, description = "Publish state changed", body = LessonResponse),
        (status = 400, description = "Module is unpublished or flag missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_publish_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<PublishBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let published = payload
        .published
        .ok_or_else(|| WebError::validation("published flag is required"))?;

    let found = Lesson::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    let updated = found
        .set_published(state.pool(), user, published)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    Ok((StatusCode::OK, Json(LessonResponse::from(updated))))
}

#[utoipa::path(
    put,
    path = "/api/v1/lessons/reorder",
    description = "Applies a new lesson order. All or nothing",
    request_body = LessonReorderBody,
    responses(
        (status = 200, description = "Order saved", body = MessageResponse),
        (status = 400, description = "Malformed or conflicting order", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "A lesson does not exist", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "lessons",
    security(("cookie" = []), ("bearer" = []))
)]
async fn lessons_reorder_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LessonReorderBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let lessons = payload
        .lessons
        .ok_or_else(|| WebError::validation("lessons array is required"))?;

    Lesson::reorder(state.pool(), user, &lessons)
        .await
        .map_err(WebError::database(ResourceType::Lesson))?;

    Ok((StatusCode::OK, Json(MessageResponse::new("Lessons reordered successfully"))))
}
