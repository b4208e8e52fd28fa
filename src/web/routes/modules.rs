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
        CrudRepository, ResourceType,
        entity::{Module, ModuleCreate, ModuleUpdate, ModuleWithLessonsRow},
    },
    web::{
        AppState, JsonBody, PathParam, QueryParams, RequestContext, WebError, WebResult,
        dto::{
            MessageResponse,
            modules::{
                ModuleBody, ModuleListQuery, ModulePublishResponse, ModuleReorderBody,
                ModuleWithLessons, PublishBody,
            },
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(modules_list_handler).post(modules_create_handler))
        .route("/reorder", put(modules_reorder_handler))
        .route(
            "/{id}",
            get(modules_get_handler)
                .put(modules_update_handler)
                .delete(modules_delete_handler),
        )
        .route("/{id}/publish", put(modules_publish_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/modules",
    description = "Course tree: modules in order with their lessons. Students only see published content",
    params(ModuleListQuery),
    responses(
        (status = 200, description = "Successfully collected modules", body = Vec<ModuleWithLessons>),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_list_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ModuleListQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let include_unpublished = query.include_unpublished && user.is_admin();

    let rows = ModuleWithLessonsRow::fetch_all(state.pool(), user, include_unpublished)
        .await
        .map_err(WebError::database(ResourceType::Module))?;
    let mut modules =
        ModuleWithLessons::from_rows(rows).map_err(WebError::database(ResourceType::Module))?;
    if !user.has_full_access() {
        modules = modules.into_iter().map(ModuleWithLessons::into_preview).collect();
    }

    Ok((StatusCode::OK, Json(modules)))
}

#[utoipa::path(
    get,
    path = "/api/v1/modules/{id}",
    description = "A module with its lessons",
    params(("id" = Uuid, Path, description = "ID of the module")),
    responses(
        (status = 200, description = "Module found", body = ModuleWithLessons),
        (status = 401, description = "You had to be authorized to do this", body = ErrorResponse),
        (status = 404, description = "Module not found or not published", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let row = ModuleWithLessonsRow::fetch_one(state.pool(), user, id, user.is_admin())
        .await
        .map_err(WebError::database(ResourceType::Module))?
        .ok_or_else(|| WebError::resource_not_found(ResourceType::Module))?;

    let mut module = ModuleWithLessons::try_from(row)
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Module, e.into()))?;
    if !user.has_full_access() {
        module = module.into_preview();
    }

    Ok((StatusCode::OK, Json(module)))
}

#[utoipa::path(
    post,
    path = "/api/v1/modules",
    description = "Creates an unpublished module at the end of the course",
    request_body = ModuleBody,
    responses(
        (status = 201, description = "Module created", body = Module),
        (status = 400, description = "Title missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_create_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ModuleBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let create = ModuleCreate::try_from(payload).map_err(WebError::validation)?;

    let created = Module::create(state.pool(), user, create)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    tracing::info!(module = %created.id(), "module created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/{id}",
    description = "Edits title, description and position of a module",
    params(("id" = Uuid, Path, description = "ID of the module")),
    request_body = ModuleBody,
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 400, description = "Title missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<ModuleBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let update = ModuleUpdate::try_from(payload).map_err(WebError::validation)?;

    let found = Module::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    let updated = found
        .update(state.pool(), user, update)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/modules/{id}",
    description = "Deletes a module together with its lessons",
    params(("id" = Uuid, Path, description = "ID of the module")),
    responses(
        (status = 200, description = "Module deleted", body = MessageResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_delete_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let found = Module::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    found
        .delete(state.pool(), user)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    tracing::info!(module = %id, "module deleted");
    Ok((StatusCode::OK, Json(MessageResponse::new("Module deleted successfully"))))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/{id}/publish",
    description = "Publishes or unpublishes a module. Every lesson of the module follows",
    params(("id" = Uuid, Path, description = "ID of the module")),
    request_body = PublishBody,
    responses(
        (status = 200, description = "Publish state changed", body = ModulePublishResponse),
        (status = 400, description = "`published` missing", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_publish_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    PathParam(id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<PublishBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let published = payload
        .published
        .ok_or_else(|| WebError::validation("published flag is required"))?;

    let found = Module::find_required(state.pool(), user, id)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    let updated = found
        .set_published(state.pool(), user, published)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    Ok((StatusCode::OK, Json(ModulePublishResponse::new(updated))))
}

#[utoipa::path(
    put,
    path = "/api/v1/modules/reorder",
    description = "Applies a new module order, optionally moving lessons between modules. All or nothing",
    request_body = ModuleReorderBody,
    responses(
        (status = 200, description = "Order saved", body = MessageResponse),
        (status = 400, description = "Malformed or conflicting order", body = ErrorResponse),
        (status = 401, description = "Administrator access required", body = ErrorResponse),
        (status = 404, description = "A module or lesson does not exist", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    ),
    tag = "modules",
    security(("cookie" = []), ("bearer" = []))
)]
async fn modules_reorder_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ModuleReorderBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let modules = payload
        .modules
        .ok_or_else(|| WebError::validation("modules array is required"))?;

    Module::reorder(state.pool(), user, &modules)
        .await
        .map_err(WebError::database(ResourceType::Module))?;

    Ok((StatusCode::OK, Json(MessageResponse::new("Modules reordered successfully"))))
}
