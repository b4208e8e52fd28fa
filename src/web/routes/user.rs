use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};

use crate::{
    auth::{hash_password, verify_password},
    model::{
        CrudRepository, PaginatableRepository, ResourceType,
        entity::{UserEntity, UserEntityUpdate},
    },
    web::{
        AppState, JsonBody, QueryParams, RequestContext, WebError, WebResult,
        dto::{
            MessageResponse,
            users::{MIN_PASSWORD_LEN, PasswordChangeBody, ProfileUpdateBody},
        },
        error::ErrorResponse,
        middlewares,
        routes::PaginationQuery,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(user_profile_handler).put(user_update_handler))
        .route("/password", put(user_password_handler))
        .route("/page", get(user_list_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/user",
    description = "Profile of the signed in user",
    responses(
        (status = 200, description = "Profile", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "user",
    security(("cookie" = []), ("bearer" = []))
)]
async fn user_profile_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_required(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::database(ResourceType::User))?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    put,
    path = "/api/v1/user",
    description = "Updates name, email or billing address. Blank values keep the stored ones",
    request_body = ProfileUpdateBody,
    responses(
        (status = 200, description = "Profile updated", body = UserEntity),
        (status = 400, description = "Malformed body or invalid email", body = ErrorResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "user",
    security(("cookie" = []), ("bearer" = []))
)]
async fn user_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ProfileUpdateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let update = UserEntityUpdate::try_from(payload).map_err(WebError::validation)?;

    if let Some(email) = &update.email {
        let taken = UserEntity::find_by_email(state.pool(), user, email)
            .await
            .map_err(WebError::database(ResourceType::User))?
            .is_some_and(|other| other.id() != user.user_id());

        if taken {
            return Err(WebError::registration_conflict());
        }
    }

    let found = UserEntity::find_required(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::database(ResourceType::User))?;

    let updated = found
        .update(state.pool(), user, update)
        .await
        .map_err(WebError::database(ResourceType::User))?;

    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/password",
    description = "Changes the password. Accounts without a password may set one without `current_password`",
    request_body = PasswordChangeBody,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Missing or too short password", body = ErrorResponse),
        (status = 401, description = "Not signed in or current password wrong", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "user",
    security(("cookie" = []), ("bearer" = []))
)]
async fn user_password_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<PasswordChangeBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let new_password = payload
        .new_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| WebError::validation("New password is required"))?;

    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(WebError::validation(format!(
            "New password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let found = UserEntity::find_required(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::database(ResourceType::User))?;

    if let Some(hash) = found.hash() {
        let current = payload
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| WebError::validation("Current password is required"))?;

        let is_verified = verify_password(hash, &current).map_err(WebError::server_crypt_error)?;
        if !is_verified {
            return Err(WebError::auth_invalid_credentials());
        }
    }

    let hash = hash_password(&new_password).map_err(WebError::server_crypt_error)?;
    found
        .set_password(state.pool(), user, hash)
        .await
        .map_err(WebError::database(ResourceType::User))?;

    tracing::info!(user = %user.user_id(), "password changed");
    Ok((StatusCode::OK, Json(MessageResponse::new("Password updated successfully"))))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/page",
    description = "Paginated list of all users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Returns requested page", body = crate::model::Page<UserEntity>),
        (status = 401, description = "You're not an admin to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "user",
    security(("cookie" = []), ("bearer" = []))
)]
async fn user_list_handler(
    ctx: RequestContext,
    QueryParams(page): QueryParams<PaginationQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;

    let users = UserEntity::page(state.pool(), user, page.limit, page.offset)
        .await
        .map_err(WebError::database(ResourceType::User))?;

    Ok((StatusCode::OK, Json(users)))
}
