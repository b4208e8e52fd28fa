use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    auth::{self, UserClaims, verify_password},
    model::{CrudRepository, ResourceType, entity::UserEntity},
    services::magic_link::send_magic_link,
    web::{
        AppState, AuthenticatedUser, JsonBody, QueryParams, RequestContext, WebError, WebResult,
        dto::{
            MessageResponse, email_address, required,
            auth::{LoginBody, MagicLinkBody, SessionResponse, VerifyQuery},
        },
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN, session_cookie},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/me", get(auth_me_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/login", post(auth_login_handler))
        .route("/magic-link", post(auth_magic_link_handler))
        .route("/verify", get(auth_verify_handler))
        .route("/logout", post(auth_logout_handler))
        .merge(protected)
        .with_state(state)
}

/// Signs a session for `user` and stores it in the cookie jar.
fn start_session(state: &AppState, cookies: &Cookies, user: UserEntity) -> WebResult<SessionResponse> {
    let days = state.config().app().session_days();
    let claims = UserClaims {
        sub: user.id().to_string(),
        role: user.role().to_string(),
        exp: (chrono::Utc::now() + Duration::days(days)).timestamp(),
    };

    let token = auth::generate_token(claims, state.config().app().jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    cookies.add(session_cookie(token.clone(), days));
    Ok(SessionResponse { token, user })
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    description = "Password login. Sets the session cookie",
    request_body = LoginBody,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
async fn auth_login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(payload): JsonBody<LoginBody>,
) -> WebResult<impl IntoResponse> {
    let email = required(payload.email, "Email").map_err(WebError::validation)?;
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| WebError::validation("Password is required"))?;

    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_email(state.pool(), &admin, &email)
        .await
        .map_err(WebError::database(ResourceType::User))?;

    let Some(found) = found.filter(|u| u.is_active()) else {
        return Err(WebError::auth_invalid_credentials());
    };

    // accounts created through checkout or magic links have no password
    let Some(hash) = found.hash() else {
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified = verify_password(hash, &password).map_err(WebError::server_crypt_error)?;
    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    let user = found
        .touch_login(state.pool(), &admin)
        .await
        .map_err(WebError::database(ResourceType::User))?;

    tracing::info!(user = %user.id(), "password login");
    Ok((StatusCode::OK, Json(start_session(&state, &cookies, user)?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/magic-link",
    description = "Mails a one-time login link, creating a student account for unknown emails",
    request_body = MagicLinkBody,
    responses(
        (status = 200, description = "Link sent", body = MessageResponse),
        (status = 400, description = "Email missing or invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
async fn auth_magic_link_handler(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<MagicLinkBody>,
) -> WebResult<impl IntoResponse> {
    let email = required(payload.email, "Email")
        .and_then(|e| email_address(&e))
        .map_err(WebError::validation)?;

    send_magic_link(state.pool(), state.mailer(), state.config().app(), &email)
        .await
        .map_err(WebError::server_service_error)?;

    Ok((StatusCode::OK, Json(MessageResponse::new("Magic link sent"))))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify",
    description = "Consumes a magic link token and signs the user in",
    params(VerifyQuery),
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 400, description = "Token missing", body = ErrorResponse),
        (status = 401, description = "Token unknown, used or expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
async fn auth_verify_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    QueryParams(query): QueryParams<VerifyQuery>,
) -> WebResult<impl IntoResponse> {
    let token = required(query.token, "Token").map_err(WebError::validation)?;

    let user = UserEntity::consume_magic_token(state.pool(), &AuthenticatedUser::admin(), &token)
        .await
        .map_err(WebError::database(ResourceType::User))?
        .ok_or_else(WebError::magic_link_invalid)?;

    tracing::info!(user = %user.id(), "magic link login");
    Ok((StatusCode::OK, Json(start_session(&state, &cookies, user)?)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    description = "Clears the session cookie",
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
    ),
    tag = "auth"
)]
async fn auth_logout_handler(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::from(AUTH_TOKEN);
    cookie.set_path("/");
    cookies.remove(cookie);
    (StatusCode::OK, Json(MessageResponse::new("Signed out")))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    description = "The signed in user",
    responses(
        (status = 200, description = "Current user", body = UserEntity),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []), ("bearer" = []))
)]
async fn auth_me_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = UserEntity::find_required(state.pool(), user, user.user_id())
        .await
        .map_err(WebError::database(ResourceType::User))?;

    Ok((StatusCode::OK, Json(found)))
}
