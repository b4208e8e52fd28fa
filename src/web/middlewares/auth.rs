use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};

use crate::{
    auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "token";

/// Session cookie holding the signed JWT.
pub fn session_cookie(token: String, days: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_max_age(Duration::days(days));
    cookie
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Resolves the caller from the session cookie or a bearer header. Invalid,
/// expired or orphaned tokens leave the request anonymous.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = cookies
        .get(AUTH_TOKEN)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(&req));

    let Some(token) = token else {
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let claims = match auth::process_token(&token, state.config().app().jwt()) {
        Ok(claims) => claims.claims,
        Err(e) => {
            tracing::debug!("rejected session token: {}", e);
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let Ok(id) = claims.sub.parse::<uuid::Uuid>() else {
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let user = found
        .filter(|u| u.is_active())
        .map(|u| AuthenticatedUser::new(u.id(), u.role()).with_paid(u.has_paid()));

    req.extensions_mut().insert(RequestContext::new(user));
    Ok(next.run(req).await)
}
