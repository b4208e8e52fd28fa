use axum::Router;
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{AppState, doc::ApiDoc};

pub mod auth;
pub mod lessons;
pub mod modules;
pub mod user;
pub mod videos;
pub mod webhooks;

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    20
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState) -> Router<S> {
    let docs = state.config().app().docs();

    let mut router = Router::new()
        .nest("/api/v1/auth", auth::routes(state.clone()))
        .nest("/api/v1/user", user::routes(state.clone()))
        .nest("/api/v1/modules", modules::routes(state.clone()))
        .nest("/api/v1/lessons", lessons::routes(state.clone()))
        .nest("/api/v1/videos", videos::routes(state.clone()))
        .nest("/api/v1/webhooks", webhooks::routes(state.clone()))
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if docs {
        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));
    }

    router
}
