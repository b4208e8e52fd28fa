use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};

use crate::{
    model::{ResourceType, entity::UserEntity},
    services::{magic_link::send_magic_link, payments, signature},
    web::{
        AppState, AuthenticatedUser, WebError, WebResult, dto::ReceivedResponse,
        error::ErrorResponse,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/payments", post(webhooks_payments_handler))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payments",
    request_body(content = String, content_type = "application/json"),
    description = "Checkout callbacks from the payment provider. A completed checkout marks the buyer as paid and mails a login link",
    responses(
        (status = 200, description = "Event accepted", body = ReceivedResponse),
        (status = 400, description = "Missing or invalid signature, malformed payload", body = ErrorResponse),
        (status = 500, description = "Event could not be processed", body = ErrorResponse),
    ),
    tag = "webhooks"
)]
async fn webhooks_payments_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebResult<impl IntoResponse> {
    let header = headers
        .get(payments::SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| WebError::validation("signature header is missing"))?;

    let config = state.config().payments();
    signature::verify(
        header,
        &body,
        config.webhook_secret(),
        config.tolerance_secs(),
        chrono::Utc::now(),
    )
    .map_err(WebError::invalid_signature)?;

    let event =
        payments::PaymentEvent::parse(&body).map_err(|e| WebError::malformed_body(e.to_string()))?;

    if !event.is_checkout_completed() {
        tracing::info!(event = %event.event_type, "unhandled payment event");
        return Ok((StatusCode::OK, Json(ReceivedResponse { received: true })));
    }

    let email = event
        .customer_email()
        .map_err(WebError::server_service_error)?;

    let user = UserEntity::mark_paid(state.pool(), &AuthenticatedUser::admin(), &email)
        .await
        .map_err(WebError::database(ResourceType::Payment))?;

    send_magic_link(state.pool(), state.mailer(), state.config().app(), user.email())
        .await
        .map_err(WebError::server_service_error)?;

    tracing::info!(user = %user.id(), event = ?event.id, "checkout completed");
    Ok((StatusCode::OK, Json(ReceivedResponse { received: true })))
}
