use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub struct SessionAuthModifier;

impl Modify for SessionAuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "token",
                    "JWT token for current user",
                ))),
            );
            schema.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::routes::auth::auth_login_handler,
        crate::web::routes::auth::auth_magic_link_handler,
        crate::web::routes::auth::auth_verify_handler,
        crate::web::routes::auth::auth_logout_handler,
        crate::web::routes::auth::auth_me_handler,
        crate::web::routes::user::user_profile_handler,
        crate::web::routes::user::user_update_handler,
        crate::web::routes::user::user_password_handler,
        crate::web::routes::user::user_list_handler,
        crate::web::routes::modules::modules_list_handler,
        crate::web::routes::modules::modules_get_handler,
        crate::web::routes::modules::modules_create_handler,
        crate::web::routes::modules::modules_update_handler,
        crate::web::routes::modules::modules_delete_handler,
        crate::web::routes::modules::modules_publish_handler,
        crate::web::routes::modules::modules_reorder_handler,
        crate::web::routes::lessons::lessons_list_handler,
        crate::web::routes::lessons::lessons_get_handler,
        crate::web::routes::lessons::lessons_create_handler,
        crate::web::routes::lessons::lessons_update_handler,
        crate::web::routes::lessons::lessons_delete_handler,
        crate::web::routes::lessons::lessons_publish_handler,
        crate::web::routes::lessons::lessons_reorder_handler,
        crate::web::routes::videos::videos_upload_handler,
        crate::web::routes::videos::videos_delete_handler,
        crate::web::routes::videos::videos_webhook_handler,
        crate::web::routes::webhooks::webhooks_payments_handler,
    ),
    modifiers(&SessionAuthModifier),
    tags(
        (name = "auth", description = "Password and magic link sessions"),
        (name = "user", description = "Profile of the signed in user"),
        (name = "modules", description = "Course modules"),
        (name = "lessons", description = "Lessons inside modules"),
        (name = "videos", description = "Hosted video uploads"),
        (name = "webhooks", description = "Third party callbacks"),
    )
)]
pub struct ApiDoc;
