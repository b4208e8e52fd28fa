use chrono::{Duration, Utc};

use crate::{
    auth::generate_magic_token,
    config::App,
    model::{ModelManager, entity::UserEntity},
    services::{
        ServiceResult,
        mail::{Mailer, magic_link_message},
    },
    web::AuthenticatedUser,
};

pub fn magic_link_url(public_url: &str, token: &str) -> String {
    format!("{}/auth/verify?token={}", public_url.trim_end_matches('/'), token)
}

/// Stores a fresh one-shot token for `email` (creating the student when
/// needed) and mails the login link.
#[tracing::instrument(skip(mm, mailer, app))]
pub async fn send_magic_link(
    mm: &ModelManager,
    mailer: &dyn Mailer,
    app: &App,
    email: &str,
) -> ServiceResult<UserEntity> {
    let token = generate_magic_token();
    let expiry = Utc::now() + Duration::hours(app.magic_link_hours());

    let user =
        UserEntity::issue_magic_token(mm, &AuthenticatedUser::admin(), email, &token, expiry)
            .await?;

    let link = magic_link_url(app.public_url(), &token);
    mailer
        .send(magic_link_message(user.email(), &link, app.magic_link_hours()))
        .await?;

    tracing::info!(user = %user.id(), "magic link issued");
    Ok(user)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn link_points_at_verify_page() {
        assert_eq!(
            magic_link_url("https://course.example.com/", "abc"),
            "https://course.example.com/auth/verify?token=abc"
        );
    }
}
