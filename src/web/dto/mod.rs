pub mod auth;
pub mod lessons;
pub mod modules;
pub mod users;
pub mod videos;

use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Acknowledgement returned to webhook senders.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReceivedResponse {
    pub received: bool,
}

/// Trims a required text field, failing with `what is required` when blank.
pub fn required(value: Option<String>, what: &str) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("{what} is required"))
}

/// Lowercases an email address and rejects anything the mailer could not
/// deliver to.
pub fn email_address(value: &str) -> Result<String, String> {
    let email = value.trim().to_lowercase();
    email
        .parse::<lettre::Address>()
        .map(|_| email)
        .map_err(|_| String::from("Email is invalid"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn email_address_is_normalized_and_checked() {
        assert_eq!(email_address(" Ada@Example.COM ").unwrap(), "ada@example.com");
        assert_eq!(email_address("not-an-email").unwrap_err(), "Email is invalid");
        assert!(email_address("two@at@example.com").is_err());
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required(Some(String::from("  Intro ")), "Title").unwrap(), "Intro");
        assert_eq!(
            required(Some(String::from("   ")), "Title").unwrap_err(),
            "Title is required"
        );
        assert!(required(None, "Title").is_err());
    }
}
