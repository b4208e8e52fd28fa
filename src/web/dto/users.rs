use serde::Deserialize;

use crate::model::entity::{BillingAddress, UserEntityUpdate};

use super::email_address;

pub static MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ProfileUpdateBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub billing: Option<BillingAddress>,
}

impl TryFrom<ProfileUpdateBody> for UserEntityUpdate {
    type Error = String;

    /// Blank strings keep the stored value.
    fn try_from(body: ProfileUpdateBody) -> Result<Self, Self::Error> {
        let keep_blank = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        Ok(Self {
            name: keep_blank(body.name),
            email: keep_blank(body.email)
                .map(|e| email_address(&e))
                .transpose()?,
            billing: body.billing,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PasswordChangeBody {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}
