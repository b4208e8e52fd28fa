use serde::{Deserialize, Serialize};

use crate::model::entity::UserEntity;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct MagicLinkBody {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

/// Issued session. The same JWT is also set as the `token` cookie.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserEntity,
}
