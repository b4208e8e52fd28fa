use crate::impl_paginatable_for;
use crate::model::repo::ResourceTyped;
use crate::web::AuthenticatedUser;
use crate::web::UserRole;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct BillingAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct UserEntity {
    id: Uuid,
    email: String,
    name: Option<String>,
    #[serde(skip)]
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    has_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<BillingAddress>)]
    billing: Option<Json<BillingAddress>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UserEntityCreate {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: String,
}

/// Profile edit. `None` keeps the stored value.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserEntityUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub billing: Option<BillingAddress>,
}

impl ResourceTyped for UserEntity {
    fn get_resource_type() -> crate::model::repo::ResourceType {
        crate::model::repo::ResourceType::User
    }
}

impl UserEntity {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn has_paid(&self) -> bool {
        self.has_paid
    }

    pub fn billing(&self) -> Option<&BillingAddress> {
        self.billing.as_ref().map(|b| &b.0)
    }

    pub fn last_login_at(&self) -> Option<&DateTime<Utc>> {
        self.last_login_at.as_ref()
    }
}

#[async_trait]
impl CrudRepository<UserEntity, UserEntityCreate, UserEntityUpdate, Uuid> for UserEntity {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            "INSERT INTO users (id, email, name, password_hash, role) VALUES ($1,$2,$3,$4,$5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.email.trim().to_lowercase())
        .bind(&data.name)
        .bind(&data.password_hash)
        .bind(&data.role)
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: UserEntityUpdate,
    ) -> DatabaseResult<Self> {
        let email = data.email.map(|e| e.trim().to_lowercase());
        let updated = sqlx::query_as(
            r#"
            UPDATE users SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                billing = COALESCE($3, billing),
                updated_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(email)
        .bind(data.billing.map(Json))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;

        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as("SELECT * FROM users ORDER BY created_at LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl_paginatable_for!(UserEntity, UserEntityCreate, UserEntityUpdate, Uuid);

impl UserEntity {
    pub async fn find_by_email(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// Stores a fresh magic token on the user with this email, creating a
    /// student account when none exists yet.
    pub async fn issue_magic_token(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
        token: &str,
        expiry: DateTime<Utc>,
    ) -> DatabaseResult<Self> {
        let user = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, role, magic_token, token_expiry)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET
                magic_token = EXCLUDED.magic_token,
                token_expiry = EXCLUDED.token_expiry,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(UserRole::Student.to_string())
        .bind(token)
        .bind(expiry)
        .fetch_one(mm.executor())
        .await?;

        Ok(user)
    }

    /// Single use: the token is cleared in the same statement that matches it.
    pub async fn consume_magic_token(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        token: &str,
    ) -> DatabaseResult<Option<Self>> {
        let user = sqlx::query_as(
            r#"
            UPDATE users SET
                magic_token = NULL,
                token_expiry = NULL,
                last_login_at = now(),
                updated_at = now()
            WHERE magic_token = $1
              AND token_expiry > now()
              AND is_active
            RETURNING *
            "#,
        )
        .bind(token)
        .fetch_optional(mm.executor())
        .await?;

        Ok(user)
    }

    /// Records a completed purchase for `email`, creating the student if the
    /// checkout came from someone without an account.
    pub async fn mark_paid(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
    ) -> DatabaseResult<Self> {
        let user = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, role, has_paid, paid_at)
            VALUES ($1, $2, $3, TRUE, now())
            ON CONFLICT (email) DO UPDATE SET
                has_paid = TRUE,
                paid_at = COALESCE(users.paid_at, now()),
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(UserRole::Student.to_string())
        .fetch_one(mm.executor())
        .await?;

        Ok(user)
    }

    /// Creates the admin account or promotes an existing user to admin.
    pub async fn upsert_admin(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        email: &str,
        password_hash: &str,
    ) -> DatabaseResult<Self> {
        let user = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .bind(UserRole::Admin.to_string())
        .fetch_one(mm.executor())
        .await?;

        Ok(user)
    }

    pub async fn set_password(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        password_hash: String,
    ) -> DatabaseResult<Self> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(&password_hash)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.password_hash = Some(password_hash);
        Ok(self)
    }

    pub async fn touch_login(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self> {
        let now = Utc::now();
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2")
            .bind(now)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        self.last_login_at = Some(now);
        Ok(self)
    }
}
