use crate::model::access::Publishable;
use crate::model::entity::ordering::{ModuleOrder, validate_module_orders};
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Module {
    id: Uuid,
    title: String,
    description: String,
    order_index: i32,
    published: bool,
    last_published_at: Option<DateTime<Utc>>,
    last_modified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleCreate {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ModuleUpdate {
    pub title: String,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}

impl ResourceTyped for Module {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Module
    }
}

impl Module {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn published(&self) -> bool {
        self.published
    }

    pub fn last_published_at(&self) -> Option<&DateTime<Utc>> {
        self.last_published_at.as_ref()
    }

    pub fn last_modified_at(&self) -> Option<&DateTime<Utc>> {
        self.last_modified_at.as_ref()
    }
}

#[async_trait]
impl CrudRepository<Module, ModuleCreate, ModuleUpdate, Uuid> for Module {
    /// New modules are appended after the last one and start unpublished.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO modules (id, title, description, order_index, published)
            SELECT $1, $2, $3, COALESCE(MAX(order_index), 0) + 1, FALSE FROM modules
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.title.trim())
        .bind(data.description.as_deref().map(str::trim).unwrap_or_default())
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ModuleUpdate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE modules SET
                title = $1,
                description = COALESCE($2, description),
                order_index = COALESCE($3, order_index),
                last_modified_at = now(),
                updated_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(data.title.trim())
        .bind(data.description.as_deref().map(str::trim))
        .bind(data.order_index)
        .bind(self.id)
        .fetch_optional(mm.executor())
        .await?;

        updated.ok_or(DatabaseError::NotFound)
    }

    /// Removes the lessons first, then the module, in one transaction.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        let mut tx = mm.transaction().await?;

        sqlx::query("DELETE FROM lessons WHERE module_id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM modules WHERE id = $1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM modules WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM modules ORDER BY order_index LIMIT $1 OFFSET $2")
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Module {
    /// Flips the publish flag and copies it to every lesson of the module.
    /// Publishing stamps `last_published_at` and clears `last_modified_at`,
    /// unpublishing does the opposite.
    pub async fn set_published(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        published: bool,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.transaction().await?;

        let updated: Option<Self> = sqlx::query_as(
            r#"
            UPDATE modules SET
                published = $1,
                last_published_at = CASE WHEN $1 THEN now() ELSE NULL END,
                last_modified_at = CASE WHEN $1 THEN NULL ELSE now() END,
                updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(published)
        .bind(self.id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Err(DatabaseError::NotFound);
        };

        let cascaded = sqlx::query(
            "UPDATE lessons SET published = $1, updated_at = now() WHERE module_id = $2",
        )
        .bind(published)
        .bind(self.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            module = %updated.id,
            published,
            lessons = cascaded.rows_affected(),
            "module publish state changed"
        );
        Ok(updated)
    }

    /// Applies a full ordering in one transaction. Lessons listed under a
    /// module are moved into it. Any unknown id aborts the whole batch.
    pub async fn reorder(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        items: &[ModuleOrder],
    ) -> DatabaseResult<()> {
        validate_module_orders(items)?;

        let mut tx = mm.transaction().await?;

        for item in items {
            let res = sqlx::query(
                "UPDATE modules SET order_index = $1, updated_at = now() WHERE id = $2",
            )
            .bind(item.order)
            .bind(item.id)
            .execute(&mut *tx)
            .await?;

            if res.rows_affected() == 0 {
                return Err(DatabaseError::NotFound);
            }

            for lesson in item.lessons.iter().flatten() {
                let res = sqlx::query(
                    "UPDATE lessons SET order_index = $1, module_id = $2, updated_at = now() WHERE id = $3",
                )
                .bind(lesson.order)
                .bind(item.id)
                .bind(lesson.id)
                .execute(&mut *tx)
                .await?;

                if res.rows_affected() == 0 {
                    return Err(DatabaseError::NotFound);
                }
            }
        }

        commit_ordering(tx).await
    }
}

/// Commits a reorder transaction. The lesson order constraint is deferred,
/// so duplicates only surface here.
pub(crate) async fn commit_ordering(
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
) -> DatabaseResult<()> {
    match tx.commit().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let e = DatabaseError::from(e);
            if e.is_unique_violation() {
                Err(DatabaseError::validation(
                    "lesson order must be unique within a module",
                ))
            } else {
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Publishable for Module {
    fn is_published(&self) -> bool {
        self.published
    }
}

// Utils

#[derive(sqlx::FromRow)]
pub struct ModuleWithLessonsRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub published: bool,
    pub last_published_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub lessons: serde_json::Value,
}

impl ModuleWithLessonsRow {
    /// Modules in course order with their lessons nested. Without
    /// `include_unpublished` both levels are filtered to published content.
    pub async fn fetch_all(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        include_unpublished: bool,
    ) -> DatabaseResult<Vec<Self>> {
        Self::fetch(mm, include_unpublished, None).await
    }

    pub async fn fetch_one(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
        include_unpublished: bool,
    ) -> DatabaseResult<Option<Self>> {
        Ok(Self::fetch(mm, include_unpublished, Some(id)).await?.pop())
    }

    async fn fetch(
        mm: &ModelManager,
        include_unpublished: bool,
        id: Option<Uuid>,
    ) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ModuleWithLessonsRow> = sqlx::query_as(
            r#"
            SELECT
            m.id,
            m.title,
            m.description,
            m.order_index,
            m.published,
            m.last_published_at,
            m.last_modified_at,
            COALESCE(
                json_agg(to_jsonb(l) ORDER BY l.order_index)
                    FILTER (WHERE l.id IS NOT NULL AND ($1 OR l.published)),
                '[]'
            ) AS lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            WHERE ($1 OR m.published)
              AND ($2::uuid IS NULL OR m.id = $2)
            GROUP BY m.id
            ORDER BY m.order_index;
        "#,
        )
        .bind(include_unpublished)
        .bind(id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}
