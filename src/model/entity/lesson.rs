use crate::model::access::Publishable;
use crate::model::entity::module::commit_ordering;
use crate::model::entity::ordering::{LessonOrder, validate_lesson_orders};
use crate::model::repo::ResourceTyped;
use crate::model::{
    DatabaseError, ModelManager, error::DatabaseResult, repo::CrudRepository,
};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

pub static VIDEO_STATUS_PREPARING: &str = "preparing";
pub static VIDEO_STATUS_READY: &str = "ready";

/// Downloadable or linked material attached to a lesson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct LessonResource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    description: Option<String>,
    content: Option<String>,
    duration: String,
    video_url: Option<String>,
    video_asset_id: Option<String>,
    video_playback_id: Option<String>,
    video_status: Option<String>,
    #[schema(value_type = Option<Vec<LessonResource>>)]
    resources: Option<Json<Vec<LessonResource>>>,
    learning_objectives: Vec<String>,
    order_index: i32,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn video_asset_id(&self) -> Option<&str> {
        self.video_asset_id.as_deref()
    }

    pub fn video_playback_id(&self) -> Option<&str> {
        self.video_playback_id.as_deref()
    }

    pub fn video_status(&self) -> Option<&str> {
        self.video_status.as_deref()
    }

    pub fn resources(&self) -> &[LessonResource] {
        self.resources.as_ref().map(|r| r.0.as_slice()).unwrap_or_default()
    }

    pub fn learning_objectives(&self) -> &[String] {
        &self.learning_objectives
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }

    pub fn published(&self) -> bool {
        self.published
    }

    /// Outline shown to students who have not paid: title, description,
    /// duration and objectives stay, content and video do not.
    pub fn into_preview(self) -> Self {
        Self {
            content: None,
            video_url: None,
            video_asset_id: None,
            video_playback_id: None,
            video_status: None,
            resources: None,
            ..self
        }
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub video_url: Option<String>,
    pub resources: Option<Vec<LessonResource>>,
    pub learning_objectives: Option<Vec<String>>,
}

/// Partial edit: `None` keeps the stored value, an empty string clears the
/// optional text fields.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub video_url: Option<String>,
    pub resources: Option<Vec<LessonResource>>,
    pub learning_objectives: Option<Vec<String>>,
    pub order_index: Option<i32>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    trimmed(value).filter(|v| !v.is_empty())
}

fn clean_objectives(objectives: Vec<String>) -> Vec<String> {
    objectives
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, LessonUpdate, Uuid> for Lesson {
    /// Appends the lesson to the end of its module. New lessons start
    /// unpublished.
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO lessons (
                id, module_id, title, description, content, duration,
                video_url, resources, learning_objectives, order_index, published
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE(MAX(order_index), 0) + 1, FALSE
            FROM lessons WHERE module_id = $2
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(data.title.trim())
        .bind(non_empty(data.description))
        .bind(non_empty(data.content))
        .bind(trimmed(data.duration).unwrap_or_default())
        .bind(non_empty(data.video_url))
        .bind(data.resources.map(Json))
        .bind(clean_objectives(data.learning_objectives.unwrap_or_default()))
        .fetch_one(mm.executor())
        .await;

        match result {
            Ok(lesson) => Ok(lesson),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Err(DatabaseError::NotFound)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonUpdate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE lessons SET
                title = COALESCE($1, title),
                description = CASE WHEN $2::text IS NULL THEN description ELSE NULLIF($2, '') END,
                content = CASE WHEN $3::text IS NULL THEN content ELSE NULLIF($3, '') END,
                duration = COALESCE($4, duration),
                video_url = CASE WHEN $5::text IS NULL THEN video_url ELSE NULLIF($5, '') END,
                resources = COALESCE($6, resources),
                learning_objectives = COALESCE($7, learning_objectives),
                order_index = COALESCE($8, order_index),
                updated_at = now()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(non_empty(data.title))
        .bind(trimmed(data.description))
        .bind(trimmed(data.content))
        .bind(trimmed(data.duration))
        .bind(trimmed(data.video_url))
        .bind(data.resources.map(Json))
        .bind(data.learning_objectives.map(clean_objectives))
        .bind(data.order_index)
        .bind(self.id)
        .fetch_optional(mm.executor())
        .await;

        match updated {
            Ok(Some(lesson)) => Ok(lesson),
            Ok(None) => Err(DatabaseError::NotFound),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                DatabaseError::validation("lesson order must be unique within a module"),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        let deleted = sqlx::query("DELETE FROM lessons WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
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
        let result = sqlx::query_as(
            "SELECT * FROM lessons ORDER BY module_id, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

impl Lesson {
    /// Lessons of a module in order. Students get only published lessons of a
    /// published module.
    pub async fn all_by_module(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        mid: Uuid,
        include_unpublished: bool,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT l.* FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE l.module_id = $1
              AND ($2 OR (m.published AND l.published))
            ORDER BY l.order_index
            "#,
        )
        .bind(mid)
        .bind(include_unpublished)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// A lesson may only become visible while its module is published.
    pub async fn set_published(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        published: bool,
    ) -> DatabaseResult<Self> {
        let mut tx = mm.transaction().await?;

        let module_published: Option<bool> =
            sqlx::query_scalar("SELECT published FROM modules WHERE id = $1 FOR SHARE")
                .bind(self.module_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(module_published) = module_published else {
            return Err(DatabaseError::NotFound);
        };

        if published && !module_published {
            return Err(DatabaseError::validation(
                "Cannot publish lesson when module is unpublished",
            ));
        }

        let updated: Option<Self> = sqlx::query_as(
            "UPDATE lessons SET published = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(published)
        .bind(self.id)
        .fetch_optional(&mut *tx)
        .await?;

        let updated = updated.ok_or(DatabaseError::NotFound)?;
        tx.commit().await?;
        Ok(updated)
    }

    /// All-or-nothing: an unknown id rolls back every update in the batch.
    pub async fn reorder(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        items: &[LessonOrder],
    ) -> DatabaseResult<()> {
        validate_lesson_orders(items)?;

        let mut tx = mm.transaction().await?;
        for item in items {
            let res = sqlx::query(
                "UPDATE lessons SET order_index = $1, updated_at = now() WHERE id = $2",
            )
            .bind(item.order)
            .bind(item.id)
            .execute(&mut *tx)
            .await?;

            if res.rows_affected() == 0 {
                return Err(DatabaseError::NotFound);
            }
        }

        commit_ordering(tx).await
    }

    /// Links an uploaded hosted video to the lesson; it stays `preparing`
    /// until the hosting provider reports the asset ready.
    pub async fn attach_video(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        asset_id: &str,
        playback_id: Option<&str>,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE lessons SET
                video_asset_id = $1,
                video_playback_id = $2,
                video_status = $3,
                updated_at = now()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(asset_id)
        .bind(playback_id)
        .bind(VIDEO_STATUS_PREPARING)
        .bind(self.id)
        .fetch_optional(mm.executor())
        .await?;

        updated.ok_or(DatabaseError::NotFound)
    }

    /// Returns how many lessons referenced the asset.
    pub async fn mark_video_ready(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        asset_id: &str,
    ) -> DatabaseResult<u64> {
        let res = sqlx::query(
            "UPDATE lessons SET video_status = $1, updated_at = now() WHERE video_asset_id = $2",
        )
        .bind(VIDEO_STATUS_READY)
        .bind(asset_id)
        .execute(mm.executor())
        .await?;

        Ok(res.rows_affected())
    }
}

#[async_trait]
impl Publishable for Lesson {
    fn is_published(&self) -> bool {
        self.published
    }

    async fn parent_published(&self, mm: &ModelManager) -> DatabaseResult<bool> {
        let published: Option<bool> =
            sqlx::query_scalar("SELECT published FROM modules WHERE id = $1")
                .bind(self.module_id)
                .fetch_optional(mm.executor())
                .await?;

        Ok(published.unwrap_or(false))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blank_optional_text_is_dropped() {
        assert_eq!(non_empty(Some(String::from("   "))), None);
        assert_eq!(non_empty(Some(String::from(" intro "))), Some(String::from("intro")));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn update_keeps_empty_string_to_clear() {
        assert_eq!(trimmed(Some(String::from("  "))), Some(String::new()));
    }

    #[test]
    fn objectives_are_trimmed_and_blank_ones_removed() {
        let cleaned = clean_objectives(vec![
            String::from(" Frame a shot "),
            String::new(),
            String::from("   "),
            String::from("Use portrait mode"),
        ]);
        assert_eq!(cleaned, vec!["Frame a shot", "Use portrait mode"]);
    }
}
