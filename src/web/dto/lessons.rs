use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    model::entity::{
        Lesson, LessonCreate, LessonOrder, LessonResource, LessonUpdate, VIDEO_STATUS_READY,
    },
    services::video::{VideoEmbed, hosted_embed, resolve_embed},
};

use super::required;

/// A lesson as the player sees it: stored fields plus the resolved embed.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LessonResponse {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub video_embed: Option<VideoEmbed>,
}

impl From<Lesson> for LessonResponse {
    fn from(lesson: Lesson) -> Self {
        let hosted = match (lesson.video_status(), lesson.video_playback_id()) {
            (Some(status), Some(playback_id)) if status == VIDEO_STATUS_READY => {
                Some(hosted_embed(playback_id))
            }
            _ => None,
        };

        let video_embed = hosted.or_else(|| lesson.video_url().and_then(resolve_embed));
        Self {
            lesson,
            video_embed,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LessonListQuery {
    pub module_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonCreateBody {
    pub module_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub video_url: Option<String>,
    pub resources: Option<Vec<LessonResource>>,
    pub learning_objectives: Option<Vec<String>>,
}

impl TryFrom<LessonCreateBody> for LessonCreate {
    type Error = String;

    fn try_from(body: LessonCreateBody) -> Result<Self, Self::Error> {
        let title = required(body.title, "Title")?;
        let module_id = body
            .module_id
            .ok_or_else(|| String::from("Module ID is required"))?;

        Ok(Self {
            module_id,
            title,
            description: body.description,
            content: body.content,
            duration: body.duration,
            video_url: body.video_url,
            resources: body.resources,
            learning_objectives: body.learning_objectives,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonUpdateBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub video_url: Option<String>,
    pub resources: Option<Vec<LessonResource>>,
    pub learning_objectives: Option<Vec<String>>,
    pub order: Option<i32>,
}

impl TryFrom<LessonUpdateBody> for LessonUpdate {
    type Error = String;

    fn try_from(body: LessonUpdateBody) -> Result<Self, Self::Error> {
        if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(String::from("Title must not be empty"));
        }
        if body.order.is_some_and(|o| o < 0) {
            return Err(String::from("order must not be negative"));
        }

        Ok(Self {
            title: body.title,
            description: body.description,
            content: body.content,
            duration: body.duration,
            video_url: body.video_url,
            resources: body.resources,
            learning_objectives: body.learning_objectives,
            order_index: body.order,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LessonReorderBody {
    pub lessons: Option<Vec<LessonOrder>>,
}
