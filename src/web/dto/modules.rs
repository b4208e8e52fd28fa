use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    DatabaseResult,
    entity::{Lesson, Module, ModuleCreate, ModuleOrder, ModuleUpdate, ModuleWithLessonsRow},
};

use super::required;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleWithLessons {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub order_index: i32,
    pub published: bool,
    pub last_published_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub lessons: Vec<Lesson>,
}

impl TryFrom<ModuleWithLessonsRow> for ModuleWithLessons {
    type Error = serde_json::Error;

    fn try_from(value: ModuleWithLessonsRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            title: value.title,
            description: value.description,
            order_index: value.order_index,
            published: value.published,
            last_published_at: value.last_published_at,
            last_modified_at: value.last_modified_at,
            lessons: serde_json::from_value(value.lessons)?,
        })
    }
}

impl ModuleWithLessons {
    pub fn into_preview(mut self) -> Self {
        self.lessons = self.lessons.into_iter().map(Lesson::into_preview).collect();
        self
    }

    pub fn from_rows(rows: Vec<ModuleWithLessonsRow>) -> DatabaseResult<Vec<Self>> {
        Ok(rows
            .into_iter()
            .map(ModuleWithLessons::try_from)
            .collect::<Result<_, _>>()?)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ModuleListQuery {
    #[serde(default)]
    pub include_unpublished: bool,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ModuleBody {
    pub title: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
}

impl TryFrom<ModuleBody> for ModuleCreate {
    type Error = String;

    fn try_from(body: ModuleBody) -> Result<Self, Self::Error> {
        Ok(Self {
            title: required(body.title, "Title")?,
            description: body.description,
        })
    }
}

impl TryFrom<ModuleBody> for ModuleUpdate {
    type Error = String;

    fn try_from(body: ModuleBody) -> Result<Self, Self::Error> {
        if body.order.is_some_and(|o| o < 0) {
            return Err(String::from("order must not be negative"));
        }

        Ok(Self {
            title: required(body.title, "Title")?,
            description: body.description,
            order_index: body.order,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PublishBody {
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ModulePublishResponse {
    pub message: String,
    pub module: Module,
}

impl ModulePublishResponse {
    pub fn new(module: Module) -> Self {
        let message = if module.published() {
            "Module published successfully"
        } else {
            "Module unpublished successfully"
        };

        Self {
            message: message.to_string(),
            module,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ModuleReorderBody {
    pub modules: Option<Vec<ModuleOrder>>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn create_requires_title() {
        let body = ModuleBody {
            title: Some(String::from("  ")),
            description: None,
            order: None,
        };
        assert_eq!(ModuleCreate::try_from(body).unwrap_err(), "Title is required");
    }

    #[test]
    fn update_rejects_negative_order() {
        let body = ModuleBody {
            title: Some(String::from("Basics")),
            description: None,
            order: Some(-1),
        };
        assert!(ModuleUpdate::try_from(body).is_err());
    }

    #[test]
    fn row_with_empty_lessons() {
        let row = ModuleWithLessonsRow {
            id: Uuid::new_v4(),
            title: String::from("Basics"),
            description: String::new(),
            order_index: 1,
            published: false,
            last_published_at: None,
            last_modified_at: None,
            lessons: serde_json::json!([]),
        };
        let module = ModuleWithLessons::try_from(row).unwrap();
        assert!(module.lessons.is_empty());
    }
}
