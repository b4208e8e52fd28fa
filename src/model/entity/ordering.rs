use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{DatabaseError, DatabaseResult};

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LessonOrder {
    pub id: Uuid,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ModuleOrder {
    pub id: Uuid,
    pub order: i32,
    /// Lessons that should end up in this module, in their new order.
    #[serde(default)]
    pub lessons: Option<Vec<LessonOrder>>,
}

fn check_pairs<I>(pairs: I, what: &str, unique_orders: bool) -> DatabaseResult<()>
where
    I: IntoIterator<Item = (Uuid, i32)>,
{
    let mut ids = HashSet::new();
    let mut orders = HashSet::new();

    for (id, order) in pairs {
        if order < 0 {
            return Err(DatabaseError::validation(format!(
                "{what} order must not be negative"
            )));
        }
        if !ids.insert(id) {
            return Err(DatabaseError::validation(format!(
                "{what} {id} is listed more than once"
            )));
        }
        if unique_orders && !orders.insert(order) {
            return Err(DatabaseError::validation(format!(
                "{what} order {order} is used more than once"
            )));
        }
    }

    Ok(())
}

/// Lessons in a flat reorder may belong to different modules, so only ids
/// must be unique here. Order clashes inside a module are caught on commit.
pub fn validate_lesson_orders(items: &[LessonOrder]) -> DatabaseResult<()> {
    check_pairs(items.iter().map(|l| (l.id, l.order)), "lesson", false)
}

pub fn validate_module_orders(items: &[ModuleOrder]) -> DatabaseResult<()> {
    check_pairs(items.iter().map(|m| (m.id, m.order)), "module", true)?;

    for module in items {
        if let Some(lessons) = &module.lessons {
            check_pairs(lessons.iter().map(|l| (l.id, l.order)), "lesson", true)?;
        }
    }

    // a lesson can only be moved into one module
    check_pairs(
        items
            .iter()
            .flat_map(|m| m.lessons.iter().flatten())
            .map(|l| (l.id, l.order)),
        "lesson",
        false,
    )
}
