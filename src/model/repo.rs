use serde::{Deserialize, Serialize};

use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResourceType {
    User,
    Module,
    Lesson,
    Video,
    Payment,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }
}

pub trait ResourceTyped {
    fn get_resource_type() -> ResourceType;
}

/// Basic persistence contract shared by every entity. `Create` and `Update`
/// are separate because updates are partial.
#[async_trait::async_trait]
pub trait CrudRepository<T, Create, Update, V>
where
    T: ResourceTyped + Send,
    V: Clone + Copy + Send + 'static,
    Create: Send + 'static,
    Update: Send + 'static,
{
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: Create,
    ) -> DatabaseResult<T>;

    async fn update(
        self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: Update,
    ) -> DatabaseResult<T>
    where
        Self: Sized;

    async fn delete(self, mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<()>
    where
        Self: Sized;

    async fn find_by_id(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: V,
    ) -> DatabaseResult<Option<T>>;

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<T>>;

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64>;

    async fn find_required(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        id: V,
    ) -> DatabaseResult<T> {
        Self::find_by_id(mm, actor, id)
            .await?
            .ok_or(DatabaseError::NotFound)
    }
}

#[async_trait::async_trait]
pub trait PaginatableRepository<T, Create, Update, V>
where
    T: ResourceTyped + Send + CrudRepository<T, Create, Update, V>,
    V: Clone + Copy + Send + 'static,
    Create: Send + 'static,
    Update: Send + 'static,
{
    async fn page(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Page<T>>;
}

#[macro_export]
macro_rules! impl_paginatable_for {
    ($ent:ident, $ent_create:ident, $ent_update:ident, $ent_id:ident) => {
        #[async_trait::async_trait]
        impl $crate::model::PaginatableRepository<$ent, $ent_create, $ent_update, $ent_id>
            for $ent
        {
            async fn page(
                mm: &$crate::model::ModelManager,
                actor: &$crate::web::AuthenticatedUser,
                limit: i64,
                offset: i64,
            ) -> $crate::model::DatabaseResult<$crate::model::Page<$ent>> {
                let limit = limit.clamp(1, 100);
                let offset = offset.max(0);
                let items = $ent::list(mm, actor, limit, offset).await?;
                let count = $ent::count(mm, actor).await?;
                Ok($crate::model::Page::new(items, count, limit, offset))
            }
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn page_reports_remaining_items() {
        let page = Page::new(vec![1, 2, 3], 10, 3, 0);
        assert!(page.has_more());

        let last = Page::new(vec![10], 10, 3, 9);
        assert!(!last.has_more());
    }
}
