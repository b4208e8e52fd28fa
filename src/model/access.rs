use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::{AuthenticatedUser, UserRole},
};

/// Content gated by the publish flag.
#[async_trait::async_trait]
pub trait Publishable {
    fn is_published(&self) -> bool;

    /// Whether everything above this resource is published too. Modules have
    /// no parent, lessons ask their module.
    async fn parent_published(&self, _mm: &ModelManager) -> DatabaseResult<bool> {
        Ok(true)
    }
}

/// Students only see published content; admins see everything. Hidden
/// resources are reported as missing rather than forbidden.
pub async fn check_visible<T: Publishable + Sync>(
    mm: &ModelManager,
    ctx: &AuthenticatedUser,
    resource: &T,
) -> DatabaseResult<()> {
    if ctx.user_role() == UserRole::Admin {
        return Ok(());
    }

    if resource.is_published() && resource.parent_published(mm).await? {
        Ok(())
    } else {
        Err(DatabaseError::NotFound)
    }
}

/// Lesson bodies and videos are for admins and students who paid.
pub fn check_full_access(ctx: &AuthenticatedUser) -> DatabaseResult<()> {
    if ctx.has_full_access() {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}
