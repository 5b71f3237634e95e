//! crates/timekeeper_core/src/viewer.rs
//!
//! The authenticated caller, threaded explicitly through every service call.
//! All role-based row filtering goes through the methods here.

use uuid::Uuid;

use crate::domain::Role;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub role: Role,
}

impl Viewer {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> CoreResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CoreError::forbidden("Access denied. Admin privileges required."))
        }
    }

    /// Effective user filter for a listing. Employees are pinned to their own
    /// rows whatever they asked for; admins get what they asked for (`None` = all).
    pub fn scope(&self, requested: Option<Uuid>) -> Option<Uuid> {
        match self.role {
            Role::Admin => requested,
            Role::Employee => Some(self.user_id),
        }
    }

    /// Whether a row owned by `owner` is visible to this viewer.
    pub fn can_see(&self, owner: Uuid) -> bool {
        self.is_admin() || self.user_id == owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_scope_ignores_requested_user() {
        let me = Uuid::new_v4();
        let viewer = Viewer::new(me, Role::Employee);
        assert_eq!(viewer.scope(Some(Uuid::new_v4())), Some(me));
        assert_eq!(viewer.scope(None), Some(me));
    }

    #[test]
    fn admin_scope_passes_requested_user_through() {
        let viewer = Viewer::new(Uuid::new_v4(), Role::Admin);
        let target = Uuid::new_v4();
        assert_eq!(viewer.scope(Some(target)), Some(target));
        assert_eq!(viewer.scope(None), None);
    }

    #[test]
    fn only_admins_pass_require_admin() {
        assert!(Viewer::new(Uuid::new_v4(), Role::Admin).require_admin().is_ok());
        assert!(matches!(
            Viewer::new(Uuid::new_v4(), Role::Employee).require_admin(),
            Err(CoreError::Forbidden(_))
        ));
    }
}
