//! Review rules: who may see, edit and decide an application

use sqlx::types::chrono::{DateTime, Utc};

use super::model::{Actor, Application, ApplicationStatus, StatusChange};
use crate::error::{ApiError, ApiResult};

pub const DEFAULT_REJECTION_REASON: &str = "Application did not meet eligibility criteria";

/// Admin decision on an application
#[derive(Debug, Clone)]
pub enum Decision {
    Approve,
    Reject { reason: Option<String> },
}

impl Decision {
    /// Status change for this decision, stamped at `at` by `actor`
    pub fn into_change(self, actor: &Actor, at: DateTime<Utc>) -> StatusChange {
        match self {
            Decision::Approve => StatusChange {
                status: ApplicationStatus::Approved,
                at,
                actor: actor.user_id,
                rejection_reason: None,
            },
            Decision::Reject { reason } => StatusChange {
                status: ApplicationStatus::Rejected,
                at,
                actor: actor.user_id,
                rejection_reason: Some(
                    reason
                        .map(|r| r.trim().to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
                ),
            },
        }
    }
}

pub fn ensure_can_view(app: &Application, actor: &Actor) -> ApiResult<()> {
    if actor.is_admin() || app.user_id == actor.user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not authorized to view this application".into()))
    }
}

/// Owners may edit only drafts; admins may edit anything
pub fn ensure_can_update(app: &Application, actor: &Actor) -> ApiResult<()> {
    if actor.is_admin() {
        return Ok(());
    }
    if app.user_id != actor.user_id {
        return Err(ApiError::Forbidden("Not authorized to update this application".into()));
    }
    if app.status != ApplicationStatus::Draft {
        return Err(ApiError::Forbidden(
            "Only draft applications can be edited".into(),
        ));
    }
    Ok(())
}

pub fn ensure_can_decide(actor: &Actor) -> ApiResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Admin access required".into()))
    }
}

pub fn ensure_transitionable(app: &Application) -> ApiResult<()> {
    if app.status.is_terminal() {
        Err(ApiError::Conflict(format!(
            "Application {} is already {:?}",
            app.application_number, app.status
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use uuid::Uuid;

    fn actor(role: UserRole) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_reject_defaults_reason() {
        let admin = actor(UserRole::Admin);
        let change = Decision::Reject { reason: Some("  ".into()) }.into_change(&admin, Utc::now());
        assert_eq!(change.rejection_reason.as_deref(), Some(DEFAULT_REJECTION_REASON));

        let change = Decision::Reject {
            reason: Some("Income too low".into()),
        }
        .into_change(&admin, Utc::now());
        assert_eq!(change.rejection_reason.as_deref(), Some("Income too low"));
        assert_eq!(change.actor, admin.user_id);
    }

    #[test]
    fn test_only_admin_decides() {
        assert!(ensure_can_decide(&actor(UserRole::Admin)).is_ok());
        assert!(matches!(
            ensure_can_decide(&actor(UserRole::User)),
            Err(ApiError::Forbidden(_))
        ));
    }
}
