//! Visibility and access policy.
//!
//! Read access and the visibility toggle never touch the review state;
//! they only observe it.

use crate::error::ServerError;
use crate::portfolio::{Portfolio, ReviewState, Visibility};
use crate::user::{Caller, Role};

/// Whether `caller` (anonymous when `None`) may read this portfolio.
///
/// The owner always may. Reviewers see the records currently waiting on
/// their stage. Everyone, signed-in or not, sees approved public work.
pub fn can_view(portfolio: &Portfolio, caller: Option<&Caller>) -> bool {
    if let Some(caller) = caller {
        if caller.id == portfolio.owner_id {
            return true;
        }

        let reviewing_stage = match caller.role {
            Role::AdvisorAdmin => portfolio.state == ReviewState::AdminPending,
            Role::SuperAdmin => portfolio.state == ReviewState::SuperPending,
            Role::Student | Role::Recruiter => false,
        };
        if reviewing_stage {
            return true;
        }
    }

    portfolio.state == ReviewState::Approved
        && portfolio.visibility == Visibility::Public
}

/// Check that `caller` may change this portfolio's visibility.
///
/// Only the owner of an `APPROVED` portfolio may. Never touches
/// `state`, `reject_comment` or `revision`.
pub fn ensure_can_toggle_visibility(
    portfolio: &Portfolio,
    caller: &Caller,
) -> Result<(), ServerError> {
    if caller.id != portfolio.owner_id {
        return Err(ServerError::Forbidden(
            "only the owner can change visibility",
        ));
    }
    if portfolio.state != ReviewState::Approved {
        return Err(ServerError::NotApproved);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::portfolio::Category;

    fn portfolio(state: ReviewState, visibility: Visibility) -> Portfolio {
        Portfolio {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            title: "Thesis".into(),
            description: String::new(),
            files: vec!["/uploads/a.pdf".into()],
            cover_url: "/uploads/a.pdf".into(),
            category: Category::Ai,
            year: 2024,
            university: "KMUTT".into(),
            tags: vec![],
            award: None,
            state,
            visibility,
            reject_comment: None,
            revision: 0,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn caller(role: Role) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_owner_always_views_own() {
        for state in [
            ReviewState::Draft,
            ReviewState::AdminPending,
            ReviewState::SuperPending,
            ReviewState::Approved,
            ReviewState::Rejected,
        ] {
            let p = portfolio(state, Visibility::Private);
            let owner = Caller {
                id: p.owner_id,
                role: Role::Student,
            };
            assert!(can_view(&p, Some(&owner)));
        }
    }

    #[test]
    fn test_anonymous_views_only_approved_public() {
        assert!(can_view(
            &portfolio(ReviewState::Approved, Visibility::Public),
            None
        ));
        assert!(!can_view(
            &portfolio(ReviewState::Approved, Visibility::Private),
            None
        ));
        assert!(!can_view(
            &portfolio(ReviewState::SuperPending, Visibility::Public),
            None
        ));
    }

    #[test]
    fn test_reviewers_view_their_stage_only() {
        let admin_stage =
            portfolio(ReviewState::AdminPending, Visibility::Private);
        let super_stage =
            portfolio(ReviewState::SuperPending, Visibility::Private);

        assert!(can_view(&admin_stage, Some(&caller(Role::AdvisorAdmin))));
        assert!(!can_view(&admin_stage, Some(&caller(Role::SuperAdmin))));
        assert!(can_view(&super_stage, Some(&caller(Role::SuperAdmin))));
        assert!(!can_view(&super_stage, Some(&caller(Role::AdvisorAdmin))));
    }

    #[test]
    fn test_other_students_denied_private_work() {
        let p = portfolio(ReviewState::Approved, Visibility::Private);
        assert!(!can_view(&p, Some(&caller(Role::Student))));
        assert!(!can_view(&p, Some(&caller(Role::Recruiter))));
    }

    #[test]
    fn test_toggle_requires_owner() {
        let p = portfolio(ReviewState::Approved, Visibility::Private);
        let err = ensure_can_toggle_visibility(&p, &caller(Role::Student))
            .unwrap_err();
        assert!(matches!(err, ServerError::Forbidden(_)));
    }

    #[test]
    fn test_toggle_requires_approved_state() {
        for state in [
            ReviewState::Draft,
            ReviewState::AdminPending,
            ReviewState::SuperPending,
            ReviewState::Rejected,
        ] {
            let p = portfolio(state, Visibility::Private);
            let owner = Caller {
                id: p.owner_id,
                role: Role::Student,
            };
            let err =
                ensure_can_toggle_visibility(&p, &owner).unwrap_err();
            assert!(matches!(err, ServerError::NotApproved));
        }
    }

    #[test]
    fn test_toggle_allowed_for_owner_of_approved() {
        let p = portfolio(ReviewState::Approved, Visibility::Private);
        let owner = Caller {
            id: p.owner_id,
            role: Role::Student,
        };
        assert!(ensure_can_toggle_visibility(&p, &owner).is_ok());
    }
}
