//! Review state machine.
//!
//! Every lifecycle move of a portfolio goes through [`apply`]: it is the
//! single place that knows which `(state, actor, action)` combinations
//! are legal and what bookkeeping each one performs. Adding a state or a
//! role breaks the exhaustive match below, forcing every edge to be
//! revisited.
//!
//! Approval is two-key: an advisor forwards `ADMIN_PENDING` work to
//! `SUPER_PENDING`, and only a super admin can take it to `APPROVED`.
//! Neither role can act on the other's stage.

use serde::Deserialize;

use crate::error::ServerError;
use crate::portfolio::ReviewState;
use crate::user::Role;

/// Comment stored when a reviewer rejects without one.
pub const NO_COMMENT: &str = "No comment provided";

/// Who is acting on the portfolio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Actor {
    /// The owning student. Ownership is checked by the caller before
    /// the transition is computed.
    Owner,
    /// A reviewer acting with their granted role.
    Reviewer(Role),
}

/// Requested lifecycle action.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Owner sends the portfolio into the review pipeline. From
    /// `REJECTED` this is a resubmission and counts a revision.
    Submit,
    /// Reviewer passes the portfolio to the next stage.
    Approve,
    /// Reviewer sends the portfolio back with a reason.
    Reject(Option<String>),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Submit => "submit",
            Action::Approve => "approve",
            Action::Reject(_) => "reject",
        }
    }
}

/// What happens to `reject_comment` when a transition is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum CommentEffect {
    Keep,
    Clear,
    Set(String),
}

/// A legal transition, ready to be written with an optimistic
/// from-state check.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub from: ReviewState,
    pub to: ReviewState,
    pub comment: CommentEffect,
    pub bump_revision: bool,
}

/// Compute the transition for `(state, actor, action)`.
///
/// Illegal combinations return [`ServerError::InvalidTransition`] and
/// must leave the stored record untouched.
pub fn apply(
    state: ReviewState,
    actor: Actor,
    action: Action,
) -> Result<Transition, ServerError> {
    use ReviewState::*;

    let transition = match (state, actor, &action) {
        (Draft, Actor::Owner, Action::Submit) => Transition {
            from: Draft,
            to: AdminPending,
            comment: CommentEffect::Clear,
            bump_revision: false,
        },
        (Rejected, Actor::Owner, Action::Submit) => Transition {
            from: Rejected,
            to: AdminPending,
            comment: CommentEffect::Clear,
            bump_revision: true,
        },
        (
            AdminPending,
            Actor::Reviewer(Role::AdvisorAdmin),
            Action::Approve,
        ) => Transition {
            from: AdminPending,
            to: SuperPending,
            comment: CommentEffect::Keep,
            bump_revision: false,
        },
        (
            AdminPending,
            Actor::Reviewer(Role::AdvisorAdmin),
            Action::Reject(comment),
        ) => Transition {
            from: AdminPending,
            to: Rejected,
            comment: CommentEffect::Set(reason(comment)),
            bump_revision: false,
        },
        (SuperPending, Actor::Reviewer(Role::SuperAdmin), Action::Approve) => {
            Transition {
                from: SuperPending,
                to: Approved,
                comment: CommentEffect::Keep,
                bump_revision: false,
            }
        },
        (
            SuperPending,
            Actor::Reviewer(Role::SuperAdmin),
            Action::Reject(comment),
        ) => Transition {
            from: SuperPending,
            to: Rejected,
            comment: CommentEffect::Set(reason(comment)),
            bump_revision: false,
        },

        // Everything else is illegal, notably any super-admin action on
        // ADMIN_PENDING and any advisor action on SUPER_PENDING.
        (state, _, action) => {
            return Err(ServerError::InvalidTransition {
                state,
                action: action.name(),
            });
        },
    };

    Ok(transition)
}

fn reason(comment: &Option<String>) -> String {
    match comment.as_deref().map(str::trim) {
        Some(comment) if !comment.is_empty() => comment.to_owned(),
        _ => NO_COMMENT.to_owned(),
    }
}

/// Review request body action, as sent by admin front-ends.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewVerdict {
    Approve,
    Reject,
}

impl ReviewVerdict {
    /// Pair the verdict with its optional comment.
    pub fn into_action(self, comment: Option<String>) -> Action {
        match self {
            ReviewVerdict::Approve => Action::Approve,
            ReviewVerdict::Reject => Action::Reject(comment),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReviewState::*;

    const ALL_STATES: [ReviewState; 5] =
        [Draft, AdminPending, SuperPending, Approved, Rejected];
    const ALL_ROLES: [Role; 4] = [
        Role::Student,
        Role::Recruiter,
        Role::AdvisorAdmin,
        Role::SuperAdmin,
    ];

    fn assert_illegal(state: ReviewState, actor: Actor, action: Action) {
        match apply(state, actor, action) {
            Err(ServerError::InvalidTransition { state: s, .. }) => {
                assert_eq!(s, state)
            },
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn test_owner_submit_from_draft() {
        let t = apply(Draft, Actor::Owner, Action::Submit).unwrap();
        assert_eq!(t.to, AdminPending);
        assert_eq!(t.comment, CommentEffect::Clear);
        assert!(!t.bump_revision);
    }

    #[test]
    fn test_owner_resubmit_from_rejected_bumps_revision() {
        let t = apply(Rejected, Actor::Owner, Action::Submit).unwrap();
        assert_eq!(t.to, AdminPending);
        assert_eq!(t.comment, CommentEffect::Clear);
        assert!(t.bump_revision);
    }

    #[test]
    fn test_advisor_approve_forwards_to_super() {
        let t = apply(
            AdminPending,
            Actor::Reviewer(Role::AdvisorAdmin),
            Action::Approve,
        )
        .unwrap();
        assert_eq!(t.to, SuperPending);
        assert_eq!(t.comment, CommentEffect::Keep);
        assert!(!t.bump_revision);
    }

    #[test]
    fn test_super_approve_is_terminal_success() {
        let t = apply(
            SuperPending,
            Actor::Reviewer(Role::SuperAdmin),
            Action::Approve,
        )
        .unwrap();
        assert_eq!(t.to, Approved);
    }

    #[test]
    fn test_reject_sets_given_comment() {
        let t = apply(
            AdminPending,
            Actor::Reviewer(Role::AdvisorAdmin),
            Action::Reject(Some("blurry scan".into())),
        )
        .unwrap();
        assert_eq!(t.to, Rejected);
        assert_eq!(t.comment, CommentEffect::Set("blurry scan".into()));
    }

    #[test]
    fn test_reject_without_comment_uses_default() {
        for empty in [None, Some(String::new()), Some("   ".to_string())] {
            let t = apply(
                SuperPending,
                Actor::Reviewer(Role::SuperAdmin),
                Action::Reject(empty),
            )
            .unwrap();
            assert_eq!(t.comment, CommentEffect::Set(NO_COMMENT.into()));
        }
    }

    #[test]
    fn test_two_key_property() {
        // A super admin has no shortcut on the advisor stage.
        assert_illegal(
            AdminPending,
            Actor::Reviewer(Role::SuperAdmin),
            Action::Approve,
        );
        assert_illegal(
            AdminPending,
            Actor::Reviewer(Role::SuperAdmin),
            Action::Reject(None),
        );
        // And an advisor cannot touch the super stage.
        assert_illegal(
            SuperPending,
            Actor::Reviewer(Role::AdvisorAdmin),
            Action::Approve,
        );
        assert_illegal(
            SuperPending,
            Actor::Reviewer(Role::AdvisorAdmin),
            Action::Reject(None),
        );
    }

    #[test]
    fn test_only_listed_edges_are_legal() {
        // Walk the whole (state, actor, action) space and count the
        // combinations the table accepts.
        let mut legal = 0;
        for state in ALL_STATES {
            for action in
                [Action::Submit, Action::Approve, Action::Reject(None)]
            {
                if apply(state, Actor::Owner, action.clone()).is_ok() {
                    legal += 1;
                }
                for role in ALL_ROLES {
                    if apply(state, Actor::Reviewer(role), action.clone())
                        .is_ok()
                    {
                        legal += 1;
                    }
                }
            }
        }
        assert_eq!(legal, 6);
    }

    #[test]
    fn test_approved_is_terminal() {
        for action in [Action::Submit, Action::Approve, Action::Reject(None)] {
            assert_illegal(Approved, Actor::Owner, action.clone());
            for role in ALL_ROLES {
                assert_illegal(Approved, Actor::Reviewer(role), action.clone());
            }
        }
    }

    #[test]
    fn test_students_and_recruiters_never_review() {
        for state in ALL_STATES {
            for role in [Role::Student, Role::Recruiter] {
                assert_illegal(state, Actor::Reviewer(role), Action::Approve);
                assert_illegal(
                    state,
                    Actor::Reviewer(role),
                    Action::Reject(None),
                );
            }
        }
    }
}
