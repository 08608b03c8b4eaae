//! Post lifecycle rules. Pure functions: the post service loads the row,
//! asks these for a verdict and writes the result.

use crate::error::{AppError, AppResult};
use crate::models::{PostStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// draft -> pending
    Submit,
    /// pending -> approved
    Approve,
    /// pending -> rejected
    Reject,
    /// draft | rejected -> draft | pending
    Edit { target: PostStatus },
}

impl Transition {
    fn name(self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Edit { .. } => "edit",
        }
    }
}

/// Who may fire a transition, independent of the post's current state.
pub fn authorize(transition: Transition, role: Role, is_owner: bool) -> AppResult<()> {
    let allowed = match transition {
        Transition::Submit | Transition::Edit { .. } => is_owner && role.can_write(),
        Transition::Approve | Transition::Reject => role.is_staff(),
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Status after `transition`, or `InvalidTransition` when `current` does not allow it.
pub fn next_status(current: PostStatus, transition: Transition) -> AppResult<PostStatus> {
    use PostStatus::*;

    let next = match (current, transition) {
        (Draft, Transition::Submit) => Some(Pending),
        (Pending, Transition::Approve) => Some(Approved),
        (Pending, Transition::Reject) => Some(Rejected),
        (Draft | Rejected, Transition::Edit { target }) => match target {
            Draft | Pending => Some(target),
            Approved | Rejected => {
                return Err(AppError::validation(
                    "an edited post can only be saved as draft or pending",
                ))
            }
        },
        _ => None,
    };

    next.ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "cannot {} a post that is {}",
            transition.name(),
            status_label(current)
        ))
    })
}

/// Initial status chosen by the author at creation.
pub fn initial_status(requested: PostStatus) -> AppResult<PostStatus> {
    match requested {
        PostStatus::Draft | PostStatus::Pending => Ok(requested),
        _ => Err(AppError::validation(
            "a new post starts as draft or pending",
        )),
    }
}

/// Owning author or staff may delete, in any state.
pub fn can_delete(role: Role, is_owner: bool) -> bool {
    is_owner || role.is_staff()
}

pub fn status_label(status: PostStatus) -> &'static str {
    match status {
        PostStatus::Draft => "draft",
        PostStatus::Pending => "pending",
        PostStatus::Approved => "approved",
        PostStatus::Rejected => "rejected",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PostStatus::*;

    const ALL: [PostStatus; 4] = [Draft, Pending, Approved, Rejected];

    fn transitions() -> Vec<Transition> {
        vec![
            Transition::Submit,
            Transition::Approve,
            Transition::Reject,
            Transition::Edit { target: Draft },
            Transition::Edit { target: Pending },
        ]
    }

    #[test]
    fn legal_transitions() {
        assert_eq!(next_status(Draft, Transition::Submit).unwrap(), Pending);
        assert_eq!(next_status(Pending, Transition::Approve).unwrap(), Approved);
        assert_eq!(next_status(Pending, Transition::Reject).unwrap(), Rejected);
        assert_eq!(
            next_status(Rejected, Transition::Edit { target: Pending }).unwrap(),
            Pending
        );
        assert_eq!(
            next_status(Draft, Transition::Edit { target: Draft }).unwrap(),
            Draft
        );
    }

    #[test]
    fn everything_else_is_invalid() {
        let legal = [
            (Draft, Transition::Submit),
            (Pending, Transition::Approve),
            (Pending, Transition::Reject),
            (Draft, Transition::Edit { target: Draft }),
            (Draft, Transition::Edit { target: Pending }),
            (Rejected, Transition::Edit { target: Draft }),
            (Rejected, Transition::Edit { target: Pending }),
        ];
        for state in ALL {
            for t in transitions() {
                let result = next_status(state, t);
                if legal.contains(&(state, t)) {
                    assert!(result.is_ok(), "{state:?} {t:?}");
                } else {
                    assert!(
                        matches!(result, Err(AppError::InvalidTransition(_))),
                        "{state:?} {t:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn approved_and_pending_posts_are_not_editable() {
        for state in [Approved, Pending] {
            assert!(matches!(
                next_status(state, Transition::Edit { target: Draft }),
                Err(AppError::InvalidTransition(_))
            ));
        }
    }

    #[test]
    fn edit_cannot_self_approve() {
        assert!(matches!(
            next_status(Draft, Transition::Edit { target: Approved }),
            Err(AppError::Validation(_))
        ));
        assert!(initial_status(Approved).is_err());
        assert_eq!(initial_status(Pending).unwrap(), Pending);
    }

    #[test]
    fn review_is_staff_only() {
        assert!(authorize(Transition::Approve, Role::Moderator, false).is_ok());
        assert!(authorize(Transition::Reject, Role::Admin, false).is_ok());
        assert!(matches!(
            authorize(Transition::Approve, Role::Author, true),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn submit_and_edit_are_owner_only() {
        assert!(authorize(Transition::Submit, Role::Contributor, true).is_ok());
        assert!(authorize(Transition::Submit, Role::Admin, false).is_err());
        assert!(authorize(Transition::Edit { target: Draft }, Role::Moderator, false).is_err());
        // demoted owner loses the author area
        assert!(authorize(Transition::Submit, Role::User, true).is_err());
    }

    #[test]
    fn delete_rights() {
        assert!(can_delete(Role::Author, true));
        assert!(can_delete(Role::Moderator, false));
        assert!(!can_delete(Role::Author, false));
    }
}
