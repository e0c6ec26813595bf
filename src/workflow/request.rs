//! Recruiting request approval: Pending, then approved (and later filled)
//! or rejected.

use crate::model::{Actor, RecruitingRequest, RequestAction, RequestStatus};

use super::WorkflowError;

impl RequestStatus {
    pub fn available_actions(self) -> &'static [RequestAction] {
        match self {
            Self::Pending => &[RequestAction::Approve, RequestAction::Reject],
            Self::Approved => &[RequestAction::Fill],
            Self::Rejected | Self::Filled => &[],
        }
    }

    pub fn next(self, action: RequestAction) -> Result<Self, WorkflowError> {
        match (self, action) {
            (Self::Pending, RequestAction::Approve) => Ok(Self::Approved),
            (Self::Pending, RequestAction::Reject) => Ok(Self::Rejected),
            (Self::Approved, RequestAction::Fill) => Ok(Self::Filled),
            (from, action) => Err(WorkflowError::InvalidRequestTransition { from, action }),
        }
    }
}

impl RecruitingRequest {
    /// Applies a workflow action on behalf of `actor`. Returns the previous status.
    ///
    /// Approve and reject need a role that may approve; fill is open to anyone
    /// who can see the request.
    pub fn apply(
        &mut self,
        action: RequestAction,
        actor: &Actor,
    ) -> Result<RequestStatus, WorkflowError> {
        if matches!(action, RequestAction::Approve | RequestAction::Reject)
            && !actor.role.can_approve()
        {
            return Err(WorkflowError::Forbidden {
                role: actor.role,
                action,
            });
        }
        let next = self.status.next(action)?;
        let previous = self.status;
        self.status = next;
        Ok(previous)
    }

    /// Filled requests are kept for the record; everything else may be deleted.
    pub fn ensure_deletable(&self) -> Result<(), WorkflowError> {
        if self.status == RequestStatus::Filled {
            return Err(WorkflowError::FilledRequestLocked);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::num::NonZeroU32;

    use jiff::Timestamp;

    use crate::catalog::Catalog;
    use crate::model::{NewRequest, PositionCategory, PositionType, Role};

    fn actor(role: Role) -> Actor {
        Actor {
            name: "sam".into(),
            role,
            department: None,
        }
    }

    fn request() -> RecruitingRequest {
        RecruitingRequest::create(
            NewRequest {
                department: "Finance".into(),
                position: "Accountant".into(),
                description: "Month-end close".into(),
                headcount: NonZeroU32::MIN,
                position_type: PositionType::New {
                    reason: "Growth".into(),
                },
                category: PositionCategory::Ind,
                confidential: false,
            },
            &Catalog::default(),
            "sam",
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn approver_approves_then_anyone_fills() {
        let mut r = request();

        r.apply(RequestAction::Approve, &actor(Role::Approver))
            .unwrap();
        assert_eq!(r.status, RequestStatus::Approved);

        r.apply(RequestAction::Fill, &actor(Role::Recruiter))
            .unwrap();
        assert_eq!(r.status, RequestStatus::Filled);
    }

    #[test]
    fn recruiter_cannot_approve_or_reject() {
        let mut r = request();
        for action in [RequestAction::Approve, RequestAction::Reject] {
            let err = r.apply(action, &actor(Role::Recruiter)).unwrap_err();
            assert_eq!(
                err,
                WorkflowError::Forbidden {
                    role: Role::Recruiter,
                    action
                }
            );
        }
        assert_eq!(r.status, RequestStatus::Pending);
    }

    #[test]
    fn pending_request_cannot_be_filled() {
        let mut r = request();
        let err = r.apply(RequestAction::Fill, &actor(Role::Admin)).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidRequestTransition {
                from: RequestStatus::Pending,
                ..
            }
        ));
    }

    #[test]
    fn only_filled_requests_are_locked() {
        for status in RequestStatus::ALL {
            let mut r = request();
            r.status = status;
            assert_eq!(
                r.ensure_deletable().is_err(),
                status == RequestStatus::Filled,
                "{status}"
            );
        }
    }

    #[test]
    fn available_actions_match_transition_function() {
        for status in RequestStatus::ALL {
            for action in [RequestAction::Approve, RequestAction::Reject, RequestAction::Fill] {
                let offered = status.available_actions().contains(&action);
                assert_eq!(offered, status.next(action).is_ok());
            }
        }
    }
}
