//! Status workflows for candidates and recruiting requests.
//!
//! Both are small fixed state machines. Each transition function rejects
//! `(state, action)` pairs that aren't edges, so a write can only ever
//! carry a status the machine allows.

mod candidate;
mod request;

use crate::model::{CandidateAction, CandidateStatus, RequestAction, RequestStatus, Role};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("cannot {action} a candidate in status {from}")]
    InvalidCandidateTransition {
        from: CandidateStatus,
        action: CandidateAction,
    },

    #[error("cannot {action} a request in status {from}")]
    InvalidRequestTransition {
        from: RequestStatus,
        action: RequestAction,
    },

    #[error("a reason is required to reject a candidate")]
    MissingReason,

    #[error("role {role} may not {action} recruiting requests")]
    Forbidden { role: Role, action: RequestAction },

    #[error("filled requests cannot be deleted")]
    FilledRequestLocked,
}
