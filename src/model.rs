//! Core data model for staffbook.
//!
//! Two loosely related domains share one entity store:
//! the recruiting pipeline (candidates and recruiting requests)
//! and the skill matrix tracker (matrices and their snapshot history).

mod candidate;
mod matrix;
mod request;
mod role;
mod snapshot;

pub use candidate::{Candidate, CandidateAction, CandidateStatus, DocumentKind, DocumentRef, NewCandidate};
pub use matrix::{EmployeeLevels, Level, LevelOutOfRange, Member, Skill, SkillMatrix};
pub use request::{
    NewRequest, PositionCategory, PositionType, RecruitingRequest, RequestAction, RequestStatus,
};
pub use role::{Actor, Role};
pub use snapshot::{MatrixSnapshot, ORIGINAL_SNAPSHOT_NAME};

/// Input that was rejected before anything reached the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("unknown department: {0}")]
    UnknownDepartment(String),

    #[error("position '{position}' is not open in department '{department}'")]
    UnknownPosition { department: String, position: String },

    #[error("unknown recruiting source: {0}")]
    UnknownSource(String),

    #[error("unknown skill: {0}")]
    UnknownSkill(String),

    #[error("unknown member: {0}")]
    UnknownMember(String),

    #[error(transparent)]
    Level(#[from] LevelOutOfRange),
}

/// Returns the trimmed value, or [`ValidationError::Missing`] when blank.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(trimmed.to_string())
}
