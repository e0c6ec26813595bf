//! Snapshot types: immutable point-in-time copies of a skill matrix.

use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeLevels, Member, Skill};

/// Name given to the snapshot written when a matrix is created.
pub const ORIGINAL_SNAPSHOT_NAME: &str = "Original";

/// One entry in a matrix's append-only history.
///
/// Skills and members are copied in, so later edits to the live matrix
/// never change how an old snapshot reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSnapshot {
    pub id: Uuid,
    pub matrix_id: Uuid,
    pub taken_at: Timestamp,
    pub name: String,
    pub skills: Vec<Skill>,
    pub members: Vec<Member>,
    pub levels: EmployeeLevels,
}

impl MatrixSnapshot {
    /// The default name for a snapshot taken at `taken_at`: its local date.
    pub fn default_name(taken_at: Timestamp) -> String {
        taken_at.to_zoned(TimeZone::system()).date().to_string()
    }
}
