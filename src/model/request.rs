//! Recruiting request types: a department asking for headcount.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;

use super::{ValidationError, required};

/// A request to open one or more positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecruitingRequest {
    pub id: Uuid,
    pub department: String,
    pub position: String,
    pub description: String,
    pub headcount: NonZeroU32,
    pub position_type: PositionType,
    pub category: PositionCategory,

    /// Hidden from recruiters other than the requester.
    pub confidential: bool,
    pub status: RequestStatus,
    pub requested_by: String,
    pub created_at: Timestamp,
    pub version: u64,
}

/// Form input for a new recruiting request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub department: String,
    pub position: String,
    pub description: String,
    pub headcount: NonZeroU32,
    pub position_type: PositionType,
    pub category: PositionCategory,
    pub confidential: bool,
}

impl RecruitingRequest {
    /// Validates the form and builds a `Pending` request.
    pub fn create(
        input: NewRequest,
        catalog: &Catalog,
        requested_by: &str,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let department = required("department", &input.department)?;
        let position = required("position", &input.position)?;
        let description = required("job description", &input.description)?;
        catalog.check_position(&department, &position)?;

        let position_type = match input.position_type {
            PositionType::New { reason } => PositionType::New {
                reason: required("reason for new position", &reason)?,
            },
            PositionType::Replacement { replaced } => PositionType::Replacement {
                replaced: required("replaced person", &replaced)?,
            },
        };

        Ok(Self {
            id: Uuid::new_v4(),
            department,
            position,
            description,
            headcount: input.headcount,
            position_type,
            category: input.category,
            confidential: input.confidential,
            status: RequestStatus::Pending,
            requested_by: requested_by.to_string(),
            created_at: now,
            version: 1,
        })
    }
}

/// Why the position is needed. Each kind carries its companion field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PositionType {
    New { reason: String },
    Replacement { replaced: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionCategory {
    /// Salaried.
    #[serde(rename = "SAL")]
    Sal,

    /// Hourly / industrial.
    #[serde(rename = "IND")]
    Ind,
}

impl PositionCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sal => "SAL",
            Self::Ind => "IND",
        }
    }
}

impl FromStr for PositionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SAL" => Ok(Self::Sal),
            "IND" => Ok(Self::Ind),
            _ => Err(format!("unknown position category: {s} (expected SAL or IND)")),
        }
    }
}

/// Where a request stands. `Filled` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Filled,
}

impl RequestStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Filled];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Filled => "filled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown request status: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestAction {
    Approve,
    Reject,
    Fill,
}

impl RequestAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Fill => "fill",
        }
    }
}

impl fmt::Display for RequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewRequest {
        NewRequest {
            department: "Engineering".into(),
            position: "QA Engineer".into(),
            description: "Own the regression suite.".into(),
            headcount: NonZeroU32::new(2).unwrap(),
            position_type: PositionType::New {
                reason: "New product line".into(),
            },
            category: PositionCategory::Sal,
            confidential: false,
        }
    }

    #[test]
    fn create_starts_pending() {
        let request =
            RecruitingRequest::create(form(), &Catalog::default(), "grace", Timestamp::now())
                .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.requested_by, "grace");
        assert_eq!(request.headcount.get(), 2);
    }

    #[test]
    fn replacement_requires_replaced_person() {
        let mut input = form();
        input.position_type = PositionType::Replacement {
            replaced: " ".into(),
        };

        let err = RecruitingRequest::create(input, &Catalog::default(), "grace", Timestamp::now())
            .unwrap_err();
        assert_eq!(err, ValidationError::Missing("replaced person"));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("ind".parse::<PositionCategory>().unwrap(), PositionCategory::Ind);
        assert!("XYZ".parse::<PositionCategory>().is_err());
    }
}
