//! Who is acting, and what they may see and do.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RecruitingRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,

    /// May approve or reject recruiting requests.
    Approver,

    #[default]
    Recruiter,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Approver => "approver",
            Self::Recruiter => "recruiter",
        }
    }

    pub fn can_approve(self) -> bool {
        matches!(self, Self::Admin | Self::Approver)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "approver" => Ok(Self::Approver),
            "recruiter" => Ok(Self::Recruiter),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// The resolved acting user.
///
/// Passed explicitly to every operation that checks permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: Role,

    /// Restricts a recruiter to one department. Ignored for approvers and admins.
    pub department: Option<String>,
}

impl Actor {
    pub fn sees_department(&self, department: &str) -> bool {
        if self.role.can_approve() {
            return true;
        }
        self.department.as_deref().is_none_or(|d| d == department)
    }

    /// Confidential requests are visible to approvers and to whoever raised them.
    pub fn sees_request(&self, request: &RecruitingRequest) -> bool {
        if self.role.can_approve() {
            return true;
        }
        if request.confidential && request.requested_by != self.name {
            return false;
        }
        self.sees_department(&request.department)
    }
}
