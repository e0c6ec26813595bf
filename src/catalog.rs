//! The departments, positions and recruiting sources candidates and
//! requests are validated against.
//!
//! A built-in catalog is used unless the config file provides its own.

use std::collections::BTreeMap;

use crate::model::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Department name to the positions open in it.
    pub departments: BTreeMap<String, Vec<String>>,

    /// Recruiting channels a candidate can come through.
    pub sources: Vec<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let departments = [
            (
                "Engineering",
                &["Backend Engineer", "Frontend Engineer", "QA Engineer", "DevOps Engineer"][..],
            ),
            ("Sales", &["Account Executive", "Sales Manager"][..]),
            ("Finance", &["Accountant", "Controller"][..]),
            ("Human Resources", &["Recruiter", "HR Generalist"][..]),
            ("Operations", &["Operations Specialist", "Warehouse Lead"][..]),
        ]
        .into_iter()
        .map(|(department, positions)| {
            (
                department.to_string(),
                positions.iter().map(ToString::to_string).collect(),
            )
        })
        .collect();

        let sources = [
            "LinkedIn",
            "Referral",
            "Job Board",
            "Agency",
            "Career Site",
            "Other",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            departments,
            sources,
        }
    }
}

impl Catalog {
    pub fn check_department(&self, department: &str) -> Result<(), ValidationError> {
        if self.departments.contains_key(department) {
            Ok(())
        } else {
            Err(ValidationError::UnknownDepartment(department.to_string()))
        }
    }

    /// Checks the department exists and the position is open in it.
    pub fn check_position(&self, department: &str, position: &str) -> Result<(), ValidationError> {
        let positions = self
            .departments
            .get(department)
            .ok_or_else(|| ValidationError::UnknownDepartment(department.to_string()))?;
        if positions.iter().any(|p| p == position) {
            Ok(())
        } else {
            Err(ValidationError::UnknownPosition {
                department: department.to_string(),
                position: position.to_string(),
            })
        }
    }

    pub fn check_source(&self, source: &str) -> Result<(), ValidationError> {
        if self.sources.iter().any(|s| s == source) {
            Ok(())
        } else {
            Err(ValidationError::UnknownSource(source.to_string()))
        }
    }
}
