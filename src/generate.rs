//! Skill matrix generation from a job description.
//!
//! The generator itself is an external program. It receives a
//! [`GenerateRequest`] as JSON on stdin and answers with a
//! [`GeneratedMatrix`] as JSON on stdout.

use serde::{Deserialize, Serialize};

use crate::model::{Level, SkillMatrix, ValidationError};
use crate::notify::{NotifyError, run_with_stdin};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("no generator configured: set `generator-command` in the config file")]
    NotConfigured,

    #[error("generator failed: {0}")]
    Command(#[from] NotifyError),

    #[error("generator exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("generator returned an invalid proposal: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("generator proposed no skills")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub department: String,
    pub description: String,
}

/// A proposed set of skills, grouped by category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedMatrix {
    pub categories: Vec<GeneratedCategory>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedCategory {
    pub name: String,
    pub skills: Vec<GeneratedSkill>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedSkill {
    pub name: String,
    pub target_level: Level,
}

impl GeneratedMatrix {
    /// Parses generator output.
    pub fn parse(output: &str) -> Result<Self, GenerateError> {
        let proposal: Self = serde_json::from_str(output)?;
        if proposal.skill_count() == 0 {
            return Err(GenerateError::Empty);
        }
        Ok(proposal)
    }

    pub fn skill_count(&self) -> usize {
        self.categories.iter().map(|c| c.skills.len()).sum()
    }

    /// Adds every proposed skill to `matrix`. Returns the new skill ids.
    pub fn apply_to(&self, matrix: &mut SkillMatrix) -> Result<Vec<String>, ValidationError> {
        let mut ids = Vec::with_capacity(self.skill_count());
        for category in &self.categories {
            for skill in &category.skills {
                ids.push(matrix.add_skill(&skill.name, &category.name, skill.target_level)?);
            }
        }
        Ok(ids)
    }
}

/// Proposes skills for a role.
pub trait MatrixGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<GeneratedMatrix, GenerateError>;
}

/// Runs the configured generator program.
pub struct CommandGenerator {
    argv: Vec<String>,
}

impl CommandGenerator {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl MatrixGenerator for CommandGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<GeneratedMatrix, GenerateError> {
        let (program, args) = self.argv.split_first().ok_or(GenerateError::NotConfigured)?;
        let input = serde_json::to_vec(request)?;
        tracing::info!(%program, department = %request.department, "requesting skill proposal");

        let output = run_with_stdin(program, args, &input)?;
        if !output.status.success() {
            return Err(GenerateError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        GeneratedMatrix::parse(&String::from_utf8_lossy(&output.stdout))
    }
}
