//! Skill matrix types: skills, members, and per-employee levels.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// A skill level in `0..=4`.
///
/// An absent entry in [`SkillLevels`] means "unrated"; `Level(0)` means rated zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("skill level {0} is out of range (0-4)")]
pub struct LevelOutOfRange(pub u8);

impl Level {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(4);

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(LevelOutOfRange(value))
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .parse()
            .map_err(|_| format!("skill level must be a number 0-4, got '{s}'"))?;
        Self::try_from(value).map_err(|e| e.to_string())
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Skill id to level, for one employee.
pub type SkillLevels = BTreeMap<String, Level>;

/// Employee id to that employee's levels.
pub type EmployeeLevels = BTreeMap<String, SkillLevels>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Slug, unique within the matrix.
    pub id: String,
    pub name: String,
    pub category: String,

    /// The level the team is expected to reach. Used for gap scoring.
    pub target_level: Level,
}

/// An employee rated by a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Slug, unique within the matrix.
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatrix {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub description: String,
    pub active: bool,
    pub skills: Vec<Skill>,
    pub members: Vec<Member>,

    /// The live levels. Overwritten whenever a snapshot is saved.
    pub levels: EmployeeLevels,
    pub created_at: Timestamp,
}

impl SkillMatrix {
    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.iter().find(|s| s.id == id)
    }

    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Adds a skill with an id derived from its name. Returns the id.
    pub fn add_skill(
        &mut self,
        name: &str,
        category: &str,
        target_level: Level,
    ) -> Result<String, ValidationError> {
        let name = super::required("skill name", name)?;
        let category = super::required("skill category", category)?;
        let id = unique_slug(&name, |candidate| self.skill(candidate).is_some());
        self.skills.push(Skill {
            id: id.clone(),
            name,
            category,
            target_level,
        });
        Ok(id)
    }

    /// Removes a skill and every level recorded against it.
    pub fn remove_skill(&mut self, id: &str) -> Result<Skill, ValidationError> {
        let index = self
            .skills
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::UnknownSkill(id.to_string()))?;
        for levels in self.levels.values_mut() {
            levels.remove(id);
        }
        self.levels.retain(|_, levels| !levels.is_empty());
        Ok(self.skills.remove(index))
    }

    /// Adds a member with an id derived from their name. Returns the id.
    pub fn add_member(&mut self, name: &str) -> Result<String, ValidationError> {
        let name = super::required("member name", name)?;
        let id = unique_slug(&name, |candidate| self.member(candidate).is_some());
        self.members.push(Member {
            id: id.clone(),
            name,
        });
        Ok(id)
    }

    /// Removes a member and their levels.
    pub fn remove_member(&mut self, id: &str) -> Result<Member, ValidationError> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ValidationError::UnknownMember(id.to_string()))?;
        self.levels.remove(id);
        Ok(self.members.remove(index))
    }

    /// Records a level for a known member and skill.
    pub fn set_level(
        &mut self,
        member: &str,
        skill: &str,
        level: Level,
    ) -> Result<(), ValidationError> {
        self.check_pair(member, skill)?;
        self.levels
            .entry(member.to_string())
            .or_default()
            .insert(skill.to_string(), level);
        Ok(())
    }

    /// Marks a pair as unrated again.
    pub fn clear_level(&mut self, member: &str, skill: &str) -> Result<(), ValidationError> {
        self.check_pair(member, skill)?;
        if let Some(levels) = self.levels.get_mut(member) {
            levels.remove(skill);
            if levels.is_empty() {
                self.levels.remove(member);
            }
        }
        Ok(())
    }

    /// The recorded level, or `None` when unrated.
    pub fn level(&self, member: &str, skill: &str) -> Option<Level> {
        self.levels.get(member)?.get(skill).copied()
    }

    fn check_pair(&self, member: &str, skill: &str) -> Result<(), ValidationError> {
        if self.member(member).is_none() {
            return Err(ValidationError::UnknownMember(member.to_string()));
        }
        if self.skill(skill).is_none() {
            return Err(ValidationError::UnknownSkill(skill.to_string()));
        }
        Ok(())
    }
}

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else become `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("item");
    }
    slug
}

fn unique_slug(name: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = slugify(name);
    if !taken(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or(base)
}
