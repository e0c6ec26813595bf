//! Computations over skill matrix snapshots: sparse diffs, team progress,
//! and per-skill / per-member attainment against targets.
//!
//! Everything here is pure. Loading and saving snapshots lives in
//! [`crate::storage`].

use std::collections::{BTreeMap, BTreeSet};

use jiff::Timestamp;
use serde::Serialize;
use uuid::Uuid;

use crate::model::{EmployeeLevels, Level, MatrixSnapshot, Member, Skill, SkillMatrix};

/// One changed employee/skill pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelChange {
    pub before: u8,
    pub after: u8,
    pub change: i8,
}

/// Employee id to skill id to change. Only changed pairs are present.
pub type LevelDiff = BTreeMap<String, BTreeMap<String, LevelChange>>;

/// Compares two sets of levels.
///
/// Employees and skills are unioned across both sides; a missing entry
/// counts as level 0. Pairs with equal levels are left out, as are
/// employees with no changed pair.
pub fn diff(before: &EmployeeLevels, after: &EmployeeLevels) -> LevelDiff {
    let employees: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
    let mut result = LevelDiff::new();

    for employee in employees {
        let old = before.get(employee);
        let new = after.get(employee);
        let skills: BTreeSet<&String> = old
            .into_iter()
            .flat_map(|levels| levels.keys())
            .chain(new.into_iter().flat_map(|levels| levels.keys()))
            .collect();

        let mut changes = BTreeMap::new();
        for skill in skills {
            let b = level_or_zero(old.and_then(|levels| levels.get(skill)));
            let a = level_or_zero(new.and_then(|levels| levels.get(skill)));
            if a != b {
                changes.insert(
                    skill.clone(),
                    LevelChange {
                        before: b,
                        after: a,
                        // Both sides are in 0..=4, so the difference fits.
                        change: i8::try_from(i16::from(a) - i16::from(b)).unwrap_or_default(),
                    },
                );
            }
        }
        if !changes.is_empty() {
            result.insert(employee.clone(), changes);
        }
    }
    result
}

fn level_or_zero(level: Option<&Level>) -> u8 {
    level.copied().unwrap_or(Level::ZERO).get()
}

/// Percentage of the maximum attainable level reached by the employees
/// present in the snapshot, over the snapshot's own skills.
///
/// The employees are the snapshot's members plus anyone with recorded
/// levels. Unrated pairs count as 0. `None` when there are no employees or
/// no skills to divide by.
pub fn team_progress(
    skills: &[Skill],
    members: &[Member],
    levels: &EmployeeLevels,
) -> Option<f64> {
    let employees: BTreeSet<&str> = members
        .iter()
        .map(|m| m.id.as_str())
        .chain(levels.keys().map(String::as_str))
        .collect();
    if employees.is_empty() || skills.is_empty() {
        return None;
    }
    let attained: u32 = levels
        .values()
        .flat_map(|employee| {
            skills
                .iter()
                .filter_map(|skill| employee.get(&skill.id))
                .map(|level| u32::from(level.get()))
        })
        .sum();
    let possible = employees.len() * skills.len() * usize::from(Level::MAX.get());
    Some(percentage(f64::from(attained), possible as f64))
}

/// A point on the team progress chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    pub snapshot_id: Uuid,
    pub name: String,
    pub taken_at: Timestamp,
    pub percent: Option<f64>,
}

/// One point per snapshot, in the order given.
pub fn progress_series(snapshots: &[MatrixSnapshot]) -> Vec<ProgressPoint> {
    snapshots
        .iter()
        .map(|snapshot| ProgressPoint {
            snapshot_id: snapshot.id,
            name: snapshot.name.clone(),
            taken_at: snapshot.taken_at,
            percent: team_progress(&snapshot.skills, &snapshot.members, &snapshot.levels),
        })
        .collect()
}

/// How the team stands on one skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    pub skill_id: String,
    pub name: String,
    pub target_level: u8,

    /// Members with an entry for this skill, rated zero included.
    pub rated: usize,

    /// Mean over rated members. `None` when nobody is rated.
    pub average: Option<f64>,

    /// Target minus average, floored at zero.
    pub gap: Option<f64>,
}

pub fn skill_summaries(matrix: &SkillMatrix) -> Vec<SkillSummary> {
    matrix
        .skills
        .iter()
        .map(|skill| {
            let rated: Vec<u8> = matrix
                .members
                .iter()
                .filter_map(|member| matrix.level(&member.id, &skill.id))
                .map(Level::get)
                .collect();
            let average = if rated.is_empty() {
                None
            } else {
                let total: u32 = rated.iter().copied().map(u32::from).sum();
                Some(f64::from(total) / rated.len() as f64)
            };
            let target = skill.target_level.get();
            SkillSummary {
                skill_id: skill.id.clone(),
                name: skill.name.clone(),
                target_level: target,
                rated: rated.len(),
                average,
                gap: average.map(|avg| (f64::from(target) - avg).max(0.0)),
            }
        })
        .collect()
}

/// Share of their targets a member reaches, with levels above target capped.
///
/// Unrated skills count as zero. `None` when every target is zero.
pub fn member_attainment(matrix: &SkillMatrix, member: &str) -> Option<f64> {
    let (reached, wanted) = matrix
        .skills
        .iter()
        .fold((0u32, 0u32), |(reached, wanted), skill| {
            let target = skill.target_level.get();
            let level = matrix.level(member, &skill.id).map_or(0, Level::get);
            (
                reached + u32::from(level.min(target)),
                wanted + u32::from(target),
            )
        });
    if wanted == 0 {
        return None;
    }
    Some(percentage(f64::from(reached), f64::from(wanted)))
}

fn percentage(part: f64, whole: f64) -> f64 {
    part / whole * 100.0
}
