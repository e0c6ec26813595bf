//! Output formatting for CLI display.

use crate::model::{
    Candidate, CandidateAction, EmployeeLevels, Member, PositionType, RecruitingRequest, Skill,
};
use crate::snapshot::LevelDiff;

use super::short_id;

pub(super) fn format_candidate_row(c: &Candidate) -> String {
    format!(
        "{}  [{}] [{}]  {}  ({})",
        short_id(c.id),
        c.status,
        c.department,
        c.full_name,
        c.position
    )
}

pub(super) fn format_request_row(r: &RecruitingRequest) -> String {
    let confidential = if r.confidential { " [confidential]" } else { "" };
    format!(
        "{}  [{}] [{}]  {} x{}  by {}{confidential}",
        short_id(r.id),
        r.status,
        r.department,
        r.position,
        r.headcount,
        r.requested_by
    )
}

pub(super) fn format_position_type(position_type: &PositionType) -> String {
    match position_type {
        PositionType::New { reason } => format!("new position ({reason})"),
        PositionType::Replacement { replaced } => format!("replacing {replaced}"),
    }
}

/// The CLI commands for a set of workflow actions.
pub(super) fn format_actions(actions: &[CandidateAction]) -> String {
    if actions.is_empty() {
        return "none".to_string();
    }
    actions
        .iter()
        .map(|a| match a {
            CandidateAction::Invite => "invite",
            CandidateAction::Advance => "advance",
            CandidateAction::Hire => "hire",
            CandidateAction::Reject => "reject",
            CandidateAction::ConfirmSourceInformed => "confirm",
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn print_notes(notes: &str) {
    if notes.is_empty() {
        return;
    }
    println!();
    println!("Notes:");
    for line in notes.lines() {
        println!("  {line}");
    }
}

pub(super) fn format_percent(percent: Option<f64>) -> String {
    percent.map_or_else(|| "-".to_string(), |p| format!("{p:.1}%"))
}

/// Members down, skills across. Unrated cells show `-`.
pub(super) fn format_grid(
    skills: &[Skill],
    members: &[Member],
    levels: &EmployeeLevels,
) -> Vec<String> {
    if skills.is_empty() || members.is_empty() {
        return vec!["(no skills or members yet)".to_string()];
    }

    let name_width = members
        .iter()
        .map(|m| m.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    let widths: Vec<usize> = skills.iter().map(|s| s.id.len().max(3)).collect();

    let mut lines = Vec::with_capacity(members.len() + 2);
    let mut header = format!("{:<name_width$}", "");
    for (skill, width) in skills.iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", skill.id));
    }
    lines.push(header);

    let mut targets = format!("{:<name_width$}", "target");
    for (skill, width) in skills.iter().zip(&widths) {
        targets.push_str(&format!("  {:>width$}", skill.target_level.get()));
    }
    lines.push(targets);

    for member in members {
        let mut row = format!("{:<name_width$}", member.name);
        let member_levels = levels.get(&member.id);
        for (skill, width) in skills.iter().zip(&widths) {
            let cell = member_levels
                .and_then(|l| l.get(&skill.id))
                .map_or_else(|| "-".to_string(), ToString::to_string);
            row.push_str(&format!("  {cell:>width$}"));
        }
        lines.push(row);
    }
    lines
}

/// One line per changed pair, using display names where known.
pub(super) fn format_diff(diff: &LevelDiff, skills: &[Skill], members: &[Member]) -> Vec<String> {
    let member_name = |id: &str| {
        members
            .iter()
            .find(|m| m.id == id)
            .map_or_else(|| id.to_string(), |m| m.name.clone())
    };
    let skill_name = |id: &str| {
        skills
            .iter()
            .find(|s| s.id == id)
            .map_or_else(|| id.to_string(), |s| s.name.clone())
    };

    let mut lines = Vec::new();
    for (member, changes) in diff {
        lines.push(member_name(member.as_str()));
        for (skill, change) in changes {
            lines.push(format!(
                "  {}: {} → {} ({:+})",
                skill_name(skill.as_str()),
                change.before,
                change.after,
                change.change
            ));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::model::Level;
    use crate::snapshot::LevelChange;

    fn skill(id: &str, target: u8) -> Skill {
        Skill {
            id: id.into(),
            name: id.to_uppercase(),
            category: "Core".into(),
            target_level: Level::try_from(target).unwrap(),
        }
    }

    fn member(id: &str, name: &str) -> Member {
        Member {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn actions_use_command_names() {
        assert_eq!(
            format_actions(&[CandidateAction::Reject, CandidateAction::ConfirmSourceInformed]),
            "reject, confirm"
        );
        assert_eq!(format_actions(&[]), "none");
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(Some(50.0)), "50.0%");
        assert_eq!(format_percent(Some(100.0 / 3.0)), "33.3%");
        assert_eq!(format_percent(None), "-");
    }

    #[test]
    fn grid_marks_unrated_cells() {
        let skills = [skill("rust", 4), skill("sql", 3)];
        let members = [member("ada", "Ada"), member("linus", "Linus")];
        let mut ada = BTreeMap::new();
        ada.insert("rust".into(), Level::try_from(3).unwrap());
        ada.insert("sql".into(), Level::ZERO);
        let levels: EmployeeLevels = [("ada".to_string(), ada)].into_iter().collect();

        let lines = format_grid(&skills, &members, &levels);

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "        rust  sql");
        assert_eq!(lines[1], "target     4    3");
        assert_eq!(lines[2], "Ada        3    0");
        assert_eq!(lines[3], "Linus      -    -");
    }

    #[test]
    fn empty_grid() {
        assert_eq!(
            format_grid(&[], &[], &EmployeeLevels::new()),
            ["(no skills or members yet)"]
        );
    }

    #[test]
    fn diff_lines_use_names() {
        let mut changes = BTreeMap::new();
        changes.insert(
            "rust".to_string(),
            LevelChange {
                before: 2,
                after: 4,
                change: 2,
            },
        );
        let mut diff = LevelDiff::new();
        diff.insert("ada".to_string(), changes);
        diff.insert(
            "gone".to_string(),
            [(
                "sql".to_string(),
                LevelChange {
                    before: 1,
                    after: 0,
                    change: -1,
                },
            )]
            .into_iter()
            .collect(),
        );

        let lines = format_diff(&diff, &[skill("rust", 4)], &[member("ada", "Ada")]);

        assert_eq!(
            lines,
            ["Ada", "  RUST: 2 → 4 (+2)", "gone", "  sql: 1 → 0 (-1)"]
        );
    }
}
