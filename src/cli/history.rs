//! Snapshot history commands: save, list, show, rename, delete, diff, progress.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use tracing::instrument;

use crate::model::{EmployeeLevels, MatrixSnapshot, SkillMatrix};
use crate::snapshot::{self, progress_series, team_progress};

use super::format::{format_diff, format_grid, format_percent};
use super::matrix::resolve_matrix;
use super::{Context, resolve, short_id};

#[derive(Debug, Subcommand)]
pub(super) enum HistoryCommand {
    /// List a matrix's snapshots, oldest first.
    List {
        /// Matrix ID: full UUID or unambiguous prefix.
        matrix: String,
    },

    /// Show the grid as it was in one snapshot.
    Show { matrix: String, snapshot: String },

    /// Save levels as a new snapshot and make them the live levels.
    /// Prints the snapshot ID.
    Save {
        matrix: String,

        /// Defaults to today's date.
        #[arg(long)]
        name: Option<String>,

        /// JSON file of `{employee: {skill: level}}` to save instead of the
        /// matrix's current levels.
        #[arg(long)]
        levels: Option<PathBuf>,
    },

    /// Rename a snapshot. Nothing else about it changes.
    Rename {
        matrix: String,
        snapshot: String,
        name: String,
    },

    /// Delete one snapshot.
    Delete { matrix: String, snapshot: String },

    /// Show what changed between two snapshots, or from a snapshot to the
    /// live matrix when `to` is omitted.
    Diff {
        matrix: String,
        from: String,
        to: Option<String>,

        /// Print the diff as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Team progress per snapshot, as a share of the maximum level.
    Progress {
        matrix: String,

        /// Print the series as JSON.
        #[arg(long)]
        json: bool,
    },
}

pub(super) fn run(ctx: &Context<'_>, command: HistoryCommand) -> Result<(), String> {
    match command {
        HistoryCommand::List { matrix } => cmd_list(ctx, &matrix),
        HistoryCommand::Show { matrix, snapshot } => cmd_show(ctx, &matrix, &snapshot),
        HistoryCommand::Save {
            matrix,
            name,
            levels,
        } => cmd_save(ctx, &matrix, name.as_deref(), levels.as_deref()),
        HistoryCommand::Rename {
            matrix,
            snapshot,
            name,
        } => cmd_rename(ctx, &matrix, &snapshot, &name),
        HistoryCommand::Delete { matrix, snapshot } => cmd_delete(ctx, &matrix, &snapshot),
        HistoryCommand::Diff {
            matrix,
            from,
            to,
            json,
        } => cmd_diff(ctx, &matrix, &from, to.as_deref(), json),
        HistoryCommand::Progress { matrix, json } => cmd_progress(ctx, &matrix, json),
    }
}

fn cmd_list(ctx: &Context<'_>, matrix: &str) -> Result<(), String> {
    let (_, snapshots) = load_history(ctx, matrix)?;

    for s in &snapshots {
        println!(
            "{}  {}  {:>6}  {}",
            short_id(s.id),
            s.taken_at.strftime("%Y-%m-%d %H:%M"),
            format_percent(team_progress(&s.skills, &s.members, &s.levels)),
            s.name
        );
    }
    Ok(())
}

fn cmd_show(ctx: &Context<'_>, matrix: &str, snapshot: &str) -> Result<(), String> {
    let (_, snapshots) = load_history(ctx, matrix)?;
    let s = resolve("snapshot", snapshot, snapshots, |s| s.id)?;

    println!("{}  {}  ({})", s.id, s.name, s.taken_at);
    println!();
    for line in format_grid(&s.skills, &s.members, &s.levels) {
        println!("{line}");
    }
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_save(
    ctx: &Context<'_>,
    matrix: &str,
    name: Option<&str>,
    levels_file: Option<&Path>,
) -> Result<(), String> {
    let matrix = resolve_matrix(ctx, matrix)?;
    let levels = match levels_file {
        Some(path) => read_levels(path)?,
        None => matrix.levels.clone(),
    };

    let id = ctx
        .storage
        .save_snapshot(matrix.id, &levels, name)
        .map_err(|e| format!("failed to save snapshot: {e}"))?;

    println!("{id}");
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_rename(ctx: &Context<'_>, matrix: &str, snapshot: &str, name: &str) -> Result<(), String> {
    let (_, snapshots) = load_history(ctx, matrix)?;
    let s = resolve("snapshot", snapshot, snapshots, |s| s.id)?;

    ctx.storage
        .rename_snapshot(s.id, name)
        .map_err(|e| format!("failed to rename snapshot: {e}"))?;

    eprintln!("{} {} → {}", short_id(s.id), s.name, name.trim());
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_delete(ctx: &Context<'_>, matrix: &str, snapshot: &str) -> Result<(), String> {
    let (_, snapshots) = load_history(ctx, matrix)?;
    let s = resolve("snapshot", snapshot, snapshots, |s| s.id)?;

    ctx.storage
        .delete_snapshot(s.id)
        .map_err(|e| format!("failed to delete snapshot: {e}"))?;

    eprintln!("Deleted snapshot {} {}", short_id(s.id), s.name);
    Ok(())
}

fn cmd_diff(
    ctx: &Context<'_>,
    matrix: &str,
    from: &str,
    to: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let (live, snapshots) = load_history(ctx, matrix)?;
    let before = resolve("snapshot", from, snapshots.clone(), |s| s.id)?;

    let (diff, skills, members) = match to {
        Some(to) => {
            let after = resolve("snapshot", to, snapshots, |s| s.id)?;
            let diff = ctx
                .storage
                .diff_snapshots(before.id, after.id)
                .map_err(|e| format!("failed to diff snapshots: {e}"))?;
            (diff, after.skills, after.members)
        }
        None => (
            snapshot::diff(&before.levels, &live.levels),
            live.skills,
            live.members,
        ),
    };

    if json {
        let out = serde_json::to_string_pretty(&diff)
            .map_err(|e| format!("failed to serialize diff: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if diff.is_empty() {
        println!("No changes");
        return Ok(());
    }
    for line in format_diff(&diff, &skills, &members) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_progress(ctx: &Context<'_>, matrix: &str, json: bool) -> Result<(), String> {
    let (_, snapshots) = load_history(ctx, matrix)?;
    let series = progress_series(&snapshots);

    if json {
        let out = serde_json::to_string_pretty(&series)
            .map_err(|e| format!("failed to serialize progress: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    for point in &series {
        println!(
            "{}  {:>6}  {}",
            point.taken_at.strftime("%Y-%m-%d"),
            format_percent(point.percent),
            point.name
        );
    }
    Ok(())
}

/// The live matrix and its snapshots, oldest first.
fn load_history(
    ctx: &Context<'_>,
    matrix: &str,
) -> Result<(SkillMatrix, Vec<MatrixSnapshot>), String> {
    let matrix = resolve_matrix(ctx, matrix)?;
    let snapshots = ctx
        .storage
        .list_snapshots(matrix.id)
        .map_err(|e| format!("failed to list snapshots: {e}"))?;
    Ok((matrix, snapshots))
}

fn read_levels(path: &Path) -> Result<EmployeeLevels, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&contents).map_err(|e| format!("invalid levels in {}: {e}", path.display()))
}
