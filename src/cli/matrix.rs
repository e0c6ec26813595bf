//! Skill matrix commands: the live matrix, its skills, members and levels.

use clap::Subcommand;
use jiff::Timestamp;
use tracing::instrument;
use uuid::Uuid;

use crate::generate::{CommandGenerator, GenerateRequest, MatrixGenerator};
use crate::model::{EmployeeLevels, Level, SkillMatrix};
use crate::snapshot::{member_attainment, skill_summaries};

use super::format::{format_grid, format_percent};
use super::{Context, resolve, short_id};

#[derive(Debug, Subcommand)]
pub(super) enum MatrixCommand {
    /// Create a matrix and its `Original` snapshot. Prints the matrix ID.
    New {
        #[arg(long)]
        name: String,

        #[arg(long)]
        department: String,

        /// What the team does. Used by `--generate`.
        #[arg(long, default_value = "")]
        description: String,

        /// Seed skills from the configured generator.
        #[arg(long)]
        generate: bool,
    },

    /// List matrices.
    List,

    /// Show the member by skill grid.
    Show {
        /// Matrix ID: full UUID or unambiguous prefix.
        matrix: String,
    },

    /// Add or remove skills.
    Skill {
        #[command(subcommand)]
        command: SkillCommand,
    },

    /// Add or remove members.
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },

    /// Set a member's level (0-4) for a skill.
    Rate {
        matrix: String,
        member: String,
        skill: String,
        level: Level,
    },

    /// Mark a member's skill as not yet rated.
    Unrate {
        matrix: String,
        member: String,
        skill: String,
    },

    /// Add skills proposed by the configured generator.
    Generate { matrix: String },

    /// Per-skill averages and gaps, and per-member attainment.
    Summary { matrix: String },

    /// Mark a matrix as in use.
    Activate { matrix: String },

    /// Mark a matrix as no longer in use. History is kept.
    Deactivate { matrix: String },

    /// Delete a matrix and all its snapshots.
    Delete { matrix: String },
}

#[derive(Debug, Subcommand)]
pub(super) enum SkillCommand {
    /// Add a skill. Prints the skill ID.
    Add {
        matrix: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        category: String,

        /// Target level (0-4).
        #[arg(long, default_value = "4")]
        target: Level,
    },

    /// Remove a skill and every level recorded for it.
    Remove { matrix: String, skill: String },
}

#[derive(Debug, Subcommand)]
pub(super) enum MemberCommand {
    /// Add a member. Prints the member ID.
    Add {
        matrix: String,

        #[arg(long)]
        name: String,
    },

    /// Remove a member and their levels.
    Remove { matrix: String, member: String },
}

pub(super) fn run(ctx: &Context<'_>, command: MatrixCommand) -> Result<(), String> {
    match command {
        MatrixCommand::New {
            name,
            department,
            description,
            generate,
        } => cmd_new(ctx, &name, &department, &description, generate),
        MatrixCommand::List => cmd_list(ctx),
        MatrixCommand::Show { matrix } => cmd_show(ctx, &matrix),
        MatrixCommand::Skill { command } => match command {
            SkillCommand::Add {
                matrix,
                name,
                category,
                target,
            } => edit(ctx, &matrix, |m| {
                let id = m.add_skill(&name, &category, target).map_err(|e| e.to_string())?;
                println!("{id}");
                Ok(())
            }),
            SkillCommand::Remove { matrix, skill } => edit(ctx, &matrix, |m| {
                let removed = m.remove_skill(&skill).map_err(|e| e.to_string())?;
                eprintln!("Removed skill {}", removed.name);
                Ok(())
            }),
        },
        MatrixCommand::Member { command } => match command {
            MemberCommand::Add { matrix, name } => edit(ctx, &matrix, |m| {
                let id = m.add_member(&name).map_err(|e| e.to_string())?;
                println!("{id}");
                Ok(())
            }),
            MemberCommand::Remove { matrix, member } => edit(ctx, &matrix, |m| {
                let removed = m.remove_member(&member).map_err(|e| e.to_string())?;
                eprintln!("Removed member {}", removed.name);
                Ok(())
            }),
        },
        MatrixCommand::Rate {
            matrix,
            member,
            skill,
            level,
        } => edit(ctx, &matrix, |m| {
            m.set_level(&member, &skill, level)
                .map_err(|e| e.to_string())
        }),
        MatrixCommand::Unrate {
            matrix,
            member,
            skill,
        } => edit(ctx, &matrix, |m| {
            m.clear_level(&member, &skill).map_err(|e| e.to_string())
        }),
        MatrixCommand::Generate { matrix } => edit(ctx, &matrix, |m| generate_into(ctx, m)),
        MatrixCommand::Summary { matrix } => cmd_summary(ctx, &matrix),
        MatrixCommand::Activate { matrix } => edit(ctx, &matrix, |m| {
            m.active = true;
            Ok(())
        }),
        MatrixCommand::Deactivate { matrix } => edit(ctx, &matrix, |m| {
            m.active = false;
            Ok(())
        }),
        MatrixCommand::Delete { matrix } => cmd_delete(ctx, &matrix),
    }
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_new(
    ctx: &Context<'_>,
    name: &str,
    department: &str,
    description: &str,
    generate: bool,
) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("matrix name is required".to_string());
    }
    ctx.catalog
        .check_department(department)
        .map_err(|e| e.to_string())?;
    ctx.require_department(department)?;

    let mut matrix = SkillMatrix {
        id: Uuid::new_v4(),
        name: name.to_string(),
        department: department.to_string(),
        description: description.trim().to_string(),
        active: true,
        skills: Vec::new(),
        members: Vec::new(),
        levels: EmployeeLevels::new(),
        created_at: Timestamp::now(),
    };
    if generate {
        generate_into(ctx, &mut matrix)?;
    }

    let original = ctx
        .storage
        .create_matrix(&matrix)
        .map_err(|e| format!("failed to create matrix: {e}"))?;

    println!("{}", matrix.id);
    eprintln!("Original snapshot {}", short_id(original));
    Ok(())
}

fn cmd_list(ctx: &Context<'_>) -> Result<(), String> {
    let matrices = ctx
        .storage
        .list_matrices(&ctx.actor)
        .map_err(|e| format!("failed to list matrices: {e}"))?;

    if matrices.is_empty() {
        println!("No matrices");
        return Ok(());
    }

    for m in &matrices {
        let state = if m.active { "active" } else { "inactive" };
        println!(
            "{}  [{state}] [{}]  {}  ({} skills, {} members)",
            short_id(m.id),
            m.department,
            m.name,
            m.skills.len(),
            m.members.len()
        );
    }
    Ok(())
}

fn cmd_show(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let matrix = resolve_matrix(ctx, reference)?;

    println!("{}  {} [{}]", matrix.id, matrix.name, matrix.department);
    if !matrix.description.is_empty() {
        println!("{}", matrix.description);
    }
    println!();
    for line in format_grid(&matrix.skills, &matrix.members, &matrix.levels) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_summary(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let matrix = resolve_matrix(ctx, reference)?;

    println!("Skills:");
    for s in skill_summaries(&matrix) {
        let average = s
            .average
            .map_or_else(|| "-".to_string(), |a| format!("{a:.1}"));
        let gap = s.gap.map_or_else(|| "-".to_string(), |g| format!("{g:.1}"));
        println!(
            "  {:<24} target {}  avg {average:>4}  gap {gap:>4}  ({} rated)",
            s.name, s.target_level, s.rated
        );
    }

    println!("Members:");
    for m in &matrix.members {
        println!(
            "  {:<24} {}",
            m.name,
            format_percent(member_attainment(&matrix, &m.id))
        );
    }
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_delete(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let matrix = resolve_matrix(ctx, reference)?;
    ctx.storage
        .delete_matrix(matrix.id)
        .map_err(|e| format!("failed to delete matrix: {e}"))?;

    eprintln!("Deleted {} {} and its history", short_id(matrix.id), matrix.name);
    Ok(())
}

/// Load a matrix, apply `change`, and write it back.
fn edit(
    ctx: &Context<'_>,
    reference: &str,
    change: impl FnOnce(&mut SkillMatrix) -> Result<(), String>,
) -> Result<(), String> {
    let mut matrix = resolve_matrix(ctx, reference)?;
    change(&mut matrix)?;
    ctx.storage
        .update_matrix(&matrix)
        .map_err(|e| format!("failed to update matrix: {e}"))?;
    tracing::debug!(id = %matrix.id, user = %ctx.actor.name, "edited matrix");
    Ok(())
}

/// Ask the generator for skills and add them to `matrix`.
fn generate_into(ctx: &Context<'_>, matrix: &mut SkillMatrix) -> Result<(), String> {
    if matrix.description.is_empty() {
        return Err("the matrix needs a --description to generate skills from".to_string());
    }
    let generator = CommandGenerator::new(ctx.config.generator_command.clone());
    let proposal = generator
        .generate(&GenerateRequest {
            department: matrix.department.clone(),
            description: matrix.description.clone(),
        })
        .map_err(|e| e.to_string())?;

    let added = proposal.apply_to(matrix).map_err(|e| e.to_string())?;
    eprintln!("Generated {} skills", added.len());
    Ok(())
}

/// Resolve a matrix reference among the matrices the actor may see.
pub(super) fn resolve_matrix(ctx: &Context<'_>, reference: &str) -> Result<SkillMatrix, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        let matrix = ctx
            .storage
            .load_matrix(id)
            .map_err(|e| format!("matrix not found: {e}"))?;
        if !ctx.actor.sees_department(&matrix.department) {
            return Err(format!("no matrix matching '{reference}'"));
        }
        return Ok(matrix);
    }

    let matrices = ctx
        .storage
        .list_matrices(&ctx.actor)
        .map_err(|e| format!("failed to list matrices: {e}"))?;
    resolve("matrix", reference, matrices, |m| m.id)
}
