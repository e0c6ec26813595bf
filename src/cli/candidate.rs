//! Candidate commands: add, list, show, workflow actions, notes, documents.

use std::fs;
use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use jiff::Timestamp;
use jiff::civil::Date;
use tracing::instrument;
use uuid::Uuid;

use crate::model::{Candidate, CandidateAction, CandidateStatus, DocumentKind, NewCandidate};
use crate::notify::Notification;
use crate::storage::CandidateFilter;

use super::format::{format_actions, format_candidate_row, print_notes};
use super::{Context, resolve, short_id, today};

#[derive(Debug, Subcommand)]
pub(super) enum CandidateCommand {
    /// Add a candidate. Prints the candidate ID.
    Add {
        /// Full name.
        #[arg(long)]
        name: String,

        #[arg(long)]
        department: String,

        /// Must be one of the department's open positions.
        #[arg(long)]
        position: String,

        /// Recruiting source (e.g. "Referral").
        #[arg(long)]
        source: String,

        /// When the candidate came in (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        obtained_on: Option<Date>,

        #[arg(long)]
        interviewer: Option<String>,
    },

    /// List candidates, most recently updated first.
    List {
        #[arg(long)]
        status: Option<CandidateStatus>,

        #[arg(long)]
        department: Option<String>,
    },

    /// Show one candidate with notes, documents and next actions.
    Show {
        /// Candidate ID: full UUID or unambiguous prefix.
        candidate: String,
    },

    /// Invite a new candidate to the first interview round.
    Invite { candidate: String },

    /// Move a candidate from the first to the second round.
    Advance { candidate: String },

    /// Hire a candidate. The source still has to be told afterwards.
    Hire { candidate: String },

    /// Reject a candidate. The reason is appended to the notes.
    Reject {
        candidate: String,

        #[arg(long)]
        reason: String,
    },

    /// Record that the recruiting source was told about the outcome.
    Confirm { candidate: String },

    /// Append a dated note.
    Note { candidate: String, text: String },

    /// Attach a CV or assessment, replacing any previous one of that kind.
    Attach {
        candidate: String,

        #[arg(long, value_enum)]
        kind: DocumentKindArg,

        file: PathBuf,
    },

    /// Download an attached document.
    Fetch {
        candidate: String,

        #[arg(long, value_enum)]
        kind: DocumentKindArg,

        /// Where to write it. Defaults to the original file name.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete a candidate and their documents.
    Delete { candidate: String },
}

/// CLI-facing document kind, mapped to the domain `DocumentKind`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub(super) enum DocumentKindArg {
    Cv,
    Assessment,
}

impl DocumentKindArg {
    fn to_domain(self) -> DocumentKind {
        match self {
            Self::Cv => DocumentKind::Cv,
            Self::Assessment => DocumentKind::Assessment,
        }
    }
}

pub(super) fn run(ctx: &Context<'_>, command: CandidateCommand) -> Result<(), String> {
    match command {
        CandidateCommand::Add {
            name,
            department,
            position,
            source,
            obtained_on,
            interviewer,
        } => cmd_add(
            ctx,
            NewCandidate {
                full_name: name,
                department,
                position,
                source,
                obtained_on: obtained_on.unwrap_or_else(today),
                interviewer,
            },
        ),
        CandidateCommand::List { status, department } => {
            cmd_list(ctx, &CandidateFilter { status, department })
        }
        CandidateCommand::Show { candidate } => cmd_show(ctx, &candidate),
        CandidateCommand::Invite { candidate } => {
            cmd_transition(ctx, &candidate, CandidateAction::Invite, None)
        }
        CandidateCommand::Advance { candidate } => {
            cmd_transition(ctx, &candidate, CandidateAction::Advance, None)
        }
        CandidateCommand::Hire { candidate } => {
            cmd_transition(ctx, &candidate, CandidateAction::Hire, None)
        }
        CandidateCommand::Reject { candidate, reason } => {
            cmd_transition(ctx, &candidate, CandidateAction::Reject, Some(&reason))
        }
        CandidateCommand::Confirm { candidate } => cmd_transition(
            ctx,
            &candidate,
            CandidateAction::ConfirmSourceInformed,
            None,
        ),
        CandidateCommand::Note { candidate, text } => cmd_note(ctx, &candidate, &text),
        CandidateCommand::Attach {
            candidate,
            kind,
            file,
        } => cmd_attach(ctx, &candidate, kind.to_domain(), &file),
        CandidateCommand::Fetch {
            candidate,
            kind,
            out,
        } => cmd_fetch(ctx, &candidate, kind.to_domain(), out),
        CandidateCommand::Delete { candidate } => cmd_delete(ctx, &candidate),
    }
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_add(ctx: &Context<'_>, input: NewCandidate) -> Result<(), String> {
    ctx.require_department(&input.department)?;
    let candidate =
        Candidate::create(input, &ctx.catalog, Timestamp::now()).map_err(|e| e.to_string())?;

    ctx.storage
        .create_candidate(&candidate)
        .map_err(|e| format!("failed to add candidate: {e}"))?;
    ctx.notify(&Notification::candidate_added(&candidate));

    println!("{}", candidate.id);
    Ok(())
}

fn cmd_list(ctx: &Context<'_>, filter: &CandidateFilter) -> Result<(), String> {
    let candidates = ctx
        .storage
        .list_candidates(&ctx.actor, filter)
        .map_err(|e| format!("failed to list candidates: {e}"))?;

    if candidates.is_empty() {
        println!("No candidates");
        return Ok(());
    }

    for c in &candidates {
        println!("{}", format_candidate_row(c));
    }
    Ok(())
}

fn cmd_show(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let c = resolve_candidate(ctx, reference)?;

    println!("{}  {}", c.id, c.full_name);
    println!("Status:      {}", c.status);
    println!("Position:    {} / {}", c.department, c.position);
    println!("Source:      {} (since {})", c.source, c.obtained_on);
    if let Some(interviewer) = &c.interviewer {
        println!("Interviewer: {interviewer}");
    }
    for kind in [DocumentKind::Cv, DocumentKind::Assessment] {
        if let Some(doc) = c.document(kind) {
            println!("{:<12} {}", format!("{}:", kind.as_str()), doc.file_name);
        }
    }
    println!("Updated:     {}", c.updated_at);
    println!("Next:        {}", format_actions(c.status.available_actions()));
    print_notes(&c.notes);
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_transition(
    ctx: &Context<'_>,
    reference: &str,
    action: CandidateAction,
    reason: Option<&str>,
) -> Result<(), String> {
    let mut candidate = resolve_candidate(ctx, reference)?;
    let previous = candidate
        .apply(action, reason, today())
        .map_err(|e| e.to_string())?;

    ctx.storage
        .update_candidate(&mut candidate)
        .map_err(|e| format!("failed to update candidate: {e}"))?;

    eprintln!(
        "{} {}: {previous} → {}",
        short_id(candidate.id),
        candidate.full_name,
        candidate.status
    );
    if !candidate.status.is_terminal() {
        eprintln!("Next: {}", format_actions(candidate.status.available_actions()));
    }
    Ok(())
}

#[instrument(skip(ctx, text), fields(user = %ctx.actor.name))]
fn cmd_note(ctx: &Context<'_>, reference: &str, text: &str) -> Result<(), String> {
    let mut candidate = resolve_candidate(ctx, reference)?;
    candidate
        .append_note(text, today())
        .map_err(|e| e.to_string())?;

    ctx.storage
        .update_candidate(&mut candidate)
        .map_err(|e| format!("failed to update candidate: {e}"))?;

    eprintln!("Note added to {}", candidate.full_name);
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_attach(
    ctx: &Context<'_>,
    reference: &str,
    kind: DocumentKind,
    file: &std::path::Path,
) -> Result<(), String> {
    let mut candidate = resolve_candidate(ctx, reference)?;
    let document = ctx
        .storage
        .attach_document(&mut candidate, kind, file)
        .map_err(|e| format!("failed to attach {}: {e}", file.display()))?;

    eprintln!(
        "Attached {} as {} for {}",
        document.file_name,
        kind.as_str(),
        candidate.full_name
    );
    Ok(())
}

fn cmd_fetch(
    ctx: &Context<'_>,
    reference: &str,
    kind: DocumentKind,
    out: Option<PathBuf>,
) -> Result<(), String> {
    let candidate = resolve_candidate(ctx, reference)?;
    let document = candidate.document(kind).ok_or_else(|| {
        format!(
            "{} has no {} attached",
            candidate.full_name,
            kind.as_str()
        )
    })?;

    let bytes = ctx
        .storage
        .download_document(document)
        .map_err(|e| format!("failed to download {}: {e}", document.file_name))?;
    let path = out.unwrap_or_else(|| PathBuf::from(&document.file_name));
    fs::write(&path, bytes).map_err(|e| format!("failed to write {}: {e}", path.display()))?;

    eprintln!("Saved {} → {}", document.file_name, path.display());
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_delete(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let candidate = resolve_candidate(ctx, reference)?;
    ctx.storage
        .delete_candidate(candidate.id)
        .map_err(|e| format!("failed to delete candidate: {e}"))?;

    eprintln!("Deleted {} {}", short_id(candidate.id), candidate.full_name);
    Ok(())
}

/// Resolve a candidate reference among the candidates the actor may see.
fn resolve_candidate(ctx: &Context<'_>, reference: &str) -> Result<Candidate, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        let candidate = ctx
            .storage
            .load_candidate(id)
            .map_err(|e| format!("candidate not found: {e}"))?;
        if !ctx.actor.sees_department(&candidate.department) {
            return Err(format!("no candidate matching '{reference}'"));
        }
        return Ok(candidate);
    }

    let candidates = ctx
        .storage
        .list_candidates(&ctx.actor, &CandidateFilter::default())
        .map_err(|e| format!("failed to list candidates: {e}"))?;
    resolve("candidate", reference, candidates, |c| c.id)
}
