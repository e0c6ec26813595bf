//! Recruiting request commands: new, list, show, approve, reject, fill, delete.

use std::num::NonZeroU32;

use clap::Subcommand;
use jiff::Timestamp;
use tracing::instrument;
use uuid::Uuid;

use crate::model::{
    NewRequest, PositionCategory, PositionType, RecruitingRequest, RequestAction, RequestStatus,
};
use crate::notify::Notification;

use super::format::{format_position_type, format_request_row};
use super::{Context, resolve, short_id};

#[derive(Debug, Subcommand)]
pub(super) enum RequestCommand {
    /// Raise a recruiting request. Prints the request ID.
    New {
        #[arg(long)]
        department: String,

        #[arg(long)]
        position: String,

        /// Job description.
        #[arg(long)]
        description: String,

        /// How many people to hire.
        #[arg(long, default_value = "1")]
        headcount: NonZeroU32,

        /// SAL (salaried) or IND (hourly).
        #[arg(long, default_value = "SAL")]
        category: PositionCategory,

        /// This is a new position; the value is the reason it is needed.
        #[arg(long, conflicts_with = "replacing", required_unless_present = "replacing")]
        new_position: Option<String>,

        /// This replaces someone; the value is who is being replaced.
        #[arg(long)]
        replacing: Option<String>,

        /// Hide from recruiters other than you.
        #[arg(long)]
        confidential: bool,
    },

    /// List requests, newest first.
    List {
        #[arg(long)]
        status: Option<RequestStatus>,
    },

    /// Show one request.
    Show {
        /// Request ID: full UUID or unambiguous prefix.
        request: String,
    },

    /// Approve a pending request. Approvers and admins only.
    Approve { request: String },

    /// Reject a pending request. Approvers and admins only.
    Reject { request: String },

    /// Mark an approved request as filled.
    Fill { request: String },

    /// Delete a request. Filled requests are kept.
    Delete { request: String },
}

pub(super) fn run(ctx: &Context<'_>, command: RequestCommand) -> Result<(), String> {
    match command {
        RequestCommand::New {
            department,
            position,
            description,
            headcount,
            category,
            new_position,
            replacing,
            confidential,
        } => {
            let position_type = match (new_position, replacing) {
                (Some(reason), None) => PositionType::New { reason },
                (None, Some(replaced)) => PositionType::Replacement { replaced },
                _ => return Err("pass exactly one of --new-position or --replacing".to_string()),
            };
            cmd_new(
                ctx,
                NewRequest {
                    department,
                    position,
                    description,
                    headcount,
                    position_type,
                    category,
                    confidential,
                },
            )
        }
        RequestCommand::List { status } => cmd_list(ctx, status),
        RequestCommand::Show { request } => cmd_show(ctx, &request),
        RequestCommand::Approve { request } => cmd_transition(ctx, &request, RequestAction::Approve),
        RequestCommand::Reject { request } => cmd_transition(ctx, &request, RequestAction::Reject),
        RequestCommand::Fill { request } => cmd_transition(ctx, &request, RequestAction::Fill),
        RequestCommand::Delete { request } => cmd_delete(ctx, &request),
    }
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_new(ctx: &Context<'_>, input: NewRequest) -> Result<(), String> {
    ctx.require_department(&input.department)?;
    let request =
        RecruitingRequest::create(input, &ctx.catalog, &ctx.actor.name, Timestamp::now())
            .map_err(|e| e.to_string())?;

    ctx.storage
        .create_request(&request)
        .map_err(|e| format!("failed to create request: {e}"))?;
    ctx.notify(&Notification::request_created(&request));

    println!("{}", request.id);
    Ok(())
}

fn cmd_list(ctx: &Context<'_>, status: Option<RequestStatus>) -> Result<(), String> {
    let requests = ctx
        .storage
        .list_requests(&ctx.actor, status)
        .map_err(|e| format!("failed to list requests: {e}"))?;

    if requests.is_empty() {
        println!("No requests");
        return Ok(());
    }

    for r in &requests {
        println!("{}", format_request_row(r));
    }
    Ok(())
}

fn cmd_show(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let r = resolve_request(ctx, reference)?;

    println!("{}", r.id);
    println!("Status:       {}", r.status);
    println!("Position:     {} / {} x{}", r.department, r.position, r.headcount);
    println!("Category:     {}", r.category.as_str());
    println!("Type:         {}", format_position_type(&r.position_type));
    println!("Requested by: {} at {}", r.requested_by, r.created_at);
    if r.confidential {
        println!("Confidential");
    }
    let next: Vec<&str> = r
        .status
        .available_actions()
        .iter()
        .map(|a| a.as_str())
        .collect();
    if !next.is_empty() {
        println!("Next:         {}", next.join(", "));
    }
    println!();
    println!("{}", r.description);
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name, role = %ctx.actor.role))]
fn cmd_transition(ctx: &Context<'_>, reference: &str, action: RequestAction) -> Result<(), String> {
    let mut request = resolve_request(ctx, reference)?;
    let previous = request
        .apply(action, &ctx.actor)
        .map_err(|e| e.to_string())?;

    ctx.storage
        .update_request(&mut request)
        .map_err(|e| format!("failed to update request: {e}"))?;

    eprintln!(
        "{} {}: {previous} → {}",
        short_id(request.id),
        request.position,
        request.status
    );
    Ok(())
}

#[instrument(skip(ctx), fields(user = %ctx.actor.name))]
fn cmd_delete(ctx: &Context<'_>, reference: &str) -> Result<(), String> {
    let request = resolve_request(ctx, reference)?;
    ctx.storage
        .delete_request(request.id)
        .map_err(|e| format!("failed to delete request: {e}"))?;

    eprintln!("Deleted {} {}", short_id(request.id), request.position);
    Ok(())
}

/// Resolve a request reference among the requests the actor may see.
fn resolve_request(ctx: &Context<'_>, reference: &str) -> Result<RecruitingRequest, String> {
    if let Ok(id) = reference.parse::<Uuid>() {
        let request = ctx
            .storage
            .load_request(id)
            .map_err(|e| format!("request not found: {e}"))?;
        if !ctx.actor.sees_request(&request) {
            return Err(format!("no request matching '{reference}'"));
        }
        return Ok(request);
    }

    let requests = ctx
        .storage
        .list_requests(&ctx.actor, None)
        .map_err(|e| format!("failed to list requests: {e}"))?;
    resolve("request", reference, requests, |r| r.id)
}
