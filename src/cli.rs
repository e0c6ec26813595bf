//! CLI interface for staffbook.
//!
//! Each subcommand is non-interactive: arguments in, plain text out.
//!
//! Commands split into four groups:
//!
//! - `staffbook candidate ...`: the candidate pipeline.
//! - `staffbook request ...`: recruiting requests and their approval.
//! - `staffbook matrix ...`: skill matrices, their skills, members and levels.
//! - `staffbook history ...`: saved matrix snapshots, diffs and progress.
//!
//! Entity IDs take a full UUID or an unambiguous prefix.

mod candidate;
mod format;
mod history;
mod matrix;
mod request;

use clap::{ArgAction, Parser, Subcommand};
use jiff::civil::Date;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::identity::resolve_actor;
use crate::model::Actor;
use crate::notify::{self, CommandNotifier, Notification, Notifier, OutboxNotifier};
use crate::storage::Storage;

use candidate::CandidateCommand;
use history::HistoryCommand;
use matrix::MatrixCommand;
use request::RequestCommand;

/// Staffbook: recruiting pipeline and skill matrices.
#[derive(Debug, Parser)]
#[command(name = "staffbook", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Act as this user instead of `STAFFBOOK_USER` or the configured user.
    #[arg(long = "as", global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: hiring for an approved request
  1. staffbook request new --department Sales --position "Account Executive" \
       --description "Mid-market" --new-position "Expansion"
  2. staffbook --as ann request approve 3f2
  3. staffbook candidate add --name "Grace Hopper" --department Sales \
       --position "Account Executive" --source Referral
  4. staffbook candidate invite 9c1
  5. staffbook candidate hire 9c1 && staffbook candidate confirm 9c1
  6. staffbook request fill 3f2

Workflow: tracking a team's skills
  1. staffbook matrix new --name Backend --department Engineering
  2. staffbook matrix skill add 5ab --name Rust --category Languages --target 4
  3. staffbook matrix member add 5ab --name Ada
  4. staffbook matrix rate 5ab ada rust 3
  5. staffbook history save 5ab --name "Q3 review"
  6. staffbook history progress 5ab"#;

#[derive(Debug, Subcommand)]
enum Command {
    /// Candidates moving through the hiring pipeline.
    Candidate {
        #[command(subcommand)]
        command: CandidateCommand,
    },

    /// Recruiting requests: headcount asks and their approval.
    Request {
        #[command(subcommand)]
        command: RequestCommand,
    },

    /// Skill matrices: the live view of a team's skills.
    Matrix {
        #[command(subcommand)]
        command: MatrixCommand,
    },

    /// Saved matrix snapshots.
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Everything a command needs, resolved once per invocation.
struct Context<'a> {
    storage: &'a Storage,
    config: &'a Config,
    actor: Actor,
    catalog: Catalog,
}

impl Context<'_> {
    /// Delivers a notification through the configured channel.
    fn notify(&self, notification: &Notification) {
        let notifier: Box<dyn Notifier> = if self.config.notify_command.is_empty() {
            Box::new(OutboxNotifier::new(self.storage.root().join("outbox.jsonl")))
        } else {
            Box::new(CommandNotifier::new(self.config.notify_command.clone()))
        };
        notify::dispatch(notifier.as_ref(), notification);
    }

    /// Fails unless the actor may work in `department`.
    fn require_department(&self, department: &str) -> Result<(), String> {
        if self.actor.sees_department(department) {
            Ok(())
        } else {
            Err(format!(
                "{} works in {} and cannot act on {department}",
                self.actor.name,
                self.actor.department.as_deref().unwrap_or("no department"),
            ))
        }
    }
}

/// Run a parsed command line, returning an error message on failure.
///
/// The config and the store are only opened here, after parsing, so `--help`
/// and usage errors never touch the disk.
pub fn run(cli: Cli) -> Result<(), String> {
    setup_logging(cli.verbose);

    let config = Config::load()?;
    let storage = open_storage(&config)?;
    let actor = resolve_actor(cli.user.as_deref(), &config)?;
    let ctx = Context {
        storage: &storage,
        config: &config,
        actor,
        catalog: config.catalog(),
    };

    match cli.command {
        Command::Candidate { command } => candidate::run(&ctx, command),
        Command::Request { command } => request::run(&ctx, command),
        Command::Matrix { command } => matrix::run(&ctx, command),
        Command::History { command } => history::run(&ctx, command),
    }
}

/// Opens the store under the configured data directory, or the default one.
fn open_storage(config: &Config) -> Result<Storage, String> {
    let root = config
        .data_dir
        .clone()
        .or_else(Storage::default_root)
        .ok_or_else(|| "could not determine home directory".to_string())?;
    Storage::new(root).map_err(|e| format!("failed to initialize storage: {e}"))
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Today's date in the local time zone.
fn today() -> Date {
    jiff::Zoned::now().date()
}

/// First eight characters of an id, for display.
fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Resolve a reference (full UUID or unambiguous prefix) against `items`.
fn resolve<T>(
    kind: &str,
    reference: &str,
    items: Vec<T>,
    id_of: impl Fn(&T) -> Uuid,
) -> Result<T, String> {
    let reference = reference.trim().to_ascii_lowercase();
    if reference.is_empty() {
        return Err(format!("empty {kind} reference"));
    }

    // A full UUID is just the longest possible prefix.
    let mut matches: Vec<T> = items
        .into_iter()
        .filter(|item| id_of(item).to_string().starts_with(&reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no {kind} matching '{reference}'")),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(|item| short_id(id_of(item))).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {n} of them: {}",
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    fn ids() -> Vec<Uuid> {
        [
            "a3b0fc12-0000-4000-8000-000000000001",
            "a3b1aa00-0000-4000-8000-000000000002",
            "ffee0000-0000-4000-8000-000000000003",
        ]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn help_is_handled_by_the_parser() {
        let err = Cli::try_parse_from(["staffbook", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn storage_opens_under_configured_data_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: Some(dir.path().join("store")),
            ..Config::default()
        };

        let storage = open_storage(&config).unwrap();

        assert_eq!(storage.root(), dir.path().join("store"));
        assert!(dir.path().join("store").join("staffbook.sqlite").is_file());
    }

    #[test]
    fn resolve_unique_prefix() {
        let found = resolve("candidate", "ff", ids(), |id| *id).unwrap();
        assert_eq!(found, ids()[2]);
    }

    #[test]
    fn resolve_full_uuid_case_insensitively() {
        let full = ids()[0].to_string().to_uppercase();
        assert_eq!(resolve("candidate", &full, ids(), |id| *id).unwrap(), ids()[0]);
    }

    #[test]
    fn resolve_ambiguous_prefix() {
        let err = resolve("request", "a3b", ids(), |id| *id).unwrap_err();
        assert!(err.contains("ambiguous"));
        assert!(err.contains("a3b0fc12"));
    }

    #[test]
    fn resolve_no_match() {
        let err = resolve("matrix", "0", ids(), |id| *id).unwrap_err();
        assert_eq!(err, "no matrix matching '0'");
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "staffbook", "candidate", "list", "--as", "ann", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("ann"));
        assert_eq!(cli.verbose, 2);
    }
}
