//! Outbound notifications for pipeline events.
//!
//! Delivery is best effort. A failed notification is logged and never undoes
//! or fails the change that triggered it.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;
use uuid::Uuid;

use crate::model::{Candidate, RecruitingRequest};

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to run {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("{program} exited with status {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("notify command is empty")]
    EmptyCommand,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An event worth telling someone about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Notification {
    RequestCreated {
        request_id: Uuid,
        department: String,
        position: String,
        headcount: u32,
        confidential: bool,
        requested_by: String,
    },
    CandidateAdded {
        candidate_id: Uuid,
        full_name: String,
        department: String,
        position: String,
        source: String,
    },
}

impl Notification {
    pub fn request_created(request: &RecruitingRequest) -> Self {
        Self::RequestCreated {
            request_id: request.id,
            department: request.department.clone(),
            position: request.position.clone(),
            headcount: request.headcount.get(),
            confidential: request.confidential,
            requested_by: request.requested_by.clone(),
        }
    }

    pub fn candidate_added(candidate: &Candidate) -> Self {
        Self::CandidateAdded {
            candidate_id: candidate.id,
            full_name: candidate.full_name.clone(),
            department: candidate.department.clone(),
            position: candidate.position.clone(),
            source: candidate.source.clone(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::RequestCreated { .. } => "request-created",
            Self::CandidateAdded { .. } => "candidate-added",
        }
    }
}

/// Somewhere notifications can be delivered.
pub trait Notifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Delivers a notification, logging instead of failing.
pub fn dispatch(notifier: &dyn Notifier, notification: &Notification) {
    match notifier.notify(notification) {
        Ok(()) => tracing::debug!(event = notification.name(), "notification delivered"),
        Err(e) => tracing::warn!(event = notification.name(), error = %e, "notification failed"),
    }
}

/// Appends each notification as one JSON line to a local outbox file.
pub struct OutboxNotifier {
    path: PathBuf,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(notification)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Runs an external command with the notification JSON on stdin.
pub struct CommandNotifier {
    argv: Vec<String>,
}

impl CommandNotifier {
    /// `argv[0]` is the program, the rest are its arguments.
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let (program, args) = self.argv.split_first().ok_or(NotifyError::EmptyCommand)?;
        let payload = serde_json::to_vec(notification)?;
        let output = run_with_stdin(program, args, &payload)?;
        if output.status.success() {
            Ok(())
        } else {
            Err(NotifyError::Failed {
                program: program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Spawn `program`, feed `input` on stdin, and wait for it.
pub(crate) fn run_with_stdin(
    program: &str,
    args: &[String],
    input: &[u8],
) -> Result<std::process::Output, NotifyError> {
    let spawn_err = |source| NotifyError::Spawn {
        program: program.to_string(),
        source,
    };
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(input),
        None => Ok(()),
    };
    let output = child.wait_with_output()?;
    match written {
        // The program chose not to read its input; its exit status decides.
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(output),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    use tempfile::TempDir;

    fn sample() -> Notification {
        Notification::CandidateAdded {
            candidate_id: Uuid::nil(),
            full_name: "Grace Hopper".into(),
            department: "Engineering".into(),
            position: "Backend Engineer".into(),
            source: "Referral".into(),
        }
    }

    #[test]
    fn outbox_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outbox.jsonl");
        let notifier = OutboxNotifier::new(&path);

        notifier.notify(&sample()).unwrap();
        notifier.notify(&sample()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["event"], "candidate-added");
        assert_eq!(value["full_name"], "Grace Hopper");
    }

    #[test]
    fn empty_command_is_an_error() {
        let err = CommandNotifier::new(vec![]).notify(&sample()).unwrap_err();
        assert!(matches!(err, NotifyError::EmptyCommand));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let notifier = CommandNotifier::new(vec!["staffbook-no-such-program".into()]);
        let err = notifier.notify(&sample()).unwrap_err();
        assert!(matches!(err, NotifyError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn program_ignoring_stdin_is_still_waited_for() {
        let input = vec![b'x'; 1 << 20];

        let output = run_with_stdin("true", &[], &input).unwrap();

        assert!(output.status.success());
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_reports_exit_code() {
        let notifier = CommandNotifier::new(vec!["false".into()]);
        let err = notifier.notify(&sample()).unwrap_err();
        assert!(matches!(err, NotifyError::Failed { code: 1, .. }));
    }

    struct Failing {
        calls: RefCell<u32>,
    }

    impl Notifier for Failing {
        fn notify(&self, _: &Notification) -> Result<(), NotifyError> {
            *self.calls.borrow_mut() += 1;
            Err(NotifyError::EmptyCommand)
        }
    }

    #[test]
    fn dispatch_swallows_failures() {
        let notifier = Failing {
            calls: RefCell::new(0),
        };

        dispatch(&notifier, &sample());

        assert_eq!(*notifier.calls.borrow(), 1);
    }
}
