//! Candidate types: a person moving through the recruiting pipeline.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;

use super::{ValidationError, required};

/// A tracked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub department: String,
    pub position: String,

    /// Recruiting channel the candidate came through.
    pub source: String,

    /// When the candidate was obtained from the source.
    pub obtained_on: Date,
    pub interviewer: Option<String>,
    pub status: CandidateStatus,

    /// Dated, append-only notes. One note per line.
    pub notes: String,
    pub cv: Option<DocumentRef>,
    pub assessment: Option<DocumentRef>,
    pub updated_at: Timestamp,

    /// Bumped on every successful write. Updates carrying a stale
    /// version are rejected by the store.
    pub version: u64,
}

/// Form input for adding a candidate.
#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub full_name: String,
    pub department: String,
    pub position: String,
    pub source: String,
    pub obtained_on: Date,
    pub interviewer: Option<String>,
}

impl Candidate {
    /// Validates the form input against the catalog and builds a candidate in `New`.
    ///
    /// The position must be open in the department. This is checked here only;
    /// later catalog edits do not invalidate existing candidates.
    pub fn create(
        input: NewCandidate,
        catalog: &Catalog,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let full_name = required("full name", &input.full_name)?;
        let department = required("department", &input.department)?;
        let position = required("position", &input.position)?;
        let source = required("source", &input.source)?;

        catalog.check_position(&department, &position)?;
        catalog.check_source(&source)?;

        let interviewer = input
            .interviewer
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());

        Ok(Self {
            id: Uuid::new_v4(),
            full_name,
            department,
            position,
            source,
            obtained_on: input.obtained_on,
            interviewer,
            status: CandidateStatus::New,
            notes: String::new(),
            cv: None,
            assessment: None,
            updated_at: now,
            version: 1,
        })
    }

    /// Appends a note prefixed with `today`. Never rewrites earlier notes.
    pub fn append_note(&mut self, text: &str, today: Date) -> Result<(), ValidationError> {
        let text = required("note", text)?;
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(&format!("{today}: {text}"));
        Ok(())
    }

    /// The attached document of the given kind, if any.
    pub fn document(&self, kind: DocumentKind) -> Option<&DocumentRef> {
        match kind {
            DocumentKind::Cv => self.cv.as_ref(),
            DocumentKind::Assessment => self.assessment.as_ref(),
        }
    }

    /// Attaches a document, returning the one it replaces.
    pub fn attach(&mut self, kind: DocumentKind, document: DocumentRef) -> Option<DocumentRef> {
        let slot = match kind {
            DocumentKind::Cv => &mut self.cv,
            DocumentKind::Assessment => &mut self.assessment,
        };
        slot.replace(document)
    }
}

/// Where a candidate stands in the pipeline.
///
/// `Hired` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateStatus {
    New,
    InProcessFirstRound,
    InProcessSecondRound,

    /// Hired; the recruiting source still has to be told.
    HiredPendingSourceContact,

    /// Rejected; the recruiting source still has to be told.
    RejectedPendingSourceInform,
    Hired,
    Rejected,
}

impl CandidateStatus {
    pub const ALL: [Self; 7] = [
        Self::New,
        Self::InProcessFirstRound,
        Self::InProcessSecondRound,
        Self::HiredPendingSourceContact,
        Self::RejectedPendingSourceInform,
        Self::Hired,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProcessFirstRound => "in-process-first-round",
            Self::InProcessSecondRound => "in-process-second-round",
            Self::HiredPendingSourceContact => "hired-pending-source-contact",
            Self::RejectedPendingSourceInform => "rejected-pending-source-inform",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Hired | Self::Rejected)
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown candidate status: {s}"))
    }
}

/// A user action on a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateAction {
    Invite,
    Advance,
    Hire,

    /// Requires a reason, which is appended to the notes.
    Reject,
    ConfirmSourceInformed,
}

impl CandidateAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Invite => "invite",
            Self::Advance => "advance",
            Self::Hire => "hire",
            Self::Reject => "reject",
            Self::ConfirmSourceInformed => "confirm-source-informed",
        }
    }
}

impl fmt::Display for CandidateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two document slots on a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Cv,
    Assessment,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::Assessment => "assessment",
        }
    }
}

/// A document held in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Path relative to the document root.
    pub path: String,

    /// The file name as uploaded.
    pub file_name: String,

    /// Hex SHA-256 of the contents.
    pub sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    fn form() -> NewCandidate {
        NewCandidate {
            full_name: "  Ada Lovelace ".into(),
            department: "Engineering".into(),
            position: "Backend Engineer".into(),
            source: "LinkedIn".into(),
            obtained_on: date(2026, 3, 1),
            interviewer: Some("   ".into()),
        }
    }

    #[test]
    fn create_starts_new_and_trims_input() {
        let candidate = Candidate::create(form(), &Catalog::default(), Timestamp::now()).unwrap();

        assert_eq!(candidate.status, CandidateStatus::New);
        assert_eq!(candidate.full_name, "Ada Lovelace");
        assert_eq!(candidate.interviewer, None);
        assert_eq!(candidate.version, 1);
        assert!(candidate.notes.is_empty());
    }

    #[test]
    fn create_rejects_position_outside_department() {
        let mut input = form();
        input.position = "Account Executive".into();

        let err = Candidate::create(input, &Catalog::default(), Timestamp::now()).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownPosition { .. }));
    }

    #[test]
    fn create_requires_name() {
        let mut input = form();
        input.full_name = String::new();

        let err = Candidate::create(input, &Catalog::default(), Timestamp::now()).unwrap_err();
        assert_eq!(err, ValidationError::Missing("full name"));
    }

    #[test]
    fn notes_are_dated_and_appended() {
        let mut candidate =
            Candidate::create(form(), &Catalog::default(), Timestamp::now()).unwrap();

        candidate.append_note("Strong on SQL", date(2026, 3, 2)).unwrap();
        candidate.append_note("Asked about remote", date(2026, 3, 4)).unwrap();

        assert_eq!(
            candidate.notes,
            "2026-03-02: Strong on SQL\n2026-03-04: Asked about remote"
        );
    }

    #[test]
    fn attach_returns_replaced_document() {
        let mut candidate =
            Candidate::create(form(), &Catalog::default(), Timestamp::now()).unwrap();
        let first = DocumentRef {
            path: "a/cv-1.pdf".into(),
            file_name: "cv.pdf".into(),
            sha256: "11".into(),
        };
        let second = DocumentRef {
            path: "a/cv-2.pdf".into(),
            ..first.clone()
        };

        assert_eq!(candidate.attach(DocumentKind::Cv, first.clone()), None);
        assert_eq!(candidate.attach(DocumentKind::Cv, second), Some(first));
        assert!(candidate.document(DocumentKind::Assessment).is_none());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in CandidateStatus::ALL {
            assert_eq!(status.as_str().parse::<CandidateStatus>().unwrap(), status);
        }
    }
}
