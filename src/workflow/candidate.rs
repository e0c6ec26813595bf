//! Candidate pipeline: New, two interview rounds, then hired or rejected
//! with a confirmation step once the recruiting source has been told.

use jiff::civil::Date;

use crate::model::{Candidate, CandidateAction, CandidateStatus};

use super::WorkflowError;

impl CandidateStatus {
    /// Actions that have an edge out of this status.
    pub fn available_actions(self) -> &'static [CandidateAction] {
        use CandidateAction::{Advance, ConfirmSourceInformed, Hire, Invite, Reject};

        match self {
            Self::New => &[Invite, Reject],
            Self::InProcessFirstRound => &[Advance, Hire, Reject],
            Self::InProcessSecondRound => &[Hire, Reject],
            Self::HiredPendingSourceContact | Self::RejectedPendingSourceInform => {
                &[ConfirmSourceInformed]
            }
            Self::Hired | Self::Rejected => &[],
        }
    }

    /// The status reached by taking `action` from `self`.
    pub fn next(self, action: CandidateAction) -> Result<Self, WorkflowError> {
        use CandidateAction::{Advance, ConfirmSourceInformed, Hire, Invite, Reject};

        let next = match (self, action) {
            (Self::New, Invite) => Self::InProcessFirstRound,
            (Self::InProcessFirstRound, Advance) => Self::InProcessSecondRound,
            (Self::InProcessFirstRound | Self::InProcessSecondRound, Hire) => {
                Self::HiredPendingSourceContact
            }
            (Self::New | Self::InProcessFirstRound | Self::InProcessSecondRound, Reject) => {
                Self::RejectedPendingSourceInform
            }
            (Self::HiredPendingSourceContact, ConfirmSourceInformed) => Self::Hired,
            (Self::RejectedPendingSourceInform, ConfirmSourceInformed) => Self::Rejected,
            (from, action) => {
                return Err(WorkflowError::InvalidCandidateTransition { from, action });
            }
        };
        Ok(next)
    }
}

impl Candidate {
    /// Applies a workflow action in memory. Returns the previous status.
    ///
    /// `reject` needs a non-empty `reason`; it is appended to the notes
    /// as a dated line. Other actions ignore `reason`.
    pub fn apply(
        &mut self,
        action: CandidateAction,
        reason: Option<&str>,
        today: Date,
    ) -> Result<CandidateStatus, WorkflowError> {
        let next = self.status.next(action)?;

        if action == CandidateAction::Reject {
            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or(WorkflowError::MissingReason)?;
            self.append_note(&format!("Rejected: {reason}"), today)
                .map_err(|_| WorkflowError::MissingReason)?;
        }

        let previous = self.status;
        self.status = next;
        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use jiff::civil::date;

    use crate::catalog::Catalog;
    use crate::model::NewCandidate;

    fn candidate() -> Candidate {
        Candidate::create(
            NewCandidate {
                full_name: "Ada Lovelace".into(),
                department: "Engineering".into(),
                position: "Backend Engineer".into(),
                source: "Referral".into(),
                obtained_on: date(2026, 1, 10),
                interviewer: None,
            },
            &Catalog::default(),
            Timestamp::now(),
        )
        .unwrap()
    }

    const ALL_ACTIONS: [CandidateAction; 5] = [
        CandidateAction::Invite,
        CandidateAction::Advance,
        CandidateAction::Hire,
        CandidateAction::Reject,
        CandidateAction::ConfirmSourceInformed,
    ];

    #[test]
    fn hire_path_ends_terminal() {
        let mut c = candidate();
        let today = date(2026, 2, 1);

        c.apply(CandidateAction::Invite, None, today).unwrap();
        assert_eq!(c.status, CandidateStatus::InProcessFirstRound);
        c.apply(CandidateAction::Hire, None, today).unwrap();
        assert_eq!(c.status, CandidateStatus::HiredPendingSourceContact);
        c.apply(CandidateAction::ConfirmSourceInformed, None, today)
            .unwrap();
        assert_eq!(c.status, CandidateStatus::Hired);

        assert!(c.status.is_terminal());
        for action in ALL_ACTIONS {
            assert!(c.apply(action, Some("again"), today).is_err());
        }
        assert_eq!(c.status, CandidateStatus::Hired);
    }

    #[test]
    fn first_round_offers_exactly_advance_hire_reject() {
        let status = CandidateStatus::InProcessFirstRound;
        assert_eq!(
            status.available_actions(),
            &[
                CandidateAction::Advance,
                CandidateAction::Hire,
                CandidateAction::Reject
            ]
        );
        for action in [CandidateAction::Invite, CandidateAction::ConfirmSourceInformed] {
            assert_eq!(
                status.next(action),
                Err(WorkflowError::InvalidCandidateTransition {
                    from: status,
                    action
                })
            );
        }
    }

    #[test]
    fn available_actions_match_transition_function() {
        for status in CandidateStatus::ALL {
            for action in ALL_ACTIONS {
                let offered = status.available_actions().contains(&action);
                assert_eq!(offered, status.next(action).is_ok(), "{status} / {action}");
            }
        }
    }

    #[test]
    fn reject_appends_dated_reason_after_existing_notes() {
        let mut c = candidate();
        c.append_note("Great portfolio", date(2026, 1, 11)).unwrap();
        let before = c.notes.clone();

        c.apply(CandidateAction::Reject, Some("Salary mismatch"), date(2026, 1, 20))
            .unwrap();

        assert_eq!(c.status, CandidateStatus::RejectedPendingSourceInform);
        assert!(c.notes.starts_with(&before));
        assert!(c.notes.ends_with("2026-01-20: Rejected: Salary mismatch"));
    }

    #[test]
    fn reject_without_reason_changes_nothing() {
        let mut c = candidate();

        let err = c
            .apply(CandidateAction::Reject, Some("   "), date(2026, 1, 20))
            .unwrap_err();

        assert_eq!(err, WorkflowError::MissingReason);
        assert_eq!(c.status, CandidateStatus::New);
        assert!(c.notes.is_empty());
    }

    #[test]
    fn rejected_confirmation_reaches_rejected() {
        let mut c = candidate();
        let today = date(2026, 1, 20);
        c.apply(CandidateAction::Invite, None, today).unwrap();
        c.apply(CandidateAction::Advance, None, today).unwrap();
        c.apply(CandidateAction::Reject, Some("No show"), today)
            .unwrap();
        let previous = c
            .apply(CandidateAction::ConfirmSourceInformed, None, today)
            .unwrap();

        assert_eq!(previous, CandidateStatus::RejectedPendingSourceInform);
        assert_eq!(c.status, CandidateStatus::Rejected);
    }
}
