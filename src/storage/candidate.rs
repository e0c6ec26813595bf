//! Candidate storage: create, load, list, update and delete candidates.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{Actor, Candidate, CandidateStatus, DocumentRef};

use super::{Result, Storage, StorageError, parse_column, parse_id, parse_version, version_param};

const KIND: &str = "candidate";

const COLUMNS: &str = "id, full_name, department, position, source, obtained_on, interviewer, \
                       status, notes, cv, assessment, updated_at, version";

/// Narrows a candidate listing.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub status: Option<CandidateStatus>,
    pub department: Option<String>,
}

impl Storage {
    /// Inserts a new candidate.
    pub fn create_candidate(&self, candidate: &Candidate) -> Result<()> {
        self.conn.execute(
            "INSERT INTO candidates (id, full_name, department, position, source, obtained_on,
                                     interviewer, status, notes, cv, assessment, updated_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                candidate.id.to_string(),
                &candidate.full_name,
                &candidate.department,
                &candidate.position,
                &candidate.source,
                candidate.obtained_on.to_string(),
                &candidate.interviewer,
                candidate.status.as_str(),
                &candidate.notes,
                document_json(candidate.cv.as_ref())?,
                document_json(candidate.assessment.as_ref())?,
                candidate.updated_at.to_string(),
                version_param(candidate.version)?,
            ],
        )?;
        tracing::info!(id = %candidate.id, name = %candidate.full_name, "added candidate");
        Ok(())
    }

    pub fn load_candidate(&self, id: Uuid) -> Result<Candidate> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM candidates WHERE id = ?1"),
                [id.to_string()],
                CandidateRow::read,
            )
            .optional()?
            .ok_or(StorageError::NotFound { kind: KIND, id })?;
        row.into_candidate()
    }

    /// Lists the candidates `actor` may see, most recently updated first.
    pub fn list_candidates(&self, actor: &Actor, filter: &CandidateFilter) -> Result<Vec<Candidate>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM candidates
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR department = ?2)"
        ))?;
        let rows = stmt.query_map(
            params![filter.status.map(CandidateStatus::as_str), &filter.department],
            CandidateRow::read,
        )?;

        let mut candidates = Vec::new();
        for row in rows {
            let candidate = row?.into_candidate()?;
            if actor.sees_department(&candidate.department) {
                candidates.push(candidate);
            }
        }
        candidates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(candidates)
    }

    /// Writes every field of `candidate` back, provided nobody else wrote first.
    ///
    /// On success the candidate's version and `updated_at` are advanced to
    /// match what was stored.
    pub fn update_candidate(&self, candidate: &mut Candidate) -> Result<()> {
        let now = Timestamp::now();
        let rows = self.conn.execute(
            "UPDATE candidates
             SET full_name = ?1, department = ?2, position = ?3, source = ?4, obtained_on = ?5,
                 interviewer = ?6, status = ?7, notes = ?8, cv = ?9, assessment = ?10,
                 updated_at = ?11, version = version + 1
             WHERE id = ?12 AND version = ?13",
            params![
                &candidate.full_name,
                &candidate.department,
                &candidate.position,
                &candidate.source,
                candidate.obtained_on.to_string(),
                &candidate.interviewer,
                candidate.status.as_str(),
                &candidate.notes,
                document_json(candidate.cv.as_ref())?,
                document_json(candidate.assessment.as_ref())?,
                now.to_string(),
                candidate.id.to_string(),
                version_param(candidate.version)?,
            ],
        )?;
        if rows == 0 {
            return Err(self.missing_or_stale("candidates", KIND, candidate.id)?);
        }
        candidate.version += 1;
        candidate.updated_at = now;
        tracing::info!(id = %candidate.id, status = %candidate.status, "updated candidate");
        Ok(())
    }

    /// Deletes a candidate and any documents attached to it.
    ///
    /// Once the row is gone the delete has happened; a failure to remove the
    /// documents is only logged.
    pub fn delete_candidate(&self, id: Uuid) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM candidates WHERE id = ?1", [id.to_string()])?;
        if rows == 0 {
            return Err(StorageError::NotFound { kind: KIND, id });
        }
        tracing::info!(%id, "deleted candidate");
        if let Err(e) = self.remove_candidate_documents(id) {
            tracing::warn!(%id, error = %e, "failed to remove candidate documents");
        }
        Ok(())
    }
}

/// A candidate row as stored, before parsing.
struct CandidateRow {
    id: String,
    full_name: String,
    department: String,
    position: String,
    source: String,
    obtained_on: String,
    interviewer: Option<String>,
    status: String,
    notes: String,
    cv: Option<String>,
    assessment: Option<String>,
    updated_at: String,
    version: i64,
}

impl CandidateRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            full_name: row.get(1)?,
            department: row.get(2)?,
            position: row.get(3)?,
            source: row.get(4)?,
            obtained_on: row.get(5)?,
            interviewer: row.get(6)?,
            status: row.get(7)?,
            notes: row.get(8)?,
            cv: row.get(9)?,
            assessment: row.get(10)?,
            updated_at: row.get(11)?,
            version: row.get(12)?,
        })
    }

    fn into_candidate(self) -> Result<Candidate> {
        Ok(Candidate {
            id: parse_id(&self.id, "candidate id")?,
            full_name: self.full_name,
            department: self.department,
            position: self.position,
            source: self.source,
            obtained_on: parse_column(&self.obtained_on, "obtained_on")?,
            interviewer: self.interviewer,
            status: parse_column(&self.status, "candidate status")?,
            notes: self.notes,
            cv: parse_document(self.cv.as_deref())?,
            assessment: parse_document(self.assessment.as_deref())?,
            updated_at: parse_column(&self.updated_at, "updated_at")?,
            version: parse_version(self.version)?,
        })
    }
}

fn document_json(document: Option<&DocumentRef>) -> Result<Option<String>> {
    Ok(document.map(serde_json::to_string).transpose()?)
}

fn parse_document(json: Option<&str>) -> Result<Option<DocumentRef>> {
    Ok(json.map(serde_json::from_str).transpose()?)
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    use jiff::civil::date;

    use crate::catalog::Catalog;
    use crate::model::{CandidateAction, NewCandidate, Role};
    use crate::storage::test_support::test_storage;

    fn admin() -> Actor {
        Actor {
            name: "root".into(),
            role: Role::Admin,
            department: None,
        }
    }

    pub(in crate::storage) fn sample_candidate(
        name: &str,
        department: &str,
        position: &str,
    ) -> Candidate {
        Candidate::create(
            NewCandidate {
                full_name: name.into(),
                department: department.into(),
                position: position.into(),
                source: "Agency".into(),
                obtained_on: date(2026, 5, 4),
                interviewer: Some("Grace".into()),
            },
            &Catalog::default(),
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_and_load_candidate() {
        let (_dir, storage) = test_storage();
        let candidate = sample_candidate("Ada", "Engineering", "QA Engineer");

        storage.create_candidate(&candidate).unwrap();
        let loaded = storage.load_candidate(candidate.id).unwrap();

        assert_eq!(loaded, candidate);
    }

    #[test]
    fn load_nonexistent_candidate_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.load_candidate(Uuid::new_v4()).unwrap_err();

        assert!(matches!(err, StorageError::NotFound { kind: "candidate", .. }));
    }

    #[test]
    fn update_persists_transition_and_bumps_version() {
        let (_dir, storage) = test_storage();
        let mut candidate = sample_candidate("Ada", "Engineering", "QA Engineer");
        storage.create_candidate(&candidate).unwrap();

        candidate
            .apply(CandidateAction::Invite, None, date(2026, 5, 5))
            .unwrap();
        storage.update_candidate(&mut candidate).unwrap();

        let loaded = storage.load_candidate(candidate.id).unwrap();
        assert_eq!(loaded.status, CandidateStatus::InProcessFirstRound);
        assert_eq!(loaded.version, 2);
        assert_eq!(candidate.version, 2);
    }

    #[test]
    fn stale_update_is_rejected() {
        let (_dir, storage) = test_storage();
        let candidate = sample_candidate("Ada", "Engineering", "QA Engineer");
        storage.create_candidate(&candidate).unwrap();

        let mut first = storage.load_candidate(candidate.id).unwrap();
        let mut second = storage.load_candidate(candidate.id).unwrap();

        first
            .apply(CandidateAction::Invite, None, date(2026, 5, 5))
            .unwrap();
        storage.update_candidate(&mut first).unwrap();

        second
            .apply(CandidateAction::Reject, Some("Too late"), date(2026, 5, 5))
            .unwrap();
        let err = storage.update_candidate(&mut second).unwrap_err();

        assert!(matches!(err, StorageError::StaleWrite { .. }));
        let stored = storage.load_candidate(candidate.id).unwrap();
        assert_eq!(stored.status, CandidateStatus::InProcessFirstRound);
        assert!(stored.notes.is_empty());
    }

    #[test]
    fn update_nonexistent_candidate_fails() {
        let (_dir, storage) = test_storage();
        let mut candidate = sample_candidate("Ada", "Engineering", "QA Engineer");

        let err = storage.update_candidate(&mut candidate).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn list_filters_by_status_department_and_visibility() {
        let (_dir, storage) = test_storage();
        let mut ada = sample_candidate("Ada", "Engineering", "QA Engineer");
        let bob = sample_candidate("Bob", "Sales", "Account Executive");
        storage.create_candidate(&ada).unwrap();
        storage.create_candidate(&bob).unwrap();
        ada.apply(CandidateAction::Invite, None, date(2026, 5, 5))
            .unwrap();
        storage.update_candidate(&mut ada).unwrap();

        let all = storage
            .list_candidates(&admin(), &CandidateFilter::default())
            .unwrap();
        assert_eq!(all.len(), 2);

        let new_only = storage
            .list_candidates(
                &admin(),
                &CandidateFilter {
                    status: Some(CandidateStatus::New),
                    department: None,
                },
            )
            .unwrap();
        assert_eq!(new_only.len(), 1);
        assert_eq!(new_only[0].full_name, "Bob");

        let sales_recruiter = Actor {
            name: "rita".into(),
            role: Role::Recruiter,
            department: Some("Sales".into()),
        };
        let visible = storage
            .list_candidates(&sales_recruiter, &CandidateFilter::default())
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].department, "Sales");
    }

    #[test]
    fn delete_candidate_removes_row() {
        let (_dir, storage) = test_storage();
        let candidate = sample_candidate("Ada", "Engineering", "QA Engineer");
        storage.create_candidate(&candidate).unwrap();

        storage.delete_candidate(candidate.id).unwrap();

        assert!(matches!(
            storage.load_candidate(candidate.id).unwrap_err(),
            StorageError::NotFound { .. }
        ));
        assert!(matches!(
            storage.delete_candidate(candidate.id).unwrap_err(),
            StorageError::NotFound { .. }
        ));
    }

    #[test]
    fn delete_succeeds_when_documents_cannot_be_removed() {
        let (_dir, storage) = test_storage();
        let candidate = sample_candidate("Ada", "Engineering", "QA Engineer");
        storage.create_candidate(&candidate).unwrap();
        let documents = storage.root().join("documents");
        std::fs::create_dir_all(&documents).unwrap();
        // A plain file where the candidate's directory belongs.
        std::fs::write(documents.join(candidate.id.to_string()), "not a dir").unwrap();

        storage.delete_candidate(candidate.id).unwrap();

        assert!(matches!(
            storage.load_candidate(candidate.id).unwrap_err(),
            StorageError::NotFound { .. }
        ));
    }
}
