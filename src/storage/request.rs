//! Recruiting request storage.

use std::num::NonZeroU32;

use rusqlite::{OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{Actor, RecruitingRequest, RequestStatus};

use super::{Result, Storage, StorageError, parse_column, parse_id, parse_version, version_param};

const KIND: &str = "recruiting request";

const COLUMNS: &str = "id, department, position, description, headcount, position_type, \
                       category, confidential, status, requested_by, created_at, version";

impl Storage {
    pub fn create_request(&self, request: &RecruitingRequest) -> Result<()> {
        self.conn.execute(
            "INSERT INTO recruiting_requests (id, department, position, description, headcount,
                                              position_type, category, confidential, status,
                                              requested_by, created_at, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                request.id.to_string(),
                &request.department,
                &request.position,
                &request.description,
                request.headcount.get(),
                serde_json::to_string(&request.position_type)?,
                request.category.as_str(),
                request.confidential,
                request.status.as_str(),
                &request.requested_by,
                request.created_at.to_string(),
                version_param(request.version)?,
            ],
        )?;
        tracing::info!(id = %request.id, position = %request.position, "created recruiting request");
        Ok(())
    }

    pub fn load_request(&self, id: Uuid) -> Result<RecruitingRequest> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM recruiting_requests WHERE id = ?1"),
                [id.to_string()],
                RequestRow::read,
            )
            .optional()?
            .ok_or(StorageError::NotFound { kind: KIND, id })?;
        row.into_request()
    }

    /// Lists the requests `actor` may see, newest first.
    pub fn list_requests(
        &self,
        actor: &Actor,
        status: Option<RequestStatus>,
    ) -> Result<Vec<RecruitingRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM recruiting_requests WHERE (?1 IS NULL OR status = ?1)"
        ))?;
        let rows = stmt.query_map([status.map(RequestStatus::as_str)], RequestRow::read)?;

        let mut requests = Vec::new();
        for row in rows {
            let request = row?.into_request()?;
            if actor.sees_request(&request) {
                requests.push(request);
            }
        }
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    /// Writes a request's mutable fields back, guarded by its version.
    pub fn update_request(&self, request: &mut RecruitingRequest) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE recruiting_requests
             SET description = ?1, headcount = ?2, position_type = ?3, category = ?4,
                 confidential = ?5, status = ?6, version = version + 1
             WHERE id = ?7 AND version = ?8",
            params![
                &request.description,
                request.headcount.get(),
                serde_json::to_string(&request.position_type)?,
                request.category.as_str(),
                request.confidential,
                request.status.as_str(),
                request.id.to_string(),
                version_param(request.version)?,
            ],
        )?;
        if rows == 0 {
            return Err(self.missing_or_stale("recruiting_requests", KIND, request.id)?);
        }
        request.version += 1;
        tracing::info!(id = %request.id, status = %request.status, "updated recruiting request");
        Ok(())
    }

    /// Deletes a request unless it has been filled.
    ///
    /// The status is re-read from the store, so a request filled by someone
    /// else in the meantime is still protected.
    pub fn delete_request(&self, id: Uuid) -> Result<()> {
        let request = self.load_request(id)?;
        request.ensure_deletable()?;
        let rows = self.conn.execute(
            "DELETE FROM recruiting_requests WHERE id = ?1 AND status <> ?2",
            params![id.to_string(), RequestStatus::Filled.as_str()],
        )?;
        if rows == 0 {
            return Err(self.missing_or_stale("recruiting_requests", KIND, id)?);
        }
        tracing::info!(%id, "deleted recruiting request");
        Ok(())
    }
}

struct RequestRow {
    id: String,
    department: String,
    position: String,
    description: String,
    headcount: u32,
    position_type: String,
    category: String,
    confidential: bool,
    status: String,
    requested_by: String,
    created_at: String,
    version: i64,
}

impl RequestRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            department: row.get(1)?,
            position: row.get(2)?,
            description: row.get(3)?,
            headcount: row.get(4)?,
            position_type: row.get(5)?,
            category: row.get(6)?,
            confidential: row.get(7)?,
            status: row.get(8)?,
            requested_by: row.get(9)?,
            created_at: row.get(10)?,
            version: row.get(11)?,
        })
    }

    fn into_request(self) -> Result<RecruitingRequest> {
        Ok(RecruitingRequest {
            id: parse_id(&self.id, "request id")?,
            department: self.department,
            position: self.position,
            description: self.description,
            headcount: NonZeroU32::new(self.headcount)
                .ok_or_else(|| StorageError::Corrupt("headcount is zero".into()))?,
            position_type: serde_json::from_str(&self.position_type)?,
            category: parse_column(&self.category, "category")?,
            confidential: self.confidential,
            status: parse_column(&self.status, "request status")?,
            requested_by: self.requested_by,
            created_at: parse_column(&self.created_at, "created_at")?,
            version: parse_version(self.version)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::catalog::Catalog;
    use crate::model::{NewRequest, PositionCategory, PositionType, RequestAction, Role};
    use crate::storage::test_support::test_storage;
    use crate::workflow::WorkflowError;

    fn actor(name: &str, role: Role) -> Actor {
        Actor {
            name: name.into(),
            role,
            department: None,
        }
    }

    fn sample_request(requested_by: &str, confidential: bool) -> RecruitingRequest {
        RecruitingRequest::create(
            NewRequest {
                department: "Operations".into(),
                position: "Warehouse Lead".into(),
                description: "Night shift lead".into(),
                headcount: NonZeroU32::new(3).unwrap(),
                position_type: PositionType::Replacement {
                    replaced: "Dana".into(),
                },
                category: PositionCategory::Ind,
                confidential,
            },
            &Catalog::default(),
            requested_by,
            Timestamp::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_and_load_request() {
        let (_dir, storage) = test_storage();
        let request = sample_request("rita", false);

        storage.create_request(&request).unwrap();

        assert_eq!(storage.load_request(request.id).unwrap(), request);
    }

    #[test]
    fn approve_and_fill_persist() {
        let (_dir, storage) = test_storage();
        let mut request = sample_request("rita", false);
        storage.create_request(&request).unwrap();

        request
            .apply(RequestAction::Approve, &actor("ann", Role::Approver))
            .unwrap();
        storage.update_request(&mut request).unwrap();
        request
            .apply(RequestAction::Fill, &actor("rita", Role::Recruiter))
            .unwrap();
        storage.update_request(&mut request).unwrap();

        let loaded = storage.load_request(request.id).unwrap();
        assert_eq!(loaded.status, RequestStatus::Filled);
        assert_eq!(loaded.version, 3);
    }

    #[test]
    fn filled_request_cannot_be_deleted() {
        let (_dir, storage) = test_storage();
        let mut request = sample_request("rita", false);
        request.status = RequestStatus::Filled;
        storage.create_request(&request).unwrap();

        let err = storage.delete_request(request.id).unwrap_err();

        assert!(matches!(
            err,
            StorageError::Workflow(WorkflowError::FilledRequestLocked)
        ));
        storage.load_request(request.id).unwrap();
    }

    #[test]
    fn unfilled_requests_can_be_deleted() {
        let (_dir, storage) = test_storage();
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            let mut request = sample_request("rita", false);
            request.status = status;
            storage.create_request(&request).unwrap();

            storage.delete_request(request.id).unwrap();
            assert!(matches!(
                storage.load_request(request.id).unwrap_err(),
                StorageError::NotFound { .. }
            ));
        }
    }

    #[test]
    fn confidential_requests_listed_only_for_requester_and_approvers() {
        let (_dir, storage) = test_storage();
        storage.create_request(&sample_request("rita", true)).unwrap();
        storage.create_request(&sample_request("rita", false)).unwrap();

        let count = |actor: &Actor| storage.list_requests(actor, None).unwrap().len();
        assert_eq!(count(&actor("rita", Role::Recruiter)), 2);
        assert_eq!(count(&actor("omar", Role::Recruiter)), 1);
        assert_eq!(count(&actor("ann", Role::Approver)), 2);

        let pending = storage
            .list_requests(&actor("ann", Role::Approver), Some(RequestStatus::Approved))
            .unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn stale_request_update_is_rejected() {
        let (_dir, storage) = test_storage();
        let request = sample_request("rita", false);
        storage.create_request(&request).unwrap();
        let approver = actor("ann", Role::Approver);

        let mut first = storage.load_request(request.id).unwrap();
        let mut second = storage.load_request(request.id).unwrap();
        first.apply(RequestAction::Approve, &approver).unwrap();
        storage.update_request(&mut first).unwrap();
        second.apply(RequestAction::Reject, &approver).unwrap();

        let err = storage.update_request(&mut second).unwrap_err();
        assert!(matches!(err, StorageError::StaleWrite { .. }));
    }
}
