//! Matrix history storage: the append-only snapshot log.
//!
//! Snapshot rows are written once. The only in-place change is the name,
//! done as a single-column update so stored levels are never rewritten.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{EmployeeLevels, MatrixSnapshot, SkillMatrix, ValidationError, required};
use crate::snapshot::{self, LevelDiff};

use super::matrix::{self, load_matrix_in};
use super::{Result, Storage, StorageError, parse_column, parse_id};

const KIND: &str = "snapshot";

const COLUMNS: &str = "id, matrix_id, taken_at, name, skills, members, levels";

impl Storage {
    /// Records the supplied levels as a new snapshot and makes them the
    /// matrix's live levels, in one transaction.
    ///
    /// Skills and members are copied from the live matrix as it stands now.
    /// Saving identical data twice still yields two snapshots.
    pub fn save_snapshot(
        &self,
        matrix_id: Uuid,
        levels: &EmployeeLevels,
        name: Option<&str>,
    ) -> Result<Uuid> {
        let tx = self.conn.unchecked_transaction()?;
        let matrix = load_matrix_in(&tx, matrix_id)?;
        check_levels(&matrix, levels)?;

        let taken_at = Timestamp::now();
        let name = match name {
            Some(name) => required("snapshot name", name)?,
            None => MatrixSnapshot::default_name(taken_at),
        };
        let snapshot = MatrixSnapshot {
            id: Uuid::new_v4(),
            matrix_id,
            taken_at,
            name,
            skills: matrix.skills,
            members: matrix.members,
            levels: levels.clone(),
        };
        insert_snapshot(&tx, &snapshot)?;
        tx.execute(
            "UPDATE skill_matrices SET levels = ?1 WHERE id = ?2",
            params![serde_json::to_string(levels)?, matrix_id.to_string()],
        )?;
        tx.commit()?;

        tracing::info!(id = %snapshot.id, matrix = %matrix_id, name = %snapshot.name, "saved snapshot");
        Ok(snapshot.id)
    }

    pub fn load_snapshot(&self, id: Uuid) -> Result<MatrixSnapshot> {
        self.conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM matrix_history WHERE id = ?1"),
                [id.to_string()],
                SnapshotRow::read,
            )
            .optional()?
            .ok_or(StorageError::NotFound { kind: KIND, id })?
            .into_snapshot()
    }

    /// A matrix's snapshots, oldest first.
    pub fn list_snapshots(&self, matrix_id: Uuid) -> Result<Vec<MatrixSnapshot>> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM skill_matrices WHERE id = ?1",
                [matrix_id.to_string()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(StorageError::NotFound {
                kind: matrix::KIND,
                id: matrix_id,
            });
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COLUMNS} FROM matrix_history WHERE matrix_id = ?1 ORDER BY seq"
        ))?;
        let rows = stmt.query_map([matrix_id.to_string()], SnapshotRow::read)?;
        let mut snapshots = Vec::new();
        for row in rows {
            snapshots.push(row?.into_snapshot()?);
        }
        Ok(snapshots)
    }

    /// Renames a snapshot. Nothing but the name column is written.
    pub fn rename_snapshot(&self, id: Uuid, name: &str) -> Result<()> {
        let name = required("snapshot name", name)?;
        let rows = self.conn.execute(
            "UPDATE matrix_history SET name = ?1 WHERE id = ?2",
            params![&name, id.to_string()],
        )?;
        if rows == 0 {
            return Err(StorageError::NotFound { kind: KIND, id });
        }
        tracing::info!(%id, %name, "renamed snapshot");
        Ok(())
    }

    /// Removes one snapshot. The live matrix and other snapshots are untouched.
    pub fn delete_snapshot(&self, id: Uuid) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM matrix_history WHERE id = ?1", [id.to_string()])?;
        if rows == 0 {
            return Err(StorageError::NotFound { kind: KIND, id });
        }
        tracing::info!(%id, "deleted snapshot");
        Ok(())
    }

    /// Sparse diff from snapshot `a` to snapshot `b`.
    pub fn diff_snapshots(&self, a: Uuid, b: Uuid) -> Result<LevelDiff> {
        let before = self.load_snapshot(a)?;
        let after = self.load_snapshot(b)?;
        Ok(snapshot::diff(&before.levels, &after.levels))
    }
}

/// Appends a snapshot row after the matrix's latest one.
pub(super) fn insert_snapshot(conn: &Connection, snapshot: &MatrixSnapshot) -> Result<()> {
    conn.execute(
        "INSERT INTO matrix_history (id, matrix_id, seq, taken_at, name, skills, members, levels)
         VALUES (?1, ?2,
                 (SELECT COALESCE(MAX(seq), 0) + 1 FROM matrix_history WHERE matrix_id = ?2),
                 ?3, ?4, ?5, ?6, ?7)",
        params![
            snapshot.id.to_string(),
            snapshot.matrix_id.to_string(),
            snapshot.taken_at.to_string(),
            &snapshot.name,
            serde_json::to_string(&snapshot.skills)?,
            serde_json::to_string(&snapshot.members)?,
            serde_json::to_string(&snapshot.levels)?,
        ],
    )?;
    Ok(())
}

/// Every rated pair must name a member and a skill of the matrix.
fn check_levels(matrix: &SkillMatrix, levels: &EmployeeLevels) -> Result<()> {
    for (member, skills) in levels {
        if matrix.member(member).is_none() {
            return Err(ValidationError::UnknownMember(member.clone()).into());
        }
        if let Some(skill) = skills.keys().find(|skill| matrix.skill(skill).is_none()) {
            return Err(ValidationError::UnknownSkill(skill.clone()).into());
        }
    }
    Ok(())
}

struct SnapshotRow {
    id: String,
    matrix_id: String,
    taken_at: String,
    name: String,
    skills: String,
    members: String,
    levels: String,
}

impl SnapshotRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            matrix_id: row.get(1)?,
            taken_at: row.get(2)?,
            name: row.get(3)?,
            skills: row.get(4)?,
            members: row.get(5)?,
            levels: row.get(6)?,
        })
    }

    fn into_snapshot(self) -> Result<MatrixSnapshot> {
        Ok(MatrixSnapshot {
            id: parse_id(&self.id, "snapshot id")?,
            matrix_id: parse_id(&self.matrix_id, "matrix id")?,
            taken_at: parse_column(&self.taken_at, "taken_at")?,
            name: self.name,
            skills: serde_json::from_str(&self.skills)?,
            members: serde_json::from_str(&self.members)?,
            levels: serde_json::from_str(&self.levels)?,
        })
    }
}
