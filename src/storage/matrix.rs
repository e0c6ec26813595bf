//! Skill matrix storage: the live matrix row.
//!
//! Creating a matrix also writes its first history entry, so every matrix
//! has at least one snapshot to compare against.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

use crate::model::{Actor, MatrixSnapshot, ORIGINAL_SNAPSHOT_NAME, SkillMatrix};

use super::history::insert_snapshot;
use super::{Result, Storage, StorageError, parse_column, parse_id};

pub(super) const KIND: &str = "skill matrix";

const COLUMNS: &str = "id, name, department, description, active, skills, members, levels, created_at";

impl Storage {
    /// Inserts a matrix together with its `Original` snapshot.
    /// Returns the snapshot id.
    pub fn create_matrix(&self, matrix: &SkillMatrix) -> Result<Uuid> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("INSERT INTO skill_matrices ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                matrix.id.to_string(),
                &matrix.name,
                &matrix.department,
                &matrix.description,
                matrix.active,
                serde_json::to_string(&matrix.skills)?,
                serde_json::to_string(&matrix.members)?,
                serde_json::to_string(&matrix.levels)?,
                matrix.created_at.to_string(),
            ],
        )?;
        let original = MatrixSnapshot {
            id: Uuid::new_v4(),
            matrix_id: matrix.id,
            taken_at: matrix.created_at,
            name: ORIGINAL_SNAPSHOT_NAME.to_string(),
            skills: matrix.skills.clone(),
            members: matrix.members.clone(),
            levels: matrix.levels.clone(),
        };
        insert_snapshot(&tx, &original)?;
        tx.commit()?;
        tracing::info!(id = %matrix.id, name = %matrix.name, "created skill matrix");
        Ok(original.id)
    }

    pub fn load_matrix(&self, id: Uuid) -> Result<SkillMatrix> {
        load_matrix_in(&self.conn, id)
    }

    /// Lists the matrices `actor` may see, by name.
    pub fn list_matrices(&self, actor: &Actor) -> Result<Vec<SkillMatrix>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM skill_matrices ORDER BY name"))?;
        let rows = stmt.query_map([], MatrixRow::read)?;
        let mut matrices = Vec::new();
        for row in rows {
            let matrix = row?.into_matrix()?;
            if actor.sees_department(&matrix.department) {
                matrices.push(matrix);
            }
        }
        Ok(matrices)
    }

    /// Overwrites the live matrix. Last write wins; history is untouched.
    pub fn update_matrix(&self, matrix: &SkillMatrix) -> Result<()> {
        let rows = self.conn.execute(
            "UPDATE skill_matrices
             SET name = ?1, department = ?2, description = ?3, active = ?4,
                 skills = ?5, members = ?6, levels = ?7
             WHERE id = ?8",
            params![
                &matrix.name,
                &matrix.department,
                &matrix.description,
                matrix.active,
                serde_json::to_string(&matrix.skills)?,
                serde_json::to_string(&matrix.members)?,
                serde_json::to_string(&matrix.levels)?,
                matrix.id.to_string(),
            ],
        )?;
        if rows == 0 {
            return Err(StorageError::NotFound {
                kind: KIND,
                id: matrix.id,
            });
        }
        tracing::info!(id = %matrix.id, "updated skill matrix");
        Ok(())
    }

    /// Deletes a matrix and its whole history.
    pub fn delete_matrix(&self, id: Uuid) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM skill_matrices WHERE id = ?1", [id.to_string()])?;
        if rows == 0 {
            return Err(StorageError::NotFound { kind: KIND, id });
        }
        tracing::info!(%id, "deleted skill matrix");
        Ok(())
    }
}

/// Loads a matrix through any connection, including an open transaction.
pub(super) fn load_matrix_in(conn: &Connection, id: Uuid) -> Result<SkillMatrix> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM skill_matrices WHERE id = ?1"),
        [id.to_string()],
        MatrixRow::read,
    )
    .optional()?
    .ok_or(StorageError::NotFound { kind: KIND, id })?
    .into_matrix()
}

struct MatrixRow {
    id: String,
    name: String,
    department: String,
    description: String,
    active: bool,
    skills: String,
    members: String,
    levels: String,
    created_at: String,
}

impl MatrixRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            department: row.get(2)?,
            description: row.get(3)?,
            active: row.get(4)?,
            skills: row.get(5)?,
            members: row.get(6)?,
            levels: row.get(7)?,
            created_at: row.get(8)?,
        })
    }

    fn into_matrix(self) -> Result<SkillMatrix> {
        Ok(SkillMatrix {
            id: parse_id(&self.id, "matrix id")?,
            name: self.name,
            department: self.department,
            description: self.description,
            active: self.active,
            skills: serde_json::from_str(&self.skills)?,
            members: serde_json::from_str(&self.members)?,
            levels: serde_json::from_str(&self.levels)?,
            created_at: parse_column::<Timestamp>(&self.created_at, "created_at")?,
        })
    }
}
