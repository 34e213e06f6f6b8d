//! Care assignment database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};

/// A nurse joined with their current doctor, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NurseRow {
    pub username: String,
    pub name: String,
    pub doctor: Option<String>,
}

impl Database {
    /// Doctor currently holding a nurse.
    pub fn doctor_for_nurse(&self, nurse: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT doctor_username FROM care_assignments WHERE nurse_username = ?",
                [nurse],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Remove every assignment of a nurse, whichever doctor holds it.
    pub fn clear_nurse_assignment(&self, nurse: &str) -> DbResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM care_assignments WHERE nurse_username = ?", [nurse])?;
        Ok(rows)
    }

    pub fn insert_assignment(&self, doctor: &str, nurse: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO care_assignments (doctor_username, nurse_username) VALUES (?1, ?2)",
            params![doctor, nurse],
        )?;
        Ok(())
    }

    /// Delete one specific pairing. Returns false if it did not exist.
    pub fn delete_assignment(&self, doctor: &str, nurse: &str) -> DbResult<bool> {
        let rows = self.conn.execute(
            "DELETE FROM care_assignments WHERE doctor_username = ?1 AND nurse_username = ?2",
            params![doctor, nurse],
        )?;
        Ok(rows > 0)
    }

    /// Nurses on one doctor's team, ordered by username.
    pub fn nurses_for_doctor(&self, doctor: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT nurse_username FROM care_assignments WHERE doctor_username = ? ORDER BY nurse_username",
        )?;
        let rows = stmt.query_map([doctor], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_nurses_for_doctor(&self, doctor: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM care_assignments WHERE doctor_username = ?",
            [doctor],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Every nurse account with its current doctor, ordered by username.
    pub fn list_nurses_with_doctor(&self) -> DbResult<Vec<NurseRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT u.username, u.name, a.doctor_username
            FROM users u
            LEFT JOIN care_assignments a ON a.nurse_username = u.username
            WHERE u.role = 'nurse'
            ORDER BY u.username
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(NurseRow {
                username: row.get(0)?,
                name: row.get(1)?,
                doctor: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
