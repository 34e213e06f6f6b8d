//! Medical history database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::MedicalHistoryEntry;

impl Database {
    pub fn insert_history(&self, entry: &MedicalHistoryEntry) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO medical_history (patient_username, date, notes) VALUES (?1, ?2, ?3)",
            params![entry.patient, entry.date, entry.notes],
        )?;
        Ok(())
    }

    pub fn get_history_entry(
        &self,
        patient: &str,
        date: NaiveDate,
    ) -> DbResult<Option<MedicalHistoryEntry>> {
        self.conn
            .query_row(
                "SELECT patient_username, date, notes FROM medical_history WHERE patient_username = ?1 AND date = ?2",
                params![patient, date],
                |row| {
                    Ok(MedicalHistoryEntry {
                        patient: row.get(0)?,
                        date: row.get(1)?,
                        notes: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Replace the notes of an existing entry.
    pub fn update_history_notes(&self, patient: &str, date: NaiveDate, notes: &str) -> DbResult<bool> {
        let rows = self.conn.execute(
            "UPDATE medical_history SET notes = ?3 WHERE patient_username = ?1 AND date = ?2",
            params![patient, date, notes],
        )?;
        Ok(rows > 0)
    }

    /// Entries for a patient, newest first, optionally capped.
    pub fn list_history(
        &self,
        patient: &str,
        limit: Option<usize>,
    ) -> DbResult<Vec<MedicalHistoryEntry>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            r#"
            SELECT patient_username, date, notes
            FROM medical_history
            WHERE patient_username = ?1
            ORDER BY date DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![patient, limit], |row| {
            Ok(MedicalHistoryEntry {
                patient: row.get(0)?,
                date: row.get(1)?,
                notes: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
