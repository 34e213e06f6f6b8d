//! Patient profile database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::PatientProfile;

const PROFILE_COLUMNS: &str = "username, name, phone, email, gender, date_of_birth, \
                               blood_group, assigned_doctor, patient_type";

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<PatientProfile> {
    Ok(PatientProfile {
        username: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        gender: row.get(4)?,
        date_of_birth: row.get(5)?,
        blood_group: row.get(6)?,
        assigned_doctor: row.get(7)?,
        patient_type: row.get(8)?,
    })
}

impl Database {
    /// Insert a new patient profile.
    pub fn insert_profile(&self, profile: &PatientProfile) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patient_profiles (
                username, name, phone, email, gender, date_of_birth,
                blood_group, assigned_doctor, patient_type
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                profile.username,
                profile.name,
                profile.phone,
                profile.email,
                profile.gender,
                profile.date_of_birth,
                profile.blood_group,
                profile.assigned_doctor,
                profile.patient_type,
            ],
        )?;
        Ok(())
    }

    /// Update the editable profile fields (not the assigned doctor).
    pub fn update_profile(&self, profile: &PatientProfile) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patient_profiles SET
                name = ?2,
                phone = ?3,
                email = ?4,
                gender = ?5,
                date_of_birth = ?6,
                blood_group = ?7
            WHERE username = ?1
            "#,
            params![
                profile.username,
                profile.name,
                profile.phone,
                profile.email,
                profile.gender,
                profile.date_of_birth,
                profile.blood_group,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient profile by username.
    pub fn get_profile(&self, username: &str) -> DbResult<Option<PatientProfile>> {
        self.conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM patient_profiles WHERE username = ?"),
                [username],
                profile_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Patients under one doctor, optionally filtered by a case-insensitive
    /// name fragment.
    pub fn list_profiles_for_doctor(
        &self,
        doctor: &str,
        name_filter: Option<&str>,
    ) -> DbResult<Vec<PatientProfile>> {
        let pattern = name_filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(|f| format!("%{}%", f.to_lowercase()));

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM patient_profiles
            WHERE assigned_doctor = ?1
              AND (?2 IS NULL OR LOWER(name) LIKE ?2)
            ORDER BY name, username
            "#
        ))?;

        let rows = stmt.query_map(params![doctor, pattern], profile_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_patients_for_doctor(&self, doctor: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patient_profiles WHERE assigned_doctor = ?",
            [doctor],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Point a patient at a different doctor.
    pub fn set_assigned_doctor(&self, patient: &str, doctor: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patient_profiles SET assigned_doctor = ?2 WHERE username = ?1",
            params![patient, doctor],
        )?;
        Ok(rows_affected > 0)
    }
}
