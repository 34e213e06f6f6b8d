//! Appointment database operations.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Appointment, AppointmentTime};

impl ToSql for AppointmentTime {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_storage()))
    }
}

impl FromSql for AppointmentTime {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        AppointmentTime::from_storage(raw).ok_or_else(|| {
            FromSqlError::Other(format!("malformed appointment time `{}`", raw).into())
        })
    }
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        doctor: row.get(0)?,
        patient: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
    })
}

impl Database {
    /// Insert an appointment.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (doctor, patient, appointment_date, appointment_time)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                appointment.doctor,
                appointment.patient,
                appointment.date,
                appointment.time,
            ],
        )?;
        Ok(())
    }

    /// True when the exact (doctor, patient, date, time) tuple is booked.
    pub fn appointment_exists(&self, appointment: &Appointment) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE doctor = ?1 AND patient = ?2
              AND appointment_date = ?3 AND appointment_time = ?4
            "#,
            params![
                appointment.doctor,
                appointment.patient,
                appointment.date,
                appointment.time,
            ],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// A doctor's appointments on or before `until`, oldest first.
    pub fn list_appointments_for_doctor(
        &self,
        doctor: &str,
        until: Option<NaiveDate>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT doctor, patient, appointment_date, appointment_time
            FROM appointments
            WHERE doctor = ?1 AND (?2 IS NULL OR appointment_date <= ?2)
            ORDER BY appointment_date, appointment_time, patient
            "#,
        )?;
        let rows = stmt.query_map(params![doctor, until], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// A doctor's appointments on one date.
    pub fn list_appointments_on(&self, doctor: &str, date: NaiveDate) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT doctor, patient, appointment_date, appointment_time
            FROM appointments
            WHERE doctor = ?1 AND appointment_date = ?2
            ORDER BY appointment_time, patient
            "#,
        )?;
        let rows = stmt.query_map(params![doctor, date], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// A patient's appointments, oldest first.
    pub fn list_appointments_for_patient(&self, patient: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT doctor, patient, appointment_date, appointment_time
            FROM appointments
            WHERE patient = ?
            ORDER BY appointment_date, appointment_time, doctor
            "#,
        )?;
        let rows = stmt.query_map([patient], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Most recent appointment by (date desc, time desc).
    pub fn latest_appointment(&self, patient: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT doctor, patient, appointment_date, appointment_time
                FROM appointments
                WHERE patient = ?
                ORDER BY appointment_date DESC, appointment_time DESC
                LIMIT 1
                "#,
                [patient],
                appointment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }
}
