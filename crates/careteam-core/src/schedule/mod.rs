//! Scheduling ledger: a booking log of (doctor, patient, date, time).
//!
//! Only exact duplicates are rejected; overlapping slots are allowed.

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::{CareError, CareResult, Conflict, ValidationError};
use crate::models::{Appointment, AppointmentTime, Role};

pub struct Ledger<'a> {
    db: &'a Database,
}

impl<'a> Ledger<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Book `patient` with `doctor`, who must be the patient's assigned doctor.
    pub fn book(
        &self,
        doctor: &str,
        patient: &str,
        date: NaiveDate,
        time: AppointmentTime,
    ) -> CareResult<Appointment> {
        self.db.atomically(|db| -> CareResult<Appointment> {
            let profile = db
                .get_profile(patient)?
                .ok_or_else(|| ValidationError::UnknownPatient(patient.to_string()))?;

            if !db.user_has_role(&profile.assigned_doctor, Role::Doctor)? {
                return Err(CareError::Integrity(format!(
                    "patient `{}` is assigned to `{}`, which is not a doctor",
                    patient, profile.assigned_doctor
                )));
            }
            if profile.assigned_doctor != doctor {
                return Err(ValidationError::NotAssignedDoctor {
                    patient: patient.to_string(),
                    doctor: doctor.to_string(),
                }
                .into());
            }

            let appointment = Appointment {
                doctor: doctor.to_string(),
                patient: patient.to_string(),
                date,
                time,
            };
            if db.appointment_exists(&appointment)? {
                return Err(Conflict::DuplicateSlot.into());
            }
            db.insert_appointment(&appointment)?;

            tracing::debug!(doctor, patient, %date, %time, "appointment booked");
            Ok(appointment)
        })
    }

    /// A doctor's worklist: everything on or before `on_or_before`.
    pub fn for_doctor(&self, doctor: &str, on_or_before: NaiveDate) -> CareResult<Vec<Appointment>> {
        self.db
            .read(|db| db.list_appointments_for_doctor(doctor, Some(on_or_before)))
            .map_err(Into::into)
    }

    /// Every appointment a doctor has, past and future.
    pub fn all_for_doctor(&self, doctor: &str) -> CareResult<Vec<Appointment>> {
        self.db
            .read(|db| db.list_appointments_for_doctor(doctor, None))
            .map_err(Into::into)
    }

    pub fn on_date(&self, doctor: &str, date: NaiveDate) -> CareResult<Vec<Appointment>> {
        self.db
            .read(|db| db.list_appointments_on(doctor, date))
            .map_err(Into::into)
    }

    pub fn for_patient(&self, patient: &str) -> CareResult<Vec<Appointment>> {
        self.db
            .read(|db| db.list_appointments_for_patient(patient))
            .map_err(Into::into)
    }

    /// Most recent appointment by date, then time.
    pub fn latest(&self, patient: &str) -> CareResult<Option<Appointment>> {
        self.db
            .read(|db| db.latest_appointment(patient))
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StoredCredential;
    use crate::models::{Meridiem, PatientProfile, User};

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        for (username, role) in [
            ("dr1", Role::Doctor),
            ("dr2", Role::Doctor),
            ("pat1", Role::Patient),
        ] {
            let user = User::new(username.into(), role, username.into(), None);
            db.insert_user(&user, &StoredCredential::derive("x")).unwrap();
        }
        db.insert_profile(&PatientProfile::new(
            "pat1".into(),
            "Jane".into(),
            "1111111111".into(),
            "dr1".into(),
        ))
        .unwrap();
        db
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_duplicate_slot() {
        let db = setup_db();
        let ledger = Ledger::new(&db);
        let ten_am = AppointmentTime::new(10, 0, Meridiem::Am).unwrap();

        ledger.book("dr1", "pat1", date("2024-01-10"), ten_am).unwrap();
        let err = ledger
            .book("dr1", "pat1", date("2024-01-10"), ten_am)
            .unwrap_err();
        assert_eq!(err.conflict(), Some(&Conflict::DuplicateSlot));
        assert_eq!(ledger.for_patient("pat1").unwrap().len(), 1);
    }

    #[test]
    fn test_only_assigned_doctor_books() {
        let db = setup_db();
        let ledger = Ledger::new(&db);
        let time = AppointmentTime::new(3, 30, Meridiem::Pm).unwrap();

        assert!(matches!(
            ledger.book("dr2", "pat1", date("2024-01-10"), time),
            Err(CareError::Validation(ValidationError::NotAssignedDoctor { .. }))
        ));
        assert!(matches!(
            ledger.book("dr1", "ghost", date("2024-01-10"), time),
            Err(CareError::Validation(ValidationError::UnknownPatient(_)))
        ));
    }

    #[test]
    fn test_worklist_and_latest() {
        let db = setup_db();
        let ledger = Ledger::new(&db);
        let morning = AppointmentTime::new(9, 0, Meridiem::Am).unwrap();
        let evening = AppointmentTime::new(6, 0, Meridiem::Pm).unwrap();

        ledger.book("dr1", "pat1", date("2024-01-10"), evening).unwrap();
        ledger.book("dr1", "pat1", date("2024-02-01"), morning).unwrap();
        ledger.book("dr1", "pat1", date("2024-02-01"), evening).unwrap();

        assert_eq!(ledger.for_doctor("dr1", date("2024-01-31")).unwrap().len(), 1);
        assert_eq!(ledger.all_for_doctor("dr1").unwrap().len(), 3);
        assert_eq!(ledger.on_date("dr1", date("2024-02-01")).unwrap().len(), 2);

        let latest = ledger.latest("pat1").unwrap().unwrap();
        assert_eq!(latest.date, date("2024-02-01"));
        assert_eq!(latest.time, evening);
    }
}
