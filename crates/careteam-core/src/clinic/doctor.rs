//! Doctor dashboard: own patients, own team, their records.

use chrono::NaiveDate;

use super::{require_patient_of, Clinic};
use crate::care_team::CareTeam;
use crate::error::{CareResult, ValidationError};
use crate::identity::{Registration, Session};
use crate::models::{
    AssignmentOutcome, MedicalHistoryEntry, NurseCandidate, PatientProfile, Role,
};
use crate::policy::Operation;
use crate::records::RecordStore;

impl Clinic {
    /// Register a patient under the calling doctor. The role and assigned
    /// doctor in `registration` are overridden.
    pub fn register_patient(&self, session: &Session, registration: &Registration) -> CareResult<String> {
        self.write(session, Operation::RegisterPatient, |db| {
            let mut registration = registration.clone();
            registration.role = Role::Patient;
            registration
                .patient
                .as_mut()
                .ok_or(ValidationError::MissingField("phone"))?
                .assigned_doctor = session.username().to_string();
            self.identity(db).register(&registration)
        })
    }

    /// Move `nurse` onto the caller's team.
    pub fn assign_nurse(&self, session: &Session, nurse: &str) -> CareResult<AssignmentOutcome> {
        self.write(session, Operation::AssignNurse, |db| {
            CareTeam::new(db).assign_nurse(session.username(), nurse)
        })
    }

    /// Drop `nurse` from the caller's team; false if they were not on it.
    pub fn remove_nurse(&self, session: &Session, nurse: &str) -> CareResult<bool> {
        self.write(session, Operation::RemoveNurse, |db| {
            CareTeam::new(db).remove_nurse(session.username(), nurse)
        })
    }

    pub fn assignable_nurses(&self, session: &Session) -> CareResult<Vec<NurseCandidate>> {
        self.read(session, Operation::ListAssignableNurses, |db| {
            CareTeam::new(db).list_assignable_nurses(session.username())
        })
    }

    pub fn my_patients(
        &self,
        session: &Session,
        name_filter: Option<&str>,
    ) -> CareResult<Vec<PatientProfile>> {
        self.read(session, Operation::ListOwnPatients, |db| {
            CareTeam::new(db).patients_of(session.username(), name_filter)
        })
    }

    /// Hand one of the caller's patients to another doctor.
    pub fn reassign_patient(&self, session: &Session, patient: &str, new_doctor: &str) -> CareResult<()> {
        let operation = Operation::ReassignPatient;
        self.write(session, operation, |db| {
            require_patient_of(db, session, operation, session.username(), patient)?;
            CareTeam::new(db).reassign_patient_doctor(patient, new_doctor)
        })
    }

    pub fn patient_history(
        &self,
        session: &Session,
        patient: &str,
        limit: Option<usize>,
    ) -> CareResult<Vec<MedicalHistoryEntry>> {
        let operation = Operation::ViewPatientHistory;
        self.read(session, operation, |db| {
            require_patient_of(db, session, operation, session.username(), patient)?;
            RecordStore::new(db).history(patient, limit)
        })
    }

    /// Add a dated entry; a second entry for the same date is a conflict.
    pub fn add_history_entry(
        &self,
        session: &Session,
        patient: &str,
        date: NaiveDate,
        notes: &str,
    ) -> CareResult<MedicalHistoryEntry> {
        let operation = Operation::AddHistoryEntry;
        self.write(session, operation, |db| {
            require_patient_of(db, session, operation, session.username(), patient)?;
            RecordStore::new(db).add_entry(patient, date, notes)
        })
    }

    /// Merge notes into the entry for `date`.
    pub fn append_history_notes(
        &self,
        session: &Session,
        patient: &str,
        date: NaiveDate,
        notes: &str,
    ) -> CareResult<MedicalHistoryEntry> {
        let operation = Operation::AddHistoryEntry;
        self.write(session, operation, |db| {
            require_patient_of(db, session, operation, session.username(), patient)?;
            RecordStore::new(db).append_notes(patient, date, notes)
        })
    }
}
