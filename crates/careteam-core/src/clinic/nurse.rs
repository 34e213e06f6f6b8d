//! Nurse dashboard. Everything here is read-only and scoped to the
//! nurse's assigned doctor.

use super::{care_doctor, require_patient_of, Clinic};
use crate::care_team::CareTeam;
use crate::error::CareResult;
use crate::identity::Session;
use crate::models::{Appointment, PatientProfile, UserSummary};
use crate::policy::Operation;
use crate::schedule::Ledger;

impl Clinic {
    /// The doctor the calling nurse works for, if any.
    pub fn assigned_doctor(&self, session: &Session) -> CareResult<Option<UserSummary>> {
        self.read(session, Operation::ViewAssignedDoctor, |db| {
            let doctor = CareTeam::new(db).doctor_for_nurse(session.username())?;
            Ok(doctor.map(|user| UserSummary::from_user(&user, None)))
        })
    }

    /// The assigned doctor's patients; empty while unassigned.
    pub fn doctor_patients(
        &self,
        session: &Session,
        name_filter: Option<&str>,
    ) -> CareResult<Vec<PatientProfile>> {
        self.read(session, Operation::ViewDoctorPatients, |db| {
            match care_doctor(db, session)? {
                Some(doctor) => CareTeam::new(db).patients_of(&doctor, name_filter),
                None => Ok(Vec::new()),
            }
        })
    }

    /// Most recent appointment of one of the doctor's patients.
    pub fn latest_appointment(
        &self,
        session: &Session,
        patient: &str,
    ) -> CareResult<Option<Appointment>> {
        let operation = Operation::ViewLatestAppointment;
        self.read(session, operation, |db| {
            let Some(doctor) = care_doctor(db, session)? else {
                return Err(super::unauthorized(session, operation));
            };
            require_patient_of(db, session, operation, &doctor, patient)?;
            Ledger::new(db).latest(patient)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::identity::Registration;
    use crate::models::Role;
    use crate::Clinic;

    #[test]
    fn test_unassigned_nurse_sees_nothing() {
        let clinic = Clinic::open_in_memory().unwrap();
        let admin = clinic.login("admin", "admin123").unwrap();
        clinic
            .register_user(
                &admin,
                &Registration {
                    name: "Ann".into(),
                    username: "n1".into(),
                    credential: "2222222222".into(),
                    role: Role::Nurse,
                    email: None,
                    patient: None,
                },
            )
            .unwrap();
        let nurse = clinic.login("n1", "2222222222").unwrap();

        assert!(clinic.assigned_doctor(&nurse).unwrap().is_none());
        assert!(clinic.doctor_patients(&nurse, None).unwrap().is_empty());
        assert!(clinic.doctor_appointments(&nurse, None).unwrap().is_empty());
        assert!(clinic.latest_appointment(&nurse, "pat1").unwrap_err().is_unauthorized());
        assert!(clinic.assign_nurse(&nurse, "n1").unwrap_err().is_unauthorized());
    }
}
