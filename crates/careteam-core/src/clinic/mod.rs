//! Session-scoped entry point for every dashboard action.
//!
//! Each call checks the role table, acquires the shared connection with a
//! bounded wait, and runs as one transaction. The session's account is
//! re-checked inside that transaction, so a deleted, renamed or replaced
//! account cannot keep acting on an old session.

mod admin;
mod doctor;
mod nurse;
mod patient;

use chrono::{NaiveDate, Utc};

use crate::config::CoreConfig;
use crate::db::{Database, Gateway};
use crate::error::{AuthError, CareError, CareResult, ValidationError};
use crate::identity::{CredentialPolicy, Identity, Session};
use crate::models::{Appointment, AppointmentTime, Role};
use crate::policy::{AccessState, Dashboard, Operation};
use crate::schedule::Ledger;

/// Shared clinic state: one store, one credential policy.
pub struct Clinic {
    gateway: Gateway,
    config: CoreConfig,
    policy: Box<dyn CredentialPolicy>,
}

impl Clinic {
    /// Open the store described by `config`, creating it if needed.
    pub fn open(config: CoreConfig) -> CareResult<Self> {
        let db = Database::open_with(&config)?;
        let gateway = Gateway::new(db, config.lock_timeout());
        let policy = config.credential_rule.policy();
        tracing::info!(path = %config.database_path.display(), "clinic store opened");
        Ok(Self {
            gateway,
            config,
            policy,
        })
    }

    pub fn open_in_memory() -> CareResult<Self> {
        Self::open(CoreConfig::in_memory())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Authenticate and open a session.
    pub fn login(&self, username: &str, credential: &str) -> CareResult<Session> {
        let db = self.gateway.acquire()?;
        let session = self.identity(&db).authenticate(username, credential)?;
        Ok(session)
    }

    fn identity<'a>(&'a self, db: &'a Database) -> Identity<'a> {
        Identity::new(db, self.policy.as_ref())
    }

    fn authorize(&self, session: &Session, operation: Operation) -> CareResult<()> {
        if session.role().permits(operation) {
            Ok(())
        } else {
            Err(unauthorized(session, operation))
        }
    }

    /// Run a mutating operation as one write transaction.
    fn write<T>(
        &self,
        session: &Session,
        operation: Operation,
        f: impl FnOnce(&Database) -> CareResult<T>,
    ) -> CareResult<T> {
        self.authorize(session, operation)?;
        let db = self.gateway.acquire()?;
        db.atomically(|db| {
            ensure_live(db, session)?;
            f(db)
        })
    }

    /// Run a read-only operation against one consistent snapshot.
    fn read<T>(
        &self,
        session: &Session,
        operation: Operation,
        f: impl FnOnce(&Database) -> CareResult<T>,
    ) -> CareResult<T> {
        self.authorize(session, operation)?;
        let db = self.gateway.acquire()?;
        db.read(|db| {
            ensure_live(db, session)?;
            f(db)
        })
    }

    /// Book an appointment.
    ///
    /// Doctors book their own patients. Patients book themselves with their
    /// assigned doctor.
    pub fn book_appointment(
        &self,
        session: &Session,
        patient: &str,
        date: NaiveDate,
        time: AppointmentTime,
    ) -> CareResult<Appointment> {
        let operation = Operation::BookAppointment;
        self.write(session, operation, |db| {
            let doctor = match session.role() {
                Role::Doctor => session.username().to_string(),
                Role::Patient if patient == session.username() => db
                    .get_profile(patient)?
                    .map(|p| p.assigned_doctor)
                    .ok_or_else(|| missing_profile(patient))?,
                _ => return Err(unauthorized(session, operation)),
            };
            Ledger::new(db).book(&doctor, patient, date, time)
        })
    }

    /// Appointments of the doctor the caller works for, on or before
    /// `on_or_before` (today when `None`).
    pub fn doctor_appointments(
        &self,
        session: &Session,
        on_or_before: Option<NaiveDate>,
    ) -> CareResult<Vec<Appointment>> {
        self.read(session, Operation::ViewDoctorAppointments, |db| {
            match care_doctor(db, session)? {
                Some(doctor) => Ledger::new(db).for_doctor(&doctor, on_or_before.unwrap_or_else(today)),
                None => Ok(Vec::new()),
            }
        })
    }

    /// The caller's doctor's appointments on one date.
    pub fn appointments_on(&self, session: &Session, date: NaiveDate) -> CareResult<Vec<Appointment>> {
        self.read(session, Operation::ViewDoctorAppointments, |db| {
            match care_doctor(db, session)? {
                Some(doctor) => Ledger::new(db).on_date(&doctor, date),
                None => Ok(Vec::new()),
            }
        })
    }
}

impl AccessState {
    /// Authenticate against `clinic`. On failure the state is unchanged.
    pub fn login(&mut self, clinic: &Clinic, username: &str, credential: &str) -> CareResult<Dashboard> {
        let session = clinic.login(username, credential)?;
        *self = AccessState::Authenticated(session);
        Ok(self.dashboard())
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn unauthorized(session: &Session, operation: Operation) -> CareError {
    tracing::warn!(
        username = session.username(),
        role = %session.role(),
        ?operation,
        "operation refused"
    );
    AuthError::Unauthorized {
        role: session.role(),
        operation,
    }
    .into()
}

fn missing_profile(patient: &str) -> CareError {
    CareError::Integrity(format!("patient `{}` has no profile", patient))
}

/// The session's username must still belong to the account it was opened
/// for, with the same role. Renamed, deleted or replaced accounts close it.
fn ensure_live(db: &Database, session: &Session) -> CareResult<()> {
    match db.get_login(session.username())? {
        Some(record)
            if record.account_id == session.account_id() && record.role == session.role() =>
        {
            Ok(())
        }
        _ => Err(AuthError::SessionClosed.into()),
    }
}

/// The doctor whose team the caller belongs to: themselves for a doctor,
/// the assigned doctor for a nurse.
fn care_doctor(db: &Database, session: &Session) -> CareResult<Option<String>> {
    match session.role() {
        Role::Doctor => Ok(Some(session.username().to_string())),
        Role::Nurse => Ok(db.doctor_for_nurse(session.username())?),
        _ => Ok(None),
    }
}

/// `patient` must be under `doctor`; anything else is out of scope.
fn require_patient_of(
    db: &Database,
    session: &Session,
    operation: Operation,
    doctor: &str,
    patient: &str,
) -> CareResult<()> {
    match db.get_profile(patient)? {
        Some(profile) if profile.assigned_doctor == doctor => Ok(()),
        Some(_) => Err(unauthorized(session, operation)),
        None => Err(ValidationError::UnknownPatient(patient.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Registration;
    use crate::models::Meridiem;

    fn clinic_with_doctor() -> (Clinic, Session) {
        let clinic = Clinic::open_in_memory().unwrap();
        let admin = clinic.login("admin", "admin123").unwrap();
        clinic
            .register_user(
                &admin,
                &Registration {
                    name: "Gregory House".into(),
                    username: "dr1".into(),
                    credential: "0000000001".into(),
                    role: Role::Doctor,
                    email: None,
                    patient: None,
                },
            )
            .unwrap();
        let doctor = clinic.login("dr1", "0000000001").unwrap();
        (clinic, doctor)
    }

    #[test]
    fn test_access_state_login() {
        let (clinic, _) = clinic_with_doctor();
        let mut state = AccessState::default();

        assert!(state.login(&clinic, "dr1", "wrong").is_err());
        assert_eq!(state, AccessState::Anonymous);

        assert_eq!(state.login(&clinic, "dr1", "0000000001").unwrap(), Dashboard::Doctor);
        assert_eq!(state.role(), Some(Role::Doctor));
    }

    #[test]
    fn test_deleted_account_session_is_closed() {
        let (clinic, doctor) = clinic_with_doctor();
        let admin = clinic.login("admin", "admin123").unwrap();
        clinic.delete_user(&admin, "dr1").unwrap();

        assert!(matches!(
            clinic.doctor_appointments(&doctor, None),
            Err(CareError::Auth(AuthError::SessionClosed))
        ));
    }

    #[test]
    fn test_session_does_not_follow_a_reused_username() {
        let (clinic, old_doctor) = clinic_with_doctor();
        let admin = clinic.login("admin", "admin123").unwrap();
        clinic
            .update_user(
                &admin,
                "dr1",
                &crate::models::UserChanges {
                    new_username: Some("drX".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        // A different doctor takes the old username and gets a patient
        clinic
            .register_user(
                &admin,
                &Registration {
                    name: "Lisa Cuddy".into(),
                    username: "dr1".into(),
                    credential: "0000000002".into(),
                    role: Role::Doctor,
                    email: None,
                    patient: None,
                },
            )
            .unwrap();
        clinic
            .register_user(
                &admin,
                &Registration {
                    name: "Jane Roe".into(),
                    username: "pat1".into(),
                    credential: "1111111111".into(),
                    role: Role::Patient,
                    email: None,
                    patient: Some(crate::identity::PatientDetails {
                        assigned_doctor: "dr1".into(),
                        phone: "1111111111".into(),
                        ..Default::default()
                    }),
                },
            )
            .unwrap();

        assert!(matches!(
            clinic.my_patients(&old_doctor, None),
            Err(CareError::Auth(AuthError::SessionClosed))
        ));

        let new_doctor = clinic.login("dr1", "0000000002").unwrap();
        assert_eq!(clinic.my_patients(&new_doctor, None).unwrap().len(), 1);
    }

    #[test]
    fn test_admin_cannot_book() {
        let (clinic, _) = clinic_with_doctor();
        let admin = clinic.login("admin", "admin123").unwrap();
        let time = AppointmentTime::new(10, 0, Meridiem::Am).unwrap();

        let err = clinic
            .book_appointment(&admin, "pat1", today(), time)
            .unwrap_err();
        assert!(err.is_unauthorized());
    }
}
