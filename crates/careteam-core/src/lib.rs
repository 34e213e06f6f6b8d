//! Careteam Core Library
//!
//! Clinical record keeper for a small care team: accounts, doctor/nurse
//! teams, appointments and dated medical history, behind a role router.
//!
//! # Architecture
//!
//! ```text
//!                 login(username, credential)
//!                             │
//!                      ┌──────▼──────┐
//!                      │   Session   │  role resolved once
//!                      └──────┬──────┘
//!                             │
//!                  Role::permits(Operation)
//!                             │
//!       ┌───────────┬─────────┼──────────┬────────────┐
//!       ▼           ▼         ▼          ▼            ▼
//!   Identity    CareTeam   Ledger   RecordStore   Directory
//!       │           │         │          │            │
//!       └───────────┴─────────┼──────────┴────────────┘
//!                             │  one transaction per call
//!                      ┌──────▼──────┐
//!                      │   Gateway   │  bounded wait
//!                      └──────┬──────┘
//!                             ▼
//!                          SQLite
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite persistence gateway
//! - [`models`]: Domain types (User, PatientProfile, Appointment, etc.)
//! - [`identity`]: Authentication, registration, credential policy, sessions
//! - [`care_team`]: Doctor/nurse and patient/doctor assignment rules
//! - [`schedule`]: Appointment ledger
//! - [`records`]: Medical history store
//! - [`directory`]: User directory and the clinical-data reset
//! - [`policy`]: Role table, dashboards, login state
//! - [`clinic`]: Session-scoped entry point used by every dashboard

pub mod care_team;
pub mod clinic;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod identity;
pub mod models;
pub mod policy;
pub mod records;
pub mod schedule;
pub mod validate;

// Re-export commonly used types
pub use clinic::Clinic;
pub use config::CoreConfig;
pub use db::Database;
pub use error::{AuthError, CareError, CareResult, Conflict, ValidationError};
pub use identity::{PatientDetails, Registration, Session};
pub use models::{
    Appointment, AppointmentTime, MedicalHistoryEntry, Meridiem, NurseCandidate, NurseStanding,
    PatientProfile, ProfileChanges, Role, User, UserChanges, UserFilter, UserSummary,
};
pub use policy::{AccessState, Dashboard, Operation};
pub use records::DASHBOARD_HISTORY_LIMIT;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CareTeamError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session closed: {0}")]
    SessionClosed(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Data integrity error: {0}")]
    Integrity(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<CareError> for CareTeamError {
    fn from(e: CareError) -> Self {
        match e {
            CareError::Validation(v) => CareTeamError::Validation(v.to_string()),
            CareError::Conflict(c) => CareTeamError::Conflict(c.to_string()),
            CareError::Auth(AuthError::InvalidCredentials) => {
                CareTeamError::InvalidCredentials(AuthError::InvalidCredentials.to_string())
            }
            CareError::Auth(a @ AuthError::Unauthorized { .. }) => {
                CareTeamError::Unauthorized(a.to_string())
            }
            CareError::Auth(a @ AuthError::SessionClosed) => {
                CareTeamError::SessionClosed(a.to_string())
            }
            CareError::StorageUnavailable(msg) => CareTeamError::StorageUnavailable(msg),
            CareError::Integrity(msg) => CareTeamError::Integrity(msg),
            CareError::NotFound(msg) => CareTeamError::NotFound(msg),
        }
    }
}

impl From<ValidationError> for CareTeamError {
    fn from(e: ValidationError) -> Self {
        CareError::from(e).into()
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CareTeamError> {
    Ok(validate::date(raw)?)
}

fn parse_optional_date(raw: Option<String>) -> Result<Option<NaiveDate>, CareTeamError> {
    raw.as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(parse_date)
        .transpose()
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a store at the given path with default settings.
#[uniffi::export]
pub fn open_core(path: String) -> Result<Arc<CareTeamCore>, CareTeamError> {
    let config = CoreConfig::default().with_database_path(path);
    Ok(Arc::new(CareTeamCore {
        clinic: Clinic::open(config)?,
    }))
}

/// Open using a JSON configuration document.
#[uniffi::export]
pub fn open_core_with_config(config_json: String) -> Result<Arc<CareTeamCore>, CareTeamError> {
    let config = CoreConfig::from_json_str(&config_json)
        .map_err(|e| CareTeamError::Validation(format!("{:#}", e)))?;
    Ok(Arc::new(CareTeamCore {
        clinic: Clinic::open(config)?,
    }))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_core_in_memory() -> Result<Arc<CareTeamCore>, CareTeamError> {
    Ok(Arc::new(CareTeamCore {
        clinic: Clinic::open_in_memory()?,
    }))
}

// =========================================================================
// Session Handle
// =========================================================================

/// Opaque login handle. The presentation layer can read it but never
/// construct or alter one.
#[derive(uniffi::Object)]
pub struct FfiSession {
    inner: Mutex<Option<Session>>,
}

impl FfiSession {
    /// The session slot. A `Session` is never mutated in place, so a lock
    /// poisoned by a panicking caller still guards a sound value.
    fn slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("recovering session handle after a panicked operation");
            self.inner.clear_poison();
            poisoned.into_inner()
        })
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&Session) -> CareResult<T>,
    ) -> Result<T, CareTeamError> {
        let guard = self.slot();
        let session = guard
            .as_ref()
            .ok_or_else(|| CareTeamError::from(CareError::from(AuthError::SessionClosed)))?;
        Ok(f(session)?)
    }
}

#[uniffi::export]
impl FfiSession {
    pub fn username(&self) -> Option<String> {
        self.slot().as_ref().map(|s| s.username().to_string())
    }

    pub fn role(&self) -> Option<FfiRole> {
        self.slot().as_ref().map(|s| s.role().into())
    }

    /// Where to route: the login screen once closed.
    pub fn dashboard(&self) -> FfiDashboard {
        match self.slot().as_ref() {
            Some(session) => Dashboard::for_role(session.role()).into(),
            None => FfiDashboard::Login,
        }
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic handle for FFI.
#[derive(uniffi::Object)]
pub struct CareTeamCore {
    clinic: Clinic,
}

#[uniffi::export]
impl CareTeamCore {
    // =========================================================================
    // Session
    // =========================================================================

    pub fn login(&self, username: String, credential: String) -> Result<Arc<FfiSession>, CareTeamError> {
        let session = self.clinic.login(&username, &credential)?;
        Ok(Arc::new(FfiSession {
            inner: Mutex::new(Some(session)),
        }))
    }

    pub fn logout(&self, session: Arc<FfiSession>) -> Result<(), CareTeamError> {
        let mut state = session
            .slot()
            .take()
            .map(AccessState::from)
            .unwrap_or_default();
        state.logout();
        Ok(())
    }

    // =========================================================================
    // Admin Operations
    // =========================================================================

    pub fn list_users(
        &self,
        session: Arc<FfiSession>,
        search: Option<String>,
        role: Option<FfiRole>,
    ) -> Result<Vec<FfiUserSummary>, CareTeamError> {
        let filter = UserFilter {
            search,
            role: role.map(Into::into),
        };
        let users = session.with(|s| self.clinic.list_users(s, &filter))?;
        Ok(users.into_iter().map(Into::into).collect())
    }

    pub fn get_user(&self, session: Arc<FfiSession>, username: String) -> Result<FfiUser, CareTeamError> {
        Ok(session.with(|s| self.clinic.user(s, &username))?.into())
    }

    pub fn register_user(
        &self,
        session: Arc<FfiSession>,
        registration: FfiRegistration,
    ) -> Result<String, CareTeamError> {
        let registration = Registration::try_from(registration)?;
        session.with(|s| self.clinic.register_user(s, &registration))
    }

    pub fn update_user(
        &self,
        session: Arc<FfiSession>,
        username: String,
        changes: FfiUserChanges,
    ) -> Result<FfiUser, CareTeamError> {
        let changes = UserChanges::from(changes);
        Ok(session
            .with(|s| self.clinic.update_user(s, &username, &changes))?
            .into())
    }

    pub fn delete_user(&self, session: Arc<FfiSession>, username: String) -> Result<(), CareTeamError> {
        session.with(|s| self.clinic.delete_user(s, &username))
    }

    pub fn reset_clinical_data(
        &self,
        session: Arc<FfiSession>,
        credential: String,
    ) -> Result<(), CareTeamError> {
        session.with(|s| self.clinic.reset_clinical_data(s, &credential))
    }

    pub fn list_doctors(&self, session: Arc<FfiSession>) -> Result<Vec<FfiUserSummary>, CareTeamError> {
        let doctors = session.with(|s| self.clinic.list_doctors(s))?;
        Ok(doctors.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    pub fn register_patient(
        &self,
        session: Arc<FfiSession>,
        registration: FfiRegistration,
    ) -> Result<String, CareTeamError> {
        let registration = Registration::try_from(registration)?;
        session.with(|s| self.clinic.register_patient(s, &registration))
    }

    pub fn assign_nurse(
        &self,
        session: Arc<FfiSession>,
        nurse: String,
    ) -> Result<FfiAssignmentOutcome, CareTeamError> {
        Ok(session.with(|s| self.clinic.assign_nurse(s, &nurse))?.into())
    }

    pub fn remove_nurse(&self, session: Arc<FfiSession>, nurse: String) -> Result<bool, CareTeamError> {
        session.with(|s| self.clinic.remove_nurse(s, &nurse))
    }

    pub fn assignable_nurses(
        &self,
        session: Arc<FfiSession>,
    ) -> Result<Vec<FfiNurseCandidate>, CareTeamError> {
        let (caller, nurses) = session.with(|s| {
            Ok((s.username().to_string(), self.clinic.assignable_nurses(s)?))
        })?;
        Ok(nurses
            .into_iter()
            .map(|c| FfiNurseCandidate::for_caller(c, &caller))
            .collect())
    }

    pub fn my_patients(
        &self,
        session: Arc<FfiSession>,
        name_filter: Option<String>,
    ) -> Result<Vec<FfiPatientProfile>, CareTeamError> {
        let patients = session.with(|s| self.clinic.my_patients(s, name_filter.as_deref()))?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    pub fn reassign_patient(
        &self,
        session: Arc<FfiSession>,
        patient: String,
        new_doctor: String,
    ) -> Result<(), CareTeamError> {
        session.with(|s| self.clinic.reassign_patient(s, &patient, &new_doctor))
    }

    pub fn patient_history(
        &self,
        session: Arc<FfiSession>,
        patient: String,
        limit: Option<u32>,
    ) -> Result<Vec<FfiHistoryEntry>, CareTeamError> {
        let entries = session.with(|s| {
            self.clinic
                .patient_history(s, &patient, limit.map(|l| l as usize))
        })?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    pub fn add_history_entry(
        &self,
        session: Arc<FfiSession>,
        patient: String,
        date: String,
        notes: String,
    ) -> Result<FfiHistoryEntry, CareTeamError> {
        let date = parse_date(&date)?;
        Ok(session
            .with(|s| self.clinic.add_history_entry(s, &patient, date, &notes))?
            .into())
    }

    pub fn append_history_notes(
        &self,
        session: Arc<FfiSession>,
        patient: String,
        date: String,
        notes: String,
    ) -> Result<FfiHistoryEntry, CareTeamError> {
        let date = parse_date(&date)?;
        Ok(session
            .with(|s| self.clinic.append_history_notes(s, &patient, date, &notes))?
            .into())
    }

    // =========================================================================
    // Appointments (Doctor, Nurse, Patient)
    // =========================================================================

    pub fn book_appointment(
        &self,
        session: Arc<FfiSession>,
        patient: String,
        date: String,
        time: FfiAppointmentTime,
    ) -> Result<FfiAppointment, CareTeamError> {
        let date = parse_date(&date)?;
        let time = AppointmentTime::try_from(time)?;
        Ok(session
            .with(|s| self.clinic.book_appointment(s, &patient, date, time))?
            .into())
    }

    /// Doctor worklist, or the assigned doctor's for a nurse. Defaults to
    /// everything due today or earlier.
    pub fn doctor_appointments(
        &self,
        session: Arc<FfiSession>,
        on_or_before: Option<String>,
    ) -> Result<Vec<FfiAppointment>, CareTeamError> {
        let on_or_before = parse_optional_date(on_or_before)?;
        let appointments = session.with(|s| self.clinic.doctor_appointments(s, on_or_before))?;
        Ok(appointments.into_iter().map(Into::into).collect())
    }

    pub fn appointments_on(
        &self,
        session: Arc<FfiSession>,
        date: String,
    ) -> Result<Vec<FfiAppointment>, CareTeamError> {
        let date = parse_date(&date)?;
        let appointments = session.with(|s| self.clinic.appointments_on(s, date))?;
        Ok(appointments.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Nurse Operations
    // =========================================================================

    pub fn assigned_doctor(
        &self,
        session: Arc<FfiSession>,
    ) -> Result<Option<FfiUserSummary>, CareTeamError> {
        Ok(session.with(|s| self.clinic.assigned_doctor(s))?.map(Into::into))
    }

    pub fn doctor_patients(
        &self,
        session: Arc<FfiSession>,
        name_filter: Option<String>,
    ) -> Result<Vec<FfiPatientProfile>, CareTeamError> {
        let patients = session.with(|s| self.clinic.doctor_patients(s, name_filter.as_deref()))?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    pub fn latest_appointment(
        &self,
        session: Arc<FfiSession>,
        patient: String,
    ) -> Result<Option<FfiAppointment>, CareTeamError> {
        Ok(session
            .with(|s| self.clinic.latest_appointment(s, &patient))?
            .map(Into::into))
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn my_profile(&self, session: Arc<FfiSession>) -> Result<FfiPatientProfile, CareTeamError> {
        Ok(session.with(|s| self.clinic.my_profile(s))?.into())
    }

    pub fn update_my_profile(
        &self,
        session: Arc<FfiSession>,
        changes: FfiProfileChanges,
    ) -> Result<FfiPatientProfile, CareTeamError> {
        let changes = ProfileChanges::try_from(changes)?;
        Ok(session
            .with(|s| self.clinic.update_my_profile(s, &changes))?
            .into())
    }

    pub fn my_appointments(
        &self,
        session: Arc<FfiSession>,
    ) -> Result<Vec<FfiAppointment>, CareTeamError> {
        let appointments = session.with(|s| self.clinic.my_appointments(s))?;
        Ok(appointments.into_iter().map(Into::into).collect())
    }

    /// Pass no limit for the full history.
    pub fn my_history(
        &self,
        session: Arc<FfiSession>,
        limit: Option<u32>,
    ) -> Result<Vec<FfiHistoryEntry>, CareTeamError> {
        let entries = session.with(|s| self.clinic.my_history(s, limit.map(|l| l as usize)))?;
        Ok(entries.into_iter().map(Into::into).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiRole {
    Admin,
    Doctor,
    Nurse,
    Patient,
}

impl From<Role> for FfiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => FfiRole::Admin,
            Role::Doctor => FfiRole::Doctor,
            Role::Nurse => FfiRole::Nurse,
            Role::Patient => FfiRole::Patient,
        }
    }
}

impl From<FfiRole> for Role {
    fn from(role: FfiRole) -> Self {
        match role {
            FfiRole::Admin => Role::Admin,
            FfiRole::Doctor => Role::Doctor,
            FfiRole::Nurse => Role::Nurse,
            FfiRole::Patient => Role::Patient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiDashboard {
    Login,
    Admin,
    Doctor,
    Nurse,
    Patient,
}

impl From<Dashboard> for FfiDashboard {
    fn from(dashboard: Dashboard) -> Self {
        match dashboard {
            Dashboard::Login => FfiDashboard::Login,
            Dashboard::Admin => FfiDashboard::Admin,
            Dashboard::Doctor => FfiDashboard::Doctor,
            Dashboard::Nurse => FfiDashboard::Nurse,
            Dashboard::Patient => FfiDashboard::Patient,
        }
    }
}

/// FFI-safe user directory row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUserSummary {
    pub username: String,
    pub role: FfiRole,
    pub display_name: String,
}

impl From<UserSummary> for FfiUserSummary {
    fn from(summary: UserSummary) -> Self {
        Self {
            username: summary.username,
            role: summary.role.into(),
            display_name: summary.display_name,
        }
    }
}

/// FFI-safe account.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub username: String,
    pub role: FfiRole,
    pub name: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            role: user.role.into(),
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// FFI-safe registration request. Dates are `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegistration {
    pub name: String,
    pub username: String,
    pub credential: String,
    pub role: FfiRole,
    pub email: Option<String>,
    pub patient: Option<FfiPatientDetails>,
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientDetails {
    pub assigned_doctor: String,
    pub phone: String,
    pub patient_type: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub initial_history: Option<String>,
}

impl TryFrom<FfiRegistration> for Registration {
    type Error = CareTeamError;

    fn try_from(reg: FfiRegistration) -> Result<Self, Self::Error> {
        let patient = match reg.patient {
            Some(details) => Some(PatientDetails {
                date_of_birth: parse_optional_date(details.date_of_birth)?,
                assigned_doctor: details.assigned_doctor,
                phone: details.phone,
                patient_type: details.patient_type,
                gender: details.gender,
                blood_group: details.blood_group,
                initial_history: details.initial_history,
            }),
            None => None,
        };
        Ok(Registration {
            name: reg.name,
            username: reg.username,
            credential: reg.credential,
            role: reg.role.into(),
            email: reg.email,
            patient,
        })
    }
}

/// FFI-safe admin edit. `None` leaves a field unchanged.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUserChanges {
    pub new_username: Option<String>,
    pub name: Option<String>,
    /// Blank clears the address
    pub email: Option<String>,
    pub credential: Option<String>,
}

impl From<FfiUserChanges> for UserChanges {
    fn from(changes: FfiUserChanges) -> Self {
        UserChanges {
            new_username: changes.new_username,
            name: changes.name,
            email: changes.email,
            credential: changes.credential,
        }
    }
}

/// FFI-safe patient profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientProfile {
    pub username: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
    pub assigned_doctor: String,
    pub patient_type: Option<String>,
}

impl From<PatientProfile> for FfiPatientProfile {
    fn from(profile: PatientProfile) -> Self {
        Self {
            username: profile.username,
            name: profile.name,
            phone: profile.phone,
            email: profile.email,
            gender: profile.gender,
            date_of_birth: profile.date_of_birth.map(|d| d.to_string()),
            blood_group: profile.blood_group,
            assigned_doctor: profile.assigned_doctor,
            patient_type: profile.patient_type,
        }
    }
}

/// FFI-safe profile edit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub blood_group: Option<String>,
}

impl TryFrom<FfiProfileChanges> for ProfileChanges {
    type Error = CareTeamError;

    fn try_from(changes: FfiProfileChanges) -> Result<Self, Self::Error> {
        Ok(ProfileChanges {
            date_of_birth: parse_optional_date(changes.date_of_birth)?,
            name: changes.name,
            phone: changes.phone,
            email: changes.email,
            gender: changes.gender,
            blood_group: changes.blood_group,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiMeridiem {
    Am,
    Pm,
}

/// FFI-safe 12-hour time.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointmentTime {
    pub hour: u8,
    pub minute: u8,
    pub meridiem: FfiMeridiem,
}

impl From<AppointmentTime> for FfiAppointmentTime {
    fn from(time: AppointmentTime) -> Self {
        Self {
            hour: time.hour(),
            minute: time.minute(),
            meridiem: match time.meridiem() {
                Meridiem::Am => FfiMeridiem::Am,
                Meridiem::Pm => FfiMeridiem::Pm,
            },
        }
    }
}

impl TryFrom<FfiAppointmentTime> for AppointmentTime {
    type Error = CareTeamError;

    fn try_from(time: FfiAppointmentTime) -> Result<Self, Self::Error> {
        let meridiem = match time.meridiem {
            FfiMeridiem::Am => Meridiem::Am,
            FfiMeridiem::Pm => Meridiem::Pm,
        };
        Ok(AppointmentTime::new(time.hour, time.minute, meridiem)?)
    }
}

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub doctor: String,
    pub patient: String,
    pub date: String,
    pub time: FfiAppointmentTime,
    /// Preformatted, e.g. "02:05 PM"
    pub display_time: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appointment: Appointment) -> Self {
        Self {
            display_time: appointment.time.to_string(),
            doctor: appointment.doctor,
            patient: appointment.patient,
            date: appointment.date.to_string(),
            time: appointment.time.into(),
        }
    }
}

/// FFI-safe history entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiHistoryEntry {
    pub patient: String,
    pub date: String,
    pub notes: String,
}

impl From<MedicalHistoryEntry> for FfiHistoryEntry {
    fn from(entry: MedicalHistoryEntry) -> Self {
        Self {
            patient: entry.patient,
            date: entry.date.to_string(),
            notes: entry.notes,
        }
    }
}

/// FFI-safe assignable nurse.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNurseCandidate {
    pub username: String,
    pub name: String,
    /// Doctor holding this nurse, if any
    pub current_doctor: Option<String>,
    pub is_assigned_to_caller: bool,
}

impl FfiNurseCandidate {
    fn for_caller(candidate: NurseCandidate, caller: &str) -> Self {
        Self {
            current_doctor: candidate.current_doctor(caller).map(str::to_string),
            is_assigned_to_caller: candidate.is_assigned_to_caller(),
            username: candidate.username,
            name: candidate.name,
        }
    }
}

/// FFI-safe result of a nurse move.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAssignmentOutcome {
    pub doctor: String,
    pub nurse: String,
    pub previous_doctor: Option<String>,
    pub moved_from_other_doctor: bool,
}

impl From<models::AssignmentOutcome> for FfiAssignmentOutcome {
    fn from(outcome: models::AssignmentOutcome) -> Self {
        Self {
            moved_from_other_doctor: outcome.moved_from_other_doctor(),
            doctor: outcome.doctor,
            nurse: outcome.nurse,
            previous_doctor: outcome.previous_doctor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_handle_survives_panicked_caller() {
        let core = open_core_in_memory().unwrap();
        let session = core.login("admin".into(), "admin123".into()).unwrap();

        let handle = Arc::clone(&session);
        let outcome = std::thread::spawn(move || {
            handle
                .with(|_| -> CareResult<()> { panic!("operation blew up") })
                .ok();
        })
        .join();
        assert!(outcome.is_err());

        assert_eq!(session.username().as_deref(), Some("admin"));
        assert_eq!(session.dashboard(), FfiDashboard::Admin);
        assert!(core.list_doctors(Arc::clone(&session)).is_ok());

        core.logout(Arc::clone(&session)).unwrap();
        assert!(matches!(
            core.list_doctors(session),
            Err(CareTeamError::SessionClosed(_))
        ));
    }
}
