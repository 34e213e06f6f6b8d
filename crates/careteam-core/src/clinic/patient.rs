//! Patient dashboard: own profile, appointments and history.

use super::{missing_profile, Clinic};
use crate::error::CareResult;
use crate::identity::Session;
use crate::models::{Appointment, MedicalHistoryEntry, PatientProfile, ProfileChanges};
use crate::policy::Operation;
use crate::records::RecordStore;
use crate::schedule::Ledger;
use crate::validate;

impl Clinic {
    pub fn my_profile(&self, session: &Session) -> CareResult<PatientProfile> {
        self.read(session, Operation::ViewOwnProfile, |db| {
            db.get_profile(session.username())?
                .ok_or_else(|| missing_profile(session.username()))
        })
    }

    /// Edit own profile fields. Name and email are mirrored onto the account.
    pub fn update_my_profile(
        &self,
        session: &Session,
        changes: &ProfileChanges,
    ) -> CareResult<PatientProfile> {
        let changes = normalize(changes)?;

        self.write(session, Operation::EditOwnProfile, |db| {
            let username = session.username();
            let mut profile = db
                .get_profile(username)?
                .ok_or_else(|| missing_profile(username))?;
            profile.apply(&changes);
            db.update_profile(&profile)?;
            db.update_user_details(username, &profile.name, profile.email.as_deref())?;
            Ok(profile)
        })
    }

    pub fn my_appointments(&self, session: &Session) -> CareResult<Vec<Appointment>> {
        self.read(session, Operation::ViewOwnAppointments, |db| {
            Ledger::new(db).for_patient(session.username())
        })
    }

    /// Newest first. Pass `Some(DASHBOARD_HISTORY_LIMIT)` for the dashboard.
    pub fn my_history(
        &self,
        session: &Session,
        limit: Option<usize>,
    ) -> CareResult<Vec<MedicalHistoryEntry>> {
        self.read(session, Operation::ViewOwnHistory, |db| {
            RecordStore::new(db).history(session.username(), limit)
        })
    }
}

/// Trim and validate the edit before it touches storage.
fn normalize(changes: &ProfileChanges) -> CareResult<ProfileChanges> {
    let name = changes
        .name
        .as_deref()
        .map(|n| validate::required(n, "name").map(str::to_string))
        .transpose()?;
    let phone = changes.phone.as_deref().map(str::trim).map(str::to_string);
    if let Some(phone) = &phone {
        validate::phone(phone)?;
    }
    let email = validate::optional(changes.email.as_deref());
    if let Some(email) = &email {
        validate::email(email)?;
    }

    Ok(ProfileChanges {
        name,
        phone,
        email,
        gender: validate::optional(changes.gender.as_deref()),
        date_of_birth: changes.date_of_birth,
        blood_group: validate::optional(changes.blood_group.as_deref()),
    })
}
