//! Admin dashboard: account management and the clinical-data reset.

use super::Clinic;
use crate::directory::Directory;
use crate::error::{CareError, CareResult, ValidationError};
use crate::identity::{Registration, Session};
use crate::models::{User, UserChanges, UserFilter, UserSummary};
use crate::policy::Operation;

impl Clinic {
    pub fn list_users(&self, session: &Session, filter: &UserFilter) -> CareResult<Vec<UserSummary>> {
        self.read(session, Operation::ListUsers, |db| {
            Directory::new(db).list_users(filter)
        })
    }

    pub fn user(&self, session: &Session, username: &str) -> CareResult<User> {
        self.read(session, Operation::ViewUser, |db| {
            Directory::new(db)
                .user(username)?
                .ok_or_else(|| CareError::NotFound(format!("user `{}`", username)))
        })
    }

    /// Create an account of any role.
    pub fn register_user(&self, session: &Session, registration: &Registration) -> CareResult<String> {
        self.write(session, Operation::RegisterUser, |db| {
            self.identity(db).register(registration)
        })
    }

    pub fn update_user(
        &self,
        session: &Session,
        username: &str,
        changes: &UserChanges,
    ) -> CareResult<User> {
        self.write(session, Operation::UpdateUser, |db| {
            self.identity(db).update_user(username, changes)
        })
    }

    /// Delete any account but the caller's own.
    pub fn delete_user(&self, session: &Session, username: &str) -> CareResult<()> {
        self.write(session, Operation::DeleteUser, |db| {
            if username == session.username() {
                return Err(ValidationError::SelfDeletion.into());
            }
            self.identity(db).delete_user(username)
        })
    }

    /// Delete every account but the bootstrap admin and every clinical
    /// record. The caller must re-enter their credential.
    pub fn reset_clinical_data(&self, session: &Session, credential: &str) -> CareResult<()> {
        self.write(session, Operation::ResetClinicalData, |db| {
            self.identity(db).confirm(session.username(), credential)?;
            Directory::new(db).reset(&self.config.bootstrap_admin)
        })
    }

    /// Doctors available for assignment pickers.
    pub fn list_doctors(&self, session: &Session) -> CareResult<Vec<UserSummary>> {
        self.read(session, Operation::ListDoctors, |db| {
            Directory::new(db).list_doctors()
        })
    }
}
