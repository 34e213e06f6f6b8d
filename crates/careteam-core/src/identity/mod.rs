//! Identity: authentication, registration and account maintenance.
//!
//! Every write here runs through `Database::atomically`, so a registration
//! either lands completely (user, profile, first history entry) or not at all.

mod credential;
mod session;

pub use credential::*;
pub use session::*;

use chrono::{NaiveDate, Utc};

use crate::care_team::CareTeam;
use crate::db::Database;
use crate::error::{AuthError, CareError, CareResult, Conflict, ValidationError};
use crate::models::{MedicalHistoryEntry, PatientProfile, Role, User, UserChanges};
use crate::validate;

/// Everything needed to create an account.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub credential: String,
    pub role: Role,
    pub email: Option<String>,
    /// Required when `role` is `Patient`, ignored otherwise
    pub patient: Option<PatientDetails>,
}

/// Patient-only registration fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientDetails {
    pub assigned_doctor: String,
    pub phone: String,
    pub patient_type: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    /// Notes for a first history entry dated on the day of registration
    pub initial_history: Option<String>,
}

/// Authentication and account lifecycle over one database handle.
pub struct Identity<'a> {
    db: &'a Database,
    policy: &'a dyn CredentialPolicy,
}

impl<'a> Identity<'a> {
    pub fn new(db: &'a Database, policy: &'a dyn CredentialPolicy) -> Self {
        Self { db, policy }
    }

    /// Check a username/credential pair and open a session carrying the
    /// account's role.
    ///
    /// Unknown usernames and wrong credentials produce the same error.
    pub fn authenticate(&self, username: &str, credential: &str) -> CareResult<Session> {
        let login = self.db.read(|db| db.get_login(username))?;

        match login {
            Some(record) if record.credential.verify(credential) => {
                tracing::info!(username, role = %record.role, "login succeeded");
                Ok(Session::open(record.account_id, username.to_string(), record.role))
            }
            _ => {
                tracing::warn!(username, "login rejected");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Create an account. Returns the new username.
    pub fn register(&self, registration: &Registration) -> CareResult<String> {
        let username = validate::required(&registration.username, "username")?.to_string();
        let name = validate::required(&registration.name, "name")?.to_string();
        self.policy.check(&registration.credential)?;

        let email = validate::optional(registration.email.as_deref());
        if let Some(email) = &email {
            validate::email(email)?;
        }

        let profile = match registration.role {
            Role::Patient => {
                let details = registration
                    .patient
                    .as_ref()
                    .ok_or(ValidationError::MissingField("assigned_doctor"))?;
                Some(self.patient_profile(&username, &name, email.clone(), details)?)
            }
            _ => None,
        };

        let user = User::new(username.clone(), registration.role, name, email);
        let credential = StoredCredential::derive(&registration.credential);
        let first_entry = registration
            .patient
            .as_ref()
            .and_then(|details| validate::optional(details.initial_history.as_deref()));

        self.db.atomically(|db| -> CareResult<()> {
            if db.username_exists(&user.username)? {
                return Err(Conflict::DuplicateUsername(user.username.clone()).into());
            }
            db.insert_user(&user, &credential)?;

            if let Some(profile) = &profile {
                if !db.user_has_role(&profile.assigned_doctor, Role::Doctor)? {
                    return Err(
                        ValidationError::UnknownDoctor(profile.assigned_doctor.clone()).into(),
                    );
                }
                db.insert_profile(profile)?;

                if let Some(notes) = &first_entry {
                    db.insert_history(&MedicalHistoryEntry {
                        patient: user.username.clone(),
                        date: Utc::now().date_naive(),
                        notes: notes.clone(),
                    })?;
                }
            }
            Ok(())
        })?;

        tracing::info!(username = %user.username, role = %user.role, "account registered");
        Ok(username)
    }

    fn patient_profile(
        &self,
        username: &str,
        name: &str,
        email: Option<String>,
        details: &PatientDetails,
    ) -> CareResult<PatientProfile> {
        let doctor = validate::required(&details.assigned_doctor, "assigned_doctor")?;
        let phone = details.phone.trim();
        validate::phone(phone)?;

        Ok(PatientProfile {
            email,
            gender: validate::optional(details.gender.as_deref()),
            date_of_birth: details.date_of_birth,
            blood_group: validate::optional(details.blood_group.as_deref()),
            patient_type: validate::optional(details.patient_type.as_deref()),
            ..PatientProfile::new(
                username.to_string(),
                name.to_string(),
                phone.to_string(),
                doctor.to_string(),
            )
        })
    }

    /// Apply admin edits to an account. The role never changes.
    pub fn update_user(&self, username: &str, changes: &UserChanges) -> CareResult<User> {
        let name = changes
            .name
            .as_deref()
            .map(|n| validate::required(n, "name").map(str::to_string))
            .transpose()?;
        // Outer `None` keeps the address, inner `None` clears it
        let email = changes
            .email
            .as_deref()
            .map(|raw| validate::optional(Some(raw)));
        if let Some(Some(email)) = &email {
            validate::email(email)?;
        }
        let credential = changes
            .credential
            .as_deref()
            .map(|secret| {
                self.policy.check(secret)?;
                Ok::<_, ValidationError>(StoredCredential::derive(secret))
            })
            .transpose()?;
        let new_username = changes
            .new_username
            .as_deref()
            .map(|u| validate::required(u, "username").map(str::to_string))
            .transpose()?
            .filter(|u| u != username);

        self.db.atomically(|db| -> CareResult<User> {
            let mut user = db
                .get_user(username)?
                .ok_or_else(|| CareError::NotFound(format!("user `{}`", username)))?;

            if let Some(new_username) = &new_username {
                if db.username_exists(new_username)? {
                    return Err(Conflict::DuplicateUsername(new_username.clone()).into());
                }
                db.rename_user(&user.username, new_username)?;
                tracing::info!(from = %user.username, to = %new_username, "account renamed");
                user.username = new_username.clone();
            }

            if name.is_some() || email.is_some() {
                if let Some(name) = &name {
                    user.name = name.clone();
                }
                if let Some(email) = &email {
                    user.email = email.clone();
                }
                db.update_user_details(&user.username, &user.name, user.email.as_deref())?;

                if user.role == Role::Patient {
                    if let Some(mut profile) = db.get_profile(&user.username)? {
                        if let Some(name) = &name {
                            profile.name = name.clone();
                        }
                        if let Some(email) = &email {
                            profile.email = email.clone();
                        }
                        db.update_profile(&profile)?;
                    }
                }
            }

            if let Some(credential) = &credential {
                db.set_credential(&user.username, credential)?;
            }

            Ok(user)
        })
    }

    /// Delete an account. Doctors go through the dependents guard.
    pub fn delete_user(&self, username: &str) -> CareResult<()> {
        self.db.atomically(|db| -> CareResult<()> {
            let user = db
                .get_user(username)?
                .ok_or_else(|| CareError::NotFound(format!("user `{}`", username)))?;

            if user.role == Role::Doctor {
                return CareTeam::new(db).delete_doctor(username);
            }
            db.delete_user(username)?;
            tracing::info!(username, role = %user.role, "account deleted");
            Ok(())
        })
    }

    /// Re-check a credential without opening a session.
    pub fn confirm(&self, username: &str, credential: &str) -> CareResult<()> {
        let login = self.db.read(|db| db.get_login(username))?;
        match login {
            Some(record) if record.credential.verify(credential) => Ok(()),
            _ => Err(AuthError::InvalidCredentials.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(identity: &Identity<'_>, username: &str, role: Role, credential: &str) {
        identity
            .register(&Registration {
                name: username.to_uppercase(),
                username: username.into(),
                credential: credential.into(),
                role,
                email: None,
                patient: None,
            })
            .unwrap();
    }

    fn patient_registration(doctor: &str) -> Registration {
        Registration {
            name: "Jane Roe".into(),
            username: "pat1".into(),
            credential: "1111111111".into(),
            role: Role::Patient,
            email: Some("jane@example.com".into()),
            patient: Some(PatientDetails {
                assigned_doctor: doctor.into(),
                phone: "1111111111".into(),
                initial_history: Some("Seasonal allergies".into()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_authenticate_hides_failure_cause() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        register(&identity, "dr1", Role::Doctor, "0000000001");

        assert_eq!(identity.authenticate("dr1", "0000000001").unwrap().role(), Role::Doctor);

        let wrong = identity.authenticate("dr1", "0000000002").unwrap_err();
        let missing = identity.authenticate("ghost", "0000000001").unwrap_err();
        assert!(matches!(wrong, CareError::Auth(AuthError::InvalidCredentials)));
        assert!(matches!(missing, CareError::Auth(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_bootstrap_admin_can_log_in() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        assert_eq!(identity.authenticate("admin", "admin123").unwrap().role(), Role::Admin);
    }

    #[test]
    fn test_register_patient_writes_profile_and_history() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        register(&identity, "dr1", Role::Doctor, "0000000001");

        identity.register(&patient_registration("dr1")).unwrap();

        let profile = db.get_profile("pat1").unwrap().unwrap();
        assert_eq!(profile.assigned_doctor, "dr1");
        assert_eq!(profile.name, "Jane Roe");
        assert_eq!(profile.phone, "1111111111");
        assert_eq!(db.list_history("pat1", None).unwrap().len(), 1);
    }

    #[test]
    fn test_register_patient_unknown_doctor_leaves_nothing() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);

        let err = identity.register(&patient_registration("nobody")).unwrap_err();
        assert!(matches!(
            err,
            CareError::Validation(ValidationError::UnknownDoctor(_))
        ));
        assert!(db.get_user("pat1").unwrap().is_none());
    }

    #[test]
    fn test_register_rejections() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        register(&identity, "n1", Role::Nurse, "2222222222");

        let duplicate = Registration {
            name: "Other".into(),
            username: "n1".into(),
            credential: "3333333333".into(),
            role: Role::Nurse,
            email: None,
            patient: None,
        };
        assert_eq!(
            identity.register(&duplicate).unwrap_err().conflict(),
            Some(&Conflict::DuplicateUsername("n1".into()))
        );

        let bad_secret = Registration {
            username: "n2".into(),
            credential: "short".into(),
            ..duplicate.clone()
        };
        assert!(matches!(
            identity.register(&bad_secret),
            Err(CareError::Validation(ValidationError::CredentialShape(_)))
        ));

        let blank = Registration {
            username: "  ".into(),
            ..duplicate
        };
        assert!(matches!(
            identity.register(&blank),
            Err(CareError::Validation(ValidationError::MissingField("username")))
        ));
    }

    #[test]
    fn test_update_user_rename_and_credential() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        register(&identity, "n1", Role::Nurse, "2222222222");
        register(&identity, "n2", Role::Nurse, "3333333333");

        let taken = identity.update_user(
            "n1",
            &UserChanges {
                new_username: Some("n2".into()),
                ..Default::default()
            },
        );
        assert!(matches!(
            taken,
            Err(CareError::Conflict(Conflict::DuplicateUsername(_)))
        ));

        let user = identity
            .update_user(
                "n1",
                &UserChanges {
                    new_username: Some("nurse.ann".into()),
                    credential: Some("4444444444".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(user.username, "nurse.ann");
        assert_eq!(identity.authenticate("nurse.ann", "4444444444").unwrap().role(), Role::Nurse);
        assert!(identity.authenticate("n1", "2222222222").is_err());
    }

    #[test]
    fn test_update_user_blank_email_clears_it() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        register(&identity, "dr1", Role::Doctor, "0000000001");
        identity.register(&patient_registration("dr1")).unwrap();

        // Untouched when absent
        let user = identity
            .update_user(
                "pat1",
                &UserChanges {
                    name: Some("Jane Q. Roe".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(user.email.as_deref(), Some("jane@example.com"));

        let user = identity
            .update_user(
                "pat1",
                &UserChanges {
                    email: Some("  ".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(user.email, None);
        assert_eq!(db.get_user("pat1").unwrap().unwrap().email, None);

        let profile = db.get_profile("pat1").unwrap().unwrap();
        assert_eq!(profile.email, None);
        assert_eq!(profile.name, "Jane Q. Roe");
    }

    #[test]
    fn test_delete_user_guards_doctors() {
        let db = Database::open_in_memory().unwrap();
        let policy = PhoneDigits::default();
        let identity = Identity::new(&db, &policy);
        register(&identity, "dr1", Role::Doctor, "0000000001");
        identity.register(&patient_registration("dr1")).unwrap();

        let err = identity.delete_user("dr1").unwrap_err();
        assert!(matches!(
            err.conflict(),
            Some(Conflict::DependentsExist { patients: 1, .. })
        ));

        identity.delete_user("pat1").unwrap();
        identity.delete_user("dr1").unwrap();
        assert!(db.get_user("dr1").unwrap().is_none());
    }
}
