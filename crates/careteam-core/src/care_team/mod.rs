//! Care-team assignment engine.
//!
//! Owns the doctor/nurse and patient/doctor relationships. A nurse belongs
//! to at most one doctor; assigning is a move, never an addition.

use std::collections::HashSet;

use crate::db::Database;
use crate::error::{CareError, CareResult, Conflict, ValidationError};
use crate::models::{
    AssignmentOutcome, NurseCandidate, NurseStanding, PatientProfile, Role, User,
};

/// Assignment rules over one database handle.
pub struct CareTeam<'a> {
    db: &'a Database,
}

impl<'a> CareTeam<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn require_doctor(db: &Database, doctor: &str) -> CareResult<()> {
        if db.user_has_role(doctor, Role::Doctor)? {
            Ok(())
        } else {
            Err(ValidationError::UnknownDoctor(doctor.to_string()).into())
        }
    }

    /// Put `nurse` on `doctor`'s team, taking them off any other team.
    ///
    /// The previous doctor is reported so callers can warn; it never blocks.
    pub fn assign_nurse(&self, doctor: &str, nurse: &str) -> CareResult<AssignmentOutcome> {
        let outcome = self.db.atomically(|db| -> CareResult<AssignmentOutcome> {
            Self::require_doctor(db, doctor)?;
            if !db.user_has_role(nurse, Role::Nurse)? {
                return Err(ValidationError::UnknownNurse(nurse.to_string()).into());
            }

            let previous_doctor = db.doctor_for_nurse(nurse)?;
            db.clear_nurse_assignment(nurse)?;
            db.insert_assignment(doctor, nurse)?;

            Ok(AssignmentOutcome {
                doctor: doctor.to_string(),
                nurse: nurse.to_string(),
                previous_doctor,
            })
        })?;

        if outcome.moved_from_other_doctor() {
            tracing::info!(
                nurse,
                doctor,
                previous = outcome.previous_doctor.as_deref().unwrap_or_default(),
                "nurse moved between doctors"
            );
        } else {
            tracing::debug!(nurse, doctor, "nurse assigned");
        }
        Ok(outcome)
    }

    /// Drop one pairing. Returns false when it did not exist.
    pub fn remove_nurse(&self, doctor: &str, nurse: &str) -> CareResult<bool> {
        self.db
            .atomically(|db| db.delete_assignment(doctor, nurse))
            .map_err(Into::into)
    }

    /// Every nurse, tagged with where they stand relative to `doctor`.
    pub fn list_assignable_nurses(&self, doctor: &str) -> CareResult<Vec<NurseCandidate>> {
        self.db.read(|db| -> CareResult<Vec<NurseCandidate>> {
            Self::require_doctor(db, doctor)?;

            let doctors: HashSet<String> = db
                .list_users_by_role(Role::Doctor)?
                .into_iter()
                .map(|u| u.username)
                .collect();

            db.list_nurses_with_doctor()?
                .into_iter()
                .map(|row| {
                    let standing = match row.doctor {
                        None => NurseStanding::Unassigned,
                        Some(holder) if holder == doctor => NurseStanding::AssignedToCaller,
                        Some(holder) if doctors.contains(&holder) => {
                            NurseStanding::AssignedElsewhere { doctor: holder }
                        }
                        Some(holder) => {
                            return Err(CareError::Integrity(format!(
                                "nurse `{}` is assigned to `{}`, which is not a doctor",
                                row.username, holder
                            )))
                        }
                    };
                    Ok(NurseCandidate {
                        username: row.username,
                        name: row.name,
                        standing,
                    })
                })
                .collect()
        })
    }

    /// Nurses on `doctor`'s team.
    pub fn team_of(&self, doctor: &str) -> CareResult<Vec<String>> {
        self.db.read(|db| db.nurses_for_doctor(doctor)).map_err(Into::into)
    }

    /// The doctor holding `nurse`, resolved to a full account.
    pub fn doctor_for_nurse(&self, nurse: &str) -> CareResult<Option<User>> {
        self.db.read(|db| -> CareResult<Option<User>> {
            let Some(doctor) = db.doctor_for_nurse(nurse)? else {
                return Ok(None);
            };
            match db.get_user(&doctor)? {
                Some(user) if user.role == Role::Doctor => Ok(Some(user)),
                _ => Err(CareError::Integrity(format!(
                    "nurse `{}` references `{}`, which is not a doctor",
                    nurse, doctor
                ))),
            }
        })
    }

    /// Move a patient under another doctor.
    pub fn reassign_patient_doctor(&self, patient: &str, new_doctor: &str) -> CareResult<()> {
        self.db.atomically(|db| -> CareResult<()> {
            Self::require_doctor(db, new_doctor)?;
            if !db.set_assigned_doctor(patient, new_doctor)? {
                return Err(ValidationError::UnknownPatient(patient.to_string()).into());
            }
            tracing::info!(patient, doctor = new_doctor, "patient reassigned");
            Ok(())
        })
    }

    /// Patients under `doctor`, optionally filtered by name fragment.
    pub fn patients_of(
        &self,
        doctor: &str,
        name_filter: Option<&str>,
    ) -> CareResult<Vec<PatientProfile>> {
        self.db
            .read(|db| db.list_profiles_for_doctor(doctor, name_filter))
            .map_err(Into::into)
    }

    /// Delete a doctor account, refused while any nurse or patient still
    /// depends on it.
    pub fn delete_doctor(&self, doctor: &str) -> CareResult<()> {
        self.db.atomically(|db| -> CareResult<()> {
            Self::require_doctor(db, doctor)?;

            let nurses = db.count_nurses_for_doctor(doctor)?;
            let patients = db.count_patients_for_doctor(doctor)?;
            if nurses > 0 || patients > 0 {
                tracing::warn!(doctor, nurses, patients, "doctor deletion refused");
                return Err(Conflict::DependentsExist {
                    doctor: doctor.to_string(),
                    nurses,
                    patients,
                }
                .into());
            }

            db.delete_user(doctor)?;
            tracing::info!(doctor, "doctor deleted");
            Ok(())
        })
    }
}
