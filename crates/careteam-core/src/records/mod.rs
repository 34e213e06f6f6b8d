//! Medical record store: one dated note per patient per day.

use chrono::NaiveDate;

use crate::db::Database;
use crate::error::{CareResult, Conflict, ValidationError};
use crate::models::{MedicalHistoryEntry, Role};
use crate::validate;

/// Entries shown on the patient dashboard.
pub const DASHBOARD_HISTORY_LIMIT: usize = 5;

pub struct RecordStore<'a> {
    db: &'a Database,
}

impl<'a> RecordStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn require_patient(db: &Database, patient: &str) -> CareResult<()> {
        if db.user_has_role(patient, Role::Patient)? {
            Ok(())
        } else {
            Err(ValidationError::UnknownPatient(patient.to_string()).into())
        }
    }

    /// Add the entry for `date`. A second entry on the same date is a
    /// `DuplicateDate` conflict, never an overwrite.
    pub fn add_entry(
        &self,
        patient: &str,
        date: NaiveDate,
        notes: &str,
    ) -> CareResult<MedicalHistoryEntry> {
        let notes = validate::required(notes, "notes")?;

        self.db.atomically(|db| -> CareResult<MedicalHistoryEntry> {
            Self::require_patient(db, patient)?;
            if db.get_history_entry(patient, date)?.is_some() {
                return Err(Conflict::DuplicateDate {
                    patient: patient.to_string(),
                    date: date.to_string(),
                }
                .into());
            }

            let entry = MedicalHistoryEntry {
                patient: patient.to_string(),
                date,
                notes: notes.to_string(),
            };
            db.insert_history(&entry)?;
            Ok(entry)
        })
    }

    /// Merge `notes` into the entry for `date`, creating it if absent.
    pub fn append_notes(
        &self,
        patient: &str,
        date: NaiveDate,
        notes: &str,
    ) -> CareResult<MedicalHistoryEntry> {
        let notes = validate::required(notes, "notes")?;

        self.db.atomically(|db| -> CareResult<MedicalHistoryEntry> {
            Self::require_patient(db, patient)?;
            match db.get_history_entry(patient, date)? {
                Some(mut entry) => {
                    entry.notes = format!("{}\n{}", entry.notes, notes);
                    db.update_history_notes(patient, date, &entry.notes)?;
                    Ok(entry)
                }
                None => {
                    let entry = MedicalHistoryEntry {
                        patient: patient.to_string(),
                        date,
                        notes: notes.to_string(),
                    };
                    db.insert_history(&entry)?;
                    Ok(entry)
                }
            }
        })
    }

    /// Newest first; `None` returns the whole history.
    pub fn history(
        &self,
        patient: &str,
        limit: Option<usize>,
    ) -> CareResult<Vec<MedicalHistoryEntry>> {
        self.db
            .read(|db| db.list_history(patient, limit))
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CareError;
    use crate::identity::StoredCredential;
    use crate::models::User;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        for (username, role) in [("pat1", Role::Patient), ("n1", Role::Nurse)] {
            let user = User::new(username.into(), role, username.into(), None);
            db.insert_user(&user, &StoredCredential::derive("x")).unwrap();
        }
        db
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_duplicate_date_rejected() {
        let db = setup_db();
        let store = RecordStore::new(&db);

        store.add_entry("pat1", date("2024-01-10"), "Flu").unwrap();
        let err = store
            .add_entry("pat1", date("2024-01-10"), "Follow-up")
            .unwrap_err();
        assert!(matches!(
            err.conflict(),
            Some(Conflict::DuplicateDate { .. })
        ));

        let history = store.history("pat1", None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].notes, "Flu");
    }

    #[test]
    fn test_append_merges_same_day() {
        let db = setup_db();
        let store = RecordStore::new(&db);

        store.append_notes("pat1", date("2024-01-10"), "Flu").unwrap();
        let merged = store
            .append_notes("pat1", date("2024-01-10"), "Prescribed rest")
            .unwrap();
        assert_eq!(merged.notes, "Flu\nPrescribed rest");
        assert_eq!(store.history("pat1", None).unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_blank_notes_and_non_patients() {
        let db = setup_db();
        let store = RecordStore::new(&db);

        assert!(matches!(
            store.add_entry("pat1", date("2024-01-10"), "  "),
            Err(CareError::Validation(ValidationError::MissingField("notes")))
        ));
        assert!(matches!(
            store.add_entry("n1", date("2024-01-10"), "x"),
            Err(CareError::Validation(ValidationError::UnknownPatient(_)))
        ));
    }

    #[test]
    fn test_dashboard_limit() {
        let db = setup_db();
        let store = RecordStore::new(&db);
        for day in 1..=7 {
            store
                .add_entry("pat1", date(&format!("2024-01-{:02}", day)), "visit")
                .unwrap();
        }

        let recent = store.history("pat1", Some(DASHBOARD_HISTORY_LIMIT)).unwrap();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].date, date("2024-01-07"));
    }
}
