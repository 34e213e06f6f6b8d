//! Patient profile models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Clinical profile of a patient account, 1:1 with its user row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    /// Username of the owning patient account
    pub username: String,
    pub name: String,
    /// Contact phone (10 digits)
    pub phone: String,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
    /// Username of the doctor this patient is under
    pub assigned_doctor: String,
    /// Intake category (e.g. "General", "Emergency")
    pub patient_type: Option<String>,
}

impl PatientProfile {
    /// Create a profile with required fields.
    pub fn new(username: String, name: String, phone: String, assigned_doctor: String) -> Self {
        Self {
            username,
            name,
            phone,
            email: None,
            gender: None,
            date_of_birth: None,
            blood_group: None,
            assigned_doctor,
            patient_type: None,
        }
    }

    /// Apply an edit, leaving `None` fields untouched.
    pub fn apply(&mut self, changes: &ProfileChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = phone.clone();
        }
        if let Some(email) = &changes.email {
            self.email = Some(email.clone());
        }
        if let Some(gender) = &changes.gender {
            self.gender = Some(gender.clone());
        }
        if let Some(dob) = changes.date_of_birth {
            self.date_of_birth = Some(dob);
        }
        if let Some(blood_group) = &changes.blood_group {
            self.blood_group = Some(blood_group.clone());
        }
    }
}

/// Fields a patient may edit on their own profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub blood_group: Option<String>,
}
