//! User and role models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The closed set of roles an account can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Patient,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Doctor, Role::Nurse, Role::Patient];

    /// Canonical lowercase form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "patient" => Ok(Role::Patient),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

/// An authenticable account of any role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Unique, stable identifier used by every cross-reference
    pub username: String,
    /// Fixed at creation and never reused, unlike the username
    pub account_id: String,
    /// Fixed at creation
    pub role: Role,
    /// Display name
    pub name: String,
    pub email: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn new(username: String, role: Role, name: String, email: Option<String>) -> Self {
        Self {
            username,
            account_id: uuid::Uuid::new_v4().to_string(),
            role,
            name,
            email,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A row of the admin user directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    /// Presentation name: profile name for patients, "Dr. <name>" for doctors
    pub display_name: String,
}

impl UserSummary {
    /// Build the summary; `profile_name` only matters for patients.
    pub fn from_user(user: &User, profile_name: Option<&str>) -> Self {
        let base = if user.name.trim().is_empty() {
            user.username.as_str()
        } else {
            user.name.as_str()
        };

        let display_name = match user.role {
            Role::Patient => profile_name.unwrap_or(base).to_string(),
            Role::Doctor => format!("Dr. {}", base),
            Role::Admin | Role::Nurse => base.to_string(),
        };

        Self {
            username: user.username.clone(),
            role: user.role,
            display_name,
        }
    }
}

/// Admin edits to an existing account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub new_username: Option<String>,
    pub name: Option<String>,
    /// A blank address clears the stored one
    pub email: Option<String>,
    pub credential: Option<String>,
}

/// Directory filter for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_is_case_insensitive() {
        assert_eq!("Doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert_eq!(" NURSE ".parse::<Role>().unwrap(), Role::Nurse);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!(matches!(
            "surgeon".parse::<Role>(),
            Err(ValidationError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_role_canonical_form() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            assert_eq!(role.to_string(), role.as_str());
        }
    }

    #[test]
    fn test_display_names() {
        let doctor = User::new("dr1".into(), Role::Doctor, "House".into(), None);
        assert_eq!(UserSummary::from_user(&doctor, None).display_name, "Dr. House");

        let patient = User::new("pat1".into(), Role::Patient, "P".into(), None);
        assert_eq!(
            UserSummary::from_user(&patient, Some("Jane Roe")).display_name,
            "Jane Roe"
        );

        let nameless = User::new("n1".into(), Role::Nurse, "".into(), None);
        assert_eq!(UserSummary::from_user(&nameless, None).display_name, "n1");
    }
}
