//! Doctor/nurse care assignment models.

use serde::{Deserialize, Serialize};

/// Where a nurse stands relative to the doctor asking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NurseStanding {
    /// Already on the caller's team
    AssignedToCaller,
    /// On another doctor's team; moving requires explicit confirmation
    AssignedElsewhere { doctor: String },
    /// Free to assign
    Unassigned,
}

/// One nurse in the assignable-nurses listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NurseCandidate {
    pub username: String,
    pub name: String,
    pub standing: NurseStanding,
}

impl NurseCandidate {
    /// The doctor currently holding this nurse, if any.
    pub fn current_doctor<'a>(&'a self, caller: &'a str) -> Option<&'a str> {
        match &self.standing {
            NurseStanding::AssignedToCaller => Some(caller),
            NurseStanding::AssignedElsewhere { doctor } => Some(doctor),
            NurseStanding::Unassigned => None,
        }
    }

    pub fn is_assigned_to_caller(&self) -> bool {
        matches!(self.standing, NurseStanding::AssignedToCaller)
    }
}

/// Result of a nurse move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub doctor: String,
    pub nurse: String,
    /// Doctor that held the nurse before the move (advisory only)
    pub previous_doctor: Option<String>,
}

impl AssignmentOutcome {
    /// True when the nurse was taken from a different doctor.
    pub fn moved_from_other_doctor(&self) -> bool {
        self.previous_doctor
            .as_deref()
            .is_some_and(|prev| prev != self.doctor)
    }
}
