//! Medical history models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A dated clinical note. One per patient per date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicalHistoryEntry {
    /// Patient username
    pub patient: String,
    pub date: NaiveDate,
    pub notes: String,
}
