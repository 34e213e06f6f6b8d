//! Appointment models.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Meridiem {
    Am,
    Pm,
}

/// A normalized 12-hour wall-clock time.
///
/// Stored as 24-hour `HH:MM` so that text ordering in SQL matches
/// chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppointmentTime {
    hour: u8,
    minute: u8,
    meridiem: Meridiem,
}

impl AppointmentTime {
    /// Build from the 12-hour triple; hour 1-12, minute 0-59.
    pub fn new(hour: u8, minute: u8, meridiem: Meridiem) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(ValidationError::TimeOutOfRange { hour, minute });
        }
        Ok(Self {
            hour,
            minute,
            meridiem,
        })
    }

    /// Build from a 24-hour clock reading.
    pub fn from_24h(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::TimeOutOfRange { hour, minute });
        }
        let meridiem = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
        let hour12 = match hour % 12 {
            0 => 12,
            h => h,
        };
        Self::new(hour12, minute, meridiem)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn meridiem(&self) -> Meridiem {
        self.meridiem
    }

    /// (hour 0-23, minute)
    pub fn to_24h(&self) -> (u8, u8) {
        let base = self.hour % 12;
        match self.meridiem {
            Meridiem::Am => (base, self.minute),
            Meridiem::Pm => (base + 12, self.minute),
        }
    }

    /// Storage form, `HH:MM` on a 24-hour clock.
    pub fn to_storage(&self) -> String {
        let (h, m) = self.to_24h();
        format!("{:02}:{:02}", h, m)
    }

    /// Parse the storage form.
    pub fn from_storage(s: &str) -> Option<Self> {
        let (h, m) = s.split_once(':')?;
        if h.len() != 2 || m.len() != 2 {
            return None;
        }
        let hour: u8 = h.parse().ok()?;
        let minute: u8 = m.parse().ok()?;
        Self::from_24h(hour, minute).ok()
    }
}

impl Ord for AppointmentTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_24h().cmp(&other.to_24h())
    }
}

impl PartialOrd for AppointmentTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for AppointmentTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.meridiem {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        };
        write!(f, "{:02}:{:02} {}", self.hour, self.minute, suffix)
    }
}

/// A booked appointment. All four fields together form the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    /// Doctor username
    pub doctor: String,
    /// Patient username
    pub patient: String,
    pub date: NaiveDate,
    pub time: AppointmentTime,
}
