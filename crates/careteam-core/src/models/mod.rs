//! Domain models for the care-team system.

mod appointment;
mod assignment;
mod history;
mod patient;
mod user;

pub use appointment::*;
pub use assignment::*;
pub use history::*;
pub use patient::*;
pub use user::*;
