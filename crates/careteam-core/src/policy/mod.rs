//! Access policy and role router.
//!
//! `Role::permits` is the single table of which role may invoke which
//! operation. Record-level scope (own patients, the nurse's doctor) is
//! checked by `Clinic` after this table.

use crate::identity::Session;
use crate::models::Role;

/// Every action a dashboard can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Admin
    ListUsers,
    ViewUser,
    RegisterUser,
    UpdateUser,
    DeleteUser,
    ResetClinicalData,

    // Doctor
    RegisterPatient,
    AssignNurse,
    RemoveNurse,
    ListAssignableNurses,
    ListOwnPatients,
    ReassignPatient,
    ViewPatientHistory,
    AddHistoryEntry,

    // Nurse
    ViewAssignedDoctor,
    ViewDoctorPatients,
    ViewLatestAppointment,

    // Patient
    ViewOwnProfile,
    EditOwnProfile,
    ViewOwnAppointments,
    ViewOwnHistory,

    // Shared
    BookAppointment,
    ViewDoctorAppointments,
    ListDoctors,
}

impl Operation {
    pub const ALL: [Operation; 24] = [
        Operation::ListUsers,
        Operation::ViewUser,
        Operation::RegisterUser,
        Operation::UpdateUser,
        Operation::DeleteUser,
        Operation::ResetClinicalData,
        Operation::RegisterPatient,
        Operation::AssignNurse,
        Operation::RemoveNurse,
        Operation::ListAssignableNurses,
        Operation::ListOwnPatients,
        Operation::ReassignPatient,
        Operation::ViewPatientHistory,
        Operation::AddHistoryEntry,
        Operation::ViewAssignedDoctor,
        Operation::ViewDoctorPatients,
        Operation::ViewLatestAppointment,
        Operation::ViewOwnProfile,
        Operation::EditOwnProfile,
        Operation::ViewOwnAppointments,
        Operation::ViewOwnHistory,
        Operation::BookAppointment,
        Operation::ViewDoctorAppointments,
        Operation::ListDoctors,
    ];
}

impl Role {
    /// Whether this role may invoke `op` at all.
    pub fn permits(&self, op: Operation) -> bool {
        use Operation::*;

        match self {
            Role::Admin => matches!(
                op,
                ListUsers
                    | ViewUser
                    | RegisterUser
                    | UpdateUser
                    | DeleteUser
                    | ResetClinicalData
                    | ListDoctors
            ),
            Role::Doctor => matches!(
                op,
                RegisterPatient
                    | AssignNurse
                    | RemoveNurse
                    | ListAssignableNurses
                    | ListOwnPatients
                    | ReassignPatient
                    | ViewPatientHistory
                    | AddHistoryEntry
                    | BookAppointment
                    | ViewDoctorAppointments
                    | ListDoctors
            ),
            Role::Nurse => matches!(
                op,
                ViewAssignedDoctor
                    | ViewDoctorPatients
                    | ViewDoctorAppointments
                    | ViewLatestAppointment
            ),
            Role::Patient => matches!(
                op,
                ViewOwnProfile
                    | EditOwnProfile
                    | ViewOwnAppointments
                    | ViewOwnHistory
                    | BookAppointment
            ),
        }
    }
}

/// Where an actor is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dashboard {
    Login,
    Admin,
    Doctor,
    Nurse,
    Patient,
}

impl Dashboard {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Dashboard::Admin,
            Role::Doctor => Dashboard::Doctor,
            Role::Nurse => Dashboard::Nurse,
            Role::Patient => Dashboard::Patient,
        }
    }
}

/// Login state of one client.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum AccessState {
    #[default]
    Anonymous,
    Authenticated(Session),
}

impl AccessState {
    pub fn dashboard(&self) -> Dashboard {
        match self {
            AccessState::Anonymous => Dashboard::Login,
            AccessState::Authenticated(session) => Dashboard::for_role(session.role()),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AccessState::Anonymous => None,
            AccessState::Authenticated(session) => Some(session),
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(Session::role)
    }

    /// Any state goes back to `Anonymous`.
    pub fn logout(&mut self) {
        if let AccessState::Authenticated(session) = std::mem::take(self) {
            tracing::info!(username = session.username(), "logged out");
        }
    }
}

impl From<Session> for AccessState {
    fn from(session: Session) -> Self {
        AccessState::Authenticated(session)
    }
}
