//! Per-login session context.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Role;

/// An authenticated actor. Only produced by a successful login, so the role
/// it carries was resolved from storage exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct Session {
    session_id: Uuid,
    account_id: String,
    username: String,
    role: Role,
    opened_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn open(account_id: String, username: String, role: Role) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            account_id,
            username,
            role,
            opened_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The account this session was opened for, stable across renames.
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sessions_are_distinct() {
        let a = Session::open("acct-1".into(), "dr1".into(), Role::Doctor);
        let b = Session::open("acct-1".into(), "dr1".into(), Role::Doctor);
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(a.account_id(), b.account_id());
        assert_eq!(a.username(), "dr1");
        assert_eq!(a.role(), Role::Doctor);
    }
}
