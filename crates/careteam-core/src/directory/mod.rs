//! User directory for the admin dashboard and doctor pickers.
//!
//! Search matching:
//! - substring of username or display name (case-insensitive), or
//! - Jaro-Winkler similarity of any display-name word above a threshold,
//!   so "jonh" still finds "John Smith".

use strsim::jaro_winkler;

use crate::config::BootstrapAdmin;
use crate::db::Database;
use crate::error::CareResult;
use crate::models::{Role, User, UserFilter, UserSummary};

/// Minimum similarity for a typo-tolerant match.
const FUZZY_THRESHOLD: f64 = 0.88;

/// Search terms shorter than this only match as substrings.
const MIN_FUZZY_LEN: usize = 3;

pub struct Directory<'a> {
    db: &'a Database,
}

impl<'a> Directory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn summarize(db: &Database, user: &User) -> CareResult<UserSummary> {
        let profile_name = match user.role {
            Role::Patient => db.get_profile(&user.username)?.map(|p| p.name),
            _ => None,
        };
        Ok(UserSummary::from_user(user, profile_name.as_deref()))
    }

    /// All accounts matching `filter`, ordered by username.
    pub fn list_users(&self, filter: &UserFilter) -> CareResult<Vec<UserSummary>> {
        let term = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        self.db.read(|db| -> CareResult<Vec<UserSummary>> {
            let users = match filter.role {
                Some(role) => db.list_users_by_role(role)?,
                None => db.list_users()?,
            };

            let mut summaries = Vec::with_capacity(users.len());
            for user in &users {
                let summary = Self::summarize(db, user)?;
                if term.as_deref().map_or(true, |t| matches_search(&summary, t)) {
                    summaries.push(summary);
                }
            }
            Ok(summaries)
        })
    }

    /// Every doctor, for reassignment and registration pickers.
    pub fn list_doctors(&self) -> CareResult<Vec<UserSummary>> {
        self.list_users(&UserFilter {
            search: None,
            role: Some(Role::Doctor),
        })
    }

    pub fn user(&self, username: &str) -> CareResult<Option<User>> {
        self.db.read(|db| db.get_user(username)).map_err(Into::into)
    }

    /// Wipe all clinical data and every account except the bootstrap admin.
    pub fn reset(&self, admin: &BootstrapAdmin) -> CareResult<()> {
        self.db.atomically(|db| db.reset_to_bootstrap(admin))?;
        tracing::warn!(admin = %admin.username, "clinical data reset to bootstrap state");
        Ok(())
    }
}

/// `term` must already be trimmed and lowercased.
fn matches_search(summary: &UserSummary, term: &str) -> bool {
    let username = summary.username.to_lowercase();
    let display = summary.display_name.to_lowercase();

    if username.contains(term) || display.contains(term) {
        return true;
    }
    if term.chars().count() < MIN_FUZZY_LEN {
        return false;
    }

    display
        .split_whitespace()
        .chain(std::iter::once(username.as_str()))
        .any(|word| jaro_winkler(word, term) >= FUZZY_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StoredCredential;
    use crate::models::PatientProfile;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        for (username, role, name) in [
            ("dr1", Role::Doctor, "Gregory House"),
            ("dr2", Role::Doctor, "Lisa Cuddy"),
            ("n1", Role::Nurse, "John Smith"),
            ("pat1", Role::Patient, "placeholder"),
        ] {
            let user = User::new(username.into(), role, name.into(), None);
            db.insert_user(&user, &StoredCredential::derive("x")).unwrap();
        }
        db.insert_profile(&PatientProfile::new(
            "pat1".into(),
            "Jane Roe".into(),
            "1111111111".into(),
            "dr1".into(),
        ))
        .unwrap();
        db
    }

    fn usernames(summaries: &[UserSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.username.as_str()).collect()
    }

    #[test]
    fn test_display_names_in_listing() {
        let db = setup_db();
        let all = Directory::new(&db).list_users(&UserFilter::default()).unwrap();

        let name_of = |u: &str| {
            all.iter()
                .find(|s| s.username == u)
                .map(|s| s.display_name.clone())
                .unwrap()
        };
        assert_eq!(name_of("dr1"), "Dr. Gregory House");
        assert_eq!(name_of("pat1"), "Jane Roe");
        assert_eq!(name_of("admin"), "Administrator");
    }

    #[test]
    fn test_filter_by_role_and_search() {
        let db = setup_db();
        let directory = Directory::new(&db);

        let doctors = directory.list_doctors().unwrap();
        assert_eq!(usernames(&doctors), vec!["dr1", "dr2"]);

        let found = directory
            .list_users(&UserFilter {
                search: Some("CUDDY".into()),
                role: None,
            })
            .unwrap();
        assert_eq!(usernames(&found), vec!["dr2"]);
    }

    #[test]
    fn test_search_tolerates_typos() {
        let db = setup_db();
        let found = Directory::new(&db)
            .list_users(&UserFilter {
                search: Some("jonh".into()),
                role: Some(Role::Nurse),
            })
            .unwrap();
        assert_eq!(usernames(&found), vec!["n1"]);
    }

    #[test]
    fn test_reset_leaves_only_admin() {
        let db = setup_db();
        let directory = Directory::new(&db);
        directory.reset(&BootstrapAdmin::default()).unwrap();

        let all = directory.list_users(&UserFilter::default()).unwrap();
        assert_eq!(usernames(&all), vec!["admin"]);
    }
}
