//! User database operations.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::config::BootstrapAdmin;
use crate::identity::StoredCredential;
use crate::models::{Role, User};

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Stored login material for one account.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub account_id: String,
    pub role: Role,
    pub credential: StoredCredential,
}

const USER_COLUMNS: &str = "username, account_id, role, name, email, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        username: row.get(0)?,
        account_id: row.get(1)?,
        role: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    /// Insert a new user with its credential digest.
    pub fn insert_user(&self, user: &User, credential: &StoredCredential) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (
                username, account_id, role, name, email,
                credential_salt, credential_digest, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                user.username,
                user.account_id,
                user.role,
                user.name,
                user.email,
                credential.salt,
                credential.digest,
                user.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a user by exact username.
    pub fn get_user(&self, username: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
                [username],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Account id, role and credential digest for login.
    pub fn get_login(&self, username: &str) -> DbResult<Option<LoginRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT account_id, role, credential_salt, credential_digest
                FROM users WHERE username = ?
                "#,
                [username],
                |row| {
                    Ok(LoginRecord {
                        account_id: row.get(0)?,
                        role: row.get(1)?,
                        credential: StoredCredential {
                            salt: row.get(2)?,
                            digest: row.get(3)?,
                        },
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn username_exists(&self, username: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// True when `username` exists and holds `role`.
    pub fn user_has_role(&self, username: &str, role: Role) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 AND role = ?2",
            params![username, role],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all users ordered by username.
    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List users holding one role, ordered by username.
    pub fn list_users_by_role(&self, role: Role) -> DbResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ? ORDER BY username"
        ))?;
        let rows = stmt.query_map([role], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Update display name and email.
    pub fn update_user_details(
        &self,
        username: &str,
        name: &str,
        email: Option<&str>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET name = ?2, email = ?3 WHERE username = ?1",
            params![username, name, email],
        )?;
        Ok(rows_affected > 0)
    }

    /// Rename a user; every reference follows through `ON UPDATE CASCADE`.
    pub fn rename_user(&self, old: &str, new: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET username = ?2 WHERE username = ?1",
            params![old, new],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn set_credential(&self, username: &str, credential: &StoredCredential) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET credential_salt = ?2, credential_digest = ?3 WHERE username = ?1",
            params![username, credential.salt, credential.digest],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a user; dependent rows cascade.
    pub fn delete_user(&self, username: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM users WHERE username = ?", [username])?;
        Ok(rows_affected > 0)
    }

    /// Create the bootstrap admin if its username is free. Returns true if
    /// created.
    ///
    /// A non-admin account holding that username is left alone.
    pub fn ensure_admin(&self, admin: &BootstrapAdmin) -> DbResult<bool> {
        if let Some(holder) = self.get_user(&admin.username)? {
            if holder.role != Role::Admin {
                tracing::warn!(
                    username = %admin.username,
                    role = %holder.role,
                    "bootstrap admin username is held by another account, not creating it"
                );
            }
            return Ok(false);
        }

        let user = User::new(
            admin.username.clone(),
            Role::Admin,
            admin.name.clone(),
            Some(admin.email.clone()),
        );
        self.insert_user(&user, &StoredCredential::derive(&admin.credential))?;
        tracing::info!(username = %admin.username, "bootstrap admin created");
        Ok(true)
    }
}
