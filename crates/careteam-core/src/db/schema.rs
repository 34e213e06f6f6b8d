//! SQLite schema definition.

/// Complete database schema for the care-team store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users (every authenticable actor, any role)
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    account_id TEXT NOT NULL UNIQUE DEFAULT (lower(hex(randomblob(16)))), -- never changes
    role TEXT NOT NULL CHECK (role IN ('admin', 'doctor', 'nurse', 'patient')),
    name TEXT NOT NULL DEFAULT '',
    email TEXT,
    credential_salt TEXT NOT NULL,                -- uuid v4
    credential_digest TEXT NOT NULL,              -- hex SHA-256(salt || secret)
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

-- ============================================================================
-- Patient Profiles (1:1 with users of role patient)
-- ============================================================================

CREATE TABLE IF NOT EXISTS patient_profiles (
    username TEXT PRIMARY KEY
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT,
    gender TEXT,
    date_of_birth TEXT,                           -- YYYY-MM-DD
    blood_group TEXT,
    assigned_doctor TEXT NOT NULL
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE RESTRICT,
    patient_type TEXT
);

CREATE INDEX IF NOT EXISTS idx_patient_doctor ON patient_profiles(assigned_doctor);

-- ============================================================================
-- Care Assignments (doctor <-> nurse, one doctor per nurse)
-- ============================================================================

CREATE TABLE IF NOT EXISTS care_assignments (
    doctor_username TEXT NOT NULL
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
    nurse_username TEXT NOT NULL UNIQUE
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
    PRIMARY KEY (doctor_username, nurse_username)
);

CREATE INDEX IF NOT EXISTS idx_assignment_doctor ON care_assignments(doctor_username);

-- ============================================================================
-- Appointments (booking log, exact-tuple uniqueness only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    doctor TEXT NOT NULL
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
    patient TEXT NOT NULL
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
    appointment_date TEXT NOT NULL,               -- YYYY-MM-DD
    appointment_time TEXT NOT NULL,               -- HH:MM, 24-hour
    PRIMARY KEY (doctor, patient, appointment_date, appointment_time)
);

CREATE INDEX IF NOT EXISTS idx_appointment_doctor ON appointments(doctor, appointment_date);
CREATE INDEX IF NOT EXISTS idx_appointment_patient ON appointments(patient, appointment_date);

-- ============================================================================
-- Medical History (one entry per patient per date)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_history (
    patient_username TEXT NOT NULL
        REFERENCES users(username) ON UPDATE CASCADE ON DELETE CASCADE,
    date TEXT NOT NULL,                           -- YYYY-MM-DD
    notes TEXT NOT NULL,
    PRIMARY KEY (patient_username, date)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO users (username, role, credential_salt, credential_digest)
            VALUES ('dr1', 'doctor', 's', 'd'),
                   ('dr2', 'doctor', 's', 'd'),
                   ('n1', 'nurse', 's', 'd'),
                   ('pat1', 'patient', 's', 'd');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
        // Idempotent
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_role_check_constraint() {
        let conn = setup();
        let result = conn.execute(
            "INSERT INTO users (username, role, credential_salt, credential_digest) VALUES ('x', 'Doctor', 's', 'd')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nurse_unique_across_doctors() {
        let conn = setup();
        conn.execute(
            "INSERT INTO care_assignments (doctor_username, nurse_username) VALUES ('dr1', 'n1')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO care_assignments (doctor_username, nurse_username) VALUES ('dr2', 'n1')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rename_cascades() {
        let conn = setup();
        conn.execute(
            "INSERT INTO care_assignments (doctor_username, nurse_username) VALUES ('dr1', 'n1')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO patient_profiles (username, name, phone, assigned_doctor) VALUES ('pat1', 'P', '1111111111', 'dr1')",
            [],
        )
        .unwrap();

        conn.execute("UPDATE users SET username = 'drX' WHERE username = 'dr1'", [])
            .unwrap();

        let doctor: String = conn
            .query_row("SELECT doctor_username FROM care_assignments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(doctor, "drX");

        let assigned: String = conn
            .query_row("SELECT assigned_doctor FROM patient_profiles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(assigned, "drX");
    }

    #[test]
    fn test_doctor_with_patients_cannot_be_deleted() {
        let conn = setup();
        conn.execute(
            "INSERT INTO patient_profiles (username, name, phone, assigned_doctor) VALUES ('pat1', 'P', '1111111111', 'dr1')",
            [],
        )
        .unwrap();

        let result = conn.execute("DELETE FROM users WHERE username = 'dr1'", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_patient_delete_cascades() {
        let conn = setup();
        conn.execute(
            "INSERT INTO patient_profiles (username, name, phone, assigned_doctor) VALUES ('pat1', 'P', '1111111111', 'dr1')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO medical_history (patient_username, date, notes) VALUES ('pat1', '2024-01-10', 'ok')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM users WHERE username = 'pat1'", [])
            .unwrap();

        let remaining: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM patient_profiles) + (SELECT COUNT(*) FROM medical_history)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
