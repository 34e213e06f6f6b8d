//! On-disk persistence, bounded waits and concurrent writers.

use std::thread;

use careteam_core::care_team::CareTeam;
use careteam_core::identity::StoredCredential;
use careteam_core::{CareError, Clinic, CoreConfig, Database, Registration, Role, User, UserChanges};
use tempfile::TempDir;

fn nurse(username: &str) -> Registration {
    Registration {
        name: "Ann".to_string(),
        username: username.to_string(),
        credential: "2222222222".to_string(),
        role: Role::Nurse,
        email: None,
        patient: None,
    }
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let config = CoreConfig::default().with_database_path(dir.path().join("clinic.db"));

    {
        let clinic = Clinic::open(config.clone()).unwrap();
        let admin = clinic.login("admin", "admin123").unwrap();
        clinic.register_user(&admin, &nurse("n1")).unwrap();
    }

    let clinic = Clinic::open(config).unwrap();
    let session = clinic.login("n1", "2222222222").unwrap();
    assert_eq!(session.role(), Role::Nurse);

    // Reopening does not duplicate the bootstrap admin
    assert!(clinic.login("admin", "admin123").is_ok());
}

#[test]
fn test_locked_store_reports_unavailable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clinic.db");
    let config = CoreConfig {
        busy_timeout_ms: 50,
        ..CoreConfig::default().with_database_path(&path)
    };

    let clinic = Clinic::open(config).unwrap();
    let admin = clinic.login("admin", "admin123").unwrap();

    // A second process holds the write lock
    let other = Database::open(&path).unwrap();
    other.conn().execute_batch("BEGIN IMMEDIATE").unwrap();

    let err = clinic.register_user(&admin, &nurse("n1")).unwrap_err();
    assert!(
        matches!(err, CareError::StorageUnavailable(_)),
        "unexpected error: {:?}",
        err
    );

    other.conn().execute_batch("ROLLBACK").unwrap();
    clinic.register_user(&admin, &nurse("n1")).unwrap();
}

#[test]
fn test_config_file_overrides() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("clinic.db");
    let config_path = dir.path().join("careteam.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{
                "database_path": {:?},
                "bootstrap_admin": {{ "username": "root", "credential": "s3cret" }},
                "credential_rule": {{ "kind": "min_length", "min": 6 }}
            }}"#,
            db_path
        ),
    )
    .unwrap();

    let clinic = Clinic::open(CoreConfig::load(&config_path).unwrap()).unwrap();
    let root = clinic.login("root", "s3cret").unwrap();
    assert_eq!(root.role(), Role::Admin);

    // Six characters is enough under this rule
    let mut reg = nurse("n1");
    reg.credential = "abcdef".to_string();
    clinic.register_user(&root, &reg).unwrap();
}

#[test]
fn test_missing_config_file_names_path() {
    let err = CoreConfig::load("/nonexistent/careteam.json").unwrap_err();
    assert!(format!("{:#}", err).contains("/nonexistent/careteam.json"));
}

#[test]
fn test_reopen_when_bootstrap_username_is_taken() {
    let dir = TempDir::new().unwrap();
    let config = CoreConfig::default().with_database_path(dir.path().join("clinic.db"));

    {
        let clinic = Clinic::open(config.clone()).unwrap();
        let admin = clinic.login("admin", "admin123").unwrap();
        clinic
            .update_user(
                &admin,
                "admin",
                &UserChanges {
                    new_username: Some("root".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let root = clinic.login("root", "admin123").unwrap();
        let mut doctor = nurse("admin");
        doctor.role = Role::Doctor;
        doctor.credential = "0000000001".to_string();
        clinic.register_user(&root, &doctor).unwrap();
    }

    let clinic = Clinic::open(config).unwrap();
    assert_eq!(clinic.login("admin", "0000000001").unwrap().role(), Role::Doctor);
    assert_eq!(clinic.login("root", "admin123").unwrap().role(), Role::Admin);
}

#[test]
fn test_concurrent_nurse_moves_leave_one_assignment() {
    const ROUNDS: usize = 25;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clinic.db");
    {
        let db = Database::open(&path).unwrap();
        for (username, role) in [("dr1", Role::Doctor), ("dr2", Role::Doctor), ("n1", Role::Nurse)] {
            let user = User::new(username.to_string(), role, username.to_string(), None);
            db.insert_user(&user, &StoredCredential::derive("x")).unwrap();
        }
    }

    let workers: Vec<_> = ["dr1", "dr2"]
        .into_iter()
        .map(|doctor| {
            let path = path.clone();
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                let team = CareTeam::new(&db);
                for _ in 0..ROUNDS {
                    team.assign_nurse(doctor, "n1").unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let rows: Vec<String> = {
        let mut stmt = db
            .conn()
            .prepare("SELECT doctor_username FROM care_assignments WHERE nurse_username = 'n1'")
            .unwrap();
        let rows = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        rows
    };
    assert_eq!(rows.len(), 1);
    assert!(rows[0] == "dr1" || rows[0] == "dr2");
    assert_eq!(db.doctor_for_nurse("n1").unwrap().as_deref(), Some(rows[0].as_str()));
}
