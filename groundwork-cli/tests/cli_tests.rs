//! CLI integration tests
//!
//! These run the `groundwork` binary for commands that need no database.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn groundwork(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_groundwork"))
        .args(args)
        .env_remove("DATABASE_URL")
        .env("LOG_LEVEL", "error")
        .output()
        .expect("Failed to execute CLI")
}

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("groundwork-cli-{}-{}", test, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_new_module_scaffolds_files_and_prints_steps() {
    let root = scratch_dir("new-module");

    let output = groundwork(&["new-module", "invoices", "--root", root.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Next steps:"));
    assert!(stdout.contains("  1. "));
    assert!(root.join("groundwork-shared/src/models/invoices.rs").exists());
    assert!(root.join("groundwork-api/src/routes/invoices.rs").exists());

    let migrations: Vec<_> = fs::read_dir(root.join("migrations"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(migrations.len(), 2);
    assert!(migrations.iter().all(|m| m.contains("_create_invoices.")));

    // A second run must not overwrite anything
    let output = groundwork(&["new-module", "invoices", "--root", root.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("refusing to overwrite"));

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_new_module_rejects_bad_names() {
    let root = scratch_dir("bad-names");

    for name in ["ab", "9lives", "Sales", "sales-orders"] {
        let output = groundwork(&["new-module", name, "--root", root.to_str().unwrap()]);
        assert!(!output.status.success(), "accepted {:?}", name);
    }
    assert!(!root.join("migrations").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_create_migration_writes_pair() {
    let dir = scratch_dir("create-migration");

    let output = groundwork(&["create-migration", "Add invoices", "--dir", dir.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let mut files: Vec<String> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    files.sort();
    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("_add_invoices.down.sql"));
    assert!(files[1].ends_with("_add_invoices.up.sql"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_dotenv_feeds_argument_defaults() {
    let dir = scratch_dir("dotenv");
    fs::write(dir.join(".env"), "MIGRATIONS_DIR=db/changes\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_groundwork"))
        .args(["create-migration", "Add invoices"])
        .current_dir(&dir)
        .env_remove("MIGRATIONS_DIR")
        .env("LOG_LEVEL", "error")
        .output()
        .expect("Failed to execute CLI");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let files = fs::read_dir(dir.join("db/changes")).unwrap().count();
    assert_eq!(files, 2);
    assert!(!dir.join("migrations").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unknown_seed_is_rejected() {
    let output = groundwork(&["seed", "--seeds", "widgets"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("permissions"));
}

#[test]
fn test_drop_db_requires_force() {
    let output = Command::new(env!("CARGO_BIN_EXE_groundwork"))
        .args(["drop-db"])
        .env("DATABASE_URL", "postgres://localhost:1/groundwork_never")
        .env("LOG_LEVEL", "error")
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--force"));
}
