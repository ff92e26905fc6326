//! Offline command tests
//!
//! Each test runs the binary against a temporary store and config
//! directory; nothing here reaches the analysis service.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().unwrap(),
        }
    }

    fn store_dir(&self) -> std::path::PathBuf {
        self.home.path().join("store")
    }

    fn run(&self, args: &[&str]) -> Output {
        let home: &Path = self.home.path();
        Command::new(env!("CARGO_BIN_EXE_steelscan"))
            .arg("--store-dir")
            .arg(self.store_dir())
            .args(args)
            .env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join("config"))
            .env("XDG_DATA_HOME", home.join("data"))
            .env_remove("RUST_LOG")
            .env_remove("GEMINI_API_KEY")
            .output()
            .unwrap()
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "{:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn fails(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_eq!(output.status.code(), Some(1), "{:?} should fail", args);
        String::from_utf8(output.stderr).unwrap()
    }

    fn json(&self, args: &[&str]) -> Value {
        let mut full = args.to_vec();
        full.extend(["--format", "json"]);
        serde_json::from_str(&self.ok(&full)).unwrap()
    }
}

#[test]
fn test_first_run_lists_defaults() {
    let sandbox = Sandbox::new();

    let palette = sandbox.json(&["palette", "list"]);
    assert_eq!(palette.as_array().unwrap().len(), 20);
    assert_eq!(palette[0]["name"], "Charcoal");

    let profiles = sandbox.json(&["profiles", "list"]);
    assert_eq!(profiles.as_array().unwrap().len(), 1);
    assert_eq!(profiles[0]["id"], "default");

    let inventory = sandbox.json(&["inventory", "list"]);
    assert!(inventory.as_array().unwrap().is_empty());
}

#[test]
fn test_palette_changes_are_saved() {
    let sandbox = Sandbox::new();

    sandbox.ok(&["palette", "add", "Sky", "#87ceeb"]);
    sandbox.ok(&["palette", "update", "0", "--hex", "#333333"]);
    sandbox.ok(&["palette", "remove", "1"]);

    let palette = sandbox.json(&["palette", "list"]);
    let entries = palette.as_array().unwrap();
    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0]["hex"], "#333333");
    assert_eq!(entries[19]["name"], "Sky");
    assert!(sandbox.store_dir().join("palette.json").exists());
}

#[test]
fn test_palette_refusals() {
    let sandbox = Sandbox::new();

    let stderr = sandbox.fails(&["palette", "add", "Charcoal", "#000000"]);
    assert!(stderr.contains("already exists"));

    let stderr = sandbox.fails(&["palette", "add", "Mist", "grey"]);
    assert!(stderr.contains("not a hex color"));

    let stderr = sandbox.fails(&["palette", "remove", "99"]);
    assert!(stderr.contains("Not found"));
}

#[test]
fn test_profile_lifecycle() {
    let sandbox = Sandbox::new();

    let stdout = sandbox.ok(&[
        "profiles",
        "add",
        "--name",
        "Texas Site",
        "--width-offset",
        "-2",
        "--states",
        "tx,ok",
    ]);
    let id = stdout.trim().trim_start_matches("Added profile ").to_string();

    let profiles = sandbox.json(&["profiles", "list"]);
    let added = &profiles[1];
    assert_eq!(added["id"], id.as_str());
    assert_eq!(added["name"], "Texas Site");
    assert_eq!(added["rules"]["width"]["offset"], -2.0);
    assert_eq!(added["rules"]["states"], serde_json::json!(["OK", "TX"]));

    sandbox.ok(&["profiles", "select", &id]);
    let table = sandbox.ok(&["profiles", "list"]);
    assert!(table.contains(&format!("* {}", id)));

    sandbox.ok(&["profiles", "delete", &id]);
    let profiles = sandbox.json(&["profiles", "list"]);
    assert_eq!(profiles.as_array().unwrap().len(), 1);
}

#[test]
fn test_last_profile_cannot_be_deleted() {
    let sandbox = Sandbox::new();

    let stderr = sandbox.fails(&["profiles", "delete", "default"]);
    assert!(stderr.contains("cannot delete the last profile"));
}

#[test]
fn test_unknown_record_is_reported() {
    let sandbox = Sandbox::new();

    let stderr = sandbox.fails(&["inventory", "show", "nope"]);
    assert!(stderr.contains("inventory record 'nope'"));

    let stderr = sandbox.fails(&["inventory", "edit", "nope", "--width", "40"]);
    assert!(stderr.contains("Not found"));
}

#[test]
fn test_ephemeral_session_writes_nothing() {
    let sandbox = Sandbox::new();

    sandbox.ok(&["--ephemeral", "palette", "add", "Sky", "#87ceeb"]);
    assert!(!sandbox.store_dir().join("palette.json").exists());
}

#[test]
fn test_process_without_images_fails() {
    let sandbox = Sandbox::new();
    let empty = sandbox.home.path().join("photos");
    std::fs::create_dir_all(&empty).unwrap();

    let stderr = sandbox.fails(&["process", empty.to_str().unwrap()]);
    assert!(stderr.contains("No images found"));
}
