//! Idea store integration tests driving the binary against temp directories

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use chrono::{Duration, Utc};
use serde_json::{json, Value};

const FIRST_ID: &str = "6f1c2a9e-4d3b-4b8a-9a51-0c2f4e7d1a01";
const SECOND_ID: &str = "0b7e5f3c-8a2d-4c61-b9e4-3d5a6f8c2b02";

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data").join("second-voice")
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_second-voice"))
            .args(args)
            .env_remove("GEMINI_API_KEY")
            .env("NO_COLOR", "1")
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .current_dir(self.dir.path())
            .output()
            .expect("Failed to execute command")
    }

    fn write(&self, file: &str, value: Value) {
        fs::create_dir_all(self.data_dir()).unwrap();
        fs::write(self.data_dir().join(file), value.to_string()).unwrap();
    }

    fn read(&self, file: &str) -> Value {
        let content = fs::read_to_string(self.data_dir().join(file)).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    /// Two ideas sharing a tag, the newer linked to the older
    fn seed(&self) {
        self.write(
            "ideas.json",
            json!([
                {
                    "id": SECOND_ID,
                    "title": "Grocery",
                    "summary": "buy bread",
                    "raw_transcript": "Captured via voice",
                    "confidence": 1.0,
                    "created_at": "2025-01-02T10:00:00Z",
                    "last_referenced_at": "2025-01-02T10:00:00Z",
                    "tags": ["home"]
                },
                {
                    "id": FIRST_ID,
                    "title": "Second Brain Plan",
                    "summary": "capture flow",
                    "raw_transcript": "Captured via voice",
                    "confidence": 1.0,
                    "created_at": "2025-01-01T09:00:00Z",
                    "last_referenced_at": "2025-01-01T09:00:00Z",
                    "tags": ["home", "pkm"]
                }
            ]),
        );
        self.write(
            "links.json",
            json!([{
                "id": "9d8c7b6a-5f4e-4d3c-8b2a-1a0f9e8d7c03",
                "source_idea_id": SECOND_ID,
                "target_idea_id": FIRST_ID,
                "strength": 0.8,
                "rationale": "Shared themes"
            }]),
        );
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn idea_at(id: &str, title: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "summary": "",
        "raw_transcript": "Captured via voice",
        "confidence": 1.0,
        "created_at": created_at,
        "last_referenced_at": created_at,
        "tags": []
    })
}

#[test]
fn ideas_export_writes_default_backup_file() {
    let sandbox = Sandbox::new();
    sandbox.seed();

    let output = sandbox.run(&["ideas", "export"]);
    assert!(output.status.success());

    let backup = sandbox.dir.path().join("second_voice_backup.json");
    let content = fs::read_to_string(&backup).unwrap();
    assert!(content.contains("\n  {"));
    let exported: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(exported, sandbox.read("ideas.json"));
    assert_eq!(exported[0]["id"], SECOND_ID);
}

#[test]
fn ideas_export_to_given_path() {
    let sandbox = Sandbox::new();
    sandbox.seed();
    let target = sandbox.dir.path().join("brain.json");

    let output = sandbox.run(&["ideas", "export", &target.to_string_lossy()]);
    assert!(output.status.success());

    let exported: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(exported.as_array().unwrap().len(), 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("Exported 2 ideas"));
}

#[test]
fn ideas_export_on_empty_store_writes_empty_array() {
    let sandbox = Sandbox::new();
    let target = sandbox.dir.path().join("empty.json");

    assert!(sandbox
        .run(&["ideas", "export", &target.to_string_lossy()])
        .status
        .success());
    let exported: Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(exported, json!([]));
}

#[test]
fn ideas_export_to_unwritable_path_fails() {
    let sandbox = Sandbox::new();
    sandbox.seed();
    let target = sandbox.dir.path().join("no-such-dir").join("brain.json");

    let output = sandbox.run(&["ideas", "export", &target.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to write"));
}

#[test]
fn ideas_timeline_sorts_by_creation_with_relative_days() {
    let sandbox = Sandbox::new();
    let now = Utc::now();
    // Stored oldest first so the sort is visible
    sandbox.write(
        "ideas.json",
        json!([
            idea_at(FIRST_ID, "Old plan", "2020-05-04T08:00:00Z"),
            idea_at(
                "2a3b4c5d-6e7f-4a8b-9c0d-1e2f3a4b5c06",
                "Late idea",
                &(now - Duration::hours(30)).to_rfc3339(),
            ),
            idea_at(SECOND_ID, "Fresh note", &(now - Duration::minutes(5)).to_rfc3339()),
        ]),
    );

    let output = sandbox.run(&["ideas", "timeline"]);
    assert!(output.status.success());
    let listing = stdout(&output);

    let fresh = listing.find("Fresh note").unwrap();
    let late = listing.find("Late idea").unwrap();
    let old = listing.find("Old plan").unwrap();
    assert!(fresh < late && late < old);
    assert!(listing.contains("Today"));
    assert!(listing.contains("Yesterday"));
    assert!(listing.contains("2020-05-04"));
}

#[test]
fn ideas_timeline_on_empty_store() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["ideas", "timeline"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No history yet"));
}

#[test]
fn ideas_list_on_empty_store() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["ideas", "list"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No ideas"));
}

#[test]
fn ideas_list_shows_most_recent_first() {
    let sandbox = Sandbox::new();
    sandbox.seed();

    let output = sandbox.run(&["ideas", "list"]);
    assert!(output.status.success());
    let listing = stdout(&output);
    let grocery = listing.find("Grocery").unwrap();
    let plan = listing.find("Second Brain Plan").unwrap();
    assert!(grocery < plan);
    assert!(listing.contains("#pkm"));
    assert!(listing.contains(FIRST_ID));
}

#[test]
fn ideas_recall_matches_case_insensitively() {
    let sandbox = Sandbox::new();
    sandbox.seed();

    let output = sandbox.run(&["ideas", "recall", "brain"]);
    assert!(output.status.success());
    let found = stdout(&output);
    assert!(found.contains("Second Brain Plan"));
    assert!(!found.contains("Grocery"));
}

#[test]
fn links_list_uses_titles() {
    let sandbox = Sandbox::new();
    sandbox.seed();

    let output = sandbox.run(&["links", "list"]);
    assert!(output.status.success());
    let listing = stdout(&output);
    assert!(listing.contains("Grocery"));
    assert!(listing.contains("Second Brain Plan"));
    assert!(listing.contains("Shared themes"));
}

#[test]
fn ideas_delete_cascades_to_links() {
    let sandbox = Sandbox::new();
    sandbox.seed();

    let output = sandbox.run(&["ideas", "delete", FIRST_ID]);
    assert!(output.status.success());

    let ideas = sandbox.read("ideas.json");
    assert_eq!(ideas.as_array().unwrap().len(), 1);
    assert_eq!(ideas[0]["id"], SECOND_ID);
    assert!(sandbox.read("links.json").as_array().unwrap().is_empty());
}

#[test]
fn ideas_delete_unknown_id_fails() {
    let sandbox = Sandbox::new();
    sandbox.seed();

    let output = sandbox.run(&["ideas", "delete", "11111111-2222-4333-8444-555555555555"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(sandbox.read("ideas.json").as_array().unwrap().len(), 2);
}

#[test]
fn settings_show_defaults() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["settings", "show"]);

    assert!(output.status.success());
    let shown = stdout(&output);
    assert!(shown.contains("voice_preset: Notebook-Clean"));
    assert!(shown.contains("hands_free: false"));
    assert!(shown.contains("vad_sensitivity: 0.5"));
    assert!(shown.contains("auto_end_turn: true"));
}

#[test]
fn settings_set_persists() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["settings", "set", "voice_preset", "reflective"]);
    assert!(output.status.success());

    assert_eq!(sandbox.read("settings.json")["voice_preset"], "Reflective");
    let shown = stdout(&sandbox.run(&["settings", "show"]));
    assert!(shown.contains("voice_preset: Reflective"));
}

#[test]
fn clear_removes_everything() {
    let sandbox = Sandbox::new();
    sandbox.seed();
    sandbox.run(&["settings", "set", "hands_free", "yes"]);

    let output = sandbox.run(&["clear", "--yes"]);
    assert!(output.status.success());
    assert!(!sandbox.data_dir().join("ideas.json").exists());
    assert!(!sandbox.data_dir().join("links.json").exists());
    assert!(!sandbox.data_dir().join("settings.json").exists());
}

#[test]
fn configured_data_dir_is_used() {
    let sandbox = Sandbox::new();
    let custom = sandbox.dir.path().join("elsewhere");
    let custom_str = custom.to_string_lossy().to_string();

    assert!(sandbox
        .run(&["config", "set", "data_dir", &custom_str])
        .status
        .success());
    assert!(sandbox
        .run(&["settings", "set", "auto_end_turn", "false"])
        .status
        .success());

    assert!(custom.join("settings.json").exists());
    assert!(!sandbox.data_dir().join("settings.json").exists());
}
