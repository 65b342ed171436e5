//! Integration tests for the file explorer boundary.
//!
//! These tests drive the JSON request/response surface exactly as a
//! transport adapter would, against real temporary directories.

use file_explorer::app::{self, events::Response, opener::Opener, state::AppState};
use file_explorer::config::{settings, AppConfig};
use serde_json::{json, Value};
use serial_test::serial;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Contains the test infrastructure.
mod helpers {
    use super::*;

    /// An Opener double that records every path it receives.
    #[derive(Default)]
    pub struct RecordingOpener {
        pub opened: Mutex<Vec<PathBuf>>,
    }

    impl Opener for RecordingOpener {
        fn open(&self, path: &Path) -> io::Result<()> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    /// `TestHarness` sets up a complete, isolated session for each test case.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub opener: Arc<RecordingOpener>,
        pub root_path: PathBuf,
        pub config_dir: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub fn new() -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().join("files");
            let config_dir = temp_dir.path().join("config");
            fs::create_dir_all(&root_path).unwrap();

            let config = AppConfig {
                start_directory: Some(root_path.clone()),
                restore_last_directory: false,
                ..AppConfig::default()
            };
            let state = AppState::new(config, Some(config_dir.clone()));

            Self {
                state: Arc::new(Mutex::new(state)),
                opener: Arc::new(RecordingOpener::default()),
                root_path,
                config_dir,
                _temp_dir: temp_dir,
            }
        }

        pub fn path(&self, relative: &str) -> PathBuf {
            self.root_path.join(relative)
        }

        pub fn create_file(&self, relative: &str, content: &str) -> PathBuf {
            let path = self.path(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            path
        }

        pub fn create_dir(&self, relative: &str) -> PathBuf {
            let path = self.path(relative);
            fs::create_dir_all(&path).unwrap();
            path
        }

        /// Sends one request through the synchronous boundary.
        pub fn send(&self, command: &str, payload: Value) -> Response {
            let request = json!({ "command": command, "payload": payload }).to_string();
            app::handle_ipc_message(&request, &self.state, self.opener.as_ref())
        }

        /// Sends a request and asserts that it succeeded.
        pub fn ok(&self, command: &str, payload: Value) -> Response {
            let response = self.send(command, payload);
            assert!(response.is_success(), "{command} failed: {response:?}");
            response
        }

        pub fn listed_names(&self, dir: &Path) -> Vec<String> {
            let response = self.ok("listDirectory", json!({ "path": dir }));
            ["directories", "files"]
                .iter()
                .flat_map(|key| response.data[*key].as_array().unwrap().clone())
                .map(|entry| entry["name"].as_str().unwrap().to_string())
                .collect()
        }
    }
}

use helpers::TestHarness;

#[test]
fn test_listing_filters_hidden_entries() {
    let harness = TestHarness::new();
    harness.create_file("a.txt", "a");
    harness.create_file(".hidden", "");
    harness.create_file("~lock", "");
    harness.create_file("desktop.ini", "");
    harness.create_dir("B");

    let response = harness.ok("listDirectory", Value::Null);
    assert_eq!(response.data["directories"][0]["name"], "B");
    assert_eq!(response.data["directories"].as_array().unwrap().len(), 1);
    assert_eq!(response.data["files"].as_array().unwrap().len(), 1);
    assert_eq!(response.data["files"][0]["name"], "a.txt");
    assert_eq!(response.data["files"][0]["size"], 1);
    assert_eq!(response.data["directories"][0]["size"], Value::Null);
}

#[test]
fn test_copy_then_list_then_remove_round_trip() {
    let harness = TestHarness::new();
    let source = harness.create_file("report.pdf", "pdf");

    let response = harness.ok(
        "copy",
        json!({ "sourcePath": source, "destinationPath": source }),
    );
    let landed = PathBuf::from(response.data["actualDestination"].as_str().unwrap());
    assert_eq!(landed, harness.path("report(副本).pdf"));
    assert!(harness
        .listed_names(&harness.root_path)
        .contains(&"report(副本).pdf".to_string()));

    harness.ok("remove", json!({ "path": landed }));
    assert_eq!(harness.listed_names(&harness.root_path), ["report.pdf"]);
}

#[test]
fn test_rename_is_reflected_in_next_listing() {
    let harness = TestHarness::new();
    let dir = harness.create_dir("d");
    harness.create_file("d/a.txt", "");
    assert_eq!(harness.listed_names(&dir), ["a.txt"]);

    harness.ok(
        "rename",
        json!({ "oldPath": dir.join("a.txt"), "newPath": dir.join("b.txt") }),
    );
    assert_eq!(harness.listed_names(&dir), ["b.txt"]);

    let response = harness.send(
        "rename",
        json!({ "oldPath": dir.join("a.txt"), "newPath": dir.join("c.txt") }),
    );
    assert_eq!(response.status, "sourceMissing");
}

#[test]
fn test_remove_batch_is_best_effort_and_copy_batch_fails_fast() {
    let harness = TestHarness::new();
    let a = harness.create_file("a.txt", "");
    let b = harness.create_file("b.txt", "");
    let dest = harness.create_dir("dest");

    let response = harness.ok(
        "removeBatch",
        json!({ "paths": [a, harness.path("never.txt")] }),
    );
    assert_eq!(response.data["removed"], 1);
    assert!(!a.exists());

    let response = harness.send(
        "copyBatch",
        json!({ "sourcePaths": [b, harness.path("never.txt")], "destinationDir": dest }),
    );
    assert_eq!(response.status, "sourceMissing");
    assert!(dest.join("b.txt").exists());
}

#[test]
fn test_move_refuses_to_overwrite() {
    let harness = TestHarness::new();
    let a = harness.create_file("a.txt", "mine");
    let taken = harness.create_file("other/a.txt", "theirs");

    let response = harness.send("move", json!({ "sourcePath": a, "destinationPath": taken }));
    assert_eq!(response.status, "destinationExists");
    assert_eq!(fs::read_to_string(&taken).unwrap(), "theirs");

    let sub = harness.create_dir("other/sub");
    harness.ok("moveBatch", json!({ "sourcePaths": [a], "destinationDir": sub }));
    assert_eq!(fs::read_to_string(sub.join("a.txt")).unwrap(), "mine");
    assert_eq!(harness.listed_names(&harness.root_path), ["other"]);
}

#[test]
fn test_cut_navigate_paste_workflow() {
    let harness = TestHarness::new();
    harness.create_file("a.txt", "a");
    harness.create_file("b.txt", "b");
    let target = harness.create_dir("target");

    harness.ok("select", json!({ "path": harness.path("a.txt") }));
    harness.ok("toggleSelection", json!({ "path": harness.path("b.txt") }));
    let view = harness.ok("cutToClipboard", Value::Null);
    assert_eq!(view.data["clipboard"]["action"], "cut");

    let view = harness.ok("navigate", json!({ "path": target }));
    assert_eq!(view.data["selectedCount"], 0);
    assert_eq!(view.data["clipboard"]["count"], 2);

    let response = harness.ok("paste", Value::Null);
    assert_eq!(response.data["written"].as_array().unwrap().len(), 2);
    assert_eq!(harness.listed_names(&target), ["a.txt", "b.txt"]);
    assert!(harness.listed_names(&harness.root_path) == ["target"]);

    let view = harness.ok("view", Value::Null);
    assert_eq!(view.data["clipboard"], Value::Null);
}

#[test]
fn test_open_entry_falls_back_for_unresolvable_shortcuts() {
    let harness = TestHarness::new();
    harness.create_dir("docs");
    fs::write(harness.path("broken.lnk"), b"\x4cnot really a shortcut").unwrap();

    let response = harness.send("resolveShortcut", json!({ "path": harness.path("broken.lnk") }));
    assert_eq!(response.status, "invalidFormat");

    harness.ok("openEntry", json!({ "path": harness.path("broken.lnk") }));
    assert_eq!(
        *harness.opener.opened.lock().unwrap(),
        [harness.path("broken.lnk")]
    );

    let view = harness.ok("openEntry", json!({ "path": harness.path("docs") }));
    assert_eq!(view.data["currentPath"], json!(harness.path("docs")));
}

#[test]
fn test_search_sort_and_export_share_the_view() {
    let harness = TestHarness::new();
    harness.create_file("small.log", "1");
    harness.create_file("large.log", &"x".repeat(3000));
    harness.create_file("notes.md", "");

    harness.ok("search", json!({ "keyword": "LOG" }));
    let view = harness.ok("setSort", json!({ "sort": { "field": "size", "direction": "desc" } }));
    let names: Vec<&str> = view.data["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["large.log", "small.log"]);

    let rows = harness.ok("exportRows", Value::Null);
    assert_eq!(rows.data[0]["name"], "large.log");
    assert_eq!(rows.data[0]["size"], "2.93 KB");
    assert_eq!(rows.data[0]["kind"], "File");
}

#[test]
fn test_tree_expands_lazily() {
    let harness = TestHarness::new();
    harness.create_file("docs/guide/intro.md", "");
    harness.create_file("readme.md", "");

    let response = harness.ok("tree", Value::Null);
    assert_eq!(response.data["tree"]["children"][0]["children"], json!([]));

    harness.ok("toggleExpansion", json!({ "path": harness.path("docs") }));
    let response = harness.ok("toggleExpansion", json!({ "path": harness.path("docs/guide") }));
    let rendered = response.data["rendered"].as_str().unwrap();
    assert!(rendered.contains("└── 📄 intro.md"));
    assert!(rendered.ends_with("└── 📄 readme.md\n"));
}

#[test]
fn test_navigation_persists_last_directory() {
    let harness = TestHarness::new();
    let docs = harness.create_dir("docs");
    harness.ok("navigate", json!({ "path": docs }));

    let saved = settings::load_config(Some(&harness.config_dir)).unwrap();
    assert_eq!(saved.last_directory, Some(docs));
}

#[test]
#[serial]
fn test_relative_paths_resolve_against_working_directory() {
    let harness = TestHarness::new();
    harness.create_dir("nested/inner");

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(&harness.root_path).unwrap();
    let response = harness.send("navigate", json!({ "path": "nested/./inner/" }));
    std::env::set_current_dir(previous).unwrap();

    assert!(response.is_success(), "{response:?}");
    assert_eq!(response.data["currentPath"], json!(harness.path("nested/inner")));
}

#[tokio::test]
async fn test_async_dispatch_echoes_request_ids() {
    let harness = TestHarness::new();
    harness.create_file("a.txt", "");
    let opener: Arc<dyn Opener> = harness.opener.clone();

    let request = json!({ "id": 42, "command": "goUp" }).to_string();
    let response = app::dispatch(request, harness.state.clone(), opener, Duration::from_secs(5)).await;

    assert!(response.is_success(), "{response:?}");
    assert_eq!(response.id, Some(json!(42)));
    let names: Vec<&str> = response.data["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"files"), "{names:?}");
}
