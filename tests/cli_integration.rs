//! Integration tests for the ltag CLI.
//!
//! These tests run the real binary against state files in temporary
//! directories.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

/// A scratch directory with an empty global config, isolated from the user's.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        dir.child("global.toml").touch().unwrap();
        Self { dir }
    }

    fn ltag(&self) -> Command {
        let mut cmd = Command::cargo_bin("ltag").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.dir.child("global.toml").path());
        cmd
    }

    fn catalog(&self, contents: &str) {
        self.dir.child("tags/base.tags").write_str(contents).unwrap();
        self.dir
            .child(".labeltree/config.toml")
            .write_str("[catalog]\nsources = [\"tags\"]\n")
            .unwrap();
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.child(name).path()).unwrap()
    }
}

// =============================================================================
// Basics
// =============================================================================

#[test]
fn version_flag_works() {
    Command::cargo_bin("ltag")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ltag"));
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("ltag")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync").and(predicate::str::contains("verify")));
}

// =============================================================================
// Mutations
// =============================================================================

#[test]
fn add_creates_state_file() {
    let ws = Workspace::new();

    ws.ltag()
        .args(["add", "actor.json", "a.b", "a.b.c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added a.b.c (1)"));

    ws.dir.child("actor.json").assert(predicate::path::exists());
    assert!(ws.read("actor.json").contains("labeltree.snapshot"));
    ws.dir.child("actor.json.tmp").assert(predicate::path::missing());
}

#[test]
fn counts_survive_between_invocations() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "a.b.c", "a.b.c"]).assert().success();
    ws.ltag().args(["remove", "s.json", "a.b.c"]).assert().success();

    ws.ltag()
        .args(["show", "s.json"])
        .assert()
        .success()
        .stdout("a\n  b\n    c\n");
}

#[test]
fn remove_all_drops_tag_but_not_ancestor() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "a", "a.b", "a.b"]).assert().success();

    ws.ltag()
        .args(["remove", "s.json", "a.b", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed a.b (0)"));

    ws.ltag()
        .args(["show", "s.json", "--leaf-only"])
        .assert()
        .success()
        .stdout("a (2)\n");
}

#[test]
fn json_output_lists_changes() {
    let ws = Workspace::new();
    let output = ws
        .ltag()
        .args(["--json", "add", "s.json", "x.y"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let changes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(changes[0]["tag"], "x");
    assert_eq!(changes[0]["kind"], "added");
    assert_eq!(changes[1]["tag"], "x.y");
    assert_eq!(changes[1]["count"], 1);
}

#[test]
fn malformed_tag_is_error() {
    let ws = Workspace::new();
    ws.ltag()
        .args(["add", "s.json", "a..b"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
    ws.dir.child("s.json").assert(predicate::path::missing());
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn has_reports_through_exit_code() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "a.b.c"]).assert().success();

    ws.ltag().args(["has", "s.json", "a.b"]).assert().success().stdout("true\n");
    ws.ltag().args(["has", "s.json", "a.b", "--exact"]).assert().code(1).stdout("false\n");
    ws.ltag().args(["has", "s.json", "zzz", "a.b.c"]).assert().success();
    ws.ltag().args(["has", "s.json", "zzz", "a.b.c", "--all"]).assert().code(1);
    ws.ltag().args(["-q", "has", "s.json", "a"]).assert().success().stdout("");
}

#[test]
fn has_on_missing_state_is_false() {
    let ws = Workspace::new();
    ws.ltag().args(["has", "none.json", "a"]).assert().code(1);
}

#[test]
fn show_empty_state() {
    let ws = Workspace::new();
    ws.ltag()
        .args(["show", "none.json"])
        .assert()
        .success()
        .stdout("(no tags)\n");
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn strict_catalog_rejects_unknown_tags() {
    let ws = Workspace::new();
    ws.catalog("combat.attack\nstatus.stunned\n");

    ws.ltag()
        .args(["add", "s.json", "combat.attack", "combat.block"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not in the catalog"));
    ws.dir.child("s.json").assert(predicate::path::missing());

    ws.ltag()
        .args(["add", "s.json", "combat.block", "--unchecked"])
        .assert()
        .success();
}

#[test]
fn non_strict_config_accepts_unknown_tags() {
    let ws = Workspace::new();
    ws.catalog("combat.attack\n");
    ws.dir
        .child(".labeltree/config.toml")
        .write_str("[catalog]\nsources = [\"tags\"]\nstrict = false\n")
        .unwrap();

    ws.ltag().args(["add", "s.json", "anything"]).assert().success();
}

#[test]
fn catalog_list_and_check() {
    let ws = Workspace::new();
    ws.catalog("# core\ncombat.attack\n[Extra]\nstatus.stunned\n");

    ws.ltag()
        .args(["catalog", "list", "--leaf-only"])
        .assert()
        .success()
        .stdout("combat.attack\nstatus.stunned\n");

    ws.ltag()
        .args(["catalog", "check", "combat", "status.stunned"])
        .assert()
        .success();

    ws.ltag()
        .args(["catalog", "check", "combat.block"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("combat.block: unknown"));
}

#[test]
fn catalog_flag_overrides_config() {
    let ws = Workspace::new();
    ws.dir.child("other.tags").write_str("only.this\n").unwrap();

    ws.ltag()
        .args(["--catalog", "other.tags", "catalog", "list"])
        .assert()
        .success()
        .stdout("only\nonly.this\n");
}

#[test]
fn catalog_without_sources_is_error() {
    let ws = Workspace::new();
    ws.ltag()
        .args(["catalog", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No catalog sources"));
}

// =============================================================================
// Sync and verify
// =============================================================================

#[test]
fn sync_reconciles_with_snapshot() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "a.b", "a.c", "x"]).assert().success();
    ws.dir
        .child("target.json")
        .write_str(
            r#"{
  "kind": "labeltree.snapshot",
  "schema_version": 1,
  "records": [
    { "name": "a", "parent_index": -1, "count": 2 },
    { "name": "b", "parent_index": 0, "count": 2 },
    { "name": "y", "parent_index": -1, "count": 1 }
  ]
}"#,
        )
        .unwrap();

    ws.ltag()
        .args(["sync", "s.json", "target.json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("removed a.c (0)")
                .and(predicate::str::contains("removed x (0)"))
                .and(predicate::str::contains("counter-increased a.b (2)"))
                .and(predicate::str::contains("added y (1)")),
        );

    ws.ltag()
        .args(["show", "s.json", "--leaf-only"])
        .assert()
        .success()
        .stdout("a.b (2)\ny\n");
}

#[test]
fn sync_rejects_malformed_snapshot_without_writing() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "a"]).assert().success();
    let before = ws.read("s.json");

    ws.dir
        .child("bad.json")
        .write_str(
            r#"{"kind":"labeltree.snapshot","schema_version":1,"records":[
                {"name":"a","parent_index":-1,"count":1},
                {"name":"a","parent_index":-1,"count":1}]}"#,
        )
        .unwrap();

    ws.ltag()
        .args(["sync", "s.json", "bad.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duplicate"));
    assert_eq!(ws.read("s.json"), before);
}

#[test]
fn verify_reports_fingerprint() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "a.b", "c"]).assert().success();

    ws.ltag()
        .args(["verify", "s.json"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^ok: 3 tags, fingerprint [0-9a-f]{64}\n$").unwrap());
}

#[test]
fn verify_flags_tags_missing_from_catalog() {
    let ws = Workspace::new();
    ws.ltag().args(["add", "s.json", "legacy.tag"]).assert().success();
    ws.catalog("combat.attack\n");

    ws.ltag()
        .args(["verify", "s.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("legacy.tag"));
}
