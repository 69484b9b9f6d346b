//! End-to-end tests of the docket binary.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    root: TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Self {
            root: tempfile::tempdir().unwrap(),
        };
        env.docket()
            .args(["config", "init"])
            .assert()
            .success();
        env.docket()
            .args(["config", "set", "tools.primary_program", "docket-test-no-primary"])
            .assert()
            .success();
        env
    }

    fn config_path(&self) -> PathBuf {
        self.root.path().join("config.json")
    }

    fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    fn docket(&self) -> Command {
        let mut cmd = Command::cargo_bin("docket").unwrap();
        cmd.arg("--config")
            .arg(self.config_path())
            .arg("--data-dir")
            .arg(self.data_dir());
        cmd
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn test_missing_config_file_fails() {
    let root = tempfile::tempdir().unwrap();
    Command::cargo_bin("docket")
        .unwrap()
        .arg("--config")
        .arg(root.path().join("absent.json"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_config_get_set() {
    let env = Env::new();

    env.docket()
        .args(["config", "set", "extraction.selection", "first_match"])
        .assert()
        .success();
    env.docket()
        .args(["config", "get", "extraction.selection"])
        .assert()
        .success()
        .stdout(predicate::str::contains("first_match"));
    env.docket()
        .args(["config", "set", "extraction.selection", "best"])
        .assert()
        .failure();
}

#[test]
fn test_add_status_delete() {
    let env = Env::new();
    let source = env.write("my invoice.pdf", "Acme");

    env.docket()
        .args(["add", "--no-process"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("my_invoice.pdf"));

    env.docket()
        .args(["status", "--location", "incoming"])
        .assert()
        .success()
        .stdout(predicate::str::contains("my_invoice.pdf"));

    env.docket()
        .args(["delete", "my_invoice.pdf"])
        .assert()
        .success();
    env.docket()
        .args(["delete", "my_invoice.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_add_keeps_going_when_names_collide() {
    let env = Env::new();
    let spaced = env.write("a b.pdf", "text");
    let underscored = env.write("a_b.pdf", "text");
    let other = env.write("c.pdf", "text");

    let output = env
        .docket()
        .arg("add")
        .arg(&spaced)
        .arg(&underscored)
        .arg(&other)
        .assert()
        .success()
        .stdout(predicate::str::contains("need attention"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.matches("a_b.pdf ->").count(), 1, "{stdout}");
    assert_eq!(stdout.matches("c.pdf ->").count(), 1, "{stdout}");
}

#[test]
fn test_process_batch_json_is_an_array() {
    let env = Env::new();
    let source = env.write("only.pdf", "text");
    env.docket()
        .args(["add", "--no-process"])
        .arg(&source)
        .assert()
        .success();

    let output = env
        .docket()
        .args(["process", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let payload: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
    assert_eq!(payload[0]["filename"], "only.pdf");
}

#[test]
fn test_reset_requires_confirmation() {
    let env = Env::new();
    env.docket().arg("reset").assert().failure();
    env.docket()
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 documents"));
}

#[test]
fn test_templates_new_show_list() {
    let env = Env::new();

    env.docket()
        .args(["templates", "new", "Acme Corp", "--field", r"amount=Total:\s*(\S+)"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme_corp_raw"));
    env.docket()
        .args(["templates", "new", "Acme Corp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    env.docket()
        .args(["templates", "show", "acme_corp_raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("issuer: Acme Corp"))
        .stdout(predicate::str::contains("currency: USD"));
    env.docket()
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme_corp_raw"));
}

#[test]
fn test_retry_unknown_document() {
    let env = Env::new();
    env.docket()
        .args(["retry", "nothing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

/// A stand-in for the text extraction program that prints the document.
#[cfg(unix)]
fn fake_text_program(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-pdftotext");
    fs::write(&path, "#!/bin/sh\ncat \"$2\"\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn test_fallback_processing_and_export() {
    let env = Env::new();
    let program = fake_text_program(env.root.path());
    env.docket()
        .args(["config", "set", "tools.text_program"])
        .arg(&program)
        .assert()
        .success();

    env.docket()
        .args(["templates", "new", "Acme"])
        .args(["--field", r"invoice_number=Invoice #:\s*(\d+)"])
        .args(["--field", r"amount=Total Due:\s*([\d.]+)"])
        .args(["--field", r"date=Date:\s*(\S+)"])
        .args(["--field", r"sold_to=Sold To:\s*(.+)"])
        .args(["--field", r"bill_to=Bill To:\s*(.+)"])
        .assert()
        .success();

    let good = env.write(
        "acme_042.pdf",
        "Invoice #: 042\nDate: 01/05/2024\nSold To: Initech\nBill To: Acme\nTotal Due: 120.00\n",
    );
    let bad = env.write("acme_043.pdf", "Total Due: 5.00\n");

    env.docket()
        .arg("add")
        .arg(&good)
        .arg(&bad)
        .assert()
        .success()
        .stdout(predicate::str::contains("acme_042.pdf -> processed"))
        .stdout(predicate::str::contains("missing required fields"));

    env.docket()
        .args(["export", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme_042.pdf"))
        .stdout(predicate::str::contains("1/5/2024"))
        .stdout(predicate::str::contains("acme_043.pdf").not());

    env.docket()
        .args(["export", "--format", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "File,Invoice Number,Amount,Date,Due Date,Terms,Sold To,Mail To",
        ))
        .stdout(predicate::str::contains("Initech"))
        .stdout(predicate::str::contains("acme_043.pdf").not());

    env.docket()
        .args(["process", "acme_043.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot move"));

    env.docket()
        .args(["retry", "acme_043.pdf", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"error_kind\": \"missing_fields\""));
}
