use std::fs::write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

/// Writes a filesystem-backed config rooted inside `dir`.
fn write_fs_config(dir: &Path) -> std::path::PathBuf {
    let config = dir.join("config.yaml");
    let yaml = format!(
        "storage:\n  backend: filesystem\n  root: {}\nproject:\n  id: 42\n  name: demo\n",
        dir.join("buckets").display()
    );
    write(&config, yaml).expect("Writing temp config failed");
    config
}

fn write_doc(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    write(&path, content).expect("Writing doc failed");
    path
}

fn codeclarity(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("codeclarity").expect("Binary exists");
    cmd.arg("--config").arg(config).env_remove("RUST_LOG");
    cmd
}

fn publish_mr(config: &Path, sha: &str, branch: &str, file: &Path) -> Command {
    let mut cmd = codeclarity(config);
    cmd.args(["publish-mr", "--sha", sha, "--branch", branch, "--file"])
        .arg(file);
    cmd
}

#[test]
fn publish_mr_then_list_shows_sha() {
    let dir = TempDir::new().unwrap();
    let config = write_fs_config(dir.path());
    let doc = write_doc(dir.path(), "doc.md", "# Feature A");

    publish_mr(&config, SHA_A, "feature-a", &doc)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("_{SHA_A}_feature-a.md")))
        .stdout(predicate::str::contains("42-demo/current_release/"));

    codeclarity(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(SHA_A));
}

#[test]
fn second_publish_for_same_sha_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_fs_config(dir.path());
    let doc = write_doc(dir.path(), "doc.md", "# Feature A");

    publish_mr(&config, SHA_A, "feature-a", &doc).assert().success();
    publish_mr(&config, SHA_A, "feature-a", &doc)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn invalid_sha_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_fs_config(dir.path());
    let doc = write_doc(dir.path(), "doc.md", "# Feature");

    publish_mr(&config, "not-a-sha", "main", &doc)
        .assert()
        .failure();
}

#[test]
fn list_without_bucket_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_fs_config(dir.path());

    codeclarity(&config)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("42-demo"));
}

#[test]
fn gather_and_publish_release_move_only_released_docs() {
    let dir = TempDir::new().unwrap();
    let config = write_fs_config(dir.path());
    let doc_a = write_doc(dir.path(), "a.md", "Alpha change");
    let doc_b = write_doc(dir.path(), "b.md", "Bravo change");
    let note = write_doc(dir.path(), "note.md", "# Release v1.0");

    publish_mr(&config, SHA_A, "feature-a", &doc_a).assert().success();
    publish_mr(&config, SHA_B, "feature-b", &doc_b).assert().success();

    codeclarity(&config)
        .args(["gather", "--tag", "v1.0", "--sha", SHA_A])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Merge Request Documentation for Release"))
        .stdout(predicate::str::contains("Alpha change"))
        .stdout(predicate::str::contains("Bravo change").not())
        .stdout(predicate::str::contains("Documents: 1"));

    codeclarity(&config)
        .args(["publish-release", "--tag", "v1.0", "--sha", SHA_A, "--file"])
        .arg(&note)
        .assert()
        .success()
        .stdout(predicate::str::contains("releases/v1.0/"))
        .stdout(predicate::str::contains("Relocated: 1 moved, 0 failed"));

    codeclarity(&config)
        .args(["list", "--folder", "releases/v1.0/mr_docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains(SHA_A))
        .stdout(predicate::str::contains(SHA_B).not());

    codeclarity(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(SHA_B))
        .stdout(predicate::str::contains(SHA_A).not());
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use codeclarity::cli::{run, Cli, Commands};

    let cli = Cli {
        config: std::path::PathBuf::from("dummy.yaml"),
        project_id: None,
        project_name: None,
        command: Commands::List {
            folder: "current_release".to_string(),
        },
    };

    let _ = run(cli).await;

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
