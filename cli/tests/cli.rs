use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A command isolated from the caller's configuration and API keys
fn tinyreact(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tinyreact").unwrap();
    cmd.current_dir(dir)
        .env_clear()
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .arg("--no-color");
    cmd
}

fn write_config(dir: &Path, base_url: &str) {
    let config = json!({
        "protocol": "google_ai",
        "api_key": "test-key",
        "base_url": base_url,
        "model": "gemini-test"
    });
    std::fs::write(dir.join("tinyreact.json"), config.to_string()).unwrap();
}

async fn gemini_replying(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_tools_lists_builtin_tools() {
    let dir = TempDir::new().unwrap();
    tinyreact(dir.path())
        .arg("tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("add_numbers"))
        .stdout(predicate::str::contains("get_temperature"))
        .stdout(predicate::str::contains("wikipedia_summary"));
}

#[test]
fn test_tools_detailed_shows_signatures() {
    let dir = TempDir::new().unwrap();
    tinyreact(dir.path())
        .args(["tools", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("add_numbers(x, y)"));
}

#[test]
fn test_missing_query_is_an_error() {
    let dir = TempDir::new().unwrap();
    tinyreact(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No query given"));
}

#[test]
fn test_missing_configuration_is_an_error() {
    let dir = TempDir::new().unwrap();
    tinyreact(dir.path())
        .arg("What is 2 + 2?")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No configuration found"));
}

#[test]
fn test_zero_ttl_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "http://127.0.0.1:9");
    tinyreact(dir.path())
        .args(["--ttl", "0", "What is 2 + 2?"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ttl"));
}

#[test]
fn test_unknown_tool_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "http://127.0.0.1:9");
    tinyreact(dir.path())
        .args(["--tools", "add_numbers,bash", "What is 2 + 2?"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bash"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_answer_exits_successfully() {
    let server = gemini_replying("Thought: 2 plus 2 is 4.\nAnswer: 4").await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());
    let mermaid = dir.path().join("trace.mmd");
    let trajectory = dir.path().join("trajectory.json");

    tinyreact(dir.path())
        .arg("--mermaid")
        .arg(&mermaid)
        .arg("--trajectory-file")
        .arg(&trajectory)
        .arg("What is 2 + 2?")
        .assert()
        .success()
        .stdout(predicate::str::contains("Query: What is 2 + 2?"))
        .stdout(predicate::str::contains("Thought: 2 plus 2 is 4."))
        .stdout(predicate::function(|out: &str| out.matches("Answer: 4").count() == 1));

    let diagram = std::fs::read_to_string(&mermaid).unwrap();
    assert!(diagram.starts_with("graph TD"));

    let recorded: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&trajectory).unwrap()).unwrap();
    assert_eq!(recorded["metadata"]["success"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_exhausted_run_exits_with_two() {
    let server = gemini_replying("Thought: I need more time.").await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    tinyreact(dir.path())
        .args(["--ttl", "2", "What is 2 + 2?"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("(no action)"))
        .stdout(predicate::str::contains(
            "Terminate: Reached maximum number of iterations",
        ));

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_model_failure_exits_with_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), &server.uri());

    tinyreact(dir.path())
        .arg("What is 2 + 2?")
        .assert()
        .code(1);
}
