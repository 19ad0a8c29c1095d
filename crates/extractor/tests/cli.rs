// ABOUTME: Integration tests for the webcontent CLI binary.
// ABOUTME: Tests HTML file extraction, multiple URL handling, flags and exit codes.

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const ARTICLE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Test Page</title><meta name="author" content="Ada"></head>
<body>
<nav><a href="/menu">Menu</a></nav>
<article><p>Hi there, this article has <a href="https://example.com/ref">a reference</a> and enough text to pass.</p></article>
</body>
</html>"#;

fn webcontent_cmd() -> Command {
    Command::cargo_bin("webcontent").unwrap()
}

fn write_article(dir: &TempDir) -> std::path::PathBuf {
    let html_path = dir.path().join("test.html");
    fs::write(&html_path, ARTICLE).unwrap();
    html_path
}

#[test]
fn extract_html_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = write_article(&temp_dir);

    webcontent_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://example.com/post")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Test Page"))
        .stdout(predicate::str::contains("**Source:** https://example.com/post"))
        .stdout(predicate::str::contains("**Author:** Ada"))
        .stdout(predicate::str::contains("[a reference](https://example.com/ref)"))
        .stdout(predicate::str::contains("Menu").not());
}

#[test]
fn no_links_and_no_metadata_flags() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = write_article(&temp_dir);

    webcontent_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://example.com/post")
        .arg("--no-links")
        .arg("--no-metadata")
        .assert()
        .success()
        .stdout(predicate::str::contains("has a reference and enough"))
        .stdout(predicate::str::contains("**Source:**").not());
}

#[test]
fn strategy_flag_selects_engine() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = write_article(&temp_dir);

    webcontent_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://example.com/post")
        .arg("--strategy")
        .arg("basic")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"engine_used\": \"basic\""));
}

#[test]
fn unknown_strategy_fails() {
    webcontent_cmd()
        .arg("-s")
        .arg("newspaper")
        .arg("https://example.com")
        .assert()
        .failure()
        .stderr(predicate::str::contains("newspaper"));
}

#[test]
fn multiple_urls_keep_order_in_json() {
    let server = MockServer::start();

    let mock1 = server.mock(|when, then| {
        when.method(GET).path("/page1");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><body><main><p>Page One carries enough words to pass the check.</p></main></body></html>");
    });
    let mock2 = server.mock(|when, then| {
        when.method(GET).path("/page2");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><body><main><p>Page Two carries enough words to pass the check.</p></main></body></html>");
    });

    let output = webcontent_cmd()
        .arg("--allow-private-networks")
        .arg("--json")
        .arg("--urls")
        .arg(format!("{}, {}", server.url("/page1"), server.url("/page2")))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    mock1.assert();
    mock2.assert();

    let stdout = String::from_utf8(output).unwrap();
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0]["body_markdown"].as_str().unwrap().contains("Page One"));
    assert!(results[1]["body_markdown"].as_str().unwrap().contains("Page Two"));
}

#[test]
fn failed_url_sets_exit_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });

    webcontent_cmd()
        .arg("--allow-private-networks")
        .arg(server.url("/missing"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Could not extract content from"))
        .stderr(predicate::str::contains("404"));
}

#[test]
fn private_urls_blocked_by_default() {
    let server = MockServer::start();

    webcontent_cmd()
        .arg(server.url("/page"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("SSRF blocked"));
}

#[test]
fn timing_flag_prints_elapsed() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = write_article(&temp_dir);

    webcontent_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://example.com")
        .arg("--timing")
        .assert()
        .success()
        .stderr(predicate::str::contains("elapsed:"))
        .stderr(predicate::str::contains("ms"));
}

#[test]
fn output_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = write_article(&temp_dir);
    let output_path = temp_dir.path().join("output.json");

    webcontent_cmd()
        .arg("--html")
        .arg(&html_path)
        .arg("--url")
        .arg("https://example.com")
        .arg("--json")
        .arg("-o")
        .arg(&output_path)
        .assert()
        .success();

    let output_content = fs::read_to_string(&output_path).unwrap();
    assert!(
        output_content.contains("\"body_markdown\":"),
        "output file should contain JSON with body_markdown field"
    );
}

#[test]
fn missing_url_with_html_fails() {
    let temp_dir = TempDir::new().unwrap();
    let html_path = write_article(&temp_dir);

    webcontent_cmd()
        .arg("--html")
        .arg(&html_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--url is required"));
}

#[test]
fn no_args_fails() {
    webcontent_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least one URL is required"));
}
