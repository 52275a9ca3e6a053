//! The `mocha` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn site() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    std::fs::write(
        root.join("index.html"),
        r#"<html><head><script type="server/rhai">let greeting = "Hello";</script></head><body><h1>${greeting} ${name}</h1></body></html>"#,
    )
    .unwrap();
    std::fs::write(
        root.join("team.html"),
        r#"<ul><li data-for-member="team">${member}</li></ul>"#,
    )
    .unwrap();
    std::fs::write(
        root.join("sum.api"),
        r#"<script type="server/rhai">let total = 0; for n in request_body.numbers { total += n; } #{ total: total }</script>"#,
    )
    .unwrap();
    temp
}

fn mocha() -> Command {
    let mut cmd = Command::cargo_bin("mocha").unwrap();
    cmd.env_remove("MOCHA_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
#[serial]
fn test_render_index() {
    let temp = site();
    mocha()
        .args(["render", "/", "--var", "name=world", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Hello world</h1>"))
        .stdout(predicate::str::contains("server/rhai").not());
}

#[test]
#[serial]
fn test_render_json_globals() {
    let temp = site();
    mocha()
        .current_dir(temp.path())
        .args(["render", "team.html", "--json", r#"team=["ada","linus"]"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("<ul><li>ada</li><li>linus</li></ul>"));
}

#[test]
#[serial]
fn test_render_to_file() {
    let temp = site();
    let output = temp.path().join("out.html");
    mocha()
        .args(["render", "/index.html", "--var", "name=file", "--root"])
        .arg(temp.path())
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let html = std::fs::read_to_string(output).unwrap();
    assert!(html.contains("<h1>Hello file</h1>"));
}

#[test]
#[serial]
fn test_config_globals_and_index() {
    let temp = site();
    std::fs::write(
        temp.path().join("mocha.toml"),
        "index = \"team.html\"\n\n[globals]\nteam = [\"grace\"]\n",
    )
    .unwrap();

    mocha()
        .args(["render", "/", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("<li>grace</li>"));
}

#[test]
#[serial]
fn test_exec_json_and_xml() {
    let temp = site();
    let body = temp.path().join("body.json");
    std::fs::write(&body, r#"{"numbers": [1, 2, 3]}"#).unwrap();

    mocha()
        .args(["exec", "sum.api", "--root"])
        .arg(temp.path())
        .arg("--body")
        .arg(&body)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"total":6}"#));

    mocha()
        .args(["exec", "sum.api", "--accept", "text/xml", "--root"])
        .arg(temp.path())
        .arg("--body")
        .arg(&body)
        .assert()
        .success()
        .stdout(predicate::str::contains("<result><total>6</total></result>"));
}

#[test]
#[serial]
fn test_exec_rejects_media_type() {
    let temp = site();
    mocha()
        .args(["exec", "sum.api", "--accept", "text/html", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'text/html' is not a supported output format"))
        .stderr(predicate::str::contains("application/json"));
}

#[test]
#[serial]
fn test_render_reports_expression_errors() {
    let temp = site();
    std::fs::write(temp.path().join("broken.html"), r#"<p data-if="1 +">x</p>"#).unwrap();

    mocha()
        .args(["render", "broken.html", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Expression failed"))
        .stderr(predicate::str::contains("While evaluating: 1 +"));
}

#[test]
#[serial]
fn test_render_missing_document() {
    let temp = site();
    mocha()
        .args(["render", "/missing.html", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_help_lists_commands() {
    mocha()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("exec"));
}
