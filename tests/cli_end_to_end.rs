use std::io::Write;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use tempfile::NamedTempFile;

fn vanish() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vanish"));
    cmd.env_remove("VANISH__CACHE_SERVER__SITE_URL")
        .env_remove("VANISH__CACHE_SERVER__PORT_OVERRIDE")
        .env_remove("VANISH_CONFIG_FILE");
    cmd
}

#[test]
fn ban_command_sends_bans_to_the_cache_server() {
    let server = MockServer::start();
    let page = server.mock(|when, then| {
        when.path("/")
            .header("x-ban-method", "url")
            .header("x-ban-url", "/2024/hello/");
        then.status(200);
    });
    let tags = server.mock(|when, then| {
        when.path("/")
            .header("x-ban-method", "regex")
            .header("x-ban-regex", "^/tag/");
        then.status(200);
    });

    let assert = vanish()
        .args(["ban", "--site-url", "http://127.0.0.1/", "--port"])
        .arg(server.port().to_string())
        .args(["--url", "https://example.com/2024/hello/"])
        .args(["--regex", "^/tag/", "--json"])
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("\"attempted\": 2"));
    assert!(output.contains("\"failed\": 0"));
    page.assert();
    tags.assert();
}

#[test]
fn partial_failure_exits_with_code_two() {
    let server = MockServer::start();
    let rejected = server.mock(|when, then| {
        when.header("x-ban-url", "/down");
        then.status(503);
    });
    let accepted = server.mock(|when, then| {
        when.header("x-ban-url", "/up");
        then.status(200);
    });

    vanish()
        .args(["ban", "--site-url", "http://127.0.0.1/", "--port"])
        .arg(server.port().to_string())
        .args(["--url", "/up", "--url", "/down"])
        .assert()
        .code(2)
        .stdout(contains("failed=1"))
        .stdout(contains("failed url:/down after 1 attempt(s)"));

    rejected.assert();
    accepted.assert();
}

#[test]
fn ban_without_site_url_fails_fast() {
    vanish()
        .args(["ban", "--url", "/a"])
        .assert()
        .code(64)
        .stderr(contains("site_url"));
}

#[test]
fn target_reads_site_url_from_config_file() {
    let mut file = NamedTempFile::with_suffix(".toml").expect("tmp file");
    file.write_all(
        b"[cache_server]\nsite_url = \"https://example.com/blog/\"\nport_override = 6081\n",
    )
    .expect("write config");

    vanish()
        .arg("--config-file")
        .arg(file.path())
        .arg("target")
        .assert()
        .success()
        .stdout("https://example.com:6081/blog/\n");
}

#[test]
fn cli_port_beats_environment() {
    vanish()
        .env("VANISH__CACHE_SERVER__SITE_URL", "http://example.com/")
        .env("VANISH__CACHE_SERVER__PORT_OVERRIDE", "8080")
        .args(["target", "--port", "6081"])
        .assert()
        .success()
        .stdout("http://example.com:6081/\n");
}

#[test]
fn normalize_prints_ban_paths() {
    vanish()
        .args(["normalize", "http://example.com:8080/foo?x=1#top", "bar"])
        .assert()
        .success()
        .stdout("/foo?x=1#top\n/bar\n");
}

#[test]
fn normalize_rejects_unparsable_urls() {
    vanish()
        .args(["normalize", "http://[::1"])
        .assert()
        .code(65);
}
