use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use flate2::{Compression, write::ZlibEncoder};

const BASE_URL: &str = "https://docs.example/";

fn inventory_bytes() -> Vec<u8> {
    let body = "\
demo.Bot py:class 1 bot.html#$ -
demo.Bot.send_message py:method 1 bot.html#$ -
demo.Message py:class 1 message.html#$ -
inline mode std:label -1 guide.html#inline-mode Inline Mode
";
    let mut bytes = b"# Sphinx inventory version 2\n\
        # Project: Demo Bot\n\
        # Version: 20.1\n\
        # The remainder of this file is compressed using zlib.\n"
        .to_vec();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    bytes.extend(encoder.finish().unwrap());
    bytes
}

fn write_inventory(dir: &Path) -> PathBuf {
    let path = dir.join("objects.inv");
    std::fs::write(&path, inventory_bytes()).unwrap();
    path
}

fn run(dir: &Path, args: &[&str]) -> Output {
    let inventory = write_inventory(dir);
    Command::new(env!("CARGO_BIN_EXE_sphinxbert"))
        .args(args)
        .env("SPHINXBERT_INVENTORY", &inventory)
        .env("SPHINXBERT_BASE_URL", BASE_URL)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("SPHINXBERT_CONFIG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn search_json_ranks_exact_name_first() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["search", "demo.Message", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["results"][0]["name"], "demo.Message");
    assert_eq!(value["results"][0]["link"], "https://docs.example/message.html#demo.Message");
    assert_eq!(
        value["results"][0]["text"],
        "Documentation of <i>Demo Bot</i>: <a href=\"https://docs.example/message.html#demo.Message\">demo.Message</a>"
    );
    assert_eq!(value["total"], 4);
}

#[tokio::test]
async fn downloads_inventory_from_base_url() {
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{method, path},
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/en/stable/objects.inv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(inventory_bytes()))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let base_url = format!("{}/en/stable/", server.uri());
    let config_home = tmp.path().to_path_buf();
    let child_base = base_url.clone();
    let output = tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_sphinxbert"))
            .args(["search", "demo.Bot", "--json"])
            .env_remove("SPHINXBERT_INVENTORY")
            .env_remove("SPHINXBERT_CONFIG")
            .env("SPHINXBERT_BASE_URL", &child_base)
            .env("XDG_CONFIG_HOME", &config_home)
            .output()
            .unwrap()
    })
    .await
    .unwrap();
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["results"][0]["name"], "demo.Bot");
    assert_eq!(
        value["results"][0]["link"],
        format!("{base_url}bot.html#demo.Bot")
    );
}

#[test]
fn insert_markdown_output() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(
        tmp.path(),
        &["insert", "see +Bot+", "-k", "1", "--markdown", "--json"],
    );
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).unwrap();
    let hits = value.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["text"], "see [Bot](https://docs.example/bot.html#demo.Bot)");
}

#[test]
fn query_dispatches_to_insert_search() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["query", "see +Bot+", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value =
        serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["mode"], "insert");
    assert_eq!(value["results"].as_array().unwrap().len(), 3);
}

#[test]
fn too_many_combinations_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["insert", "+a+ +b+ +c+ +d+"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("TooManyCombinations"), "{stderr}");
}

#[test]
fn list_filters_by_domain_glob() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["list", "--domain", "py:*"]);
    assert!(output.status.success(), "{output:?}");

    let text = stdout(&output);
    assert!(text.contains("demo.Bot.send_message"));
    assert!(!text.contains("inline mode"));
    assert!(text.contains("3 entries"));
}

#[test]
fn info_reports_project() {
    let tmp = tempfile::tempdir().unwrap();
    let output = run(tmp.path(), &["info"]);
    assert!(output.status.success(), "{output:?}");

    let text = stdout(&output);
    assert!(text.contains("Project: Demo Bot"));
    assert!(text.contains("Entries: 4"));
}

#[test]
fn missing_inventory_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_sphinxbert"))
        .args(["info"])
        .env_remove("SPHINXBERT_INVENTORY")
        .env_remove("SPHINXBERT_BASE_URL")
        .env_remove("SPHINXBERT_CONFIG")
        .env("XDG_CONFIG_HOME", tmp.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
}
