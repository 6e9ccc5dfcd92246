//! Integration tests for `monaco-workers build` and `monaco-workers workers`.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const EDITOR_WORKER: &str = "monaco-editor/esm/vs/editor/editor.worker";
const JSON_WORKER: &str = "monaco-editor/esm/vs/language/json/json.worker";

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_monaco-workers"))
}

fn project(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in [EDITOR_WORKER, JSON_WORKER] {
        let file = dir.path().join("node_modules").join(format!("{entry}.js"));
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(file, format!("/* {entry} */")).unwrap();
    }
    std::fs::write(dir.path().join("monaco-workers.json"), config).unwrap();
    dir
}

/// A stand-in for esbuild that echoes the entry file.
#[cfg(unix)]
fn fake_esbuild(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-esbuild");
    std::fs::write(&script, "#!/bin/sh\ncat \"$1\"\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be valid JSON ({e}): {stdout}\nstderr: {}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[cfg(unix)]
#[test]
fn test_build_emits_workers_and_injects_html() {
    let dir = project(r#"{ "languageWorkers": ["json"] }"#);
    let tools = tempfile::tempdir().unwrap();
    let esbuild = fake_esbuild(tools.path());

    let dist = dir.path().join("dist");
    std::fs::create_dir_all(&dist).unwrap();
    std::fs::write(
        dist.join("index.html"),
        "<html><head><title>app</title></head><body></body></html>",
    )
    .unwrap();

    let output = bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "build", "--esbuild"])
        .arg(&esbuild)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let json = stdout_json(&output);
    assert_eq!(json["ok"], true);
    assert_eq!(json["skipped"], false);
    assert_eq!(json["copied"].as_array().unwrap().len(), 2);

    let workers = dist.join("monacoeditorwork");
    assert_eq!(
        std::fs::read_to_string(workers.join("json.worker.bundle.js")).unwrap(),
        format!("/* {JSON_WORKER} */")
    );
    assert!(workers.join("editor.worker.bundle.js").is_file());

    let html = std::fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(html.starts_with("<html><head><script>"));
    assert!(html.contains("/monacoeditorwork/json.worker.bundle.js"));
}

#[cfg(unix)]
#[test]
fn test_build_failure_exits_non_zero() {
    let dir = project(
        r#"{ "languageWorkers": [], "customWorkers": [{ "label": "yaml", "entry": "monaco-yaml/yaml.worker" }] }"#,
    );
    let tools = tempfile::tempdir().unwrap();
    let esbuild = fake_esbuild(tools.path());

    let output = bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "build", "--esbuild"])
        .arg(&esbuild)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let json = stdout_json(&output);
    assert_eq!(json["ok"], false);
    assert_eq!(json["failed"][0]["label"], "yaml");
    assert!(dir
        .path()
        .join("dist/monacoeditorwork/editor.worker.bundle.js")
        .is_file());
}

#[test]
fn test_build_remote_public_path_is_skipped() {
    let dir = project(r#"{ "publicPath": "https://cdn.example.com/workers" }"#);

    let output = bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "build", "--esbuild", "/nonexistent/esbuild"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let json = stdout_json(&output);
    assert_eq!(json["skipped"], true);
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_unknown_label_is_an_error() {
    let dir = project(r#"{ "languageWorkers": ["cobol"] }"#);

    let output = bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["build", "--esbuild", "/nonexistent/esbuild"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cobol"), "stderr: {stderr}");
}

#[test]
fn test_workers_json() {
    let dir = project(r#"{ "languageWorkers": ["typescript"] }"#);

    let output = bin()
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "workers", "--base", "/app/"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let json = stdout_json(&output);
    assert_eq!(json["remote"], false);
    assert_eq!(json["workers"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["paths"]["javascript"],
        "/app/monacoeditorwork/ts.worker.bundle.js"
    );
    assert_eq!(json["paths"]["javascript"], json["paths"]["typescript"]);
}

#[test]
fn test_version() {
    let output = bin().arg("version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("monaco-workers "));
}
