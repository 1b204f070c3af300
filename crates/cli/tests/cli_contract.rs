use assert_cmd::cargo::cargo_bin_cmd;
use pdf_engine::testing::{blank_pdf, sample_pdf, SamplePage};
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn write_pdf(dir: &Path, name: &str, bytes: Vec<u8>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("fixture pdf should be written");
    path
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("stdout should contain valid json")
}

#[test]
fn info_emits_stable_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(
        temp.path(),
        "small.pdf",
        sample_pdf(&[SamplePage::new(400.0, 300.0), SamplePage::letter()]).unwrap(),
    );

    let output = cargo_bin_cmd!("pdf-canvas-cli")
        .arg("info")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = stdout_json(&output);
    assert_eq!(value["page_count"], 2);
    assert_eq!(value["first_page_size_pt"]["width"], 400.0);
    assert_eq!(value["first_page_size_pt"]["height"], 300.0);
}

#[test]
fn info_rejects_missing_file() {
    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("info")
        .arg("/definitely/not/here.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_rejects_non_pdf_bytes() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("notes.pdf");
    std::fs::write(&path, b"just some text").unwrap();

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("info")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn render_writes_png_at_default_zoom() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "doc.pdf", blank_pdf(2).unwrap());
    let output_path = temp.path().join("page.png");

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--page")
        .arg("2")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("page.png"));

    let image = image::open(&output_path).expect("render should be a readable image");
    assert_eq!((image.width(), image.height()), (918, 1188));
}

#[test]
fn render_applies_zoom_and_rotation() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "doc.pdf", blank_pdf(1).unwrap());

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--zoom")
        .arg("1")
        .arg("--rotation")
        .arg("90")
        .assert()
        .success();

    let image =
        image::open(temp.path().join("doc-page-1.png")).expect("default output should exist");
    assert_eq!((image.width(), image.height()), (792, 612));
}

#[test]
fn render_rejects_bad_arguments() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "doc.pdf", blank_pdf(1).unwrap());

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--rotation")
        .arg("45")
        .assert()
        .failure()
        .stderr(predicate::str::contains("multiple of 90"));

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--zoom")
        .arg("9")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--zoom must be between"));

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("render")
        .arg(&pdf)
        .arg("--page")
        .arg("3")
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn text_lists_runs_in_canvas_space() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(
        temp.path(),
        "text.pdf",
        sample_pdf(&[SamplePage::letter().with_text("Hello", 20.0, 100.0, 200.0)]).unwrap(),
    );

    let output = cargo_bin_cmd!("pdf-canvas-cli")
        .arg("text")
        .arg(&pdf)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let runs = stdout_json(&output);
    let runs = runs.as_array().expect("text output should be a list");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["text"], "Hello");
    let font_size = runs[0]["font_size"].as_f64().unwrap();
    assert!((font_size - 30.0).abs() < 1e-3);
}

#[test]
fn edit_replays_script_and_exports() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "doc.pdf", blank_pdf(1).unwrap());
    let script = temp.path().join("script.json");
    std::fs::write(
        &script,
        r#"{
            "steps": [
                { "action": "shape", "kind": "rectangle" },
                { "action": "drag", "from": [100, 100], "to": [200, 150] },
                { "action": "tool", "mode": { "mode": "add_link" } },
                { "action": "click", "x": 300, "y": 300 },
                { "action": "link", "text": "Docs", "url": "https://example.com" },
                { "action": "tool", "mode": { "mode": "annotate" } },
                { "action": "click", "x": 50, "y": 600 },
                { "action": "undo" },
                { "action": "click", "x": 305, "y": 305 }
            ]
        }"#,
    )
    .unwrap();
    let output_path = temp.path().join("edited.png");

    let output = cargo_bin_cmd!("pdf-canvas-cli")
        .arg("edit")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary = stdout_json(&output);
    assert_eq!(summary["objects"], serde_json::json!(["shape", "link"]));
    assert_eq!(summary["opened_links"], serde_json::json!(["https://example.com"]));
    assert_eq!(summary["page"], 1);
    assert_eq!(summary["can_undo"], true);

    let image = image::open(&output_path).expect("export should be a readable image");
    assert_eq!((image.width(), image.height()), (918, 1188));
}

#[test]
fn edit_reports_failing_step() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = write_pdf(temp.path(), "doc.pdf", blank_pdf(1).unwrap());
    let script = temp.path().join("script.json");
    std::fs::write(
        &script,
        r#"{ "steps": [
            { "action": "tool", "mode": { "mode": "add_link" } },
            { "action": "click", "x": 10, "y": 10 },
            { "action": "link", "text": "  ", "url": "https://example.com" }
        ] }"#,
    )
    .unwrap();

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("edit")
        .arg(&pdf)
        .arg("--script")
        .arg(&script)
        .arg("--output")
        .arg(temp.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 3 failed"))
        .stderr(predicate::str::contains("Please enter both link text and URL"));
}

#[test]
fn config_reflects_file_and_environment() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let config = temp.path().join("editor.toml");
    std::fs::write(&config, "sticky_shapes = true\n").unwrap();

    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("config")
        .arg("--config")
        .arg(&config)
        .env("PDF_CANVAS_HISTORY_DEPTH", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("history_depth = 5"))
        .stdout(predicate::str::contains("sticky_shapes = true"));
}

#[test]
fn version_prints_package_version() {
    cargo_bin_cmd!("pdf-canvas-cli")
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
