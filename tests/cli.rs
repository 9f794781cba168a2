use std::path::Path;
use std::process::{Command, Output};

fn bottle_detect(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bottle-detect"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to run bottle-detect")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn no_image_path() {
    let dir = tempfile::tempdir().unwrap();
    let output = bottle_detect(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "{\"error\": \"No image path provided\"}\n");
}

#[test]
fn image_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = bottle_detect(dir.path(), &["does-not-exist.jpg"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "{\"error\": \"Image file not found: does-not-exist.jpg\"}\n"
    );
}

#[test]
fn model_not_found_at_default_path() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(16, 16)
        .save(dir.path().join("bottles.png"))
        .unwrap();

    let output = bottle_detect(dir.path(), &["bottles.png"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "{\"error\": \"Model file not found at ./controllers/best.onnx\"}\n"
    );
    assert!(!dir.path().join("output_image_with_boxes.jpg").exists());
}

#[test]
fn model_not_found_at_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(16, 16)
        .save(dir.path().join("bottles.png"))
        .unwrap();

    let output = bottle_detect(
        dir.path(),
        &["--model", "weights/yolo.onnx", "bottles.png"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "{\"error\": \"Model file not found at weights/yolo.onnx\"}\n"
    );
}

#[test]
fn arguments_after_the_image_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let output = bottle_detect(dir.path(), &["missing.jpg", "extra", "--more"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "{\"error\": \"Image file not found: missing.jpg\"}\n"
    );
}

#[test]
fn image_path_may_start_with_a_hyphen() {
    let dir = tempfile::tempdir().unwrap();
    let output = bottle_detect(dir.path(), &["-photo.jpg"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "{\"error\": \"Image file not found: -photo.jpg\"}\n"
    );
}

#[test]
fn malformed_option_is_reported_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = bottle_detect(dir.path(), &["missing.jpg", "--conf", "abc"]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 1);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid value 'abc' for '--conf <CONF>'"));
}

#[test]
fn out_of_range_thickness_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = bottle_detect(dir.path(), &["missing.jpg", "--thickness", "4294967295"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).starts_with("{\"error\": "));
}
