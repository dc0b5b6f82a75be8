//! Integration tests for the signature-match CLI.

use std::path::Path;
use std::process::{Command, Output};

fn signature_match(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_signature-match"))
        .args(args)
        .env_remove("SIGNATURE_MATCH_THRESHOLD")
        .output()
        .expect("Failed to run signature-match")
}

/// Write a solid-color PNG.
fn create_solid_png(path: &Path, size: u32, value: u8) {
    image::RgbImage::from_pixel(size, size, image::Rgb([value, value, value]))
        .save(path)
        .unwrap();
}

/// Write a PNG with a dark diagonal stroke on white, like a pen line.
fn create_stroke_png(path: &Path, size: u32) {
    let img = image::RgbImage::from_fn(size, size, |x, y| {
        if x.abs_diff(y) < size / 20 {
            image::Rgb([20, 20, 40])
        } else {
            image::Rgb([250, 250, 250])
        }
    });
    img.save(path).unwrap();
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_compare_identical_match() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    create_stroke_png(&a, 120);

    let output = signature_match(&["compare", a.to_str().unwrap(), a.to_str().unwrap()]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("Success"), "stdout: {out}");
    assert!(
        out.contains("Signatures are 100.00% similar!!"),
        "stdout: {out}"
    );
    assert!(
        out.contains("Signatures match successfully!"),
        "stdout: {out}"
    );
}

#[test]
fn test_compare_white_black_no_match() {
    let dir = tempfile::tempdir().unwrap();
    let white = dir.path().join("white.png");
    let black = dir.path().join("black.png");
    create_solid_png(&white, 100, 255);
    create_solid_png(&black, 100, 0);

    let output = signature_match(&["compare", white.to_str().unwrap(), black.to_str().unwrap()]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("Failure"), "stdout: {out}");
    assert!(out.contains("Signatures do not match."), "stdout: {out}");
}

#[test]
fn test_compare_json_with_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    create_solid_png(&a, 50, 128);

    let output = signature_match(&[
        "compare",
        a.to_str().unwrap(),
        a.to_str().unwrap(),
        "--json",
        "--threshold",
        "99.5",
        "--psnr",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["score"].as_f64(), Some(100.0));
    assert_eq!(json["threshold"].as_f64(), Some(99.5));
    assert_eq!(json["verdict"].as_str(), Some("match"));
    assert_eq!(json["canonical_size"][0].as_u64(), Some(300));
}

#[test]
fn test_compare_threshold_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    create_solid_png(&a, 40, 90);

    let output = Command::new(env!("CARGO_BIN_EXE_signature-match"))
        .args([
            "compare",
            a.to_str().unwrap(),
            a.to_str().unwrap(),
            "--json",
        ])
        .env("SIGNATURE_MATCH_THRESHOLD", "100")
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // 100.00 is not strictly above a threshold of 100
    assert_eq!(json["verdict"].as_str(), Some("no_match"));
}

#[test]
fn test_compare_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    create_solid_png(&a, 20, 0);
    let missing = dir.path().join("missing_file.png");

    let output = signature_match(&["compare", missing.to_str().unwrap(), a.to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing_file.png"), "stderr: {stderr}");
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_compare_writes_ssim_map() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    let map = dir.path().join("map.png");
    create_stroke_png(&a, 90);
    create_solid_png(&b, 90, 250);

    let output = signature_match(&[
        "compare",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--ssim-map",
        map.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let saved = image::open(&map).unwrap();
    assert_eq!((saved.width(), saved.height()), (294, 294));
}

#[test]
fn test_batch_csv_output() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("ref.png");
    let same = dir.path().join("same.png");
    let other = dir.path().join("other.png");
    let missing = dir.path().join("missing.png");
    let csv = dir.path().join("batch.csv");
    create_stroke_png(&reference, 100);
    create_stroke_png(&same, 200);
    create_solid_png(&other, 100, 0);

    let output = signature_match(&[
        "batch",
        "--reference",
        reference.to_str().unwrap(),
        same.to_str().unwrap(),
        other.to_str().unwrap(),
        missing.to_str().unwrap(),
        "--output",
        csv.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = stdout(&output);
    assert!(out.contains("(1 failed)"), "stdout: {out}");

    let content = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("reference,candidate,score,threshold,"));
    let failed = lines.iter().find(|l| l.contains("missing.png")).unwrap();
    assert!(failed.contains("Image load failed"));
}

#[test]
fn test_batch_rejects_unknown_output_format() {
    let dir = tempfile::tempdir().unwrap();
    let reference = dir.path().join("ref.png");
    create_solid_png(&reference, 30, 200);
    let out_path = dir.path().join("batch.txt");

    let output = signature_match(&[
        "batch",
        "-r",
        reference.to_str().unwrap(),
        reference.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
}
