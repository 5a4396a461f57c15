use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn cargo_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_marathon-bibs"))
}

fn sample_csv() -> &'static str {
    "demos/participants.csv"
}

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write CSV fixture");
    path
}

fn run(args: &[&str]) -> Output {
    cargo_bin().args(args).output().expect("Failed to execute command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("non-UTF-8 temp path")
}

/// Page objects in a saved PDF: `/Type /Page`, but not the `/Pages` tree.
fn count_pdf_pages(bytes: &[u8]) -> usize {
    let text = String::from_utf8_lossy(bytes);
    text.split("/Type")
        .skip(1)
        .filter(|rest| {
            let rest = rest.trim_start();
            rest.starts_with("/Page")
                && !rest["/Page".len()..].starts_with(|c: char| c.is_ascii_alphanumeric())
        })
        .count()
}

#[test]
fn test_themes_lists_all_six() {
    let output = run(&["themes"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let text = stdout(&output);
    for id in [
        "athletic-blue",
        "energy-orange",
        "victory-green",
        "champion-purple",
        "fire-red",
        "thunder-yellow",
    ] {
        assert!(text.contains(id), "missing theme {}", id);
    }
}

#[test]
fn test_themes_json() {
    let output = run(&["themes", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let themes: serde_json::Value = serde_json::from_slice(&output.stdout).expect("invalid JSON");
    let themes = themes.as_array().expect("expected an array");
    assert_eq!(themes.len(), 6);
    assert_eq!(themes[0]["id"], "athletic-blue");
    assert_eq!(themes[0]["text"], "#FFFFFF");
}

#[test]
fn test_pdf_export() {
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("bibs.pdf");

    let output = run(&["pdf", "--csv", sample_csv(), "-o", path_str(&output_file)]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Loaded 3 participants"));
    assert!(stdout(&output).contains("Exported 3 BIB pages"));

    let bytes = fs::read(&output_file).expect("PDF file was not created");
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() > 1000, "PDF file is too small, likely empty or corrupt");
    assert_eq!(count_pdf_pages(&bytes), 3);
}

#[test]
fn test_pdf_export_skips_duplicate_pages() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(
        &dir,
        "dupes.csv",
        "BIB Number,Participant Name\n001,Ann Lee\n001,Bo Park\n002,Cy Young\n",
    );
    let output_file = dir.path().join("bibs.pdf");

    let output = run(&["pdf", "--csv", path_str(&csv), "-o", path_str(&output_file)]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Exported 2 BIB pages"));

    let bytes = fs::read(&output_file).expect("PDF file was not created");
    assert_eq!(count_pdf_pages(&bytes), 2);
}

#[test]
fn test_images_export_with_slash_in_name() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(
        &dir,
        "slashes.csv",
        "BIB Number,Participant Name\n001,Ann Lee\n002,Smith/Jones\n003,Cy Young\n",
    );
    let out_dir = dir.path().join("jpegs");

    let output = run(&["images", "--csv", path_str(&csv), "--out-dir", path_str(&out_dir)]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Exported 3 JPEG files"));

    assert!(out_dir.join("bib-001-Ann-Lee.jpg").exists());
    assert!(out_dir.join("bib-002-Smith-Jones.jpg").exists());
    assert!(out_dir.join("bib-003-Cy-Young.jpg").exists());
}

#[test]
fn test_pdf_export_with_theme() {
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("green.pdf");

    let output = run(&[
        "pdf",
        "--csv", sample_csv(),
        "--theme", "victory-green",
        "-o", path_str(&output_file),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(output_file.exists(), "PDF file was not created");
}

#[test]
fn test_images_export_names_and_order() {
    let dir = TempDir::new().unwrap();
    let out_dir = dir.path().join("jpegs");

    let output = run(&["images", "--csv", sample_csv(), "--out-dir", path_str(&out_dir)]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let mut names: Vec<String> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "bib-001-John-Smith.jpg",
            "bib-002-Jane-Doe.jpg",
            "bib-003-Mike-Johnson.jpg",
        ]
    );
}

#[test]
fn test_print_export() {
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("print.html");

    let output = run(&["print", "--csv", sample_csv(), "-o", path_str(&output_file)]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let html = fs::read_to_string(&output_file).expect("HTML file was not created");
    assert_eq!(html.matches("<div class=\"bib-card\"").count(), 3);
    assert!(html.contains("@page { size: 8.25in 5.25in landscape; margin: 0; }"));
}

#[test]
fn test_preview_svg_with_wraparound() {
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("preview.svg");

    let output = run(&[
        "preview",
        "--csv", sample_csv(),
        "--step", "-1",
        "-o", path_str(&output_file),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Preview 3 of 3"));

    let svg = fs::read_to_string(&output_file).unwrap();
    assert!(svg.contains("Mike Johnson"));
}

#[test]
fn test_preview_with_huge_step_returns_promptly() {
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("preview.svg");

    let output = run(&[
        "preview",
        "--csv", sample_csv(),
        "--step", "9223372036854775807",
        "-o", path_str(&output_file),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Preview 2 of 3"));
}

#[test]
fn test_preview_png() {
    let dir = TempDir::new().unwrap();
    let output_file = dir.path().join("preview.png");

    let output = run(&["preview", "--csv", sample_csv(), "-o", path_str(&output_file)]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let bytes = fs::read(&output_file).expect("PNG file was not created");
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
}

#[test]
fn test_preview_json_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(&dir, "names.csv", "Participant Name\nJane Doe\n");
    let output_file = dir.path().join("preview.svg");

    let output = run(&[
        "preview",
        "--csv", path_str(&csv),
        "--json",
        "-o", path_str(&output_file),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let text = stdout(&output);
    assert!(text.contains("\"eventName\": \"Marathon Event\""));
    assert!(text.contains("\"raceCategory\": \"Full Marathon\""));
    assert!(text.contains("\"bibNumber\": \"1\""));
}

#[test]
fn test_empty_roster_exports_nothing() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(&dir, "empty.csv", "Event Name,Race Category,BIB Number,Participant Name,Date\n");
    let output_file = dir.path().join("empty.pdf");

    let output = run(&["pdf", "--csv", path_str(&csv), "-o", path_str(&output_file)]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(!output_file.exists(), "no PDF should be written for zero records");
    assert!(!stdout(&output).contains("Exported"));
}

#[test]
fn test_duplicate_bib_is_skipped() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(
        &dir,
        "dupes.csv",
        "BIB Number,Participant Name\n001,Ann Lee\n001,Bo Park\n002,Cy Young\n",
    );
    let out_dir = dir.path().join("jpegs");

    let output = run(&["images", "--csv", path_str(&csv), "--out-dir", path_str(&out_dir)]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Skipped (duplicate BIB number): bib-001"));

    assert!(out_dir.join("bib-001-Ann-Lee.jpg").exists());
    assert!(!out_dir.join("bib-001-Bo-Park.jpg").exists());
    assert!(out_dir.join("bib-002-Cy-Young.jpg").exists());
}

#[test]
fn test_generate_reports_collisions() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(&dir, "dupes.csv", "BIB Number\n7\n7\n");

    let output = run(&["generate", "--csv", path_str(&csv)]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let text = stdout(&output);
    assert!(text.contains("Row 2 reuses bib-7 from row 1"));
    assert!(text.contains("Generated 1 BIB cards"));
}

#[test]
fn test_malformed_csv_fails() {
    let dir = TempDir::new().unwrap();
    let csv = write_csv(&dir, "bad.csv", "Participant Name,Date\nAl,2024-01-01\nBea\n");
    let output_file = dir.path().join("should-not-exist.pdf");

    let output = run(&["pdf", "--csv", path_str(&csv), "-o", path_str(&output_file)]);
    assert!(!output.status.success(), "Command should have failed for a ragged row");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse CSV file"));
    assert!(!output_file.exists());
}

#[test]
fn test_missing_csv_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nonexistent.csv");
    let output_file = dir.path().join("should-not-exist.pdf");

    let output = run(&["pdf", "--csv", path_str(&missing), "-o", path_str(&output_file)]);
    assert!(!output.status.success(), "Command should have failed for missing CSV");
    assert!(!output_file.exists());
}

#[test]
fn test_unknown_theme_fails() {
    let output = run(&["pdf", "--csv", sample_csv(), "--theme", "neon-pink"]);
    assert!(!output.status.success(), "Command should have failed for unknown theme");
    assert!(String::from_utf8_lossy(&output.stderr).contains("neon-pink"));
}

#[test]
fn test_invalid_background_fails() {
    let dir = TempDir::new().unwrap();
    let bogus = write_csv(&dir, "not-an-image.png", "hello");
    let output_file = dir.path().join("should-not-exist.pdf");

    let output = run(&[
        "pdf",
        "--csv", sample_csv(),
        "--background", path_str(&bogus),
        "-o", path_str(&output_file),
    ]);
    assert!(!output.status.success(), "Command should have failed for a non-image background");
    assert!(!output_file.exists());
}

#[test]
fn test_background_image_export() {
    let dir = TempDir::new().unwrap();
    let bg_path = dir.path().join("bg.png");
    image::RgbImage::from_pixel(40, 25, image::Rgb([30, 120, 60]))
        .save(&bg_path)
        .unwrap();
    let output_file = dir.path().join("bg.pdf");

    let output = run(&[
        "pdf",
        "--csv", sample_csv(),
        "--background", path_str(&bg_path),
        "-o", path_str(&output_file),
    ]);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout(&output).contains("Background image loaded"));
    assert!(output_file.exists());
}
