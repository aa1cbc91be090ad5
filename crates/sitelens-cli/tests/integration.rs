//! Integration tests for the sitelens CLI
//!
//! These tests run the built binary as a subprocess against temporary
//! directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const CATALOG: &str = r#"
blog_dir = "blog"

[[services]]
name = "PU Polish"
keywords = ["pu polish"]

[[services]]
name = "Melamine Polish"

[[locations]]
name = "Bandra"

[[locations]]
name = "Juhu"

[[locations]]
name = "Powai"

[[posts]]
slug = "teak-care"
title = "How to Care for Teak Furniture"
location = "Bandra"
published = "2025-02-01"
"#;

fn sitelens(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sitelens"))
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run CLI")
}

fn write_catalog(dir: &Path) {
    fs::create_dir(dir.join("blog")).unwrap();
    fs::write(
        dir.join("blog/teak-care.html"),
        "<h2>Teak care in Bandra</h2><p>Dust teak weekly.</p>\
         <img src=\"/images/teak-table.jpg\"><img src=\"/images/teak-chair.png\">",
    )
    .unwrap();
    fs::write(dir.join("catalog.toml"), CATALOG).unwrap();
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = sitelens(&["--help"], dir.path());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success());
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("validate-sitemap"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = sitelens(&["--version"], dir.path());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains(&format!("sitelens {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_build_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());

    let output = sitelens(&["build", "catalog.toml", "--out", "public"], dir.path());
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = dir.path().join("public");
    for file in [
        "pages.json",
        "sitemap.xml",
        "robots.txt",
        "seo-report.json",
        "pipeline-report.json",
    ] {
        assert!(out.join(file).exists(), "missing {file}");
    }

    let pages: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("pages.json")).unwrap()).unwrap();
    let pages = pages.as_array().unwrap();
    // home + 2 categories + 6 service pages + blog index + 1 post
    assert_eq!(pages.len(), 11);
    for page in pages {
        assert!(!page["title"].as_str().unwrap().is_empty());
        assert!(page["canonicalUrl"].as_str().unwrap().starts_with("https://"));
    }

    let robots = fs::read_to_string(out.join("robots.txt")).unwrap();
    assert!(robots.contains("Sitemap: https://www.mumbaifurniturepolish.com/sitemap.xml"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("seo-report.json")).unwrap()).unwrap();
    assert_eq!(report["pages"].as_array().unwrap().len(), 11);
    assert!(report["averageScore"].as_f64().unwrap() > 0.0);

    let pipeline: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("pipeline-report.json")).unwrap())
            .unwrap();
    let post = &pipeline["pages"]["/blog/teak-care"];
    assert_eq!(post["performance"]["preload"], "/images/teak-table.jpg");
    assert_eq!(
        post["performance"]["webpAlternatives"]["/images/teak-chair.png"],
        "/images/teak-chair.webp"
    );
    assert!(post["wordCount"].as_u64().unwrap() > 0);
    assert!(!post["outgoingLinks"].as_array().unwrap().is_empty());
}

#[test]
fn test_generated_sitemap_validates() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    let build = sitelens(&["build", "catalog.toml"], dir.path());
    assert!(build.status.success());

    let output = sitelens(&["validate-sitemap", "dist/sitemap.xml"], dir.path());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success());
    assert!(stdout.contains("valid (11 URLs)"));
}

#[test]
fn test_invalid_sitemap_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sitemap.xml"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc><priority>1.5</priority></url>
  <url><loc>https://example.com/a</loc></url>
</urlset>"#,
    )
    .unwrap();

    let output = sitelens(&["validate-sitemap", "sitemap.xml"], dir.path());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(!output.status.success());
    assert!(stderr.contains("duplicate <loc>"));
    assert!(stderr.contains("invalid <priority> 1.5"));
}

#[test]
fn test_process_is_stable_on_its_own_output() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    assert!(sitelens(&["build", "catalog.toml", "-o", "first"], dir.path()).status.success());

    let output = sitelens(&["process", "first/pages.json", "-o", "second"], dir.path());
    assert!(output.status.success());

    let first = fs::read_to_string(dir.path().join("first/pages.json")).unwrap();
    let second = fs::read_to_string(dir.path().join("second/pages.json")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_report_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("pages.json"),
        r#"[{"url": "/pu-polish-in-bandra", "serviceName": "PU Polish", "location": "Bandra"}]"#,
    )
    .unwrap();

    let output = sitelens(&["report", "pages.json"], dir.path());
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["pages"][0]["url"], "/pu-polish-in-bandra");
    assert!(report["bySeverity"]["critical"].as_u64().unwrap() > 0);
}

#[test]
fn test_config_file_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    write_catalog(dir.path());
    fs::write(
        dir.path().join("sitelens.toml"),
        "[site]\nurl = \"https://polish.example.com\"\n\n[sitemap]\ndisallow = [\"/admin\"]\n",
    )
    .unwrap();

    let output = sitelens(&["--config", "sitelens.toml", "build", "catalog.toml"], dir.path());
    assert!(output.status.success());

    let robots = fs::read_to_string(dir.path().join("dist/robots.txt")).unwrap();
    assert!(robots.contains("Disallow: /admin"));
    assert!(robots.contains("Sitemap: https://polish.example.com/sitemap.xml"));
}

#[test]
fn test_bad_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("sitelens.toml"), "[site]\nurl = \"http://insecure.example.com\"\n")
        .unwrap();
    fs::write(dir.path().join("pages.json"), "[]").unwrap();

    let output = sitelens(&["--config", "sitelens.toml", "report", "pages.json"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("site.url"));
}
