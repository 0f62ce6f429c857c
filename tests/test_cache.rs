//! Metadata sidecar compatibility and change detection on disk.

use penwork::cache::{bump_version, file_hash, needs_regeneration, Metadata, Version};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_reads_existing_sidecar() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");
    fs::write(
        &path,
        r#"{
  "version": "2.3.9",
  "version_date": "2025-01-02T10:00:00",
  "author": "Sidecar Author",
  "introduction": {
    "input_hash": "abc",
    "generated_at": "2025-01-02T10:00:00",
    "output_file": "output/introduction.txt"
  },
  "abstract": {
    "generated_from_sections": true,
    "generated_at": "2025-01-02T10:01:00",
    "output_file": "output/abstract.txt"
  }
}"#,
    )
    .unwrap();

    let metadata = Metadata::load(&path).unwrap();
    assert_eq!(metadata.author().as_deref(), Some("Sidecar Author"));
    assert_eq!(metadata.input_hash("introduction").as_deref(), Some("abc"));
    assert!(metadata.record("abstract").unwrap().generated_from_sections);
    assert_eq!(metadata.input_hash("abstract"), None);

    let next = bump_version(&path).unwrap();
    assert_eq!(
        next,
        Version {
            major: 2,
            minor: 3,
            patch: 10
        }
    );
    let reloaded = Metadata::load(&path).unwrap();
    assert_eq!(reloaded.version.as_deref(), Some("2.3.10"));
    assert_eq!(reloaded.author().as_deref(), Some("Sidecar Author"));
}

#[test]
fn test_malformed_sidecar_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metadata.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(Metadata::load(&path).is_err());
}

#[test]
fn test_change_detection() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("methodology.md");
    let output = dir.path().join("methodology.txt");

    assert!(!needs_regeneration(&input, &output, None).unwrap());

    fs::write(&input, "notes v1").unwrap();
    assert!(needs_regeneration(&input, &output, None).unwrap());

    fs::write(&output, "generated").unwrap();
    let hash = file_hash(&input).unwrap();
    assert!(!needs_regeneration(&input, &output, Some(&hash)).unwrap());
    assert!(needs_regeneration(&input, &output, None).unwrap());

    fs::write(&input, "notes v2").unwrap();
    assert!(needs_regeneration(&input, &output, Some(&hash)).unwrap());
}
