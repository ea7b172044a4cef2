//! Integration tests for rocrate2rohub.

use std::fs::{self, File};
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use rocrate2rohub::rocrate::converter::STUDY_SUBJECT;
use rocrate2rohub::{
    CrateConverter, Error, RoCrate, ResearchAreaSource, convert_crate_to_jsonld,
    convert_jsonld_to_crate, validate_file,
};

const MANIFEST: &str = r#"{
    "@context": "https://w3id.org/ro/crate/1.1/context",
    "@graph": [
        {
            "@id": "ro-crate-metadata.json",
            "@type": "CreativeWork",
            "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"},
            "about": {"@id": "./"}
        },
        {
            "@id": "./",
            "@type": "Dataset",
            "name": "Glacier melt series",
            "description": "Daily discharge measurements",
            "keywords": ["glacier", "hydrology"],
            "hasPart": [{"@id": "data/discharge.csv"}]
        },
        {"@id": "data/discharge.csv", "@type": "File", "encodingFormat": "text/csv"}
    ]
}"#;

/// Helper to create a crate directory with one payload file.
fn create_test_crate(manifest: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("ro-crate-metadata.json"), manifest)
        .expect("Failed to write manifest");
    fs::create_dir(dir.path().join("data")).expect("Failed to create data dir");
    fs::write(dir.path().join("data/discharge.csv"), "day,m3\n1,4.2\n")
        .expect("Failed to write payload");
    dir
}

fn zip_entries(path: &Path) -> Vec<String> {
    let archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validate_reports_missing_research_area() {
    let dir = create_test_crate(MANIFEST);
    let errors = validate_file(dir.path()).expect("Validation failed");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "research_area");
    assert_eq!(errors[0].message, "must be set");
}

#[test]
fn test_validate_sorted_by_field() {
    let manifest = MANIFEST
        .replace("\"name\": \"Glacier melt series\",", "\"name\": \"Ice\",")
        .replace("\"description\": \"Daily discharge measurements\",", "");
    let dir = create_test_crate(&manifest);
    let converter = CrateConverter::new(Some(dir.path())).unwrap();

    let errors = converter.validate();
    let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
    assert_eq!(fields, vec!["description", "name", "research_area"]);
    assert_eq!(errors[1].message, "must be at least 5 characters long");
}

#[test]
fn test_research_area_check_is_presence_only() {
    let dir = create_test_crate(MANIFEST);
    let mut converter = CrateConverter::new(Some(dir.path())).unwrap();
    converter
        .rocrate_mut()
        .root_dataset_mut()
        .set(STUDY_SUBJECT, "not a known research area");

    assert!(!converter.research_areas().values().any(|v| v == "not a known research area"));
    assert_eq!(converter.check_research_area(), None);
    assert!(converter.is_valid());
}

#[test]
fn test_single_element_lists_are_read_as_text() {
    let manifest = MANIFEST.replace(
        "\"name\": \"Glacier melt series\"",
        "\"name\": [\"Glacier melt series\"], \"studySubject\": [{\"@id\": \"http://example.org/hydro\"}]",
    );
    let dir = create_test_crate(&manifest);
    let converter = CrateConverter::new(Some(dir.path())).unwrap();
    assert!(converter.validate().is_empty());
}

// =============================================================================
// Fixing
// =============================================================================

#[test]
fn test_set_research_area_known_key() {
    let dir = create_test_crate(MANIFEST);
    let mut converter = CrateConverter::new(Some(dir.path())).unwrap();

    converter.set_research_area("Biology").expect("Biology is a bundled area");
    let expected = converter.research_areas()["Biology"].clone();
    assert_eq!(
        converter.rocrate().root_dataset().get(STUDY_SUBJECT),
        Some(&json!({"@id": expected}))
    );
    assert!(converter.is_valid());
}

#[test]
fn test_alternate_research_area_file() {
    let dir = create_test_crate(MANIFEST);
    let areas = dir.path().join("areas.tsv");
    fs::write(&areas, "Glaciology\thttp://example.org/glaciology\n").unwrap();

    let mut converter =
        CrateConverter::with_source(Some(dir.path()), ResearchAreaSource::File(areas.clone()))
            .unwrap();
    assert!(converter.set_research_area("Biology").is_err());
    converter.set_research_area("Glaciology").unwrap();

    fs::write(&areas, "Biology\thttp://example.org/biology\n").unwrap();
    converter.reload_research_areas().unwrap();
    converter.set_research_area("Biology").unwrap();
    assert!(!converter.research_areas().contains_key("Glaciology"));
}

#[test]
fn test_set_description_accepts_anything() {
    let mut converter = CrateConverter::new(None).unwrap();
    converter.set_description(42).unwrap();
    assert_eq!(converter.check_description(), None);
    converter.set_description("").unwrap();
    assert_eq!(converter.check_description().as_deref(), Some("must be set"));
}

// =============================================================================
// Writing
// =============================================================================

#[test]
fn test_write_directory_copies_payload() {
    let dir = create_test_crate(MANIFEST);
    let out = TempDir::new().unwrap();
    let dest = out.path().join("my.crate");

    let mut converter = CrateConverter::new(Some(dir.path())).unwrap();
    converter.set_name("Glacier melt series 2020").unwrap();
    converter.write_directory(&dest).expect("Write failed");

    assert_eq!(
        fs::read_to_string(dest.join("data/discharge.csv")).unwrap(),
        "day,m3\n1,4.2\n"
    );
    let reloaded = CrateConverter::new(Some(dest.as_path())).unwrap();
    assert_eq!(
        reloaded.rocrate().root_dataset().text("name").as_deref(),
        Some("Glacier melt series 2020")
    );
}

#[test]
fn test_write_directory_suffix_boundary() {
    let dir = create_test_crate(MANIFEST);
    let converter = CrateConverter::new(Some(dir.path())).unwrap();
    let out = TempDir::new().unwrap();

    let rejected = out.path().join("crate.zip");
    let err = converter.write_directory(&rejected).unwrap_err();
    assert!(matches!(err, Error::Conversion(_)));
    assert!(!rejected.exists());

    for accepted in ["crate.zipped", "crate.v2", "crate.ZIP"] {
        let dest = out.path().join(accepted);
        converter.write_directory(&dest).expect(accepted);
        assert!(dest.join("ro-crate-metadata.json").is_file(), "{accepted}");
    }
}

#[test]
fn test_write_zipfile_rejects_json_suffix() {
    let dir = create_test_crate(MANIFEST);
    let converter = CrateConverter::new(Some(dir.path())).unwrap();
    let out = TempDir::new().unwrap();
    let dest = out.path().join("out.json");

    let err = converter.write_zipfile(&dest).unwrap_err();
    assert!(err.is_conversion());
    assert!(!dest.exists());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_zip_round_trip() {
    let dir = create_test_crate(MANIFEST);
    let out = TempDir::new().unwrap();
    let zipped = out.path().join("crate.zip");

    let mut converter = CrateConverter::new(Some(dir.path())).unwrap();
    converter.set_research_area("Geology").unwrap();
    converter.write_zipfile(&zipped).expect("Zip write failed");

    assert_eq!(
        zip_entries(&zipped),
        vec!["data/", "data/discharge.csv", "ro-crate-metadata.json"]
    );

    let reopened = CrateConverter::new(Some(zipped.as_path())).unwrap();
    assert!(reopened.is_valid());
    assert_eq!(
        reopened.rocrate().root_dataset(),
        converter.rocrate().root_dataset()
    );

    let unpacked = out.path().join("unpacked");
    reopened.write_directory(&unpacked).unwrap();
    assert!(unpacked.join("data/discharge.csv").is_file());
}

#[test]
fn test_zip_with_top_level_folder() {
    let out = TempDir::new().unwrap();
    let zipped = out.path().join("nested.zip");

    let mut zip = zip::ZipWriter::new(File::create(&zipped).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("glacier/ro-crate-metadata.json", options).unwrap();
    std::io::Write::write_all(&mut zip, MANIFEST.as_bytes()).unwrap();
    zip.finish().unwrap();

    let converter = CrateConverter::new(Some(zipped.as_path())).unwrap();
    assert_eq!(
        converter.rocrate().root_dataset().text("name").as_deref(),
        Some("Glacier melt series")
    );
}

#[test]
fn test_write_in_place_keeps_payload() {
    let dir = create_test_crate(MANIFEST);
    let mut converter = CrateConverter::new(Some(dir.path())).unwrap();
    converter.set_description("Hourly discharge").unwrap();
    converter.write(dir.path()).expect("In-place write failed");

    assert_eq!(
        fs::read_to_string(dir.path().join("data/discharge.csv")).unwrap(),
        "day,m3\n1,4.2\n"
    );
    let reloaded = CrateConverter::new(Some(dir.path())).unwrap();
    assert_eq!(
        reloaded.rocrate().root_dataset().text("description").as_deref(),
        Some("Hourly discharge")
    );
}

#[test]
fn test_zip_in_place_rewrites_archive() {
    let dir = create_test_crate(MANIFEST);
    let out = TempDir::new().unwrap();
    let zipped = out.path().join("crate.zip");
    CrateConverter::new(Some(dir.path())).unwrap().write(&zipped).unwrap();

    let mut converter = CrateConverter::new(Some(zipped.as_path())).unwrap();
    converter.set_research_area("Geology").unwrap();
    converter.write(&zipped).expect("In-place zip write failed");

    assert_eq!(
        zip_entries(&zipped),
        vec!["data/", "data/discharge.csv", "ro-crate-metadata.json"]
    );
    assert!(CrateConverter::new(Some(zipped.as_path())).unwrap().is_valid());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn test_failed_in_place_zip_write_keeps_archive() {
    let dir = create_test_crate(MANIFEST);
    let out = TempDir::new().unwrap();
    let zipped = out.path().join("crate.zip");
    CrateConverter::new(Some(dir.path())).unwrap().write(&zipped).unwrap();
    let before = fs::read(&zipped).unwrap();

    let converter = CrateConverter::new(Some(zipped.as_path())).unwrap();
    let extracted = converter.rocrate().source().unwrap().to_path_buf();
    fs::remove_dir_all(&extracted).unwrap();

    assert!(converter.write(&zipped).is_err());
    assert_eq!(fs::read(&zipped).unwrap(), before);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
}

#[test]
fn test_zip_inside_source_excludes_itself() {
    let dir = create_test_crate(MANIFEST);
    let zipped = dir.path().join("self.zip");
    let converter = CrateConverter::new(Some(dir.path())).unwrap();
    converter.write(&zipped).unwrap();

    assert!(!zip_entries(&zipped).contains(&"self.zip".to_string()));
}

#[test]
fn test_directory_inside_source_is_not_copied_into_itself() {
    let dir = create_test_crate(MANIFEST);
    let dest = dir.path().join("copy");
    let converter = CrateConverter::new(Some(dir.path())).unwrap();
    converter.write(&dest).unwrap();

    assert!(dest.join("data/discharge.csv").is_file());
    assert!(!dest.join("copy").exists());
}

// =============================================================================
// JSON-LD conversion
// =============================================================================

#[test]
fn test_jsonld_round_trip_preserves_root() {
    let dir = create_test_crate(MANIFEST);
    let source_crate = RoCrate::open(dir.path()).unwrap();

    let text = convert_crate_to_jsonld(&source_crate).expect("crate -> JSON-LD failed");
    let converted = convert_jsonld_to_crate(text.as_bytes()).expect("JSON-LD -> crate failed");

    assert_eq!(converted.root_dataset(), source_crate.root_dataset());
}

#[test]
fn test_crate_to_jsonld_is_written_manifest() {
    let dir = create_test_crate(MANIFEST);
    let converter = CrateConverter::new(Some(dir.path())).unwrap();

    let out = TempDir::new().unwrap();
    let document = out.path().join("crate.json");
    converter.write_jsonld(&document).unwrap();
    converter.write_directory(out.path().join("dir")).unwrap();

    assert_eq!(
        fs::read_to_string(&document).unwrap(),
        fs::read_to_string(out.path().join("dir/ro-crate-metadata.json")).unwrap()
    );
}

#[test]
fn test_jsonld_with_embedded_nodes() {
    let document = json!({
        "@context": "https://w3id.org/ro/crate/1.1/context",
        "@graph": [{
            "@id": "./",
            "@type": "Dataset",
            "name": "Embedded example",
            "author": {"@id": "#ana", "@type": "Person", "name": "Ana"}
        }]
    });
    let rocrate = convert_jsonld_to_crate(document.to_string().as_bytes()).unwrap();

    assert_eq!(rocrate.root_dataset().reference("author"), Some("#ana"));
    assert!(rocrate.manifest().entity("#ana").is_some());
    assert!(rocrate.manifest().descriptor().is_some());
}

#[test]
fn test_jsonld_without_root_is_rejected() {
    let document = r##"{"@graph": [{"@id": "#someone", "@type": "Person"}]}"##;
    let err = convert_jsonld_to_crate(document.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));
}
