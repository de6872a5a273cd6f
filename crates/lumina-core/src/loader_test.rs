use std::fs;

use serde_json::json;
use tempfile::TempDir;

use super::*;

fn write(dir: &TempDir, name: &str, body: &str) {
    fs::write(dir.path().join(name), body).expect("write fixture");
}

fn names(catalog: &Catalog) -> Vec<String> {
    catalog
        .iter()
        .map(|(_, r)| r.name().unwrap_or_default().into_owned())
        .collect()
}

#[test]
fn missing_data_dir_yields_empty_catalog() {
    let dir = TempDir::new().expect("tempdir");
    let missing = dir.path().join("does-not-exist");

    let (catalog, report) = load_catalog(&missing);

    assert!(catalog.is_empty());
    assert!(catalog.top_products().is_empty());
    assert_eq!(report.products, SourceStatus::Absent);
    assert_eq!(report.recommendations, SourceStatus::Absent);
}

#[test]
fn directory_without_matrix_file_yields_empty_catalog() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, RECOMMENDATIONS_FILE, r#"{"1": [{"product_name": "Mug"}]}"#);

    let (catalog, report) = load_catalog(dir.path());

    assert!(catalog.is_empty());
    assert!(catalog.top_products().is_empty());
    assert_eq!(report.products, SourceStatus::Absent);
    assert!(report.recommendations.is_loaded());
    assert_eq!(catalog.recommendation_count(), 1);
}

#[test]
fn list_shaped_matrix_is_indexed_in_file_order() {
    let dir = TempDir::new().expect("tempdir");
    let body = json!([
        {"product_id_numeric": 3, "product_name": "Gamma"},
        "stray string entry",
        {"product_id_numeric": 1, "product_name": " Alpha "},
        42,
        {"product_id": "B2", "product_name": "Beta"}
    ]);
    write(&dir, "product_matrix.json", &body.to_string());

    let (catalog, report) = load_catalog(dir.path());

    assert_eq!(names(&catalog), vec!["Gamma", " Alpha ", "Beta"]);
    assert_eq!(catalog.id_for_name("Alpha"), Some("1"));
    assert_eq!(catalog.id_for_name("Beta"), Some("B2"));
    assert!(matches!(report.products, SourceStatus::Loaded { records: 3, .. }));
}

#[test]
fn map_shaped_matrix_keeps_file_order_of_values() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        "product_matrix.json",
        r#"{
            "z": {"product_id_numeric": 26, "product_name": "Zed"},
            "a": {"product_id_numeric": 1, "product_name": "Ay"},
            "m": {"product_id_numeric": 13, "product_name": "Em"}
        }"#,
    );

    let (catalog, _) = load_catalog(dir.path());

    let ids: Vec<&str> = catalog.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["26", "1", "13"]);
}

#[test]
fn records_without_usable_id_are_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let body = json!([
        {"product_name": "No id at all"},
        {"product_id_numeric": null, "product_name": "Null id"},
        {"product_id": null, "product_name": "Null generic id"},
        {"product_id_numeric": 7, "product_name": "Kept"}
    ]);
    write(&dir, "product_matrix.json", &body.to_string());

    let (catalog, _) = load_catalog(dir.path());

    assert_eq!(names(&catalog), vec!["Kept"]);
    assert_eq!(catalog.id_for_name("No id at all"), None);
}

#[test]
fn first_existing_candidate_wins() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        "product_index_map.json",
        r#"[{"product_id_numeric": 2, "product_name": "From index map"}]"#,
    );

    let (catalog, report) = load_catalog(dir.path());
    assert_eq!(names(&catalog), vec!["From index map"]);
    assert!(
        matches!(report.products, SourceStatus::Loaded { ref path, .. } if path.ends_with("product_index_map.json"))
    );

    write(
        &dir,
        "product_matrix.json",
        r#"[{"product_id_numeric": 1, "product_name": "From matrix"}]"#,
    );
    let (catalog, _) = load_catalog(dir.path());
    assert_eq!(names(&catalog), vec!["From matrix"]);
}

#[test]
fn malformed_matrix_degrades_to_empty() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "product_matrix.json", "{ not json");

    let (catalog, report) = load_catalog(dir.path());

    assert!(catalog.is_empty());
    assert!(matches!(report.products, SourceStatus::ParseError { .. }));
}

#[test]
fn scalar_matrix_loads_zero_records() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "product_matrix.json", "17");

    let (catalog, report) = load_catalog(dir.path());

    assert!(catalog.is_empty());
    assert!(matches!(report.products, SourceStatus::Loaded { records: 0, .. }));
}

#[test]
fn malformed_recommendations_never_break_loading() {
    let dir = TempDir::new().expect("tempdir");
    write(
        &dir,
        "product_matrix.json",
        r#"[{"product_id_numeric": 1, "product_name": "Mug"}]"#,
    );
    write(&dir, RECOMMENDATIONS_FILE, "[[[");

    let (catalog, report) = load_catalog(dir.path());

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.recommendation_count(), 0);
    assert!(matches!(report.recommendations, SourceStatus::ParseError { .. }));
}

#[test]
fn recommendations_with_wrong_shape_are_ignored() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "product_matrix.json", "[]");
    write(
        &dir,
        RECOMMENDATIONS_FILE,
        r#"{
            "1": [{"product_name": "Mug"}, "bare", {"other": 1}],
            "2": "not a list"
        }"#,
    );

    let (catalog, _) = load_catalog(dir.path());

    let stubs = catalog.recommendations_for("1").expect("entry for 1");
    assert_eq!(stubs.len(), 2);
    assert_eq!(stubs[0].product_name.as_deref(), Some("Mug"));
    assert!(stubs[1].product_name.is_none());
    assert!(catalog.recommendations_for("2").is_none());
}

#[test]
fn list_shaped_recommendation_file_yields_empty_table() {
    let dir = TempDir::new().expect("tempdir");
    write(&dir, "product_matrix.json", "[]");
    write(&dir, RECOMMENDATIONS_FILE, r#"[{"product_name": "Mug"}]"#);

    let (catalog, report) = load_catalog(dir.path());

    assert_eq!(catalog.recommendation_count(), 0);
    assert!(matches!(report.recommendations, SourceStatus::Loaded { records: 0, .. }));
}

#[test]
fn sample_artifacts_directory_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("artifacts");
    assert!(
        path.exists(),
        "artifacts missing at {path:?}; required for this test"
    );

    let (catalog, report) = load_catalog(&path);

    assert!(report.products.is_loaded());
    assert!(report.recommendations.is_loaded());
    assert!(!catalog.is_empty());
    assert!(catalog.top_products().len() <= 20);
}
