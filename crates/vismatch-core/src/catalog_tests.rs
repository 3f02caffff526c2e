//! Tests for `catalog` module

use super::catalog::*;
use super::error::Error;
use std::fs::File;
use std::io::BufWriter;
use tempfile::tempdir;

fn meta(id: &str, name: &str) -> ProductMeta {
    ProductMeta {
        id: id.to_string(),
        name: name.to_string(),
        category: "shoes".to_string(),
        price_min: None,
        price_max: None,
    }
}

fn entry(product_id: &str, file: &str, price: Option<f64>) -> ImageIndexEntry {
    ImageIndexEntry {
        product_id: product_id.to_string(),
        file: file.to_string(),
        price,
    }
}

fn table(vectors: Vec<Vec<f32>>) -> EmbeddingTable {
    EmbeddingTable {
        dimension: 4,
        vectors,
    }
}

#[test]
fn test_from_artifacts_groups_images_by_product() {
    let index = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker"), meta("b", "Boot")],
        vec![
            entry("a", "a_front.jpg", Some(100.0)),
            entry("b", "b_front.jpg", Some(500.0)),
            entry("a", "a_side.jpg", Some(150.0)),
        ],
        table(vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
        ]),
    )
    .unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.image_count(), 3);
    assert_eq!(index.dimension(), 4);

    let a = index.get("a").unwrap();
    assert_eq!(a.image_rows, vec![0, 2]);
    assert_eq!(index.get("b").unwrap().image_rows, vec![1]);
}

#[test]
fn test_price_bounds_derived_from_images() {
    let index = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![
            entry("a", "1.jpg", Some(150.0)),
            entry("a", "2.jpg", Some(100.0)),
            entry("a", "3.jpg", None),
        ],
        table(vec![vec![1.0; 4], vec![1.0; 4], vec![1.0; 4]]),
    )
    .unwrap();

    let a = index.get("a").unwrap();
    assert_eq!(a.min_price, Some(100.0));
    assert_eq!(a.max_price, Some(150.0));
}

#[test]
fn test_explicit_price_bounds_win_over_derivation() {
    let mut product = meta("a", "Sneaker");
    product.price_min = Some(80.0);

    let index = CatalogIndex::from_artifacts(
        vec![product],
        vec![entry("a", "1.jpg", Some(150.0))],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap();

    let a = index.get("a").unwrap();
    assert_eq!(a.min_price, Some(80.0)); // explicit
    assert_eq!(a.max_price, Some(150.0)); // derived
}

#[test]
fn test_negative_image_price_is_unknown() {
    let index = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("a", "1.jpg", Some(-5.0))],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap();

    let a = index.get("a").unwrap();
    assert_eq!(index.images()[0].price, None);
    assert_eq!(a.min_price, None);
    assert_eq!(a.max_price, None);
}

#[test]
fn test_row_count_mismatch_is_fatal() {
    let err = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("a", "1.jpg", None), entry("a", "2.jpg", None)],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::RowCountMismatch {
            vectors: 1,
            entries: 2
        }
    ));
    assert!(err.is_fatal());
}

#[test]
fn test_dangling_product_reference_is_fatal() {
    let err = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("ghost", "g.jpg", None)],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap_err();

    match err {
        Error::DanglingProduct { product_id, file } => {
            assert_eq!(product_id, "ghost");
            assert_eq!(file, "g.jpg");
        }
        other => panic!("expected DanglingProduct, got {other}"),
    }
}

#[test]
fn test_deviant_vector_dimension_is_fatal() {
    let err = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("a", "1.jpg", None)],
        table(vec![vec![1.0; 3]]),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::DimensionMismatch {
            expected: 4,
            actual: 3
        }
    ));
}

#[test]
fn test_duplicate_product_id_is_fatal() {
    let err = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker"), meta("a", "Impostor")],
        vec![],
        table(vec![]),
    )
    .unwrap_err();

    assert!(matches!(err, Error::CatalogLoad(_)));
}

#[test]
fn test_product_without_images_is_kept() {
    let index = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker"), meta("empty", "No Photos")],
        vec![entry("a", "1.jpg", None)],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap();

    assert_eq!(index.len(), 2);
    assert!(index.get("empty").unwrap().image_rows.is_empty());
}

#[test]
fn test_file_reference_preserved_unmodified() {
    // Opaque references pass through untouched, absolute URLs included
    let index = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("a", "https://cdn.example.com/a.jpg?v=2", None)],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap();

    assert_eq!(index.images()[0].file, "https://cdn.example.com/a.jpg?v=2");
}

#[test]
fn test_scan_is_restartable() {
    let index = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("a", "1.jpg", None), entry("a", "2.jpg", None)],
        table(vec![vec![1.0; 4], vec![2.0; 4]]),
    )
    .unwrap();

    assert_eq!(index.all().count(), 2);
    assert_eq!(index.all().count(), 2);
}

#[test]
fn test_lenient_price_parsing_in_index_entries() {
    // Precompute tools stringify prices, currency decoration included
    let json = r#"[
        {"product_id": "a", "file": "1.jpg", "price": "1,299.00"},
        {"product_id": "a", "file": "2.jpg", "price": 450},
        {"product_id": "a", "file": "3.jpg", "price": "None"},
        {"product_id": "a", "file": "4.jpg"}
    ]"#;
    let entries: Vec<ImageIndexEntry> = serde_json::from_str(json).unwrap();

    assert_eq!(entries[0].price, Some(1299.0));
    assert_eq!(entries[1].price, Some(450.0));
    assert_eq!(entries[2].price, None);
    assert_eq!(entries[3].price, None);
}

#[test]
fn test_load_from_dir_round_trip() {
    let dir = tempdir().unwrap();

    serde_json::to_writer(
        BufWriter::new(File::create(dir.path().join(PRODUCTS_FILE)).unwrap()),
        &vec![meta("a", "Sneaker"), meta("b", "Boot")],
    )
    .unwrap();
    serde_json::to_writer(
        BufWriter::new(File::create(dir.path().join(IMAGE_INDEX_FILE)).unwrap()),
        &vec![
            entry("a", "a.jpg", Some(100.0)),
            entry("b", "b.jpg", Some(500.0)),
        ],
    )
    .unwrap();
    bincode::serialize_into(
        BufWriter::new(File::create(dir.path().join(EMBEDDINGS_FILE)).unwrap()),
        &table(vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0, 0.0]]),
    )
    .unwrap();

    let index = CatalogIndex::load_from_dir(dir.path()).unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.image_count(), 2);
    assert_eq!(index.get("b").unwrap().min_price, Some(500.0));
}

#[test]
fn test_load_from_dir_missing_artifact() {
    let dir = tempdir().unwrap();
    let err = CatalogIndex::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, Error::CatalogLoad(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_load_from_dir_malformed_artifact() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(PRODUCTS_FILE), "not json at all").unwrap();
    std::fs::write(dir.path().join(IMAGE_INDEX_FILE), "[]").unwrap();
    std::fs::write(dir.path().join(EMBEDDINGS_FILE), [0u8; 3]).unwrap();

    let err = CatalogIndex::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, Error::CatalogLoad(_)));
}

#[test]
fn test_handle_swap_preserves_old_snapshot() {
    let old = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker")],
        vec![entry("a", "1.jpg", None)],
        table(vec![vec![1.0; 4]]),
    )
    .unwrap();
    let new = CatalogIndex::from_artifacts(
        vec![meta("a", "Sneaker"), meta("b", "Boot")],
        vec![],
        table(vec![]),
    )
    .unwrap();

    let handle = CatalogHandle::new(old);
    let snapshot = handle.current();
    assert_eq!(snapshot.len(), 1);

    let previous = handle.swap(new);

    // In-flight readers keep the old, fully-consistent snapshot
    assert_eq!(previous.len(), 1);
    assert_eq!(snapshot.len(), 1);
    assert_eq!(handle.current().len(), 2);
}
