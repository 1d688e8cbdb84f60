//! Image reconciliation through the public API.
//!
//! Plans are applied to an in-memory row list to check that the stored
//! additional-image set converges on the desired set.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use ocsync_core::ProductImageId;
use ocsync_gateway::db::images::ImageRow;
use ocsync_gateway::services::images::{ImageStore, plan};

fn row(id: i32, file_uid: &str) -> ImageRow {
    ImageRow {
        product_image_id: ProductImageId::new(id),
        file_uid: file_uid.to_string(),
    }
}

fn uids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

/// Rows left after applying the plan; inserted rows get ids after the
/// existing ones.
fn apply(existing: &[ImageRow], desired: &[String], main_file: Option<&str>) -> Vec<ImageRow> {
    let plan = plan(existing, desired, main_file);
    let deleted: HashSet<ProductImageId> = plan.delete.iter().copied().collect();

    let mut rows: Vec<ImageRow> = existing
        .iter()
        .filter(|r| !deleted.contains(&r.product_image_id))
        .cloned()
        .collect();
    let mut next_id = existing
        .iter()
        .map(|r| r.product_image_id.as_i32())
        .max()
        .unwrap_or(0);
    for (file_uid, _) in plan.insert {
        next_id += 1;
        rows.push(row(next_id, &file_uid));
    }
    rows
}

fn expected(desired: &[String], main_file: Option<&str>) -> HashSet<String> {
    desired
        .iter()
        .filter(|uid| {
            main_file
                .and_then(|main| Path::new(main).file_stem())
                .is_none_or(|stem| stem.to_str() != Some(uid.as_str()))
        })
        .cloned()
        .collect()
}

// =============================================================================
// Convergence
// =============================================================================

#[test]
fn test_converges_on_desired_set() {
    let cases: Vec<(Vec<ImageRow>, Vec<String>, Option<&str>)> = vec![
        (vec![], uids(&["a", "b"]), None),
        (vec![row(1, "a"), row(2, "b")], uids(&["b", "c"]), None),
        (
            vec![row(1, "a"), row(2, "a"), row(3, "b"), row(4, "a")],
            uids(&["a", "b", "b"]),
            None,
        ),
        (vec![row(1, "m"), row(2, "x")], uids(&["m", "x", "y"]), Some("m.jpg")),
        (vec![], uids(&["abc", "abc.v2"]), Some("abc.v2.jpg")),
        (vec![row(1, "abc")], uids(&["abc", "abcd"]), Some("abcd.png")),
        (vec![row(1, "a"), row(2, "b")], vec![], None),
    ];

    for (existing, desired, main_file) in cases {
        let rows = apply(&existing, &desired, main_file);

        let stored: Vec<&str> = rows.iter().map(|r| r.file_uid.as_str()).collect();
        let unique: HashSet<&str> = stored.iter().copied().collect();
        assert_eq!(unique.len(), stored.len(), "duplicates left: {stored:?}");

        let stored: HashSet<String> = rows.iter().map(|r| r.file_uid.clone()).collect();
        assert_eq!(stored, expected(&desired, main_file), "desired {desired:?}");
    }
}

#[test]
fn test_first_stored_occurrence_is_kept() {
    let existing = vec![row(10, "a"), row(11, "b"), row(12, "a"), row(13, "b")];
    let rows = apply(&existing, &uids(&["b", "a"]), None);

    let ids: HashMap<&str, i32> = rows
        .iter()
        .map(|r| (r.file_uid.as_str(), r.product_image_id.as_i32()))
        .collect();
    assert_eq!(ids.get("a"), Some(&10));
    assert_eq!(ids.get("b"), Some(&11));
}

#[test]
fn test_second_pass_is_a_no_op() {
    let existing = vec![row(1, "a"), row(2, "c")];
    let desired = uids(&["a", "b", "b", "c"]);

    let rows = apply(&existing, &desired, None);
    let second = plan(&rows, &desired, None);

    assert!(second.delete.is_empty());
    assert!(second.insert.is_empty());
    assert_eq!(second.present, uids(&["a", "b", "c"]));
}

#[test]
fn test_present_excludes_new_files() {
    let existing = vec![row(1, "a")];
    let plan = plan(&existing, &uids(&["n", "a"]), None);

    assert_eq!(plan.present, uids(&["a"]));
    assert_eq!(plan.insert, vec![("n".to_string(), 0)]);
}

// =============================================================================
// Image Store
// =============================================================================

#[tokio::test]
async fn test_store_resolves_by_uid_prefix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ImageStore::new(dir.path(), "catalog/product/");

    store.write("img-1.png", b"png").await.expect("write");
    store.write("img-10.jpg", b"jpg").await.expect("write");

    assert_eq!(
        store.find("img-1").await.expect("find").as_deref(),
        Some("img-1.png")
    );
    assert_eq!(store.find("img-2").await.expect("find"), None);
    assert_eq!(store.url("img-1.png"), "catalog/product/img-1.png");
}

#[tokio::test]
async fn test_garbage_collection_keeps_referenced_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ImageStore::new(dir.path(), "catalog/product/");

    for name in ["keep.jpg", "main.png", "orphan.jpg"] {
        store.write(name, b"x").await.expect("write");
    }

    let referenced: HashSet<String> = ["keep.jpg", "main.png"]
        .into_iter()
        .map(String::from)
        .collect();
    let deleted = store.collect_garbage(&referenced).await.expect("gc");

    assert_eq!(deleted, 1);
    assert!(dir.path().join("keep.jpg").exists());
    assert!(!dir.path().join("orphan.jpg").exists());
}
