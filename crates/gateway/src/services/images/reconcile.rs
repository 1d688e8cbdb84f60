//! Image set reconciliation.
//!
//! Computes the row changes that turn a product's stored additional images
//! into the desired list. The main image is stored on the product row, so
//! it never appears among the additional rows.

use std::collections::HashSet;
use std::path::Path;

use ocsync_core::ProductImageId;

use crate::db::images::ImageRow;

/// Row changes for one product.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImagePlan {
    /// Rows to delete: not desired, or a repeat of a row already kept.
    pub delete: Vec<ProductImageId>,
    /// File UIDs to insert with their position in the desired list.
    pub insert: Vec<(String, i32)>,
    /// File UIDs already stored, in desired order.
    pub present: Vec<String>,
}

/// File UID of the main image file: the name without its last extension.
#[must_use]
pub fn main_file_uid(main_file: &str) -> Option<&str> {
    Path::new(main_file).file_stem().and_then(|stem| stem.to_str())
}

/// Plan the changes for `existing` rows (oldest first) against `desired`.
///
/// The first stored row per file UID is kept; later repeats are deleted.
/// Repeats in `desired` are ignored after their first occurrence.
#[must_use]
pub fn plan(existing: &[ImageRow], desired: &[String], main_file: Option<&str>) -> ImagePlan {
    let main_uid = main_file.and_then(main_file_uid);
    let wanted: HashSet<&str> = desired
        .iter()
        .map(String::as_str)
        .filter(|uid| Some(*uid) != main_uid)
        .collect();

    let mut kept: HashSet<&str> = HashSet::new();
    let mut delete = Vec::new();
    for row in existing {
        let uid = row.file_uid.as_str();
        if wanted.contains(uid) && kept.insert(uid) {
            continue;
        }
        delete.push(row.product_image_id);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut insert = Vec::new();
    let mut present = Vec::new();
    for (position, uid) in desired.iter().enumerate() {
        if !wanted.contains(uid.as_str()) || !seen.insert(uid.as_str()) {
            continue;
        }
        if kept.contains(uid.as_str()) {
            present.push(uid.clone());
        } else {
            let sort_order = i32::try_from(position).unwrap_or(i32::MAX);
            insert.push((uid.clone(), sort_order));
        }
    }

    ImagePlan {
        delete,
        insert,
        present,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, uid: &str) -> ImageRow {
        ImageRow {
            product_image_id: ProductImageId::new(id),
            file_uid: uid.to_string(),
        }
    }

    fn uids(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn ids(list: &[i32]) -> Vec<ProductImageId> {
        list.iter().copied().map(ProductImageId::new).collect()
    }

    #[test]
    fn test_empty_to_desired() {
        let plan = plan(&[], &uids(&["a", "b"]), None);
        assert!(plan.delete.is_empty());
        assert_eq!(plan.insert, vec![("a".to_string(), 0), ("b".to_string(), 1)]);
        assert!(plan.present.is_empty());
    }

    #[test]
    fn test_removes_undesired_and_duplicates() {
        let existing = [row(1, "a"), row(2, "x"), row(3, "a"), row(4, "b")];
        let plan = plan(&existing, &uids(&["a", "b", "c"]), None);
        assert_eq!(plan.delete, ids(&[2, 3]));
        assert_eq!(plan.insert, vec![("c".to_string(), 2)]);
        assert_eq!(plan.present, uids(&["a", "b"]));
    }

    #[test]
    fn test_main_image_is_excluded() {
        let existing = [row(1, "main"), row(2, "a")];
        let plan = plan(&existing, &uids(&["main", "a", "b"]), Some("main.jpg"));
        assert_eq!(plan.delete, ids(&[1]));
        assert_eq!(plan.insert, vec![("b".to_string(), 2)]);
        assert_eq!(plan.present, uids(&["a"]));
    }

    #[test]
    fn test_desired_duplicates_keep_first_position() {
        let plan = plan(&[], &uids(&["a", "b", "a"]), None);
        assert_eq!(plan.insert, vec![("a".to_string(), 0), ("b".to_string(), 1)]);
    }

    #[test]
    fn test_empty_desired_clears_rows() {
        let existing = [row(1, "a"), row(2, "b")];
        let plan = plan(&existing, &[], None);
        assert_eq!(plan.delete, ids(&[1, 2]));
        assert!(plan.insert.is_empty());
    }

    #[test]
    fn test_already_converged_is_noop() {
        let existing = [row(5, "a"), row(6, "b")];
        let plan = plan(&existing, &uids(&["a", "b"]), Some("m.jpg"));
        assert_eq!(
            plan,
            ImagePlan {
                delete: vec![],
                insert: vec![],
                present: uids(&["a", "b"]),
            }
        );
    }

    #[test]
    fn test_main_file_uid() {
        assert_eq!(main_file_uid("abc.jpg"), Some("abc"));
        assert_eq!(main_file_uid("abc"), Some("abc"));
        assert_eq!(main_file_uid("abc.v2.jpg"), Some("abc.v2"));
    }

    #[test]
    fn test_only_exact_main_uid_is_excluded() {
        let dotted = plan(&[], &uids(&["abc", "abc.v2"]), Some("abc.v2.jpg"));
        assert_eq!(dotted.insert, vec![("abc".to_string(), 0)]);

        let longer = plan(&[row(1, "abc")], &uids(&["abc", "abcd"]), Some("abcd.png"));
        assert!(longer.delete.is_empty());
        assert_eq!(longer.present, uids(&["abc"]));
        assert!(longer.insert.is_empty());
    }
}
