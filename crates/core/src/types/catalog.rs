//! Catalog payloads pushed by the catalog-management process.
//!
//! Every entity is keyed by an external UID; the gateway maps it onto the
//! storefront's integer ids. Payloads only carry light structural checks
//! (`validate`), the engine enforces everything that needs the database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CustomerGroupId, LanguageId};

/// Structural problems with an incoming payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// A required identifier is empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    /// A numeric field is out of its accepted range.
    #[error("{field} is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        reason: &'static str,
    },
}

fn require(value: &str, field: &'static str) -> Result<(), PayloadError> {
    if value.trim().is_empty() {
        return Err(PayloadError::EmptyField(field));
    }
    Ok(())
}

// =============================================================================
// Products
// =============================================================================

/// A whitelisted product column set through `custom_fields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomField {
    pub name: String,
    pub value: String,
}

/// Product upsert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductData {
    /// External product UID (stored in the storefront's `model` column).
    pub uid: String,
    /// Article code (stored in `sku`).
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    /// Manufacturer name, resolved or created by name. Empty means none.
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub active: bool,
    /// Shipping weight; left untouched on update when absent.
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub weight_class_id: Option<i32>,
    /// Category UIDs; the product's category links are replaced by this set.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    /// Ingestion run this write belongs to.
    #[serde(default)]
    pub batch_uid: String,
}

impl ProductData {
    /// # Errors
    ///
    /// Returns an error if the UID is empty or the quantity is negative.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.uid, "uid")?;
        if self.quantity < 0 {
            return Err(PayloadError::OutOfRange {
                field: "quantity",
                reason: "must not be negative",
            });
        }
        if self.price.is_sign_negative() {
            return Err(PayloadError::OutOfRange {
                field: "price",
                reason: "must not be negative",
            });
        }
        Ok(())
    }

    /// Quantity to store when the product is first created.
    ///
    /// A product created without a price cannot be sold, so it starts with
    /// no stock.
    #[must_use]
    pub fn initial_quantity(&self) -> i32 {
        if self.price.is_zero() {
            0
        } else {
            self.quantity
        }
    }
}

/// Per-language product name and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub product_uid: String,
    pub language_id: LanguageId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Replace the stored body. When false (or the body is empty) only the
    /// name of an existing description is updated.
    #[serde(default)]
    pub update_description: bool,
}

impl ProductDescription {
    /// # Errors
    ///
    /// Returns an error if the product UID or name is empty.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.product_uid, "product_uid")?;
        require(&self.name, "name")
    }

    /// Whether an existing row's body should be overwritten.
    #[must_use]
    pub fn replaces_body(&self) -> bool {
        self.update_description && !self.description.is_empty()
    }
}

/// Attribute value attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub product_uid: String,
    pub attribute_uid: String,
    pub language_id: LanguageId,
    pub text: String,
}

impl ProductAttribute {
    /// # Errors
    ///
    /// Returns an error if either UID is empty.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.product_uid, "product_uid")?;
        require(&self.attribute_uid, "attribute_uid")
    }
}

/// Special price for one customer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSpecial {
    pub product_uid: String,
    pub group_id: CustomerGroupId,
    pub price: Decimal,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub date_start: Option<NaiveDate>,
    #[serde(default)]
    pub date_end: Option<NaiveDate>,
}

impl ProductSpecial {
    /// # Errors
    ///
    /// Returns an error if the UID is empty or the window ends before it starts.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.product_uid, "product_uid")?;
        if let (Some(start), Some(end)) = (self.date_start, self.date_end)
            && end < start
        {
            return Err(PayloadError::OutOfRange {
                field: "date_end",
                reason: "must not be before date_start",
            });
        }
        Ok(())
    }
}

// =============================================================================
// Images
// =============================================================================

/// Binary image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImageUpload {
    pub product_uid: String,
    pub file_uid: String,
    /// Extension including the leading dot, e.g. `.jpg`.
    pub file_ext: String,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub sort_order: i32,
    /// Base64 (standard alphabet) encoded file contents.
    pub file_data: String,
}

impl ProductImageUpload {
    /// # Errors
    ///
    /// Returns an error if an identifier or the extension is empty, or if
    /// either would escape the image directory.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.product_uid, "product_uid")?;
        require(&self.file_uid, "file_uid")?;
        require(&self.file_data, "file_data")?;
        if !is_plain_file_name(&self.file_uid) {
            return Err(PayloadError::OutOfRange {
                field: "file_uid",
                reason: "must be a plain file name",
            });
        }
        require(&self.file_ext, "file_ext")?;
        if !self
            .file_ext
            .strip_prefix('.')
            .is_some_and(is_plain_file_name)
        {
            return Err(PayloadError::OutOfRange {
                field: "file_ext",
                reason: "must look like .jpg",
            });
        }
        Ok(())
    }

    /// File name on disk: `{file_uid}{file_ext}`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}{}", self.file_uid, self.file_ext)
    }
}

/// Desired image set for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImageSet {
    #[serde(alias = "product_uid")]
    pub uid: String,
    /// File UIDs in display order. May include the main image and duplicates.
    #[serde(default)]
    pub images: Vec<String>,
}

impl ProductImageSet {
    /// # Errors
    ///
    /// Returns an error if the UID is empty or a file UID is not a plain name.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.uid, "uid")?;
        if self.images.iter().any(|uid| !is_plain_file_name(uid)) {
            return Err(PayloadError::OutOfRange {
                field: "images",
                reason: "must contain plain file names",
            });
        }
        Ok(())
    }
}

/// Non-empty name without path separators or parent references.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains("..")
}

// =============================================================================
// Categories and attributes
// =============================================================================

/// Category upsert payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(alias = "category_uid")]
    pub uid: String,
    /// Parent category UID; unknown parents are created as stubs.
    #[serde(default)]
    pub parent_uid: String,
    #[serde(default)]
    pub sort_order: i32,
    /// Show in the top menu.
    #[serde(default)]
    pub menu: bool,
    #[serde(default)]
    pub active: bool,
}

impl CategoryData {
    /// # Errors
    ///
    /// Returns an error if the UID is empty or the category is its own parent.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.uid, "uid")?;
        if self.parent_uid == self.uid {
            return Err(PayloadError::OutOfRange {
                field: "parent_uid",
                reason: "must differ from uid",
            });
        }
        Ok(())
    }
}

/// Per-language category name and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDescription {
    pub category_uid: String,
    pub language_id: LanguageId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl CategoryDescription {
    /// # Errors
    ///
    /// Returns an error if the category UID or name is empty.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.category_uid, "category_uid")?;
        require(&self.name, "name")
    }
}

/// Attribute definition with its per-language names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeData {
    #[serde(alias = "attribute_uid")]
    pub uid: String,
    #[serde(alias = "attribute_group_id")]
    pub group_id: i32,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub descriptions: Vec<AttributeDescription>,
}

/// Attribute name in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescription {
    pub language_id: LanguageId,
    pub name: String,
}

impl AttributeData {
    /// # Errors
    ///
    /// Returns an error if the UID or any description name is empty.
    pub fn validate(&self) -> Result<(), PayloadError> {
        require(&self.uid, "uid")?;
        for description in &self.descriptions {
            require(&description.name, "descriptions.name")?;
        }
        Ok(())
    }
}

// =============================================================================
// Results
// =============================================================================

/// A row written by an upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upserted {
    pub uid: String,
    /// Internal storefront id.
    pub id: i32,
    /// Whether the row was inserted rather than updated.
    pub created: bool,
}

impl Upserted {
    #[must_use]
    pub fn new(uid: &str, id: i32, created: bool) -> Self {
        Self {
            uid: uid.to_string(),
            id,
            created,
        }
    }
}

// =============================================================================
// Batches
// =============================================================================

/// Outcome of finalizing an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_uid: String,
    #[serde(rename = "status")]
    pub success: bool,
    pub message: String,
    /// Active products after finalize.
    pub products: i64,
    /// Active categories after finalize.
    pub categories: i64,
    /// Orphan image files removed from disk.
    pub deleted_files: u64,
}

impl BatchResult {
    /// Successful finalize.
    #[must_use]
    pub fn finished(batch_uid: &str, products: i64, categories: i64, deleted_files: u64) -> Self {
        Self {
            batch_uid: batch_uid.to_string(),
            success: true,
            message: String::new(),
            products,
            categories,
            deleted_files,
        }
    }

    /// Failed finalize.
    #[must_use]
    pub fn failed(batch_uid: &str, message: impl Into<String>) -> Self {
        Self {
            batch_uid: batch_uid.to_string(),
            success: false,
            message: message.into(),
            products: 0,
            categories: 0,
            deleted_files: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(uid: &str) -> ProductData {
        ProductData {
            uid: uid.to_string(),
            article: "A-1".to_string(),
            price: Decimal::new(1999, 2),
            quantity: 10,
            manufacturer: String::new(),
            active: true,
            weight: None,
            weight_class_id: None,
            categories: vec![],
            custom_fields: vec![],
            batch_uid: String::new(),
        }
    }

    #[test]
    fn test_product_minimal_json() {
        let p: ProductData = serde_json::from_str(r#"{"uid":"p-1"}"#).unwrap();
        assert_eq!(p.uid, "p-1");
        assert_eq!(p.quantity, 0);
        assert!(p.price.is_zero());
        assert!(!p.active);
        assert!(p.categories.is_empty());
    }

    #[test]
    fn test_product_validate() {
        assert!(product("p-1").validate().is_ok());
        assert_eq!(
            product(" ").validate(),
            Err(PayloadError::EmptyField("uid"))
        );
        let mut negative = product("p-1");
        negative.quantity = -1;
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_zero_price_forces_zero_initial_quantity() {
        let mut p = product("p-1");
        assert_eq!(p.initial_quantity(), 10);
        p.price = Decimal::ZERO;
        assert_eq!(p.initial_quantity(), 0);
    }

    #[test]
    fn test_description_body_replacement() {
        let mut d = ProductDescription {
            product_uid: "p-1".to_string(),
            language_id: LanguageId::new(1),
            name: "Chair".to_string(),
            description: String::new(),
            update_description: true,
        };
        assert!(!d.replaces_body());
        d.description = "<p>Oak</p>".to_string();
        assert!(d.replaces_body());
        d.update_description = false;
        assert!(!d.replaces_body());
    }

    #[test]
    fn test_image_upload_rejects_path_traversal() {
        let mut upload = ProductImageUpload {
            product_uid: "p-1".to_string(),
            file_uid: "abc".to_string(),
            file_ext: ".jpg".to_string(),
            is_main: false,
            sort_order: 0,
            file_data: "AAAA".to_string(),
        };
        assert!(upload.validate().is_ok());
        assert_eq!(upload.file_name(), "abc.jpg");

        upload.file_uid = "../etc/passwd".to_string();
        assert!(upload.validate().is_err());

        upload.file_uid = "abc".to_string();
        upload.file_ext = "/x".to_string();
        assert!(upload.validate().is_err());
    }

    #[test]
    fn test_image_upload_requires_extension() {
        let mut upload = ProductImageUpload {
            product_uid: "p-1".to_string(),
            file_uid: "abc".to_string(),
            file_ext: String::new(),
            is_main: true,
            sort_order: 0,
            file_data: "AAAA".to_string(),
        };
        assert_eq!(
            upload.validate(),
            Err(PayloadError::EmptyField("file_ext"))
        );

        for ext in ["jpg", ".", "..", "./jpg"] {
            upload.file_ext = ext.to_string();
            assert!(
                matches!(
                    upload.validate(),
                    Err(PayloadError::OutOfRange { field: "file_ext", .. })
                ),
                "{ext}"
            );
        }
    }

    #[test]
    fn test_image_set_accepts_product_uid_alias() {
        let set: ProductImageSet =
            serde_json::from_str(r#"{"product_uid":"p-1","images":["a","b"]}"#).unwrap();
        assert_eq!(set.uid, "p-1");
        assert_eq!(set.images, vec!["a", "b"]);
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_special_window() {
        let special = ProductSpecial {
            product_uid: "p-1".to_string(),
            group_id: CustomerGroupId::new(1),
            price: Decimal::new(500, 2),
            priority: 0,
            date_start: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_end: NaiveDate::from_ymd_opt(2024, 4, 1),
        };
        assert!(special.validate().is_err());
    }

    #[test]
    fn test_category_cannot_parent_itself() {
        let category = CategoryData {
            uid: "c-1".to_string(),
            parent_uid: "c-1".to_string(),
            sort_order: 0,
            menu: false,
            active: true,
        };
        assert!(category.validate().is_err());
    }

    #[test]
    fn test_batch_result_wire_names() {
        let json = serde_json::to_value(BatchResult::finished("b-1", 3, 2, 1)).unwrap();
        assert_eq!(json["status"], true);
        assert_eq!(json["products"], 3);
        assert_eq!(json["deleted_files"], 1);

        let failed = BatchResult::failed("b-1", "empty batch");
        assert!(!failed.success);
        assert_eq!(failed.message, "empty batch");
    }
}
