//! Request and response wrappers shared by every `/api/v1` endpoint.

use serde::{Deserialize, Serialize};

/// Page of items sent by the catalog-management process.
///
/// Only `data` drives the engine; the paging fields are echoed into logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest<T> {
    #[serde(default, rename = "full_update")]
    pub full: bool,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total: u32,
    pub data: Vec<T>,
}

/// JSON envelope `{ success, message, data }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }

    /// Failed response.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_data_request_defaults() {
        let request: DataRequest<String> = serde_json::from_str(r#"{"data":["a","b"]}"#).unwrap();
        assert!(!request.full);
        assert_eq!(request.page, 0);
        assert_eq!(request.data, vec!["a", "b"]);

        let request: DataRequest<String> =
            serde_json::from_str(r#"{"full_update":true,"page":2,"total":7,"data":[]}"#).unwrap();
        assert!(request.full);
        assert_eq!(request.total, 7);
    }

    #[test]
    fn test_data_is_required() {
        assert!(serde_json::from_str::<DataRequest<String>>(r#"{"page":1}"#).is_err());
    }

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(ApiResponse::ok(3)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 3);

        let json = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "nope");
        assert!(json["data"].is_null());
    }
}
