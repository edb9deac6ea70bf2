//! JSON envelope shared by every HTTP endpoint and by the HTTP client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Uniform wrapper for API responses.
///
/// On success: `{"success": true, "data": ..., "timestamp": ...}`,
/// on failure: `{"success": false, "message": "...", "timestamp": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: crate::time::now(),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            timestamp: crate::time::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_omits_data() {
        let json = serde_json::to_value(ApiResponse::<bool>::failure("Service not found")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Service not found");
        assert!(json.get("data").is_none());
        assert!(json.get("timestamp").is_some());
    }

    #[test]
    fn success_parses_back_without_message() {
        let text = serde_json::to_string(&ApiResponse::success(vec![1, 2])).unwrap();
        let parsed: ApiResponse<Vec<i32>> = serde_json::from_str(&text).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data, Some(vec![1, 2]));
        assert!(parsed.message.is_none());
    }
}
