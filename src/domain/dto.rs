//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};

use super::SettingOverrides;
use crate::engine::{Capacity, Pid};

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (0 = success, non-zero = error).
    pub code: i32,

    /// Human-readable message.
    pub message: String,

    /// Response data (null on error).
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a success response.
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// Create an error response.
    pub fn error(code: i32, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Amount requested from `GET /v1/mint`.
///
/// Setting overrides are read from the same query string separately.
#[derive(Debug, Clone, Deserialize)]
pub struct MintQuery {
    /// Number of identifiers; zero or negative mints nothing.
    #[serde(default = "default_amount")]
    pub amount: i64,
}

const fn default_amount() -> i64 {
    1
}

/// Minted identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintResponse {
    /// Identifiers, in canonical order for sequential mints.
    pub pids: Vec<Pid>,

    /// New sequential resume point; absent for random mints.
    pub ordinal: Option<u64>,
}

/// Remaining capacity of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReport {
    /// Usage key of the configuration.
    pub usage_key: String,

    /// Total permutations; `None` when the count overflows.
    pub total: Option<u64>,

    /// Consumed count used by the capacity guard for the setting's mode.
    pub consumed: u64,

    /// Permutations left; `None` when unbounded.
    pub remaining: Option<u64>,
}

impl CapacityReport {
    /// Build a report from an engine capacity.
    #[must_use]
    pub fn new(usage_key: String, capacity: Capacity, consumed: u64) -> Self {
        Self {
            usage_key,
            total: capacity.total(),
            consumed,
            remaining: capacity.remaining(),
        }
    }
}

/// Request to move the sequential resume point past an existing identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeRequest {
    /// Full identifier, including prepend and prefix.
    pub pid: String,

    /// Overrides selecting the configuration.
    #[serde(flatten)]
    pub overrides: SettingOverrides,
}

/// Resume result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResponse {
    /// Sequential resume point after the update.
    pub ordinal: u64,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,

    /// Service version.
    pub version: String,
}

/// Readiness check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// Overall readiness status.
    pub ready: bool,

    /// Individual component statuses.
    pub components: ReadyComponents,
}

/// Component readiness statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyComponents {
    /// Storage backend status.
    pub storage: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(vec![1, 2, 3]);
        assert_eq!(response.code, 0);
        assert_eq!(response.message, "success");
        assert_eq!(response.data, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_api_response_error() {
        let response = ApiResponse::<()>::error(1005, "not enough");
        assert_eq!(response.code, 1005);
        assert!(response.data.is_none());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_capacity_report_unbounded() {
        let report = CapacityReport::new("k".to_string(), Capacity::Unbounded, 12);
        assert_eq!(report.total, None);
        assert_eq!(report.remaining, None);
        assert_eq!(report.consumed, 12);
    }

    #[test]
    fn test_resume_request_flattens_overrides() {
        let request: ResumeRequest =
            serde_json::from_str(r#"{"pid":"x00042","prefix":"x","random":false}"#).unwrap();
        assert_eq!(request.pid, "x00042");
        assert_eq!(request.overrides.prefix.as_deref(), Some("x"));
        assert_eq!(request.overrides.random, Some(false));
        assert!(request.overrides.root_length.is_none());
    }
}
