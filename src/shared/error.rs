use serde::{Deserialize, Serialize};

/// Failure report emitted when a recording run aborts
/// Contains stable machine-readable error code, human-readable message, and run ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Stable machine-readable error code (e.g., "INVALID_READING", "NO_INSTANCE")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Run ID for correlating with log output
    pub run_id: String,
}

impl ErrorReport {
    /// Create a new error report
    pub fn new(
        error: impl Into<String>,
        message: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            run_id: run_id.into(),
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Common error codes used across the recorder
pub mod error_codes {
    // Conversion errors
    pub const NON_FINITE_ELAPSED: &str = "NON_FINITE_ELAPSED";
    pub const TIMESTEP_OUT_OF_RANGE: &str = "TIMESTEP_OUT_OF_RANGE";
    pub const INVALID_INTERVAL: &str = "INVALID_INTERVAL";

    // Reading errors
    pub const INVALID_WIDTH: &str = "INVALID_WIDTH";
    pub const INVALID_READING: &str = "INVALID_READING";

    // Storage errors
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const NO_INSTANCE: &str = "NO_INSTANCE";
    pub const AMBIGUOUS_INSTANCE: &str = "AMBIGUOUS_INSTANCE";
    pub const NOT_NUMERIC: &str = "NOT_NUMERIC";

    // Configuration errors
    pub const MISSING_ENV_VAR: &str = "MISSING_ENV_VAR";
    pub const INVALID_CONFIG: &str = "INVALID_CONFIG";
    pub const INVALID_TABLE: &str = "INVALID_TABLE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_creation() {
        let report = ErrorReport::new(
            "INVALID_READING",
            "reading 3 (corridor) is NaN",
            "run-123",
        );

        assert_eq!(report.error, "INVALID_READING");
        assert_eq!(report.message, "reading 3 (corridor) is NaN");
        assert_eq!(report.run_id, "run-123");
    }

    #[test]
    fn test_error_report_to_json() {
        let report = ErrorReport::new("NO_INSTANCE", "no active instance", "run-456");

        let json = report.to_json().unwrap();
        assert!(json.contains("NO_INSTANCE"));
        assert!(json.contains("no active instance"));
        assert!(json.contains("run-456"));

        let deserialized: ErrorReport = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, report.error);
        assert_eq!(deserialized.run_id, report.run_id);
    }
}
