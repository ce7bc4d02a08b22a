//! Generation request parsing.

use report_state::ReportId;
use serde_json::Value;

use crate::error::ValidationError;

/// A validated request to (re)generate one report for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub report_id: ReportId,
    pub user_id: String,
}

impl GenerateRequest {
    pub fn new(report_id: ReportId, user_id: &str) -> Result<Self, ValidationError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ValidationError::MissingUser);
        }
        Ok(Self {
            report_id,
            user_id: user_id.to_string(),
        })
    }

    /// Parse a `{"reportId": "<uuid>"}` body on behalf of `user_id`.
    pub fn parse(body: &str, user_id: &str) -> Result<Self, ValidationError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        let raw = value
            .get("reportId")
            .filter(|v| !v.is_null())
            .ok_or(ValidationError::MissingReportId)?;
        let text = raw
            .as_str()
            .ok_or_else(|| ValidationError::InvalidReportId(raw.to_string()))?;
        let report_id = ReportId::parse(text.trim())
            .ok_or_else(|| ValidationError::InvalidReportId(text.to_string()))?;
        Self::new(report_id, user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "6f1c2a9e-3b7d-4c1e-9a55-0d2f4b8e7c11";

    #[test]
    fn test_parse_valid_body() {
        let request = GenerateRequest::parse(&format!(r#"{{"reportId": "{}"}}"#, ID), "user-1").unwrap();
        assert_eq!(request.report_id.to_string(), ID);
        assert_eq!(request.user_id, "user-1");
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = GenerateRequest::parse("{not json", "u").unwrap_err();
        assert!(matches!(err, ValidationError::MalformedBody(_)));
    }

    #[test]
    fn test_rejects_missing_or_null_id() {
        assert_eq!(
            GenerateRequest::parse("{}", "u").unwrap_err(),
            ValidationError::MissingReportId
        );
        assert_eq!(
            GenerateRequest::parse(r#"{"reportId": null}"#, "u").unwrap_err(),
            ValidationError::MissingReportId
        );
        assert_eq!(
            GenerateRequest::parse("[]", "u").unwrap_err(),
            ValidationError::MissingReportId
        );
    }

    #[test]
    fn test_rejects_non_uuid() {
        let err = GenerateRequest::parse(r#"{"reportId": "report-7"}"#, "u").unwrap_err();
        assert_eq!(err, ValidationError::InvalidReportId("report-7".to_string()));
        let err = GenerateRequest::parse(r#"{"reportId": 7}"#, "u").unwrap_err();
        assert_eq!(err, ValidationError::InvalidReportId("7".to_string()));
    }

    #[test]
    fn test_rejects_blank_user() {
        let err = GenerateRequest::parse(&format!(r#"{{"reportId": "{}"}}"#, ID), "  ").unwrap_err();
        assert_eq!(err, ValidationError::MissingUser);
    }
}
