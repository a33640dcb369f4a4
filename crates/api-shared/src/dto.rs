//! Wire types for the REST API.
//!
//! Timestamps are RFC 3339 strings and identifiers are canonical 32-character hex strings.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearchReq {
    pub topic: String,
    #[serde(default)]
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ResearchRes {
    pub research_id: String,
    pub status: String,
    /// Rough duration estimate in seconds.
    pub estimated_time: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusRes {
    pub research_id: String,
    pub status: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SectionDto {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourceDto {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReportRes {
    pub research_id: String,
    pub topic: String,
    pub summary: String,
    pub sections: Vec<SectionDto>,
    pub sources: Vec<SourceDto>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    pub research_id: String,
    pub topic: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HistoryRes {
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_research_req_context_is_optional() {
        let req: ResearchReq = serde_json::from_str(r#"{"topic": "Tides"}"#).unwrap();
        assert_eq!(
            req,
            ResearchReq {
                topic: "Tides".into(),
                additional_context: None,
            }
        );
    }

    #[test]
    fn test_status_res_omits_absent_fields() {
        let res = StatusRes {
            research_id: "abc".into(),
            status: "processing".into(),
            topic: "Tides".into(),
            error: None,
            start_time: None,
        };
        let json = serde_json::to_value(&res).unwrap();
        assert!(json.get("error").is_none());
        assert!(json.get("start_time").is_none());
    }
}
