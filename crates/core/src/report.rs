//! Report records: the normalized draft produced from model output and the persisted,
//! owner-scoped report.
//!
//! `sections` and `sources` of a persisted report may arrive either as native JSON arrays or
//! as JSON text holding those arrays (older stores serialized them to strings). Both forms are
//! accepted on read; writes always use native arrays.

use crate::{ResearchError, ResearchResult};
use chrono::{DateTime, Utc};
use research_uuid::ResearchId;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// One titled section of a research report. `content` carries lightweight markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// A cited source. `snippet` is an optional markup description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Structured research output recovered from a model response.
///
/// Serializes to a JSON object with exactly the keys `summary`, `sections` and `sources`.
/// Order of sections and sources is preserved as received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDraft {
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<Section>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: Vec<Source>,
}

impl ReportDraft {
    /// Reads a draft from an already-parsed JSON value.
    ///
    /// Only JSON objects qualify; arrays and scalars are rejected even where serde could
    /// coerce them into the struct.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Canonical JSON text of this draft.
    pub fn to_canonical_json(&self) -> ResearchResult<String> {
        serde_json::to_string(self).map_err(ResearchError::Serialization)
    }
}

/// A persisted research report, exclusively scoped to `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: ResearchId,
    pub owner_id: String,
    pub topic: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: String,
    #[serde(deserialize_with = "json_or_string")]
    pub sections: Vec<Section>,
    #[serde(deserialize_with = "json_or_string")]
    pub sources: Vec<Source>,
    /// Canonical JSON of the draft this report was built from.
    #[serde(default)]
    pub report_json: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl StoredReport {
    /// Builds a new, not-deleted report from a normalized draft.
    ///
    /// # Errors
    ///
    /// Returns `ResearchError::Serialization` if the draft cannot be serialized.
    pub fn new(
        id: ResearchId,
        owner_id: impl Into<String>,
        topic: impl Into<String>,
        draft: ReportDraft,
        created_at: DateTime<Utc>,
    ) -> ResearchResult<Self> {
        let report_json = draft.to_canonical_json()?;
        Ok(Self {
            id,
            owner_id: owner_id.into(),
            topic: topic.into(),
            summary: draft.summary,
            sections: draft.sections,
            sources: draft.sources,
            report_json: Some(report_json),
            created_at,
            deleted: false,
        })
    }

    /// Returns the draft portion of this report.
    pub fn draft(&self) -> ReportDraft {
        ReportDraft {
            summary: self.summary.clone(),
            sections: self.sections.clone(),
            sources: self.sources.clone(),
        }
    }

    /// True if `owner_id` owns this report and it has not been soft-deleted.
    pub fn is_visible_to(&self, owner_id: &str) -> bool {
        !self.deleted && self.owner_id == owner_id
    }

    pub fn summary_entry(&self) -> ReportSummary {
        ReportSummary {
            id: self.id,
            owner_id: self.owner_id.clone(),
            topic: self.topic.clone(),
            created_at: self.created_at,
        }
    }
}

/// History listing entry for a stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: ResearchId,
    pub owner_id: String,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn json_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(T::default()),
        serde_json::Value::String(text) => {
            serde_json::from_str(&text).map_err(serde::de::Error::custom)
        }
        other => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_draft() -> ReportDraft {
        ReportDraft {
            summary: "Short **summary**".into(),
            sections: vec![
                Section {
                    title: "Zeta".into(),
                    content: "last alphabetically, first in order".into(),
                },
                Section {
                    title: "Alpha".into(),
                    content: "second".into(),
                },
            ],
            sources: vec![Source {
                title: "Example".into(),
                url: "https://example.com".into(),
                snippet: None,
            }],
        }
    }

    #[test]
    fn test_canonical_json_has_exactly_three_keys() {
        let json = sample_draft().to_canonical_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(value.get("summary").is_some());
        assert!(value.get("sections").is_some());
        assert!(value.get("sources").is_some());
    }

    #[test]
    fn test_from_value_defaults_missing_and_null_fields() {
        let draft = ReportDraft::from_value(json!({
            "summary": null,
            "sections": [{"title": "Only title"}],
        }))
        .unwrap();
        assert_eq!(draft.summary, "");
        assert_eq!(draft.sections[0].content, "");
        assert!(draft.sources.is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(ReportDraft::from_value(json!(["summary", [], []])).is_none());
        assert!(ReportDraft::from_value(json!("text")).is_none());
        assert!(ReportDraft::from_value(json!({"sections": "not a list"})).is_none());
    }

    #[test]
    fn test_stored_report_accepts_string_encoded_fields() {
        let draft = sample_draft();
        let sections_text = serde_json::to_string(&draft.sections).unwrap();
        let sources_text = serde_json::to_string(&draft.sources).unwrap();

        let native = json!({
            "id": "550e8400e29b41d4a716446655440000",
            "owner_id": "user-1",
            "topic": "Tides",
            "summary": draft.summary,
            "sections": draft.sections,
            "sources": draft.sources,
            "created_at": "2026-01-22T10:30:00Z",
        });
        let mut encoded = native.clone();
        encoded["sections"] = json!(sections_text);
        encoded["sources"] = json!(sources_text);

        let from_native: StoredReport = serde_json::from_value(native).unwrap();
        let from_encoded: StoredReport = serde_json::from_value(encoded).unwrap();
        assert_eq!(from_native, from_encoded);
        assert_eq!(from_encoded.draft(), draft);
        assert!(!from_encoded.deleted);
    }

    #[test]
    fn test_new_stored_report_keeps_order_and_raw_json() {
        let id = ResearchId::new();
        let report =
            StoredReport::new(id, "user-1", "Tides", sample_draft(), Utc::now()).unwrap();
        assert_eq!(report.sections[0].title, "Zeta");
        assert_eq!(report.sections[1].title, "Alpha");
        let raw: ReportDraft =
            serde_json::from_str(report.report_json.as_deref().unwrap()).unwrap();
        assert_eq!(raw, sample_draft());
        assert!(report.is_visible_to("user-1"));
        assert!(!report.is_visible_to("user-2"));
    }
}
