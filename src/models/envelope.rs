use crate::models::{context_tag_keys::Tags, Data};
use serde::Serialize;

/// System variables for a telemetry item.
///
/// This is the representation handed to the ingestion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub(crate) name: &'static str,
    pub(crate) time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seq: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) sample_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) i_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tags: Option<Tags>,
    pub(crate) data: Data,
}

impl Envelope {
    /// Envelope name, e.g. `Microsoft.ApplicationInsights.Event`.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Timestamp formatted as RFC 3339.
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Sampling percentage the item was sent with.
    pub fn sample_rate(&self) -> Option<f64> {
        self.sample_rate
    }

    /// Instrumentation key the item is routed to.
    pub fn instrumentation_key(&self) -> Option<&str> {
        self.i_key.as_deref()
    }

    /// Context tags.
    pub fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    /// Serialize to JSON as expected by the ingestion endpoint.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
