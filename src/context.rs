use crate::models::{
    context_tag_keys::{sanitize_tags, ContextTagKey, Tags},
    Properties, Sanitize,
};

/// Contextual information attached to a telemetry item or shared by a
/// [`TelemetryClient`](crate::TelemetryClient).
///
/// A client's context is copied into every item it tracks, but only where the item does not
/// define a value itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryContext {
    /// Instrumentation key that routes the item to an Application Insights resource.
    pub instrumentation_key: Option<String>,

    /// Context tags, keyed by the names in [`context_tag_keys`](crate::context_tag_keys).
    pub tags: Tags,

    /// Custom properties.
    pub properties: Properties,
}

impl TelemetryContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a context tag.
    pub fn set_tag(&mut self, key: ContextTagKey, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Get a context tag.
    pub fn tag(&self, key: ContextTagKey) -> Option<&str> {
        self.tags.get(key.as_str()).map(String::as_str)
    }

    /// Instrumentation key, treating an empty key as missing.
    pub fn instrumentation_key(&self) -> Option<&str> {
        self.instrumentation_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    /// Copy values from `other` where this context has none.
    pub fn merge_from(&mut self, other: &TelemetryContext) {
        if self.instrumentation_key().is_none() {
            if let Some(key) = other.instrumentation_key() {
                self.instrumentation_key = Some(key.to_string());
            }
        }
        for (key, value) in &other.tags {
            self.tags
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        for (key, value) in &other.properties {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl Sanitize for TelemetryContext {
    fn sanitize(&mut self) {
        sanitize_tags(&mut self.tags);
        self.properties.sanitize();
    }
}
