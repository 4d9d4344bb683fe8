use crate::{
    context::TelemetryContext,
    convert::{duration_to_string, properties_or_none},
    models::{
        sanitize::{truncate, truncate_opt, MAX_NAME_LENGTH, MAX_URL_LENGTH},
        PageViewData, Sanitize,
    },
};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A view of a page or screen in the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageViewTelemetry {
    /// When the page was viewed.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Page name.
    pub name: String,
    /// Page URL.
    pub url: Option<String>,
    /// Time it took to load the page.
    pub duration: Option<Duration>,
    /// Sampling percentage in `(0, 100]`. `None` means 100.
    pub sampling_percentage: Option<f64>,
}

impl PageViewTelemetry {
    /// Create a page view with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Sanitize for PageViewTelemetry {
    fn sanitize(&mut self) {
        truncate(&mut self.name, MAX_NAME_LENGTH);
        truncate_opt(&mut self.url, MAX_URL_LENGTH);
        self.context.sanitize();
    }
}

impl From<&PageViewTelemetry> for PageViewData {
    fn from(page_view: &PageViewTelemetry) -> Self {
        PageViewData {
            ver: 2,
            name: page_view.name.clone(),
            url: page_view.url.clone(),
            duration: page_view.duration.map(duration_to_string),
            properties: properties_or_none(&page_view.context.properties),
        }
    }
}
