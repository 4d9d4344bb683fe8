use crate::{
    models::{Envelope, Properties},
    telemetry::TelemetryItem,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

pub(crate) fn duration_to_string(duration: Duration) -> String {
    let micros = duration.as_micros();
    let s = micros / 1_000_000 % 60;
    let m = micros / 1_000_000 / 60 % 60;
    let h = micros / 1_000_000 / 60 / 60 % 24;
    let d = micros / 1_000_000 / 60 / 60 / 24;
    let micros_remaining = micros % 1_000_000;
    format!(
        "{}.{:0>2}:{:0>2}:{:0>2}.{:0>6}",
        d, h, m, s, micros_remaining
    )
}

pub(crate) fn time_to_string(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn properties_or_none(properties: &Properties) -> Option<Properties> {
    Some(properties.clone()).filter(|x| !x.is_empty())
}

impl From<&TelemetryItem> for Envelope {
    fn from(item: &TelemetryItem) -> Self {
        let context = item.context();
        Envelope {
            name: match item {
                TelemetryItem::Event(_) => "Microsoft.ApplicationInsights.Event",
                TelemetryItem::Metric(_) => "Microsoft.ApplicationInsights.Metric",
                TelemetryItem::Trace(_) => "Microsoft.ApplicationInsights.Message",
                TelemetryItem::Exception(_) => "Microsoft.ApplicationInsights.Exception",
                TelemetryItem::PageView(_) => "Microsoft.ApplicationInsights.PageView",
                TelemetryItem::Request(_) => "Microsoft.ApplicationInsights.Request",
                TelemetryItem::Dependency(_) => "Microsoft.ApplicationInsights.RemoteDependency",
                TelemetryItem::SessionState(_) => "Microsoft.ApplicationInsights.SessionState",
            },
            time: time_to_string(item.timestamp().unwrap_or_else(Utc::now)),
            seq: item.sequence().map(String::from),
            sample_rate: item.as_sampled().and_then(|s| s.sampling_percentage()),
            i_key: context.instrumentation_key().map(String::from),
            tags: Some(context.tags.clone()).filter(|x| !x.is_empty()),
            data: item.to_data(),
        }
    }
}
