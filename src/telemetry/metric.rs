use crate::{
    context::TelemetryContext,
    convert::properties_or_none,
    models::{
        sanitize::{truncate, MAX_NAME_LENGTH},
        DataPoint, DataPointType, MetricData, Sanitize,
    },
};
use chrono::{DateTime, Utc};

/// A single measurement, or an aggregation of measurements, of a named metric.
///
/// Metrics are pre-aggregated and are never sampled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricTelemetry {
    /// When the value was measured.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Metric name.
    pub name: String,
    /// Single value, or the sum of values for an aggregation.
    pub value: f64,
    /// Number of aggregated measurements.
    pub count: Option<i32>,
    /// Minimum of aggregated measurements.
    pub min: Option<f64>,
    /// Maximum of aggregated measurements.
    pub max: Option<f64>,
    /// Standard deviation of aggregated measurements.
    pub std_dev: Option<f64>,
}

impl MetricTelemetry {
    /// Create a single measurement.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            ..Default::default()
        }
    }

    fn is_aggregation(&self) -> bool {
        self.count.is_some() || self.min.is_some() || self.max.is_some() || self.std_dev.is_some()
    }
}

impl Sanitize for MetricTelemetry {
    fn sanitize(&mut self) {
        truncate(&mut self.name, MAX_NAME_LENGTH);
        self.context.sanitize();
    }
}

impl From<&MetricTelemetry> for MetricData {
    fn from(metric: &MetricTelemetry) -> Self {
        let kind = if metric.is_aggregation() {
            DataPointType::Aggregation {
                count: metric.count,
                min: metric.min,
                max: metric.max,
                std_dev: metric.std_dev,
            }
        } else {
            DataPointType::Measurement
        };
        MetricData {
            ver: 2,
            metrics: vec![DataPoint {
                name: metric.name.clone(),
                kind,
                value: metric.value,
            }],
            properties: properties_or_none(&metric.context.properties),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_unless_aggregated_fields_are_set() {
        let mut metric = MetricTelemetry::new("m", 1.0);
        assert_eq!(DataPointType::Measurement, MetricData::from(&metric).metrics[0].kind);

        metric.count = Some(3);
        assert_eq!(
            DataPointType::Aggregation {
                count: Some(3),
                min: None,
                max: None,
                std_dev: None
            },
            MetricData::from(&metric).metrics[0].kind
        );
    }
}
