use crate::{
    context::TelemetryContext,
    convert::properties_or_none,
    models::{
        sanitize::{
            truncate, truncate_opt, MAX_COMMAND_NAME_LENGTH, MAX_DEPENDENCY_TYPE_LENGTH,
            MAX_ID_LENGTH, MAX_NAME_LENGTH, MAX_RESULT_CODE_LENGTH,
        },
        DependencyKind, RemoteDependencyData, Sanitize,
    },
};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A call from the application to a remote component, like a database or an HTTP service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyTelemetry {
    /// When the call started.
    pub timestamp: Option<DateTime<Utc>>,
    /// Sequence field used to track absolute order of uploaded events.
    pub sequence: Option<String>,
    /// Context of the item.
    pub context: TelemetryContext,
    /// Identifier of the call instance.
    pub id: Option<String>,
    /// Name of the dependency, e.g. the server name.
    pub name: String,
    /// Command issued, e.g. a SQL statement or a full URL.
    pub command_name: Option<String>,
    /// Dependency type, e.g. `SQL` or `HTTP`.
    pub dependency_type_name: Option<String>,
    /// Kind of the dependency.
    pub dependency_kind: DependencyKind,
    /// Call duration.
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: Option<bool>,
    /// Whether the call was made asynchronously.
    pub async_: Option<bool>,
    /// Result code of the call.
    pub result_code: Option<String>,
    /// Sampling percentage in `(0, 100]`. `None` means 100.
    pub sampling_percentage: Option<f64>,
}

impl DependencyTelemetry {
    /// Create a completed dependency call of kind [`DependencyKind::Other`].
    pub fn new(
        name: impl Into<String>,
        command_name: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        success: bool,
    ) -> Self {
        Self {
            timestamp: Some(start_time),
            name: name.into(),
            command_name: Some(command_name.into()),
            duration,
            success: Some(success),
            ..Default::default()
        }
    }

    /// Set the dependency kind from its name. Unknown names yield [`DependencyKind::Other`].
    pub fn set_dependency_kind(&mut self, kind: Option<&str>) {
        self.dependency_kind = DependencyKind::parse_or_other(kind);
    }
}

impl Sanitize for DependencyTelemetry {
    fn sanitize(&mut self) {
        truncate_opt(&mut self.id, MAX_ID_LENGTH);
        truncate(&mut self.name, MAX_NAME_LENGTH);
        truncate_opt(&mut self.command_name, MAX_COMMAND_NAME_LENGTH);
        truncate_opt(&mut self.dependency_type_name, MAX_DEPENDENCY_TYPE_LENGTH);
        truncate_opt(&mut self.result_code, MAX_RESULT_CODE_LENGTH);
        self.context.sanitize();
    }
}

impl From<&DependencyTelemetry> for RemoteDependencyData {
    fn from(dependency: &DependencyTelemetry) -> Self {
        RemoteDependencyData {
            ver: 2,
            name: dependency.name.clone(),
            id: dependency.id.clone(),
            result_code: dependency.result_code.clone(),
            kind: "Aggregation",
            value: dependency.duration.as_secs_f64() * 1000.0,
            dependency_kind: dependency.dependency_kind,
            success: dependency.success,
            async_: dependency.async_,
            command_name: dependency.command_name.clone().filter(|c| !c.is_empty()),
            dependency_type_name: dependency.dependency_type_name.clone(),
            properties: properties_or_none(&dependency.context.properties),
        }
    }
}
