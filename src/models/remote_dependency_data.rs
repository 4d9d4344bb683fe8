use crate::models::{DependencyKind, Properties};
use serde::Serialize;

/// An instance of Remote Dependency represents an interaction of the monitored component with a
/// remote component/service like SQL or an HTTP endpoint.
///
/// The call duration is reported as a single aggregated data point in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemoteDependencyData {
    /// Schema version
    pub(crate) ver: i32,

    /// Name of the command initiated with this dependency call. Low cardinality value.
    pub(crate) name: String,

    /// Identifier of a dependency call instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,

    /// Result code of a dependency call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) result_code: Option<String>,

    /// Always `Aggregation`.
    pub(crate) kind: &'static str,

    /// Call duration in milliseconds.
    pub(crate) value: f64,

    /// Kind of the dependency.
    pub(crate) dependency_kind: DependencyKind,

    /// Indication of successful or unsuccessful call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) success: Option<bool>,

    /// Whether the call was made asynchronously.
    #[serde(rename = "async", skip_serializing_if = "Option::is_none")]
    pub(crate) async_: Option<bool>,

    /// Command initiated by this dependency call, e.g. a SQL statement or a full URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) command_name: Option<String>,

    /// Dependency type name, e.g. `SQL`, `Azure table` or `HTTP`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) dependency_type_name: Option<String>,

    /// Collection of custom properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) properties: Option<Properties>,
}
