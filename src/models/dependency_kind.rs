use serde::Serialize;
use std::{fmt, str::FromStr};

/// Kind of a remote dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum DependencyKind {
    /// A SQL database call.
    SQL,
    /// An HTTP call.
    Http,
    /// Anything else.
    #[default]
    Other,
}

impl DependencyKind {
    /// Parses `value`, falling back to [`DependencyKind::Other`] for unknown or missing values.
    pub fn parse_or_other(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Name as reported to Application Insights.
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::SQL => "SQL",
            DependencyKind::Http => "Http",
            DependencyKind::Other => "Other",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`DependencyKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dependency kind {0:?}")]
pub struct UnknownDependencyKind(String);

impl FromStr for DependencyKind {
    type Err = UnknownDependencyKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SQL" => Ok(DependencyKind::SQL),
            "Http" => Ok(DependencyKind::Http),
            "Other" => Ok(DependencyKind::Other),
            _ => Err(UnknownDependencyKind(s.to_string())),
        }
    }
}
