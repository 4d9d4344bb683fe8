pub mod context_tag_keys;
mod data;
mod data_point;
pub(crate) mod dependency_kind;
pub(crate) mod envelope;
mod event_data;
mod exception_data;
pub(crate) mod exception_details;
mod message_data;
mod metric_data;
mod page_view_data;
mod remote_dependency_data;
mod request_data;
pub(crate) mod sanitize;
pub(crate) mod session_state_data;
pub(crate) mod severity_level;

pub(crate) use data::*;
pub(crate) use data_point::*;
pub(crate) use dependency_kind::DependencyKind;
pub(crate) use envelope::Envelope;
pub(crate) use event_data::*;
pub(crate) use exception_data::*;
pub(crate) use exception_details::ExceptionDetails;
pub(crate) use message_data::*;
pub(crate) use metric_data::*;
pub(crate) use page_view_data::*;
pub(crate) use remote_dependency_data::*;
pub(crate) use request_data::*;
pub(crate) use sanitize::{Properties, Sanitize};
pub(crate) use session_state_data::{SessionState, SessionStateData};
pub(crate) use severity_level::SeverityLevel;
