//! Telemetry item types.
//!
//! Every item type is a plain data holder. [`TelemetryItem`] wraps them for dispatch, and the
//! optional capabilities [`Sampled`] and [`PropertyBearing`] are implemented only by the types
//! that support them.

mod dependency;
mod event;
mod exception;
mod metric;
mod page_view;
mod request;
mod session_state;
mod trace;

pub use dependency::DependencyTelemetry;
pub use event::EventTelemetry;
pub use exception::ExceptionTelemetry;
pub use metric::MetricTelemetry;
pub use page_view::PageViewTelemetry;
pub use request::RequestTelemetry;
pub use session_state::SessionStateTelemetry;
pub use trace::TraceTelemetry;

use crate::{
    context::TelemetryContext,
    models::{Data, Properties, Sanitize},
};
use chrono::{DateTime, Utc};

/// Items whose sampling percentage can be set.
pub trait Sampled {
    /// Sampling percentage in `(0, 100]`. `None` means the item is always included.
    fn sampling_percentage(&self) -> Option<f64>;

    /// Set the sampling percentage.
    fn set_sampling_percentage(&mut self, percentage: Option<f64>);
}

/// Items that carry custom properties.
pub trait PropertyBearing {
    /// Custom properties.
    fn properties(&self) -> &Properties;

    /// Mutable custom properties.
    fn properties_mut(&mut self) -> &mut Properties;
}

macro_rules! impl_sampled {
    ($($ty:ty),*) => {
        $(
            impl Sampled for $ty {
                fn sampling_percentage(&self) -> Option<f64> {
                    self.sampling_percentage
                }

                fn set_sampling_percentage(&mut self, percentage: Option<f64>) {
                    self.sampling_percentage = percentage;
                }
            }
        )*
    };
}

macro_rules! impl_property_bearing {
    ($($ty:ty),*) => {
        $(
            impl PropertyBearing for $ty {
                fn properties(&self) -> &Properties {
                    &self.context.properties
                }

                fn properties_mut(&mut self) -> &mut Properties {
                    &mut self.context.properties
                }
            }
        )*
    };
}

impl_sampled!(
    EventTelemetry,
    TraceTelemetry,
    ExceptionTelemetry,
    PageViewTelemetry,
    RequestTelemetry,
    DependencyTelemetry
);

impl_property_bearing!(
    EventTelemetry,
    MetricTelemetry,
    TraceTelemetry,
    ExceptionTelemetry,
    PageViewTelemetry,
    RequestTelemetry,
    DependencyTelemetry
);

/// A single telemetry record of any type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TelemetryItem {
    /// Custom event.
    Event(EventTelemetry),
    /// Metric measurement or aggregation.
    Metric(MetricTelemetry),
    /// Trace message.
    Trace(TraceTelemetry),
    /// Error.
    Exception(ExceptionTelemetry),
    /// Page view.
    PageView(PageViewTelemetry),
    /// Incoming request.
    Request(RequestTelemetry),
    /// Outgoing dependency call.
    Dependency(DependencyTelemetry),
    /// Session state transition.
    SessionState(SessionStateTelemetry),
}

macro_rules! for_each_variant {
    ($item:expr, $inner:ident => $body:expr) => {
        match $item {
            TelemetryItem::Event($inner) => $body,
            TelemetryItem::Metric($inner) => $body,
            TelemetryItem::Trace($inner) => $body,
            TelemetryItem::Exception($inner) => $body,
            TelemetryItem::PageView($inner) => $body,
            TelemetryItem::Request($inner) => $body,
            TelemetryItem::Dependency($inner) => $body,
            TelemetryItem::SessionState($inner) => $body,
        }
    };
}

impl TelemetryItem {
    /// Short type name, e.g. `Event` or `RemoteDependency`.
    pub fn type_name(&self) -> &'static str {
        match self {
            TelemetryItem::Event(_) => "Event",
            TelemetryItem::Metric(_) => "Metric",
            TelemetryItem::Trace(_) => "Message",
            TelemetryItem::Exception(_) => "Exception",
            TelemetryItem::PageView(_) => "PageView",
            TelemetryItem::Request(_) => "Request",
            TelemetryItem::Dependency(_) => "RemoteDependency",
            TelemetryItem::SessionState(_) => "SessionState",
        }
    }

    /// When the item happened.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        for_each_variant!(self, item => item.timestamp)
    }

    /// Set when the item happened.
    pub fn set_timestamp(&mut self, timestamp: DateTime<Utc>) {
        for_each_variant!(self, item => item.timestamp = Some(timestamp))
    }

    /// Sequence field used to track absolute order of uploaded events.
    pub fn sequence(&self) -> Option<&str> {
        for_each_variant!(self, item => item.sequence.as_deref())
    }

    /// Set the sequence field.
    pub fn set_sequence(&mut self, sequence: impl Into<String>) {
        let sequence = sequence.into();
        for_each_variant!(self, item => item.sequence = Some(sequence))
    }

    /// Context of the item.
    pub fn context(&self) -> &TelemetryContext {
        for_each_variant!(self, item => &item.context)
    }

    /// Mutable context of the item.
    pub fn context_mut(&mut self) -> &mut TelemetryContext {
        for_each_variant!(self, item => &mut item.context)
    }

    /// The sampling capability, if this item type supports it.
    pub fn as_sampled(&self) -> Option<&dyn Sampled> {
        match self {
            TelemetryItem::Event(item) => Some(item),
            TelemetryItem::Trace(item) => Some(item),
            TelemetryItem::Exception(item) => Some(item),
            TelemetryItem::PageView(item) => Some(item),
            TelemetryItem::Request(item) => Some(item),
            TelemetryItem::Dependency(item) => Some(item),
            TelemetryItem::Metric(_) | TelemetryItem::SessionState(_) => None,
        }
    }

    /// The mutable sampling capability, if this item type supports it.
    pub fn as_sampled_mut(&mut self) -> Option<&mut dyn Sampled> {
        match self {
            TelemetryItem::Event(item) => Some(item),
            TelemetryItem::Trace(item) => Some(item),
            TelemetryItem::Exception(item) => Some(item),
            TelemetryItem::PageView(item) => Some(item),
            TelemetryItem::Request(item) => Some(item),
            TelemetryItem::Dependency(item) => Some(item),
            TelemetryItem::Metric(_) | TelemetryItem::SessionState(_) => None,
        }
    }

    /// The custom properties capability, if this item type supports it.
    pub fn as_property_bearing(&self) -> Option<&dyn PropertyBearing> {
        match self {
            TelemetryItem::Event(item) => Some(item),
            TelemetryItem::Metric(item) => Some(item),
            TelemetryItem::Trace(item) => Some(item),
            TelemetryItem::Exception(item) => Some(item),
            TelemetryItem::PageView(item) => Some(item),
            TelemetryItem::Request(item) => Some(item),
            TelemetryItem::Dependency(item) => Some(item),
            TelemetryItem::SessionState(_) => None,
        }
    }

    /// The mutable custom properties capability, if this item type supports it.
    pub fn as_property_bearing_mut(&mut self) -> Option<&mut dyn PropertyBearing> {
        match self {
            TelemetryItem::Event(item) => Some(item),
            TelemetryItem::Metric(item) => Some(item),
            TelemetryItem::Trace(item) => Some(item),
            TelemetryItem::Exception(item) => Some(item),
            TelemetryItem::PageView(item) => Some(item),
            TelemetryItem::Request(item) => Some(item),
            TelemetryItem::Dependency(item) => Some(item),
            TelemetryItem::SessionState(_) => None,
        }
    }

    pub(crate) fn to_data(&self) -> Data {
        match self {
            TelemetryItem::Event(item) => Data::Event(item.into()),
            TelemetryItem::Metric(item) => Data::Metric(item.into()),
            TelemetryItem::Trace(item) => Data::Message(item.into()),
            TelemetryItem::Exception(item) => Data::Exception(item.into()),
            TelemetryItem::PageView(item) => Data::PageView(item.into()),
            TelemetryItem::Request(item) => Data::Request(item.into()),
            TelemetryItem::Dependency(item) => Data::RemoteDependency(item.into()),
            TelemetryItem::SessionState(item) => Data::SessionState(item.into()),
        }
    }
}

impl Sanitize for TelemetryItem {
    fn sanitize(&mut self) {
        for_each_variant!(self, item => item.sanitize())
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),*) => {
        $(
            impl From<$ty> for TelemetryItem {
                fn from(item: $ty) -> Self {
                    TelemetryItem::$variant(item)
                }
            }
        )*
    };
}

impl_from_variant!(
    Event(EventTelemetry),
    Metric(MetricTelemetry),
    Trace(TraceTelemetry),
    Exception(ExceptionTelemetry),
    PageView(PageViewTelemetry),
    Request(RequestTelemetry),
    Dependency(DependencyTelemetry),
    SessionState(SessionStateTelemetry)
);
