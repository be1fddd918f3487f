//! Observability: event counters and sink abstractions.
//!
//! Engine code never touches `metrics` directly; every observation flows
//! through `sink::record` as a [`MockEvent`].

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{ClassCounters, EventOps, EventReport};
pub use sink::{EventSink, MockEvent, StubScope, event_report, events_reset, with_event_sink};
