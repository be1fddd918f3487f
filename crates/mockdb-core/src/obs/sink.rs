//! Event sink boundary.
//!
//! This module is the only bridge between engine code and the thread-local
//! counter state. The global sink also forwards every event to `tracing`
//! under the `mockdb` target.
use crate::{obs::metrics, stub::CallLevel, value::RecordId};
use derive_more::Display;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn EventSink>>> = RefCell::new(None);
}

///
/// StubScope
/// Which registry a stub was written to or cleared from.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum StubScope {
    #[display("class method")]
    ClassMethod,
    #[display("class-wide instance method")]
    ClassInstanceMethod,
    #[display("instance method")]
    InstanceMethod,
}

///
/// MockEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MockEvent<'a> {
    StubRegistered {
        class: &'a str,
        method: &'a str,
        scope: StubScope,
    },
    StubsCleared {
        class: &'a str,
        scope: StubScope,
        cleared: u64,
    },
    DispatchHit {
        class: &'a str,
        method: &'a str,
        level: CallLevel,
    },
    DispatchMiss {
        class: &'a str,
        method: &'a str,
        level: CallLevel,
    },
    RecordInserted {
        class: &'a str,
        id: RecordId,
    },
    RecordRemoved {
        class: &'a str,
        id: RecordId,
    },
    StoreCleared {
        class: &'a str,
        removed: u64,
    },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: &MockEvent<'_>);
}

/// GlobalEventSink
/// Default sink: aggregates into thread-local counters and emits `tracing`
/// events. Used whenever no scoped override is installed.

pub(crate) struct GlobalEventSink;

impl EventSink for GlobalEventSink {
    fn record(&self, event: &MockEvent<'_>) {
        match *event {
            MockEvent::StubRegistered {
                class,
                method,
                scope,
            } => {
                tracing::debug!(target: "mockdb", class, method, %scope, "stub registered");
                metrics::with_state_mut(|m| {
                    m.ops.stubs_registered = m.ops.stubs_registered.saturating_add(1);
                });
                metrics::with_class_mut(class, |c| {
                    c.stubs_registered = c.stubs_registered.saturating_add(1);
                });
            }

            MockEvent::StubsCleared {
                class,
                scope,
                cleared,
            } => {
                tracing::debug!(target: "mockdb", class, %scope, cleared, "stubs cleared");
                metrics::with_state_mut(|m| {
                    m.ops.stubs_cleared = m.ops.stubs_cleared.saturating_add(cleared);
                });
            }

            MockEvent::DispatchHit {
                class,
                method,
                level,
            } => {
                tracing::trace!(target: "mockdb", class, method, %level, "dispatch hit");
                metrics::with_state_mut(|m| {
                    m.ops.dispatch_hits = m.ops.dispatch_hits.saturating_add(1);
                });
                metrics::with_class_mut(class, |c| {
                    c.dispatch_hits = c.dispatch_hits.saturating_add(1);
                });
            }

            MockEvent::DispatchMiss {
                class,
                method,
                level,
            } => {
                tracing::debug!(target: "mockdb", class, method, %level, "dispatch miss");
                metrics::with_state_mut(|m| {
                    m.ops.dispatch_misses = m.ops.dispatch_misses.saturating_add(1);
                });
                metrics::with_class_mut(class, |c| {
                    c.dispatch_misses = c.dispatch_misses.saturating_add(1);
                });
            }

            MockEvent::RecordInserted { class, id } => {
                tracing::trace!(target: "mockdb", class, id, "record inserted");
                metrics::with_state_mut(|m| {
                    m.ops.records_inserted = m.ops.records_inserted.saturating_add(1);
                });
                metrics::with_class_mut(class, |c| {
                    c.records_inserted = c.records_inserted.saturating_add(1);
                });
            }

            MockEvent::RecordRemoved { class, id } => {
                tracing::trace!(target: "mockdb", class, id, "record removed");
                metrics::with_state_mut(|m| {
                    m.ops.records_removed = m.ops.records_removed.saturating_add(1);
                });
                metrics::with_class_mut(class, |c| {
                    c.records_removed = c.records_removed.saturating_add(1);
                });
            }

            MockEvent::StoreCleared { class, removed } => {
                tracing::debug!(target: "mockdb", class, removed, "store cleared");
                metrics::with_state_mut(|m| {
                    m.ops.stores_cleared = m.ops.stores_cleared.saturating_add(1);
                    m.ops.records_removed = m.ops.records_removed.saturating_add(removed);
                });
                metrics::with_class_mut(class, |c| {
                    c.records_removed = c.records_removed.saturating_add(removed);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_EVENT_SINK: GlobalEventSink = GlobalEventSink;

pub(crate) fn record(event: MockEvent<'_>) {
    // Clone the override out so a sink may itself record without re-borrowing.
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match override_sink {
        Some(sink) => sink.record(&event),
        None => GLOBAL_EVENT_SINK.record(&event),
    }
}

/// Snapshot the current thread's event counters.
#[must_use]
pub fn event_report() -> metrics::EventReport {
    metrics::with_state(Clone::clone)
}

/// Reset the current thread's event counters.
pub fn events_reset() {
    metrics::reset();
}

/// Run a closure with a temporary sink override; the previous sink is
/// restored on every exit path, unwinding included.
pub fn with_event_sink<T>(sink: Rc<dyn EventSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn EventSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
