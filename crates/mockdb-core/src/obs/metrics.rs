use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventReport
/// Point-in-time copy of the thread's event counters.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub classes: BTreeMap<String, ClassCounters>,
}

impl EventReport {
    /// Counters for one class, zeroed when the class never produced an event.
    #[must_use]
    pub fn class(&self, name: &str) -> ClassCounters {
        self.classes.get(name).cloned().unwrap_or_default()
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Stubbing
    pub stubs_registered: u64,
    pub stubs_cleared: u64,

    // Dispatch
    pub dispatch_hits: u64,
    pub dispatch_misses: u64,

    // Store mutations
    pub records_inserted: u64,
    pub records_removed: u64,
    pub stores_cleared: u64,
}

///
/// ClassCounters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ClassCounters {
    pub stubs_registered: u64,
    pub dispatch_hits: u64,
    pub dispatch_misses: u64,
    pub records_inserted: u64,
    pub records_removed: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventReport> = RefCell::new(EventReport::default());
}

/// Borrow counters immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventReport) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow counters mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventReport) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Borrow one class's counters mutably, creating them on first use.
pub(crate) fn with_class_mut(class: &str, f: impl FnOnce(&mut ClassCounters)) {
    with_state_mut(|m| f(m.classes.entry(class.to_string()).or_default()));
}

/// Reset all counters.
pub(crate) fn reset() {
    with_state_mut(|m| *m = EventReport::default());
}
