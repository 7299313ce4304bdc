use serde::Serialize;
use std::cell::RefCell;

thread_local! {
    static STATE: RefCell<Counters> = RefCell::new(Counters::default());
}

///
/// Counters
///
/// Saturating event counters for the key engine. Probe counters split by
/// the strategy that resolved the candidate; the rest track the write path.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Counters {
    pub probe_initials: u64,
    pub probe_truncation: u64,
    pub probe_single_suffix: u64,
    pub probe_double_suffix: u64,
    pub probe_exhausted: u64,
    pub unique_violations: u64,
    pub insert_retries: u64,
    pub serials_allocated: u64,
    pub moves: u64,
    pub moves_rekeyed: u64,
    pub dependents_rewritten: u64,
}

///
/// EventReport
///
/// Point-in-time snapshot for endpoint/test plumbing.
///

#[derive(Clone, Debug, Serialize)]
pub struct EventReport {
    pub counters: Counters,
}

pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut Counters) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

pub(crate) fn report() -> EventReport {
    STATE.with(|state| EventReport {
        counters: state.borrow().clone(),
    })
}

pub(crate) fn reset_all() {
    STATE.with(|state| {
        *state.borrow_mut() = Counters::default();
    });
}
