//! Metrics sink boundary.
//!
//! Engine logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
//!
//! This module is the only allowed bridge between engine logic and the
//! process-local metrics state.

use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// ProbeStrategy
///
/// Which rung of the escalation ladder resolved a candidate.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProbeStrategy {
    Initials,
    Truncation,
    SingleSuffix,
    DoubleSuffix,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    ProbeResolved {
        strategy: ProbeStrategy,
    },
    ProbeExhausted,
    UniqueViolation {
        constraint: &'static str,
    },
    InsertRetry {
        attempt: u32,
    },
    SerialAllocated,
    MoveFinished {
        key_changed: bool,
        dependents_rewritten: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global counter state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::ProbeResolved { strategy } => match strategy {
                ProbeStrategy::Initials => {
                    m.probe_initials = m.probe_initials.saturating_add(1);
                }
                ProbeStrategy::Truncation => {
                    m.probe_truncation = m.probe_truncation.saturating_add(1);
                }
                ProbeStrategy::SingleSuffix => {
                    m.probe_single_suffix = m.probe_single_suffix.saturating_add(1);
                }
                ProbeStrategy::DoubleSuffix => {
                    m.probe_double_suffix = m.probe_double_suffix.saturating_add(1);
                }
            },

            MetricsEvent::ProbeExhausted => {
                m.probe_exhausted = m.probe_exhausted.saturating_add(1);
            }

            MetricsEvent::UniqueViolation { constraint: _ } => {
                m.unique_violations = m.unique_violations.saturating_add(1);
            }

            MetricsEvent::InsertRetry { attempt: _ } => {
                m.insert_retries = m.insert_retries.saturating_add(1);
            }

            MetricsEvent::SerialAllocated => {
                m.serials_allocated = m.serials_allocated.saturating_add(1);
            }

            MetricsEvent::MoveFinished {
                key_changed,
                dependents_rewritten,
            } => {
                m.moves = m.moves.saturating_add(1);
                if key_changed {
                    m.moves_rekeyed = m.moves_rekeyed.saturating_add(1);
                }
                m.dependents_rewritten =
                    m.dependents_rewritten.saturating_add(dependents_rewritten);
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    if let Some(sink) = override_sink {
        sink.record(event);
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current counter state for endpoint/test plumbing.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counter state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
///
/// The previous override is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = previous;
            });
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(previous);

    f()
}

///
/// TESTS
///
