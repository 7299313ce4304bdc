//! Observability: derivation/uniqueness counters and sink abstractions.
//!
//! Engine logic does not touch counter state directly; every event flows
//! through [`sink::record`] so callers can install a scoped sink override.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{Counters, EventReport};
pub use sink::{
    MetricsEvent, MetricsSink, ProbeStrategy, metrics_report, metrics_reset_all,
    with_metrics_sink,
};

pub(crate) use sink::record;
