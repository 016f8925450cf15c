//! Prometheus metrics for the verification engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] that a host process can
//! encode into the Prometheus text exposition format.

use bgv_types::{CheckKind, ErrorCategory};
use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Provider checks started, by check kind.
    pub provider_calls: IntCounterVec,
    /// Attempt outcomes, by category (`success` for matches).
    pub outcomes: IntCounterVec,
    pub retries_scheduled: IntCounter,
    pub retries_exhausted: IntCounter,
    pub token_refreshes: IntCounter,
    pub persistence_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Retry timers currently armed.
    pub pending_retries: IntGauge,
}

impl EngineMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let provider_calls = register_int_counter_vec_with_registry!(
            Opts::new("bgv_provider_calls_total", "Provider checks started"),
            &["kind"],
            registry
        )?;
        let outcomes = register_int_counter_vec_with_registry!(
            Opts::new("bgv_outcomes_total", "Verification attempt outcomes"),
            &["category"],
            registry
        )?;
        let retries_scheduled = register_int_counter_with_registry!(
            Opts::new("bgv_retries_scheduled_total", "Retry timers armed"),
            registry
        )?;
        let retries_exhausted = register_int_counter_with_registry!(
            Opts::new(
                "bgv_retries_exhausted_total",
                "Entries that failed after spending their retry budget"
            ),
            registry
        )?;
        let token_refreshes = register_int_counter_with_registry!(
            Opts::new(
                "bgv_token_refreshes_total",
                "Company tokens re-minted after the provider invalidated them"
            ),
            registry
        )?;
        let persistence_failures = register_int_counter_with_registry!(
            Opts::new(
                "bgv_persistence_failures_total",
                "Outcomes that could not be written to the store"
            ),
            registry
        )?;
        let pending_retries = register_int_gauge_with_registry!(
            Opts::new("bgv_pending_retries", "Retry timers currently armed"),
            registry
        )?;

        Ok(Self {
            registry,
            provider_calls,
            outcomes,
            retries_scheduled,
            retries_exhausted,
            token_refreshes,
            persistence_failures,
            pending_retries,
        })
    }

    pub fn record_call(&self, kind: CheckKind) {
        self.provider_calls.with_label_values(&[kind.as_str()]).inc();
    }

    /// Count an outcome; `None` means success.
    pub fn record_outcome(&self, category: Option<ErrorCategory>) {
        let label = category.map_or("success", |c| c.as_str());
        self.outcomes.with_label_values(&[label]).inc();
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_the_encoding() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.record_call(CheckKind::Company);
        metrics.record_call(CheckKind::Company);
        metrics.record_outcome(Some(ErrorCategory::Transient));
        metrics.record_outcome(None);
        metrics.pending_retries.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("bgv_provider_calls_total{kind=\"company\"} 2"));
        assert!(text.contains("bgv_outcomes_total{category=\"transient\"} 1"));
        assert!(text.contains("bgv_outcomes_total{category=\"success\"} 1"));
        assert!(text.contains("bgv_pending_retries 2"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = EngineMetrics::new().unwrap();
        let b = EngineMetrics::new().unwrap();
        a.token_refreshes.inc();
        assert_eq!(a.token_refreshes.get(), 1);
        assert_eq!(b.token_refreshes.get(), 0);
    }
}
