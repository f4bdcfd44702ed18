//! Prometheus counters for the review workflow
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    transitions: IntCounterVec,
    detector_degraded: IntCounter,
    rate_limited: IntCounter,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("vigil_submissions_total", "Accepted report submissions"),
            &["level"],
        )?;
        let transitions = IntCounterVec::new(
            Opts::new("vigil_transitions_total", "Committed status transitions"),
            &["to"],
        )?;
        let detector_degraded = IntCounter::new(
            "vigil_detector_degraded_total",
            "Similarity searches that fell back to the safe default",
        )?;
        let rate_limited = IntCounter::new(
            "vigil_rate_limited_total",
            "Submissions rejected by flood control",
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(transitions.clone()))?;
        registry.register(Box::new(detector_degraded.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;

        Ok(Self {
            registry,
            submissions,
            transitions,
            detector_degraded,
            rate_limited,
        })
    }

    pub fn submission(&self, level: &str) {
        self.submissions.with_label_values(&[level]).inc();
    }

    pub fn transition(&self, to: &str) {
        self.transitions.with_label_values(&[to]).inc();
    }

    pub fn detector_degraded(&self) {
        self.detector_degraded.inc();
    }

    pub fn rate_limited(&self) {
        self.rate_limited.inc();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Text exposition format for `/metrics`
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
