//! ## larmvakt-telemetry::metrics
//! **Prometheus recorder for orchestration counters**
//!
//! Tracks the run's process population and the alert pipeline volume:
//! - processes launched (capture sessions, detector units, engine)
//! - alerts extracted from / republished off the store
//! - export duration histogram

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub processes_launched: prometheus::Counter,
    pub alerts_extracted: prometheus::Counter,
    pub alerts_emitted: prometheus::Counter,
    pub export_duration: prometheus::Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let processes_launched = Counter::new(
            "larmvakt_processes_launched_total",
            "Total child processes launched this run",
        )
        .unwrap();

        let alerts_extracted = Counter::new(
            "larmvakt_alerts_extracted_total",
            "Total alert records in the final extracted snapshot",
        )
        .unwrap();

        let alerts_emitted = Counter::new(
            "larmvakt_alerts_emitted_total",
            "Total alert records republished on the merged stream",
        )
        .unwrap();

        let export_duration = Histogram::with_opts(
            HistogramOpts::new(
                "larmvakt_export_duration_seconds",
                "Wall time spent writing the final alert export",
            )
            .buckets(vec![0.01, 0.1, 1.0, 10.0]),
        )
        .unwrap();

        registry
            .register(Box::new(processes_launched.clone()))
            .unwrap();
        registry.register(Box::new(alerts_extracted.clone())).unwrap();
        registry.register(Box::new(alerts_emitted.clone())).unwrap();
        registry.register(Box::new(export_duration.clone())).unwrap();

        Self {
            registry,
            processes_launched,
            alerts_extracted,
            alerts_emitted,
            export_duration,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    pub fn inc_processes_launched(&self) {
        self.processes_launched.inc();
    }

    pub fn inc_alerts_extracted(&self) {
        self.alerts_extracted.inc();
    }

    pub fn inc_alerts_emitted(&self) {
        self.alerts_emitted.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_register_and_gather() {
        let metrics = MetricsRecorder::new();
        metrics.inc_processes_launched();
        metrics.inc_alerts_extracted();
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("larmvakt_processes_launched_total 1"));
        assert!(text.contains("larmvakt_alerts_extracted_total 1"));
    }
}
