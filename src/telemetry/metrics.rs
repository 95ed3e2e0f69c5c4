use std::sync::Arc;

use prometheus::{Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::telemetry::error::TelemetryError;

const NAMESPACE: &str = "nrdot_host";

/// The agent's self-telemetry (§4.9): discovery latency per method and
/// overall, generation latency, apply outcomes, active Collector uptime,
/// export success ratio, API request durations, and rate-limiter
/// rejections. Registered against a crate-owned [`Registry`] rather than
/// the `prometheus` crate's process-global default, per §9's no-ambient-
/// singletons rule — the composition root builds exactly one `Metrics`
/// and threads it everywhere.
pub struct Metrics {
    registry: Registry,

    pub discovery_cycle_duration_seconds: Histogram,
    pub discovery_method_duration_seconds: HistogramVec,
    pub discovery_method_errors_total: IntCounterVec,

    pub generation_duration_seconds: Histogram,

    pub apply_success_total: IntCounter,
    pub apply_failure_total: IntCounter,
    pub rollback_total: IntCounter,

    pub collector_uptime_seconds: IntGauge,
    pub export_success_ratio: prometheus::Gauge,

    pub api_request_duration_seconds: HistogramVec,
    pub rate_limiter_rejections_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let discovery_cycle_duration_seconds = histogram(
            "discovery_cycle_duration_seconds",
            "Time spent running a full discovery cycle",
            vec![0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0],
        )?;
        let discovery_method_duration_seconds = histogram_vec(
            "discovery_method_duration_seconds",
            "Time spent running a single discovery method",
            &["method"],
            vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0],
        )?;
        let discovery_method_errors_total = counter_vec(
            "discovery_method_errors_total",
            "Discovery method failures",
            &["method"],
        )?;

        let generation_duration_seconds = histogram(
            "generation_duration_seconds",
            "Time spent rendering and signing a candidate configuration",
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
        )?;

        let apply_success_total = counter("apply_success_total", "Successful blue-green swaps")?;
        let apply_failure_total = counter("apply_failure_total", "Failed blue-green swaps")?;
        let rollback_total = counter("rollback_total", "Rollbacks performed after a failed apply")?;

        let collector_uptime_seconds = int_gauge(
            "collector_uptime_seconds",
            "Uptime of the currently active Collector process",
        )?;
        let export_success_ratio = gauge(
            "export_success_ratio",
            "Ratio of successful exports reported by the Collector's own metrics",
        )?;

        let api_request_duration_seconds = histogram_vec(
            "api_request_duration_seconds",
            "Control API request duration",
            &["route", "method"],
            vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
        )?;
        let rate_limiter_rejections_total = counter_vec(
            "rate_limiter_rejections_total",
            "Requests rejected by the rate limiter",
            &["route"],
        )?;

        macro_rules! register {
            ($metric:expr) => {
                registry
                    .register(Box::new($metric.clone()))
                    .map_err(|err| TelemetryError::RegistrationFailed(stringify!($metric).to_string(), err.to_string()))?;
            };
        }
        register!(discovery_cycle_duration_seconds);
        register!(discovery_method_duration_seconds);
        register!(discovery_method_errors_total);
        register!(generation_duration_seconds);
        register!(apply_success_total);
        register!(apply_failure_total);
        register!(rollback_total);
        register!(collector_uptime_seconds);
        register!(export_success_ratio);
        register!(api_request_duration_seconds);
        register!(rate_limiter_rejections_total);

        Ok(Self {
            registry,
            discovery_cycle_duration_seconds,
            discovery_method_duration_seconds,
            discovery_method_errors_total,
            generation_duration_seconds,
            apply_success_total,
            apply_failure_total,
            rollback_total,
            collector_uptime_seconds,
            export_success_ratio,
            api_request_duration_seconds,
            rate_limiter_rejections_total,
        })
    }

    /// Renders every registered metric in the Prometheus text exposition
    /// format, for the `/metrics` handler.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| TelemetryError::EncodingFailed(err.to_string()))?;
        String::from_utf8(buffer).map_err(|err| TelemetryError::EncodingFailed(err.to_string()))
    }
}

fn histogram(name: &str, help: &str, buckets: Vec<f64>) -> Result<Histogram, TelemetryError> {
    Histogram::with_opts(HistogramOpts::new(name, help).namespace(NAMESPACE).buckets(buckets))
        .map_err(|err| TelemetryError::RegistrationFailed(name.to_string(), err.to_string()))
}

fn histogram_vec(name: &str, help: &str, labels: &[&str], buckets: Vec<f64>) -> Result<HistogramVec, TelemetryError> {
    HistogramVec::new(
        HistogramOpts::new(name, help).namespace(NAMESPACE).buckets(buckets),
        labels,
    )
    .map_err(|err| TelemetryError::RegistrationFailed(name.to_string(), err.to_string()))
}

fn counter(name: &str, help: &str) -> Result<IntCounter, TelemetryError> {
    IntCounter::with_opts(Opts::new(name, help).namespace(NAMESPACE))
        .map_err(|err| TelemetryError::RegistrationFailed(name.to_string(), err.to_string()))
}

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> Result<IntCounterVec, TelemetryError> {
    IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)
        .map_err(|err| TelemetryError::RegistrationFailed(name.to_string(), err.to_string()))
}

fn int_gauge(name: &str, help: &str) -> Result<IntGauge, TelemetryError> {
    IntGauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))
        .map_err(|err| TelemetryError::RegistrationFailed(name.to_string(), err.to_string()))
}

fn gauge(name: &str, help: &str) -> Result<prometheus::Gauge, TelemetryError> {
    prometheus::Gauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))
        .map_err(|err| TelemetryError::RegistrationFailed(name.to_string(), err.to_string()))
}

/// Convenience alias for the shared handle every subsystem holds.
pub type SharedMetrics = Arc<Metrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_registers_every_metric_without_name_collisions() {
        Metrics::new().unwrap();
    }

    #[test]
    fn encode_produces_exposition_text_containing_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.apply_success_total.inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("nrdot_host_apply_success_total"));
    }

    #[test]
    fn per_method_labels_are_independent() {
        let metrics = Metrics::new().unwrap();
        metrics
            .discovery_method_errors_total
            .with_label_values(&["port_scan"])
            .inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("method=\"port_scan\""));
    }
}
