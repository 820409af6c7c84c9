//! Process-wide metric descriptor registry.
//!
//! Descriptors are built once at startup by [`Descriptors::new`] and shared
//! read-only (`Arc<Descriptors>`) with every collector and the scrape step.
//! Names follow `<namespace>_<subsystem>_<name>`; an empty subsystem is
//! elided.

use std::fmt;
use std::sync::Arc;

use prometheus::Opts;
use prometheus::core::{Desc, Describer};

/// Namespace prefix of every exported metric.
pub const NAMESPACE: &str = "ipmi";

/// Value semantics of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Point-in-time value, overwritten on every scrape.
    Gauge,
    /// Monotonically increasing value.
    Counter,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
        })
    }
}

/// Invalid descriptor definition. Only possible at startup.
#[derive(Debug, thiserror::Error)]
#[error("invalid metric descriptor {name}: {source}")]
pub struct DescriptorError {
    name: String,
    #[source]
    source: prometheus::Error,
}

/// Immutable identity and schema of one kind of measurement.
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    desc: Desc,
    kind: MetricKind,
}

impl MetricDescriptor {
    pub fn new(
        subsystem: &str,
        name: &str,
        help: &str,
        label_names: &[&str],
        kind: MetricKind,
    ) -> Result<Self, DescriptorError> {
        let desc = Opts::new(name, help)
            .namespace(NAMESPACE)
            .subsystem(subsystem)
            .variable_labels(label_names.iter().map(|l| l.to_string()).collect())
            .describe()
            .map_err(|source| DescriptorError {
                name: name.to_string(),
                source,
            })?;
        Ok(Self { desc, kind })
    }

    /// Fully-qualified metric name, e.g. `ipmi_config_lan_mode`.
    pub fn fq_name(&self) -> &str {
        &self.desc.fq_name
    }

    pub fn help(&self) -> &str {
        &self.desc.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.desc.variable_labels
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }
}

// Descriptors are identified by name; the prometheus `Desc` ids are derived
// from it.
impl PartialEq for MetricDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.fq_name() == other.fq_name() && self.kind == other.kind
    }
}

/// Every descriptor a collector or the scrape step can emit under.
#[derive(Debug)]
pub struct Descriptors {
    pub lan_mode: Arc<MetricDescriptor>,
    pub fan_mode: Arc<MetricDescriptor>,
    pub chassis_power_state: Arc<MetricDescriptor>,
    pub chassis_power_fault: Arc<MetricDescriptor>,
    pub chassis_cooling_fault: Arc<MetricDescriptor>,
    pub power_on_seconds: Arc<MetricDescriptor>,
    pub self_test_passed: Arc<MetricDescriptor>,

    pub up: Arc<MetricDescriptor>,
    pub collector_duration: Arc<MetricDescriptor>,
    pub collector_failures: Arc<MetricDescriptor>,
}

impl Descriptors {
    pub fn new() -> Result<Self, DescriptorError> {
        use MetricKind::{Counter, Gauge};

        let d = |subsystem: &str, name: &str, help: &str, labels: &[&str], kind| {
            MetricDescriptor::new(subsystem, name, help, labels, kind).map(Arc::new)
        };

        Ok(Self {
            lan_mode: d(
                "config",
                "lan_mode",
                "Returns configured LAN mode (0=dedicated, 1=shared, 2=failover).",
                &[],
                Gauge,
            )?,
            fan_mode: d(
                "config",
                "fan_mode",
                "Returns configured fan mode (0=standard, 1=full, 2=optimal, 4=heavy_io).",
                &[],
                Gauge,
            )?,
            chassis_power_state: d(
                "chassis",
                "power_state",
                "Current chassis power state (1=on, 0=off).",
                &[],
                Gauge,
            )?,
            chassis_power_fault: d(
                "chassis",
                "power_fault",
                "Main power or power control fault detected (1=fault, 0=ok).",
                &[],
                Gauge,
            )?,
            chassis_cooling_fault: d(
                "chassis",
                "cooling_fault",
                "Cooling or fan fault detected (1=fault, 0=ok).",
                &[],
                Gauge,
            )?,
            power_on_seconds: d(
                "chassis",
                "power_on_seconds_total",
                "Accumulated time the system has been powered on, from the POH counter.",
                &[],
                Counter,
            )?,
            self_test_passed: d(
                "bmc",
                "self_test_passed",
                "BMC self test outcome (1=no error reported, 0=failure described by the result label).",
                &["result"],
                Gauge,
            )?,
            up: d(
                "",
                "up",
                "'1' if a scrape of the IPMI device was successful, '0' otherwise.",
                &["collector"],
                Gauge,
            )?,
            collector_duration: d(
                "",
                "collector_duration_seconds",
                "Time spent running and decoding one collector's command.",
                &["collector"],
                Gauge,
            )?,
            collector_failures: d(
                "exporter",
                "collector_failures_total",
                "Failed collector invocations since the exporter started.",
                &["collector"],
                Counter,
            )?,
        })
    }

    pub fn all(&self) -> Vec<&Arc<MetricDescriptor>> {
        vec![
            &self.lan_mode,
            &self.fan_mode,
            &self.chassis_power_state,
            &self.chassis_power_fault,
            &self.chassis_cooling_fault,
            &self.power_on_seconds,
            &self.self_test_passed,
            &self.up,
            &self.collector_duration,
            &self.collector_failures,
        ]
    }

    /// Find a descriptor by its fully-qualified name.
    pub fn lookup(&self, fq_name: &str) -> Option<&Arc<MetricDescriptor>> {
        self.all().into_iter().find(|d| d.fq_name() == fq_name)
    }
}
