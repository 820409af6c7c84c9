//! Metric samples and the shared stream collectors emit them into.
//!
//! The stream is a multi-producer channel: every (collector, target)
//! invocation holds a cloned [`MetricSink`] and the scrape step drains the
//! single [`MetricStream`]. A collector hands over all of its samples in one
//! [`MetricSink::emit`] call, so a consumer never sees half of an invocation.

use std::sync::Arc;
use std::sync::mpsc;

use crate::descriptors::{MetricDescriptor, MetricKind};
use crate::error::CollectError;
use crate::target::Target;

/// One value emitted under a descriptor for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    descriptor: Arc<MetricDescriptor>,
    value: f64,
    label_values: Vec<String>,
    target: String,
}

impl MetricSample {
    /// Build a sample, checking the label values against the descriptor's
    /// label schema.
    pub fn new(
        descriptor: &Arc<MetricDescriptor>,
        value: f64,
        label_values: &[&str],
        target: &Target,
    ) -> Result<Self, CollectError> {
        if label_values.len() != descriptor.label_names().len() {
            return Err(CollectError::Labels {
                metric: descriptor.fq_name().to_string(),
                expected: descriptor.label_names().len(),
                actual: label_values.len(),
            });
        }
        Ok(Self {
            descriptor: Arc::clone(descriptor),
            value,
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
            target: target.name().to_string(),
        })
    }

    pub fn descriptor(&self) -> &Arc<MetricDescriptor> {
        &self.descriptor
    }

    pub fn fq_name(&self) -> &str {
        self.descriptor.fq_name()
    }

    pub fn kind(&self) -> MetricKind {
        self.descriptor.kind()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// `(name, value)` label pairs in schema order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.descriptor
            .label_names()
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Name of the target this sample was measured on.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Write-only handle to the shared metric stream.
#[derive(Debug, Clone)]
pub struct MetricSink {
    tx: mpsc::Sender<Vec<MetricSample>>,
}

impl MetricSink {
    /// Hand a batch of samples to the stream. Returns how many were emitted.
    pub fn emit(&self, samples: Vec<MetricSample>) -> Result<usize, CollectError> {
        let n = samples.len();
        if n == 0 {
            return Ok(0);
        }
        self.tx.send(samples).map_err(|_| CollectError::SinkClosed)?;
        Ok(n)
    }
}

/// Consumer side of the metric stream.
#[derive(Debug)]
pub struct MetricStream {
    rx: mpsc::Receiver<Vec<MetricSample>>,
}

impl MetricStream {
    /// Take every sample emitted so far without blocking.
    pub fn drain(&self) -> Vec<MetricSample> {
        self.rx.try_iter().flatten().collect()
    }
}

/// Create a connected sink/stream pair.
pub fn metric_stream() -> (MetricSink, MetricStream) {
    let (tx, rx) = mpsc::channel();
    (MetricSink { tx }, MetricStream { rx })
}
