//! Prometheus text exposition of collected samples.

use std::collections::{BTreeMap, HashSet};

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

use crate::descriptors::MetricKind;
use crate::metric::MetricSample;

/// `Content-Type` of [`encode_text`] output.
pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Render `samples` in the Prometheus text format.
///
/// Samples are grouped into one family per fully-qualified name, families
/// sorted by name, samples kept in emission order within a family.
///
/// The output carries no target label, so `samples` must describe a single
/// target (plus exporter-level series). Two samples with the same name and
/// label values are rejected rather than rendered as duplicate series.
pub fn encode_text(samples: &[MetricSample]) -> Result<String, prometheus::Error> {
    let families = metric_families(samples)?;
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

fn metric_families(samples: &[MetricSample]) -> Result<Vec<MetricFamily>, prometheus::Error> {
    let mut families: BTreeMap<&str, MetricFamily> = BTreeMap::new();
    let mut series: HashSet<(&str, &[String])> = HashSet::new();
    for sample in samples {
        if !series.insert((sample.fq_name(), sample.label_values())) {
            return Err(prometheus::Error::Msg(format!(
                "duplicate series {} {:?} (target {})",
                sample.fq_name(),
                sample.label_values(),
                sample.target()
            )));
        }
        let family = families.entry(sample.fq_name()).or_insert_with(|| {
            let mut mf = MetricFamily::default();
            mf.set_name(sample.fq_name().to_string());
            mf.set_help(sample.descriptor().help().to_string());
            mf.set_field_type(match sample.kind() {
                MetricKind::Gauge => MetricType::GAUGE,
                MetricKind::Counter => MetricType::COUNTER,
            });
            mf
        });
        family.mut_metric().push(to_metric(sample));
    }
    Ok(families.into_values().collect())
}

fn to_metric(sample: &MetricSample) -> Metric {
    let mut metric = Metric::default();
    for (name, value) in sample.labels() {
        let mut pair = LabelPair::default();
        pair.set_name(name.to_string());
        pair.set_value(value.to_string());
        metric.mut_label().push(pair);
    }
    match sample.kind() {
        MetricKind::Gauge => {
            let mut gauge = Gauge::default();
            gauge.set_value(sample.value());
            metric.set_gauge(gauge);
        }
        MetricKind::Counter => {
            let mut counter = Counter::default();
            counter.set_value(sample.value());
            metric.set_counter(counter);
        }
    }
    metric
}
