//! SmLanModeCollector: reads the configured LAN mode of a Supermicro BMC
//! through the OEM command `0x30 0x70 0x0c`.
//!
//! The response is three octets; the last one is the mode.

use std::sync::Arc;

use crate::collector::{Collector, CollectorInfo, CollectorName, CommandSpec};
use crate::decode::Octets;
use crate::descriptors::Descriptors;
use crate::error::{CollectError, ExpectedLen};
use crate::metric::{MetricSample, MetricSink};
use crate::target::Target;

use super::helpers::{IPMI_RAW, expect_len, octet_value, unexpected};

pub const NAME: CollectorName = CollectorName::new("sm-lan-mode");

const RESPONSE_LEN: ExpectedLen = ExpectedLen::Exactly(3);

static SM_LAN_MODE_INFO: CollectorInfo = CollectorInfo {
    name: NAME,
    description: "Supermicro LAN mode (dedicated, shared or failover)",
    command: CommandSpec {
        program: IPMI_RAW,
        args: &["0x0", "0x30", "0x70", "0x0c", "0"],
    },
};

pub struct SmLanModeCollector {
    descriptors: Arc<Descriptors>,
}

impl SmLanModeCollector {
    pub fn new(descriptors: Arc<Descriptors>) -> Self {
        Self { descriptors }
    }
}

impl Collector for SmLanModeCollector {
    fn info(&self) -> &CollectorInfo {
        &SM_LAN_MODE_INFO
    }

    fn collect(
        &self,
        octets: &Octets,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError> {
        expect_len(NAME, octets, RESPONSE_LEN, target)?;

        let last = octets.len() - 1;
        let mode = match octets.get(last) {
            Some("00" | "01" | "02") => octet_value(octets, last),
            other => {
                return Err(unexpected(
                    NAME,
                    "lan mode status",
                    other.unwrap_or_default(),
                    target,
                ));
            }
        };

        let sample = MetricSample::new(&self.descriptors.lan_mode, mode, &[], target)?;
        sink.emit(vec![sample])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{RawResult, decode_raw_octets};
    use crate::error::ErrorKind;
    use crate::metric::metric_stream;

    fn collector() -> SmLanModeCollector {
        SmLanModeCollector::new(Arc::new(Descriptors::new().unwrap()))
    }

    fn run(raw: &str) -> (Result<usize, CollectError>, Vec<MetricSample>) {
        let octets = decode_raw_octets(&RawResult::from(raw)).unwrap();
        let (sink, stream) = metric_stream();
        let result = collector().collect(&octets, &sink, &Target::remote("bmc-01"));
        (result, stream.drain())
    }

    #[test]
    fn sm_lan_mode_info() {
        let c = collector();
        assert_eq!(c.name().as_str(), "sm-lan-mode");
        assert_eq!(c.command().to_string(), "ipmi-raw 0x0 0x30 0x70 0x0c 0");
    }

    #[test]
    fn recognized_modes_emit_one_gauge() {
        for (raw, expected) in [("0C 00 00", 0.0), ("0C 00 01", 1.0), ("0C 00 02", 2.0)] {
            let (result, samples) = run(raw);
            assert_eq!(result, Ok(1), "{raw}");
            assert_eq!(samples.len(), 1);
            assert_eq!(samples[0].fq_name(), "ipmi_config_lan_mode");
            assert_eq!(samples[0].value(), expected);
            assert!(samples[0].label_values().is_empty());
        }
    }

    #[test]
    fn leading_octets_are_not_inspected() {
        let (result, samples) = run("FF EE 01");
        assert_eq!(result, Ok(1));
        assert_eq!(samples[0].value(), 1.0);
    }

    #[test]
    fn wrong_length_is_a_shape_error() {
        for raw in ["01", "0C 00", "0C 00 01 00", "0C 00 00 00 00 00"] {
            let (result, samples) = run(raw);
            assert_eq!(result.unwrap_err().kind(), ErrorKind::Shape, "{raw}");
            assert!(samples.is_empty());
        }
    }

    #[test]
    fn unknown_mode_is_a_classification_error() {
        for raw in ["0C 00 03", "0C 00 FF", "0C 00 10"] {
            let (result, samples) = run(raw);
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Classification);
            assert!(err.to_string().contains(&raw[6..]));
            assert!(samples.is_empty());
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let first = run("0C 00 02");
        let second = run("0C 00 02");
        assert_eq!(first, second);

        let first = run("0C 00 07");
        let second = run("0C 00 07");
        assert_eq!(first.0.unwrap_err().kind(), second.0.unwrap_err().kind());
    }
}
