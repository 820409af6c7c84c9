//! BmcSelfTestCollector: Get Self Test Results (NetFn App, cmd 0x04).
//!
//! Response: command, completion code, result code, detail byte. Only the
//! four result codes defined for all controllers are accepted; device
//! specific codes are rejected rather than guessed at.

use std::sync::Arc;

use crate::collector::{Collector, CollectorInfo, CollectorName, CommandSpec};
use crate::decode::Octets;
use crate::descriptors::Descriptors;
use crate::error::{CollectError, ExpectedLen};
use crate::metric::{MetricSample, MetricSink};
use crate::target::Target;

use super::helpers::{IPMI_RAW, expect_completion_ok, expect_len, unexpected};

pub const NAME: CollectorName = CollectorName::new("bmc-self-test");

const RESPONSE_LEN: ExpectedLen = ExpectedLen::Exactly(4);

const RESULT: usize = 2;

static BMC_SELF_TEST_INFO: CollectorInfo = CollectorInfo {
    name: NAME,
    description: "BMC self test result",
    command: CommandSpec {
        program: IPMI_RAW,
        args: &["0x0", "0x06", "0x04"],
    },
};

pub struct BmcSelfTestCollector {
    descriptors: Arc<Descriptors>,
}

impl BmcSelfTestCollector {
    pub fn new(descriptors: Arc<Descriptors>) -> Self {
        Self { descriptors }
    }
}

impl Collector for BmcSelfTestCollector {
    fn info(&self) -> &CollectorInfo {
        &BMC_SELF_TEST_INFO
    }

    fn collect(
        &self,
        octets: &Octets,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError> {
        expect_len(NAME, octets, RESPONSE_LEN, target)?;
        expect_completion_ok(NAME, octets, target)?;

        let (passed, result) = match octets.get(RESULT) {
            Some("55") => (1.0, "no_error"),
            Some("56") => (1.0, "not_implemented"),
            Some("57") => (0.0, "corrupted_or_inaccessible"),
            Some("58") => (0.0, "fatal_hardware"),
            other => {
                return Err(unexpected(
                    NAME,
                    "self test result",
                    other.unwrap_or_default(),
                    target,
                ));
            }
        };

        let sample =
            MetricSample::new(&self.descriptors.self_test_passed, passed, &[result], target)?;
        sink.emit(vec![sample])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{RawResult, decode_raw_octets};
    use crate::error::ErrorKind;
    use crate::metric::metric_stream;

    fn run(raw: &str) -> (Result<usize, CollectError>, Vec<MetricSample>) {
        let collector = BmcSelfTestCollector::new(Arc::new(Descriptors::new().unwrap()));
        let octets = decode_raw_octets(&RawResult::from(raw)).unwrap();
        let (sink, stream) = metric_stream();
        let result = collector.collect(&octets, &sink, &Target::remote("bmc-7"));
        (result, stream.drain())
    }

    #[test]
    fn no_error_passes() {
        let (result, samples) = run("rcvd: 04 00 55 00");
        assert_eq!(result, Ok(1));
        assert_eq!(samples[0].value(), 1.0);
        assert_eq!(samples[0].label_values(), ["no_error".to_string()]);
        assert_eq!(samples[0].target(), "bmc-7");
    }

    #[test]
    fn fatal_hardware_fails_with_label() {
        let (_, samples) = run("04 00 58 02");
        assert_eq!(samples[0].value(), 0.0);
        assert_eq!(
            samples[0].labels().collect::<Vec<_>>(),
            vec![("result", "fatal_hardware")]
        );
    }

    #[test]
    fn device_specific_codes_are_rejected() {
        for raw in ["04 00 01 00", "04 00 FF 00", "04 00 54 00"] {
            let (result, samples) = run(raw);
            assert_eq!(result.unwrap_err().kind(), ErrorKind::Classification, "{raw}");
            assert!(samples.is_empty());
        }
    }

    #[test]
    fn detail_byte_is_required() {
        let (result, _) = run("04 00 55");
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Shape);
    }
}
