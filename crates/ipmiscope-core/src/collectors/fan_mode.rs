//! SmFanModeCollector: reads the fan control mode of a Supermicro BMC
//! through the OEM command `0x30 0x45 0x00`.

use std::sync::Arc;

use crate::collector::{Collector, CollectorInfo, CollectorName, CommandSpec};
use crate::decode::Octets;
use crate::descriptors::Descriptors;
use crate::error::{CollectError, ExpectedLen};
use crate::metric::{MetricSample, MetricSink};
use crate::target::Target;

use super::helpers::{IPMI_RAW, expect_len, octet_value, unexpected};

pub const NAME: CollectorName = CollectorName::new("sm-fan-mode");

const RESPONSE_LEN: ExpectedLen = ExpectedLen::Exactly(3);

static SM_FAN_MODE_INFO: CollectorInfo = CollectorInfo {
    name: NAME,
    description: "Supermicro fan mode (standard, full, optimal or heavy IO)",
    command: CommandSpec {
        program: IPMI_RAW,
        args: &["0x0", "0x30", "0x45", "0x00"],
    },
};

pub struct SmFanModeCollector {
    descriptors: Arc<Descriptors>,
}

impl SmFanModeCollector {
    pub fn new(descriptors: Arc<Descriptors>) -> Self {
        Self { descriptors }
    }
}

impl Collector for SmFanModeCollector {
    fn info(&self) -> &CollectorInfo {
        &SM_FAN_MODE_INFO
    }

    fn collect(
        &self,
        octets: &Octets,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError> {
        expect_len(NAME, octets, RESPONSE_LEN, target)?;

        let last = octets.len() - 1;
        // 03 is not assigned by the firmware.
        let mode = match octets.get(last) {
            Some("00" | "01" | "02" | "04") => octet_value(octets, last),
            other => {
                return Err(unexpected(
                    NAME,
                    "fan mode",
                    other.unwrap_or_default(),
                    target,
                ));
            }
        };

        let sample = MetricSample::new(&self.descriptors.fan_mode, mode, &[], target)?;
        sink.emit(vec![sample])
    }
}
