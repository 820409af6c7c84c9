//! PowerOnHoursCollector: Get POH Counter (NetFn Chassis, cmd 0x0F).
//!
//! Response: command, completion code, minutes per count, then a 32-bit
//! counter in little-endian order.

use std::sync::Arc;

use crate::collector::{Collector, CollectorInfo, CollectorName, CommandSpec};
use crate::decode::Octets;
use crate::descriptors::Descriptors;
use crate::error::{CollectError, ExpectedLen};
use crate::metric::{MetricSample, MetricSink};
use crate::target::Target;

use super::helpers::{IPMI_RAW, expect_completion_ok, expect_len, unexpected};

pub const NAME: CollectorName = CollectorName::new("poh-counter");

const RESPONSE_LEN: ExpectedLen = ExpectedLen::Exactly(7);

const MINUTES_PER_COUNT: usize = 2;
const COUNTER: usize = 3;

static POH_COUNTER_INFO: CollectorInfo = CollectorInfo {
    name: NAME,
    description: "Power-on hours counter, exported in seconds",
    command: CommandSpec {
        program: IPMI_RAW,
        args: &["0x0", "0x00", "0x0f"],
    },
};

pub struct PowerOnHoursCollector {
    descriptors: Arc<Descriptors>,
}

impl PowerOnHoursCollector {
    pub fn new(descriptors: Arc<Descriptors>) -> Self {
        Self { descriptors }
    }
}

impl Collector for PowerOnHoursCollector {
    fn info(&self) -> &CollectorInfo {
        &POH_COUNTER_INFO
    }

    fn collect(
        &self,
        octets: &Octets,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError> {
        expect_len(NAME, octets, RESPONSE_LEN, target)?;
        expect_completion_ok(NAME, octets, target)?;

        let minutes = octets.byte(MINUTES_PER_COUNT).unwrap_or_default();
        if minutes == 0 {
            return Err(unexpected(
                NAME,
                "minutes per count",
                octets.get(MINUTES_PER_COUNT).unwrap_or_default(),
                target,
            ));
        }

        let mut counter = [0u8; 4];
        for (i, byte) in counter.iter_mut().enumerate() {
            *byte = octets.byte(COUNTER + i).unwrap_or_default();
        }
        let counts = u32::from_le_bytes(counter);
        let seconds = f64::from(counts) * f64::from(minutes) * 60.0;

        let sample = MetricSample::new(&self.descriptors.power_on_seconds, seconds, &[], target)?;
        sink.emit(vec![sample])
    }
}
