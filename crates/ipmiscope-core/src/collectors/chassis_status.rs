//! ChassisStatusCollector: Get Chassis Status (NetFn Chassis, cmd 0x01).
//!
//! Response: command, completion code, current power state, last power
//! event, misc chassis state and an optional front panel capability byte.

use std::sync::Arc;

use crate::collector::{Collector, CollectorInfo, CollectorName, CommandSpec};
use crate::decode::Octets;
use crate::descriptors::Descriptors;
use crate::error::{CollectError, ExpectedLen};
use crate::metric::{MetricSample, MetricSink};
use crate::target::Target;

use super::helpers::{IPMI_RAW, expect_completion_ok, expect_len};

pub const NAME: CollectorName = CollectorName::new("chassis-status");

const RESPONSE_LEN: ExpectedLen = ExpectedLen::Between(5, 6);

const CURRENT_POWER_STATE: usize = 2;
const MISC_CHASSIS_STATE: usize = 4;

const POWER_ON: u8 = 1 << 0;
const MAIN_POWER_FAULT: u8 = 1 << 3;
const POWER_CONTROL_FAULT: u8 = 1 << 4;
const COOLING_FAULT: u8 = 1 << 3;

static CHASSIS_STATUS_INFO: CollectorInfo = CollectorInfo {
    name: NAME,
    description: "Chassis power state plus power and cooling fault flags",
    command: CommandSpec {
        program: IPMI_RAW,
        args: &["0x0", "0x00", "0x01"],
    },
};

pub struct ChassisStatusCollector {
    descriptors: Arc<Descriptors>,
}

impl ChassisStatusCollector {
    pub fn new(descriptors: Arc<Descriptors>) -> Self {
        Self { descriptors }
    }
}

fn flag(byte: u8, mask: u8) -> f64 {
    if byte & mask != 0 { 1.0 } else { 0.0 }
}

impl Collector for ChassisStatusCollector {
    fn info(&self) -> &CollectorInfo {
        &CHASSIS_STATUS_INFO
    }

    fn collect(
        &self,
        octets: &Octets,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError> {
        expect_len(NAME, octets, RESPONSE_LEN, target)?;
        expect_completion_ok(NAME, octets, target)?;

        let power = octets.byte(CURRENT_POWER_STATE).unwrap_or_default();
        let misc = octets.byte(MISC_CHASSIS_STATE).unwrap_or_default();

        let d = &self.descriptors;
        let samples = vec![
            MetricSample::new(&d.chassis_power_state, flag(power, POWER_ON), &[], target)?,
            MetricSample::new(
                &d.chassis_power_fault,
                flag(power, MAIN_POWER_FAULT | POWER_CONTROL_FAULT),
                &[],
                target,
            )?,
            MetricSample::new(&d.chassis_cooling_fault, flag(misc, COOLING_FAULT), &[], target)?,
        ];
        sink.emit(samples)
    }
}
