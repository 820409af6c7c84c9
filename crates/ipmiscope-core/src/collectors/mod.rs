//! Built-in collectors, one per `ipmi-raw` command.

pub mod helpers;

pub mod chassis_status;
pub mod fan_mode;
pub mod lan_mode;
pub mod power_on_hours;
pub mod self_test;

use std::sync::Arc;

use crate::collector::{Collector, CollectorName};
use crate::descriptors::Descriptors;

/// Names of every built-in collector, in registration order.
pub const COLLECTOR_NAMES: &[CollectorName] = &[
    lan_mode::NAME,
    fan_mode::NAME,
    chassis_status::NAME,
    power_on_hours::NAME,
    self_test::NAME,
];

/// All collector constructors. Each returns a boxed collector sharing
/// `descriptors`.
pub fn all_collectors(descriptors: &Arc<Descriptors>) -> Vec<Box<dyn Collector>> {
    vec![
        // Supermicro OEM
        Box::new(lan_mode::SmLanModeCollector::new(Arc::clone(descriptors))),
        Box::new(fan_mode::SmFanModeCollector::new(Arc::clone(descriptors))),
        // Chassis
        Box::new(chassis_status::ChassisStatusCollector::new(Arc::clone(descriptors))),
        Box::new(power_on_hours::PowerOnHoursCollector::new(Arc::clone(descriptors))),
        // BMC
        Box::new(self_test::BmcSelfTestCollector::new(Arc::clone(descriptors))),
    ]
}

/// Resolve a collector name to its canonical [`CollectorName`].
pub fn lookup_name(name: &str) -> Option<CollectorName> {
    COLLECTOR_NAMES.iter().copied().find(|n| *n == *name)
}

/// Build the collectors named in `names`, in the given order.
///
/// Unknown names are skipped; configuration loading rejects them earlier.
pub fn collectors_by_name<S: AsRef<str>>(
    names: &[S],
    descriptors: &Arc<Descriptors>,
) -> Vec<Box<dyn Collector>> {
    let mut all = all_collectors(descriptors);
    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        if let Some(pos) = all.iter().position(|c| c.name() == *name.as_ref()) {
            selected.push(all.swap_remove(pos));
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_match_constructors() {
        let descriptors = Arc::new(Descriptors::new().unwrap());
        let names: Vec<_> = all_collectors(&descriptors)
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, COLLECTOR_NAMES);
    }

    #[test]
    fn names_are_unique() {
        let unique: HashSet<_> = COLLECTOR_NAMES.iter().collect();
        assert_eq!(unique.len(), COLLECTOR_NAMES.len());
    }

    #[test]
    fn every_collector_runs_ipmi_raw() {
        let descriptors = Arc::new(Descriptors::new().unwrap());
        for c in all_collectors(&descriptors) {
            assert_eq!(c.command().program, "ipmi-raw", "{}", c.name());
            assert!(!c.command().args.is_empty());
            assert!(!c.info().description.is_empty());
        }
    }

    #[test]
    fn select_by_name_keeps_order_and_skips_unknown() {
        let descriptors = Arc::new(Descriptors::new().unwrap());
        let selected = collectors_by_name(&["poh-counter", "nope", "sm-lan-mode"], &descriptors);
        let names: Vec<_> = selected.iter().map(|c| c.name().as_str()).collect();
        assert_eq!(names, vec!["poh-counter", "sm-lan-mode"]);
    }

    #[test]
    fn lookup_name_finds_builtin() {
        assert_eq!(lookup_name("chassis-status"), Some(chassis_status::NAME));
        assert_eq!(lookup_name("ipmi"), None);
    }
}
