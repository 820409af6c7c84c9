//! Per-target scrape step with failure isolation.
//!
//! Architecture:
//! 1. Expand the selected collectors × targets into independent units
//! 2. Run units on a bounded set of scoped worker threads
//! 3. Per unit: run command → decode → collect, all under `catch_unwind`
//! 4. Emit `ipmi_up` and `ipmi_collector_duration_seconds` for every unit
//! 5. Keep cumulative success/failure counts per collector
//!
//! A failing unit never affects its siblings: its error is logged, recorded
//! in the [`ScrapeReport`] and counted, and the scrape moves on.

use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::collector::{Collector, CollectorName};
use crate::config::DEFAULT_MAX_CONCURRENCY;
use crate::decode::decode_raw_octets;
use crate::descriptors::Descriptors;
use crate::error::{CollectError, ErrorKind};
use crate::metric::{MetricSample, MetricSink, metric_stream};
use crate::runner::CommandRunner;
use crate::target::Target;

/// Result of one (collector, target) invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub collector: CollectorName,
    pub target: String,
    /// Samples emitted by the collector itself (0 on error).
    pub emitted: usize,
    pub error: Option<CollectError>,
    pub duration: Duration,
}

impl UnitOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything one scrape produced.
#[derive(Debug, Default)]
pub struct ScrapeReport {
    pub samples: Vec<MetricSample>,
    /// One entry per unit, in collector-major order.
    pub outcomes: Vec<UnitOutcome>,
}

impl ScrapeReport {
    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.len() - self.successes()
    }
}

/// Cumulative invocation counts of one collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    pub name: String,
    pub successes: u64,
    pub failures: u64,
}

/// Runtime state for a registered collector.
struct CollectorState {
    collector: Box<dyn Collector>,
    successes: AtomicU64,
    failures: AtomicU64,
}

/// Runs collectors against targets.
pub struct Scraper {
    collectors: Vec<CollectorState>,
    runner: Arc<dyn CommandRunner>,
    descriptors: Arc<Descriptors>,
    max_concurrency: usize,
}

impl Scraper {
    pub fn new(
        collectors: Vec<Box<dyn Collector>>,
        runner: Arc<dyn CommandRunner>,
        descriptors: Arc<Descriptors>,
    ) -> Self {
        Self {
            collectors: collectors
                .into_iter()
                .map(|collector| CollectorState {
                    collector,
                    successes: AtomicU64::new(0),
                    failures: AtomicU64::new(0),
                })
                .collect(),
            runner,
            descriptors,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound the number of units running at once (minimum 1).
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn collector_count(&self) -> usize {
        self.collectors.len()
    }

    pub fn collector_names(&self) -> Vec<CollectorName> {
        self.collectors.iter().map(|s| s.collector.name()).collect()
    }

    /// Run every registered collector against every target.
    pub fn scrape(&self, targets: &[Target]) -> ScrapeReport {
        self.scrape_states(self.collectors.iter().collect(), targets)
    }

    /// Run only the collectors whose names are in `names`.
    pub fn scrape_selected<S: AsRef<str>>(&self, names: &[S], targets: &[Target]) -> ScrapeReport {
        let selected = self
            .collectors
            .iter()
            .filter(|s| names.iter().any(|n| s.collector.name() == *n.as_ref()))
            .collect();
        self.scrape_states(selected, targets)
    }

    fn scrape_states(&self, selected: Vec<&CollectorState>, targets: &[Target]) -> ScrapeReport {
        let units: Vec<(&CollectorState, &Target)> = selected
            .iter()
            .flat_map(|state| targets.iter().map(move |target| (*state, target)))
            .collect();
        if units.is_empty() {
            return ScrapeReport::default();
        }

        let (sink, stream) = metric_stream();
        let next = AtomicUsize::new(0);
        let workers = self.max_concurrency.min(units.len());

        let finished: Mutex<Vec<(usize, UnitOutcome)>> =
            Mutex::new(Vec::with_capacity(units.len()));
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let sink = sink.clone();
                    let units = &units;
                    let next = &next;
                    let finished = &finished;
                    s.spawn(move || {
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some((state, target)) = units.get(i) else {
                                break;
                            };
                            let outcome = self.run_unit(state, target, &sink);
                            finished
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push((i, outcome));
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    log::error!("scrape worker panicked outside a unit");
                }
            }
        });
        let mut indexed = finished.into_inner().unwrap_or_else(PoisonError::into_inner);
        indexed.sort_by_key(|(i, _)| *i);

        ScrapeReport {
            samples: stream.drain(),
            outcomes: indexed.into_iter().map(|(_, o)| o).collect(),
        }
    }

    fn run_unit(&self, state: &CollectorState, target: &Target, sink: &MetricSink) -> UnitOutcome {
        let collector = state.collector.as_ref();
        let name = collector.name();
        let t0 = Instant::now();

        // A panic in the runner or the collector stays inside this unit.
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let raw = self.runner.run(collector.command(), target)?;
            let octets = decode_raw_octets(&raw).map_err(|source| {
                log::error!("{name}: failed to decode response from {target}: {source}");
                CollectError::Decode {
                    target: target.name().to_string(),
                    source,
                }
            })?;
            collector.collect(&octets, sink, target)
        }))
        .unwrap_or_else(|_| {
            log::error!("{name}: panicked while scraping {target}");
            Err(CollectError::Panicked {
                collector: name.to_string(),
                target: target.name().to_string(),
            })
        });
        let duration = t0.elapsed();

        let (emitted, error) = match result {
            Ok(n) => {
                state.successes.fetch_add(1, Ordering::Relaxed);
                log::debug!("{name}: {n} samples from {target} in {duration:?}");
                (n, None)
            }
            Err(e) => {
                state.failures.fetch_add(1, Ordering::Relaxed);
                if e.kind() == ErrorKind::Execution {
                    log::warn!("{name}: {e}");
                } else {
                    log::debug!("{name}: {} failure for {target}: {e}", e.kind());
                }
                (0, Some(e))
            }
        };

        let up = if error.is_none() { 1.0 } else { 0.0 };
        let meta = [
            MetricSample::new(&self.descriptors.up, up, &[name.as_str()], target),
            MetricSample::new(
                &self.descriptors.collector_duration,
                duration.as_secs_f64(),
                &[name.as_str()],
                target,
            ),
        ]
        .into_iter()
        .collect::<Result<Vec<_>, _>>();
        match meta.and_then(|samples| sink.emit(samples)) {
            Ok(_) => {}
            Err(e) => log::warn!("{name}: cannot emit scrape metadata for {target}: {e}"),
        }

        UnitOutcome {
            collector: name,
            target: target.name().to_string(),
            emitted,
            error,
            duration,
        }
    }

    /// Cumulative success/failure counts per collector.
    pub fn stats(&self) -> Vec<CollectorStats> {
        self.collectors
            .iter()
            .map(|s| CollectorStats {
                name: s.collector.name().to_string(),
                successes: s.successes.load(Ordering::Relaxed),
                failures: s.failures.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// `ipmi_exporter_collector_failures_total` samples for every collector.
    pub fn failure_samples(&self) -> Vec<MetricSample> {
        let exporter = Target::local();
        self.collectors
            .iter()
            .filter_map(|s| {
                let name = s.collector.name();
                MetricSample::new(
                    &self.descriptors.collector_failures,
                    s.failures.load(Ordering::Relaxed) as f64,
                    &[name.as_str()],
                    &exporter,
                )
                .ok()
            })
            .collect()
    }
}
