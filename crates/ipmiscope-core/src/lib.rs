//! # ipmiscope-core
//!
//! Collector plugin model for an IPMI metrics exporter.
//!
//! Each collector names one FreeIPMI command, decodes the raw octets the BMC
//! sends back and emits typed samples under a fixed set of metric
//! descriptors. A malformed or unexpected response fails that collector for
//! that target only; every other collector in the scrape carries on.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use ipmiscope_core::{Descriptors, FreeIpmiRunner, Scraper, Target, all_collectors, encode_text};
//!
//! let descriptors = Arc::new(Descriptors::new().unwrap());
//! let scraper = Scraper::new(
//!     all_collectors(&descriptors),
//!     Arc::new(FreeIpmiRunner::new()),
//!     descriptors,
//! );
//! let report = scraper.scrape(&[Target::remote("10.0.0.17")]);
//! println!("{}", encode_text(&report.samples).unwrap());
//! ```
//!
//! ## Architecture
//!
//! Command → RawResult → decode → Octets → Collector → MetricSink → exposition
//!
//! Every collector implements the [`Collector`] trait. The [`Scraper`] runs
//! the selected collectors against the selected targets, isolates failures
//! and reports `ipmi_up` per collector.

pub mod collector;
pub mod collectors;
pub mod config;
pub mod decode;
pub mod descriptors;
pub mod error;
pub mod exposition;
pub mod metric;
pub mod runner;
pub mod scrape;
pub mod target;

pub use collector::{Collector, CollectorInfo, CollectorName, CommandSpec};
pub use collectors::{COLLECTOR_NAMES, all_collectors, collectors_by_name, lookup_name};
pub use config::{ConfigError, DEFAULT_MODULE, ExporterConfig, ModuleConfig, load_config_from_path};
pub use decode::{Octets, RawResult, decode_raw_octets};
pub use descriptors::{DescriptorError, Descriptors, MetricDescriptor, MetricKind, NAMESPACE};
pub use error::{CollectError, DecodeError, ErrorKind, ExpectedLen};
pub use exposition::{CONTENT_TYPE, encode_text};
pub use metric::{MetricSample, MetricSink, MetricStream, metric_stream};
pub use runner::{CommandRunner, DEFAULT_COMMAND_TIMEOUT, FreeIpmiRunner};
pub use scrape::{CollectorStats, ScrapeReport, Scraper, UnitOutcome};
pub use target::{LOCAL_TARGET_NAME, Target};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
