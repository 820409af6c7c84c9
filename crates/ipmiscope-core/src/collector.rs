//! Collector contract and metadata.
//!
//! Every collector implements the [`Collector`] trait: it declares one
//! external command via [`CollectorInfo`] and turns the decoded response of
//! that command into metric samples.

use std::fmt;

use crate::decode::Octets;
use crate::error::CollectError;
use crate::metric::MetricSink;
use crate::target::Target;

/// Unique identifier of a collector within the process (e.g. `"sm-lan-mode"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectorName(&'static str);

impl CollectorName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for CollectorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.0)
    }
}

impl AsRef<str> for CollectorName {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl PartialEq<str> for CollectorName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// External program and fixed arguments a collector needs run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: &'static str,
    pub args: &'static [&'static str],
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program)?;
        for arg in self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Metadata about a collector.
#[derive(Debug, Clone)]
pub struct CollectorInfo {
    /// Unique identifier (e.g. `"sm-lan-mode"`).
    pub name: CollectorName,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Command whose output [`Collector::collect`] decodes.
    pub command: CommandSpec,
}

/// Trait that every collector must implement.
///
/// Implementations hold no per-call mutable state, so one instance can serve
/// concurrent invocations for different targets.
pub trait Collector: Send + Sync {
    /// Collector metadata.
    fn info(&self) -> &CollectorInfo;

    /// Turn the decoded response for `target` into samples on `sink`.
    ///
    /// Returns the number of samples emitted. An `Err` means nothing was
    /// emitted for this invocation; malformed input must surface here and
    /// never as a panic.
    fn collect(
        &self,
        octets: &Octets,
        sink: &MetricSink,
        target: &Target,
    ) -> Result<usize, CollectError>;

    /// Convenience: name from info.
    fn name(&self) -> CollectorName {
        self.info().name
    }

    /// Convenience: command from info.
    fn command(&self) -> &CommandSpec {
        &self.info().command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_spec_display() {
        let spec = CommandSpec {
            program: "ipmi-raw",
            args: &["0x0", "0x30", "0x70", "0x0c", "0"],
        };
        assert_eq!(spec.to_string(), "ipmi-raw 0x0 0x30 0x70 0x0c 0");
    }

    #[test]
    fn collector_name_compares_with_str() {
        let name = CollectorName::new("sm-lan-mode");
        assert!(name == *"sm-lan-mode");
        assert_eq!(name.to_string(), "sm-lan-mode");
    }
}
