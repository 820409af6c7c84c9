//! Error taxonomy for a single (collector, target) invocation.
//!
//! Every variant is local to one invocation: the scrape step logs it, marks
//! the collector as down for that target and moves on.

use std::fmt;

/// Failure to turn raw command output into an [`Octets`](crate::decode::Octets)
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The command produced no octet tokens at all.
    #[error("empty raw response")]
    Empty,
    /// A token does not match the two-hex-digit grammar.
    #[error("invalid octet {token:?} at position {position}")]
    InvalidToken { position: usize, token: String },
}

/// Expected octet count of a collector's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedLen {
    Exactly(usize),
    Between(usize, usize),
}

impl ExpectedLen {
    pub fn matches(self, len: usize) -> bool {
        match self {
            Self::Exactly(n) => len == n,
            Self::Between(lo, hi) => (lo..=hi).contains(&len),
        }
    }
}

impl fmt::Display for ExpectedLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::Between(lo, hi) => write!(f, "{lo}..={hi}"),
        }
    }
}

/// Error class of a [`CollectError`], used to compare outcomes without
/// comparing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Execution,
    Decode,
    Shape,
    Classification,
    Labels,
    SinkClosed,
    Panicked,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execution => write!(f, "execution"),
            Self::Decode => write!(f, "decode"),
            Self::Shape => write!(f, "shape"),
            Self::Classification => write!(f, "classification"),
            Self::Labels => write!(f, "labels"),
            Self::SinkClosed => write!(f, "sink_closed"),
            Self::Panicked => write!(f, "panicked"),
        }
    }
}

/// Terminal failure of one (collector, target) invocation.
///
/// Returning any of these from [`Collector::collect`](crate::collector::Collector::collect)
/// means no sample was emitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectError {
    /// The external command could not be run or exited unsuccessfully.
    #[error("failed to run {program} against {target}: {reason}")]
    Execution {
        program: String,
        target: String,
        reason: String,
    },

    /// The raw output does not match the octet grammar.
    #[error("failed to decode raw response from {target}: {source}")]
    Decode {
        target: String,
        #[source]
        source: DecodeError,
    },

    /// The decoded sequence has the wrong number of octets for this collector.
    #[error(
        "unexpected number of octets in raw response from {target}: expected {expected}, got {actual}"
    )]
    Shape {
        target: String,
        expected: ExpectedLen,
        actual: usize,
    },

    /// A decoded value falls outside the collector's recognized set.
    #[error("unexpected {field} from {target}: {value}")]
    Classification {
        target: String,
        field: &'static str,
        value: String,
    },

    /// A sample was built with the wrong number of label values.
    #[error("metric {metric} expects {expected} label values, got {actual}")]
    Labels {
        metric: String,
        expected: usize,
        actual: usize,
    },

    /// The consumer side of the metric stream has been dropped.
    #[error("metric stream closed")]
    SinkClosed,

    /// The runner or collector panicked; caught by the scrape step.
    #[error("collector {collector} panicked while scraping {target}")]
    Panicked { collector: String, target: String },
}

impl CollectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Execution { .. } => ErrorKind::Execution,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Shape { .. } => ErrorKind::Shape,
            Self::Classification { .. } => ErrorKind::Classification,
            Self::Labels { .. } => ErrorKind::Labels,
            Self::SinkClosed => ErrorKind::SinkClosed,
            Self::Panicked { .. } => ErrorKind::Panicked,
        }
    }
}
