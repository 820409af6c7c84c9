//! Remote (or local) BMC being measured.

use std::fmt;

/// Name used for the BMC of the machine the exporter runs on.
pub const LOCAL_TARGET_NAME: &str = "[local]";

/// A BMC to query. `host == None` means the local BMC, reached through the
/// in-band driver instead of the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Target {
    host: Option<String>,
}

impl Target {
    pub fn local() -> Self {
        Self { host: None }
    }

    pub fn remote(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
        }
    }

    /// Build a target from an optional `?target=` value; empty means local.
    pub fn from_param(host: Option<&str>) -> Self {
        match host.map(str::trim) {
            Some(h) if !h.is_empty() => Self::remote(h),
            _ => Self::local(),
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn is_local(&self) -> bool {
        self.host.is_none()
    }

    /// Identifier used in log lines and error messages.
    pub fn name(&self) -> &str {
        self.host.as_deref().unwrap_or(LOCAL_TARGET_NAME)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
