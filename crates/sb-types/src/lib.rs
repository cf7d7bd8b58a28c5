//! sb-types: cross-crate stable contracts (ids, error taxonomy, shared structs, ports).
//!
//! Everything here is consumed by at least two of `sb-profile`, `sb-config` and `app`.
//! Keep it free of build logic.
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod errors;
pub mod ports;

pub use errors::{BuildError, EngineError, ErrorClass};

/// Stable identifier of a proxy profile in the external store.
pub type ProfileId = i64;

/// Stable identifier of a profile group.
pub type GroupId = i64;

/// Binds one materialized outbound tag to the profile whose traffic it carries.
///
/// The compiler never mutates profiles; the caller uses these bindings to wire
/// its own traffic counters after a successful build.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrafficBinding {
    pub profile_id: ProfileId,
    pub tag: String,
}

impl TrafficBinding {
    pub fn new(profile_id: ProfileId, tag: impl Into<String>) -> Self {
        Self {
            profile_id,
            tag: tag.into(),
        }
    }
}

impl Display for TrafficBinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.tag, self.profile_id)
    }
}

/// Config file the helper expects on disk before it is spawned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperConfigFile {
    pub path: String,
    pub contents: String,
}

/// Launch specification for an external helper process bridged in via loopback ports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLaunch {
    /// Display type of the hop (for logs and UI).
    pub tag: String,
    /// Executable path; never empty in a produced launch spec.
    pub program: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub env: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<HelperConfigFile>,
}
