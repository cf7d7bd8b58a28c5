//! Per-build context threaded through resolver, builder and assembler.

use sb_types::{ExternalLaunch, ProfileId, TrafficBinding};
use serde_json::Value;
use std::collections::HashSet;

/// Build mode flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildMode {
    /// Connectivity test: no user-facing inbounds, DNS/route customization
    /// or custom outbounds.
    pub for_test: bool,
    /// Export for sharing. Currently changes nothing.
    pub for_export: bool,
}

impl BuildMode {
    pub const NORMAL: BuildMode = BuildMode {
        for_test: false,
        for_export: false,
    };
    pub const TEST: BuildMode = BuildMode {
        for_test: true,
        for_export: false,
    };
}

/// User rule entries collected per category.
#[derive(Clone, Debug, Default)]
pub struct UserRules {
    pub domain_remote: Vec<String>,
    pub domain_direct: Vec<String>,
    pub domain_block: Vec<String>,
    pub domain_dns_remote: Vec<String>,
    pub domain_dns_direct: Vec<String>,
    pub ip_remote: Vec<String>,
    pub ip_direct: Vec<String>,
    pub ip_block: Vec<String>,
}

/// Mutable state owned by exactly one build; dropped on return, so a failed
/// build leaves nothing behind.
#[derive(Debug, Default)]
pub struct BuildState {
    pub mode: BuildMode,
    pub inbounds: Vec<Value>,
    pub outbounds: Vec<Value>,
    pub routing_rules: Vec<Value>,
    /// Profiles already materialized as a `g-<id>` hop.
    pub global_profiles: HashSet<ProfileId>,
    pub rules: UserRules,
    pub external: Vec<ExternalLaunch>,
    pub outbound_stats: Vec<TrafficBinding>,
    pub outbound_stat: Option<TrafficBinding>,
    pub ignore_conn_tags: Vec<String>,
    pub need_keep_vpn_off: bool,
    /// Ports taken from the allocator for helper hops; fixed ports excluded.
    pub helper_ports: Vec<u16>,
}

impl BuildState {
    pub fn new(mode: BuildMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }
}
