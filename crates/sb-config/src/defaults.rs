//! Default values for build settings.
//!
//! Used with `#[serde(default = "...")]` attributes in [`crate::settings`].

/// Default listen address for the local mixed inbound (localhost).
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1";

/// Default port of the local mixed (HTTP+SOCKS) inbound.
pub const DEFAULT_MIXED_PORT: u16 = 2080;

/// Loopback address every helper hop is bridged through.
pub const LOOPBACK: &str = "127.0.0.1";

/// Fake-IP ranges handed to the engine's fakeip DNS server.
pub const FAKEIP_INET4_RANGE: &str = "198.18.0.0/15";
pub const FAKEIP_INET6_RANGE: &str = "fc00::/18";

/// Tun addresses (v4, optional v6).
pub const TUN_INET4_ADDRESS: &str = "172.18.0.1/30";
pub const TUN_INET6_ADDRESS: &str = "fdfe:dcba:9876::1/126";

pub fn default_log_level() -> String {
    "warn".to_string()
}

pub fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

pub fn default_mixed_port() -> u16 {
    DEFAULT_MIXED_PORT
}

pub fn default_tun_mtu() -> u32 {
    9000
}

pub fn default_tun_stack() -> String {
    "mixed".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_ntp_server() -> String {
    "time.apple.com".to_string()
}

pub fn default_ntp_port() -> u16 {
    123
}

pub fn default_ntp_interval() -> String {
    "30m".to_string()
}

pub fn default_mux_protocol() -> String {
    "h2mux".to_string()
}

pub fn default_mux_concurrency() -> u32 {
    8
}

pub fn default_remote_dns() -> String {
    "https://dns.google/dns-query".to_string()
}

pub fn default_direct_dns() -> String {
    "local".to_string()
}

pub fn default_outbound() -> String {
    "proxy".to_string()
}

/// Platform tun interface name.
#[must_use]
pub fn tun_interface_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "utun9"
    } else {
        "sb-tun"
    }
}

/// Platform WireGuard interface name.
#[must_use]
pub fn wireguard_interface_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "uwg9"
    } else {
        "sb-wg"
    }
}
