//! Immutable build settings snapshot.
//! 构建设置快照（只读）。
//!
//! Every preference the compiler reads (inbounds, tun, DNS, routing lists,
//! multiplex, control plane, helper cores) lives here. A snapshot is loaded
//! once and shared read-only by concurrent builds.
//! 编译器读取的所有偏好都集中在这里；快照加载一次后由并发构建只读共享。

use crate::defaults::*;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Local mixed (HTTP+SOCKS) listener.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundSettings {
    pub address: String,
    /// 0 disables the listener.
    pub mixed_port: u16,
    pub username: String,
    pub password: String,
}

impl Default for InboundSettings {
    fn default() -> Self {
        Self {
            address: default_listen_addr(),
            mixed_port: default_mixed_port(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl InboundSettings {
    #[must_use]
    pub fn need_auth(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Tun (VPN capture) device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunSettings {
    pub enabled: bool,
    pub mtu: u32,
    pub stack: String,
    pub strict_route: bool,
    pub ipv6: bool,
    /// Whitelist mode: matched processes/CIDRs go through the proxy.
    /// Otherwise they bypass it.
    pub whitelist: bool,
    /// One process name per line.
    pub process_rules: String,
    /// One CIDR per line.
    pub cidr_rules: String,
}

impl Default for TunSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mtu: default_tun_mtu(),
            stack: default_tun_stack(),
            strict_route: default_true(),
            ipv6: false,
            whitelist: false,
            process_rules: String::new(),
            cidr_rules: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NtpSettings {
    pub enabled: bool,
    pub server: String,
    pub server_port: u16,
    pub interval: String,
}

impl Default for NtpSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            server: default_ntp_server(),
            server_port: default_ntp_port(),
            interval: default_ntp_interval(),
        }
    }
}

/// Connection multiplexing policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxSettings {
    /// Max streams per connection; 0 disables multiplexing.
    pub concurrency: u32,
    pub protocol: String,
    pub padding: bool,
    /// Applies to profiles whose mux state is `default`.
    pub default_on: bool,
}

impl Default for MuxSettings {
    fn default() -> Self {
        Self {
            concurrency: default_mux_concurrency(),
            protocol: default_mux_protocol(),
            padding: false,
            default_on: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SniffingMode {
    Disable,
    #[default]
    ForRouting,
    ForDestination,
}

/// DNS and routing preferences.
/// DNS 与路由偏好。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Address of the remote resolver, e.g. `https://dns.google/dns-query`.
    pub remote_dns: String,
    pub direct_dns: String,
    /// `direct` moves `dns-direct` to the front of the server list.
    pub dns_final_out: String,
    /// Route proxy/direct domain lists to the matching DNS server too.
    pub dns_routing: bool,
    pub fake_dns: bool,
    /// Replace the generated DNS object with `dns_object`.
    pub use_dns_object: bool,
    pub dns_object: String,
    /// Non-empty adds a leading `resolve` route action.
    pub domain_strategy: String,
    /// Applied to every hop outbound.
    pub outbound_domain_strategy: String,
    pub sniffing: SniffingMode,
    pub proxy_domain: String,
    pub direct_domain: String,
    pub block_domain: String,
    pub proxy_ip: String,
    pub direct_ip: String,
    pub block_ip: String,
    /// `route.final`.
    pub def_outbound: String,
    /// Raw `{"route": {...}, "outbounds": [...]}` replacing the generated route.
    pub custom: String,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            remote_dns: default_remote_dns(),
            direct_dns: default_direct_dns(),
            dns_final_out: default_outbound(),
            dns_routing: default_true(),
            fake_dns: false,
            use_dns_object: false,
            dns_object: String::new(),
            domain_strategy: String::new(),
            outbound_domain_strategy: String::new(),
            sniffing: SniffingMode::default(),
            proxy_domain: String::new(),
            direct_domain: String::new(),
            block_domain: String::new(),
            proxy_ip: String::new(),
            direct_ip: String::new(),
            block_ip: String::new(),
            def_outbound: default_outbound(),
            custom: String::new(),
        }
    }
}

/// Engine control plane (Clash-compatible API).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClashApiSettings {
    /// 0 disables the API.
    pub port: u16,
    pub listen_addr: String,
    pub secret: String,
}

impl Default for ClashApiSettings {
    fn default() -> Self {
        Self {
            port: 0,
            listen_addr: default_listen_addr(),
            secret: String::new(),
        }
    }
}

/// Complete settings snapshot consumed by a build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub log_level: String,
    pub inbound: InboundSettings,
    pub tun: TunSettings,
    /// Raw `{"inbounds": [...]}` appended to the generated inbounds.
    pub custom_inbound: String,
    pub ntp: NtpSettings,
    pub mux: MuxSettings,
    pub routing: RoutingSettings,
    pub clash_api: ClashApiSettings,
    /// Force `tls.insecure` on every TLS stream.
    pub skip_cert: bool,
    /// The process may create system network interfaces.
    pub elevated: bool,
    /// Helper core name → executable path.
    pub helper_cores: BTreeMap<String, String>,
    /// Directory for helper config files; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            inbound: InboundSettings::default(),
            tun: TunSettings::default(),
            custom_inbound: String::new(),
            ntp: NtpSettings::default(),
            mux: MuxSettings::default(),
            routing: RoutingSettings::default(),
            clash_api: ClashApiSettings::default(),
            skip_cert: false,
            elevated: false,
            helper_cores: BTreeMap::new(),
            temp_dir: None,
        }
    }
}

impl BuildSettings {
    /// Parse settings text, trying JSON first and falling back to YAML.
    /// 解析设置文本：先尝试 JSON，失败后回退 YAML。
    pub fn from_text(text: &str) -> Result<Self> {
        match serde_json::from_str(text) {
            Ok(v) => Ok(v),
            Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| {
                anyhow!("settings are neither JSON ({json_err}) nor YAML ({yaml_err})")
            }),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("read settings {}", path.display()))?;
        Self::from_text(&text).with_context(|| format!("parse settings {}", path.display()))
    }

    /// Executable configured for a helper core, if any.
    pub fn helper_program(&self, core: &str) -> Option<&str> {
        self.helper_cores
            .get(core)
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
    }

    pub fn helper_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
