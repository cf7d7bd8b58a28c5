//! Protocol payloads ("beans") carried by a profile.
//!
//! [`ProfileBean`] is a closed, internally tagged enum: the `type` key selects
//! the variant and every protocol's fields live next to it.

use sb_types::ProfileId;
use serde::{Deserialize, Serialize};

/// Transport network of a TCP-based stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Tcp,
    Ws,
    Http,
    Grpc,
    Quic,
    HttpUpgrade,
}

impl Network {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Ws => "ws",
            Network::Http => "http",
            Network::Grpc => "grpc",
            Network::Quic => "quic",
            Network::HttpUpgrade => "httpupgrade",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    #[default]
    None,
    Tls,
}

/// Network/TLS/transport parameters shared by the TCP-based protocols.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub network: Network,
    pub security: Security,
    /// Host header (ws/httpupgrade) or comma separated host list (http).
    pub host: String,
    /// Path; gRPC service name when `network` is grpc. A ws path may carry `?ed=<n>`.
    pub path: String,
    /// TCP header obfuscation; only `http` is meaningful.
    pub header_type: String,
    pub sni: String,
    /// Comma separated ALPN list.
    pub alpn: String,
    pub certificate: String,
    pub allow_insecure: bool,
    pub utls_fingerprint: String,
    pub reality_public_key: String,
    /// Comma separated; only the first entry is used.
    pub reality_short_id: String,
    pub packet_encoding: String,
    pub ws_early_data_length: u32,
    pub ws_early_data_name: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocksVersion {
    #[serde(rename = "4")]
    V4,
    #[default]
    #[serde(rename = "5")]
    V5,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocksHttpBean {
    /// Ignored for HTTP profiles.
    pub version: SocksVersion,
    pub username: String,
    pub password: String,
    pub stream: StreamSettings,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowsocksBean {
    pub method: String,
    pub password: String,
    /// UDP-over-TCP version; 0 disables it.
    pub uot: u8,
    /// `name;opts` in SIP003 form.
    pub plugin: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowsocksRBean {
    pub method: String,
    pub password: String,
    pub obfs: String,
    pub obfs_param: String,
    pub protocol: String,
    pub protocol_param: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmessBean {
    pub uuid: String,
    pub alter_id: u32,
    pub security: String,
    pub stream: StreamSettings,
}

impl Default for VmessBean {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            alter_id: 0,
            security: "auto".to_string(),
            stream: StreamSettings::default(),
        }
    }
}

/// Trojan password or VLESS uuid plus the VLESS flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrojanVlessBean {
    pub password: String,
    pub flow: String,
    pub stream: StreamSettings,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HysteriaAuth {
    #[default]
    None,
    Base64,
    String,
}

/// Settings of the QUIC family (hysteria, hysteria2, tuic).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuicBean {
    pub uuid: String,
    pub password: String,
    pub obfs_password: String,
    pub auth_payload: String,
    pub auth_payload_type: HysteriaAuth,
    pub upload_mbps: u32,
    pub download_mbps: u32,
    pub stream_receive_window: u64,
    pub connection_receive_window: u64,
    pub disable_mtu_discovery: bool,
    /// Port hopping list, e.g. `20000-30000,443`.
    pub hop_port: String,
    /// Seconds.
    pub hop_interval: u32,
    pub congestion_control: String,
    pub udp_relay_mode: String,
    pub udp_over_stream: bool,
    pub zero_rtt_handshake: bool,
    pub heartbeat: String,
    pub sni: String,
    pub alpn: String,
    pub ca_text: String,
    pub allow_insecure: bool,
    pub disable_sni: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshBean {
    pub user: String,
    pub password: String,
    pub private_key: String,
    pub private_key_path: String,
    pub private_key_passphrase: String,
    pub host_key: Vec<String>,
    pub host_key_algorithms: Vec<String>,
    pub client_version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGuardBean {
    pub private_key: String,
    pub public_key: String,
    pub pre_shared_key: String,
    pub local_address: Vec<String>,
    pub reserved: Vec<u8>,
    pub mtu: u32,
    pub enable_gso: bool,
    pub use_system_interface: bool,
}

impl Default for WireGuardBean {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            public_key: String::new(),
            pre_shared_key: String::new(),
            local_address: Vec::new(),
            reserved: Vec::new(),
            mtu: 1420,
            enable_gso: false,
            use_system_interface: false,
        }
    }
}

/// Which engine runs a custom profile.
///
/// Serialized as a plain string: `internal`, `internal-full`, or the helper core name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CustomCore {
    /// `config_simple` is one native outbound object.
    #[default]
    Internal,
    /// `config_simple` is the complete engine configuration.
    InternalFull,
    /// Named helper core run as an external process.
    External(String),
}

impl From<String> for CustomCore {
    fn from(s: String) -> Self {
        match s.as_str() {
            "internal" => CustomCore::Internal,
            "internal-full" => CustomCore::InternalFull,
            _ => CustomCore::External(s),
        }
    }
}

impl From<CustomCore> for String {
    fn from(c: CustomCore) -> Self {
        match c {
            CustomCore::Internal => "internal".to_string(),
            CustomCore::InternalFull => "internal-full".to_string(),
            CustomCore::External(name) => name,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomBean {
    pub core: CustomCore,
    /// Raw JSON (internal cores) or the helper's config file body.
    pub config_simple: String,
    /// Helper arguments; may contain `%mapping_port%`, `%socks_port%`,
    /// `%server_addr%`, `%server_port%`, `%config%` placeholders.
    pub command: Vec<String>,
    /// File extension of the written helper config.
    pub config_suffix: String,
    pub mapping_port: u16,
    pub socks_port: u16,
}

/// Member ids, innermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainBean {
    pub list: Vec<ProfileId>,
}

/// How a hop is materialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExternalMode {
    /// Translated into a native outbound.
    Native,
    /// Helper process reached through a loopback mapping inbound.
    Mapped,
    /// Helper process dials the network itself; VPN capture must stay off.
    DirectDial,
    /// Cannot be configured automatically.
    Unsupported,
}

impl ExternalMode {
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, ExternalMode::Mapped | ExternalMode::DirectDial)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProfileBean {
    Socks(SocksHttpBean),
    Http(SocksHttpBean),
    Shadowsocks(ShadowsocksBean),
    #[serde(rename = "shadowsocksr")]
    ShadowsocksR(ShadowsocksRBean),
    Vmess(VmessBean),
    Trojan(TrojanVlessBean),
    Vless(TrojanVlessBean),
    Hysteria(QuicBean),
    Hysteria2(QuicBean),
    Tuic(QuicBean),
    Ssh(SshBean),
    #[serde(rename = "wireguard")]
    WireGuard(WireGuardBean),
    Custom(CustomBean),
    Chain(ChainBean),
}

impl ProfileBean {
    /// Protocol discriminator, matching the serialized `type`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ProfileBean::Socks(_) => "socks",
            ProfileBean::Http(_) => "http",
            ProfileBean::Shadowsocks(_) => "shadowsocks",
            ProfileBean::ShadowsocksR(_) => "shadowsocksr",
            ProfileBean::Vmess(_) => "vmess",
            ProfileBean::Trojan(_) => "trojan",
            ProfileBean::Vless(_) => "vless",
            ProfileBean::Hysteria(_) => "hysteria",
            ProfileBean::Hysteria2(_) => "hysteria2",
            ProfileBean::Tuic(_) => "tuic",
            ProfileBean::Ssh(_) => "ssh",
            ProfileBean::WireGuard(_) => "wireguard",
            ProfileBean::Custom(_) => "custom",
            ProfileBean::Chain(_) => "chain",
        }
    }

    /// Human readable type, used to label helper processes.
    #[must_use]
    pub fn display_type(&self) -> String {
        match self {
            ProfileBean::Custom(c) => match &c.core {
                CustomCore::External(name) => name.clone(),
                CustomCore::Internal => "Internal".to_string(),
                CustomCore::InternalFull => "Internal Full".to_string(),
            },
            other => other.type_name().to_string(),
        }
    }

    #[must_use]
    pub fn is_chain(&self) -> bool {
        matches!(self, ProfileBean::Chain(_))
    }

    #[must_use]
    pub fn stream(&self) -> Option<&StreamSettings> {
        match self {
            ProfileBean::Socks(b) | ProfileBean::Http(b) => Some(&b.stream),
            ProfileBean::Vmess(b) => Some(&b.stream),
            ProfileBean::Trojan(b) | ProfileBean::Vless(b) => Some(&b.stream),
            _ => None,
        }
    }

    /// Decide how a hop is materialized.
    ///
    /// `is_global` marks the hop that dials the network; `tun_enabled` is the
    /// VPN capture switch. Only helper cores ever leave the engine.
    #[must_use]
    pub fn external_mode(&self, is_global: bool, tun_enabled: bool) -> ExternalMode {
        let ProfileBean::Custom(custom) = self else {
            return ExternalMode::Native;
        };
        match &custom.core {
            CustomCore::Internal | CustomCore::InternalFull => ExternalMode::Native,
            CustomCore::External(_) => {
                if custom.command.is_empty() && custom.config_simple.trim().is_empty() {
                    ExternalMode::Unsupported
                } else if is_global && !tun_enabled {
                    ExternalMode::DirectDial
                } else {
                    ExternalMode::Mapped
                }
            }
        }
    }
}
