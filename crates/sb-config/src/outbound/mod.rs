//! Per-protocol outbound translators.
//! 按协议把档案翻译为引擎出站对象。
//!
//! Each translator is a pure function of the profile and [`TranslateOptions`]:
//! same input, same object. The emitted `type` strings are a wire contract
//! with the engine.

use crate::merge::parse_object;
use crate::settings::BuildSettings;
use sb_profile::{CustomCore, ProfileBean, ProxyProfile};
use sb_types::BuildError;
use serde_json::{Map, Value};

pub mod quic;
pub mod shadowsocks;
pub mod socks;
pub mod ssh;
pub mod stream;
pub mod v2ray;
pub mod wireguard;

/// An engine outbound object under construction.
pub type Outbound = Map<String, Value>;

/// Settings-derived inputs a translator may read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Force `tls.insecure` on every TLS stream.
    pub skip_cert_verify: bool,
    /// Interface name for WireGuard outbounds.
    pub wireguard_interface: String,
}

impl TranslateOptions {
    pub fn from_settings(settings: &BuildSettings) -> Self {
        Self {
            skip_cert_verify: settings.skip_cert,
            wireguard_interface: crate::defaults::wireguard_interface_name().to_string(),
        }
    }
}

/// `server` + `server_port` of a hop.
#[derive(Copy, Clone, Debug)]
pub struct Endpoint<'a> {
    pub server: &'a str,
    pub port: u16,
}

impl<'a> Endpoint<'a> {
    pub fn of(profile: &'a ProxyProfile) -> Self {
        Self {
            server: &profile.server,
            port: profile.server_port,
        }
    }

    pub(crate) fn insert_into(&self, outbound: &mut Outbound) {
        outbound.insert("server".into(), Value::from(self.server));
        outbound.insert("server_port".into(), Value::from(self.port));
    }
}

/// Translate one non-chain profile into a native outbound (without `tag`).
pub fn translate(profile: &ProxyProfile, opts: &TranslateOptions) -> Result<Outbound, BuildError> {
    let ep = Endpoint::of(profile);
    let outbound = match &profile.bean {
        ProfileBean::Socks(b) => socks::socks_http(b, false, ep, opts),
        ProfileBean::Http(b) => socks::socks_http(b, true, ep, opts),
        ProfileBean::Shadowsocks(b) => shadowsocks::shadowsocks(b, ep),
        ProfileBean::ShadowsocksR(b) => shadowsocks::shadowsocksr(b, ep),
        ProfileBean::Vmess(b) => v2ray::vmess(b, ep, opts),
        ProfileBean::Trojan(b) => v2ray::trojan_vless(b, false, ep, opts),
        ProfileBean::Vless(b) => v2ray::trojan_vless(b, true, ep, opts),
        ProfileBean::Hysteria(b) => quic::hysteria(b, ep),
        ProfileBean::Hysteria2(b) => quic::hysteria2(b, ep),
        ProfileBean::Tuic(b) => quic::tuic(b, ep),
        ProfileBean::Ssh(b) => ssh::ssh(b, ep),
        ProfileBean::WireGuard(b) => wireguard::wireguard(b, ep, opts),
        ProfileBean::Custom(c) if c.core == CustomCore::Internal => {
            parse_object(&c.config_simple, "custom outbound config")
        }
        ProfileBean::Custom(_) | ProfileBean::Chain(_) => Map::new(),
    };
    if outbound.is_empty() {
        return Err(BuildError::UnsupportedOutbound);
    }
    Ok(outbound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_profile::{ChainBean, CustomBean, ShadowsocksBean};
    use serde_json::json;

    #[test]
    fn dispatches_by_bean() {
        let p = ProxyProfile::new(
            1,
            0,
            ProfileBean::Shadowsocks(ShadowsocksBean {
                method: "aes-128-gcm".into(),
                password: "pw".into(),
                ..Default::default()
            }),
        )
        .with_server("1.1.1.1", 8388);
        let o = translate(&p, &TranslateOptions::default()).unwrap();
        assert_eq!(o["type"], json!("shadowsocks"));
        assert_eq!(o["server_port"], json!(8388));
    }

    #[test]
    fn internal_custom_uses_raw_object() {
        let p = ProxyProfile::new(
            2,
            0,
            ProfileBean::Custom(CustomBean {
                core: CustomCore::Internal,
                config_simple: r#"{"type":"direct","bind_interface":"eth0"}"#.into(),
                ..Default::default()
            }),
        );
        let o = translate(&p, &TranslateOptions::default()).unwrap();
        assert_eq!(o["bind_interface"], json!("eth0"));
    }

    #[test]
    fn empty_or_invalid_is_unsupported() {
        let p = ProxyProfile::new(
            3,
            0,
            ProfileBean::Custom(CustomBean {
                config_simple: "not json".into(),
                ..Default::default()
            }),
        );
        assert_eq!(
            translate(&p, &TranslateOptions::default()),
            Err(BuildError::UnsupportedOutbound)
        );
        let c = ProxyProfile::new(4, 0, ProfileBean::Chain(ChainBean { list: vec![1] }));
        assert!(translate(&c, &TranslateOptions::default()).is_err());
    }
}
