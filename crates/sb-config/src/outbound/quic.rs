//! QUIC family: Hysteria, Hysteria2 and TUIC.

use super::{Endpoint, Outbound};
use sb_profile::{HysteriaAuth, QuicBean};
use serde_json::{json, Map, Value};

fn base(bean: &QuicBean, ty: &str, ep: Endpoint<'_>) -> Outbound {
    let mut tls = Map::new();
    tls.insert("enabled".into(), json!(true));
    tls.insert("disable_sni".into(), json!(bean.disable_sni));
    tls.insert("insecure".into(), json!(bean.allow_insecure));
    tls.insert("certificate".into(), json!(bean.ca_text.trim()));
    tls.insert("server_name".into(), json!(bean.sni));
    if !bean.alpn.trim().is_empty() {
        let alpn: Vec<&str> = bean.alpn.split(',').collect();
        tls.insert("alpn".into(), json!(alpn));
    }

    let mut o = Outbound::new();
    o.insert("type".into(), json!(ty));
    ep.insert_into(&mut o);
    o.insert("tls".into(), Value::Object(tls));
    o
}

pub fn hysteria(bean: &QuicBean, ep: Endpoint<'_>) -> Outbound {
    let mut o = base(bean, "hysteria", ep);
    o.insert("obfs".into(), json!(bean.obfs_password));
    o.insert("disable_mtu_discovery".into(), json!(bean.disable_mtu_discovery));
    o.insert("recv_window".into(), json!(bean.stream_receive_window));
    o.insert("recv_window_conn".into(), json!(bean.connection_receive_window));
    o.insert("up_mbps".into(), json!(bean.upload_mbps));
    o.insert("down_mbps".into(), json!(bean.download_mbps));
    match bean.auth_payload_type {
        HysteriaAuth::Base64 => {
            o.insert("auth".into(), json!(bean.auth_payload));
        }
        HysteriaAuth::String => {
            o.insert("auth_str".into(), json!(bean.auth_payload));
        }
        HysteriaAuth::None => {}
    }
    o
}

/// `20000-30000,443` → `["20000:30000", "443"]`.
pub fn hop_ports(spec: &str) -> Vec<String> {
    spec.replace('-', ":")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn hysteria2(bean: &QuicBean, ep: Endpoint<'_>) -> Outbound {
    let mut o = base(bean, "hysteria2", ep);
    if let Some(Value::Object(tls)) = o.get_mut("tls") {
        // hysteria2 pins a single ALPN string
        tls.insert("alpn".into(), json!("h3"));
    }
    o.insert("password".into(), json!(bean.password));
    o.insert("up_mbps".into(), json!(bean.upload_mbps));
    o.insert("down_mbps".into(), json!(bean.download_mbps));
    if !bean.obfs_password.is_empty() {
        o.insert(
            "obfs".into(),
            json!({ "type": "salamander", "password": bean.obfs_password }),
        );
    }
    if !bean.hop_port.is_empty() {
        o.insert("server_ports".into(), json!(hop_ports(&bean.hop_port)));
        o.insert("hop_interval".into(), json!(format!("{}s", bean.hop_interval)));
    }
    o
}

pub fn tuic(bean: &QuicBean, ep: Endpoint<'_>) -> Outbound {
    let mut o = base(bean, "tuic", ep);
    o.insert("uuid".into(), json!(bean.uuid));
    o.insert("password".into(), json!(bean.password));
    o.insert("congestion_control".into(), json!(bean.congestion_control));
    if bean.udp_over_stream {
        o.insert("udp_over_stream".into(), json!(true));
    } else {
        o.insert("udp_relay_mode".into(), json!(bean.udp_relay_mode));
    }
    o.insert("zero_rtt_handshake".into(), json!(bean.zero_rtt_handshake));
    if !bean.heartbeat.trim().is_empty() {
        o.insert("heartbeat".into(), json!(bean.heartbeat));
    }
    o
}

#[cfg(test)]
mod tests {
    use super::*;

    const EP: Endpoint<'static> = Endpoint {
        server: "q.example",
        port: 443,
    };

    #[test]
    fn hysteria2_port_hopping_and_alpn() {
        let b = QuicBean {
            password: "pw".into(),
            obfs_password: "salt".into(),
            hop_port: "20000-30000,443,".into(),
            hop_interval: 30,
            alpn: "h3,h2".into(),
            ..Default::default()
        };
        let o = hysteria2(&b, EP);
        assert_eq!(o["type"], json!("hysteria2"));
        assert_eq!(o["server_ports"], json!(["20000:30000", "443"]));
        assert_eq!(o["hop_interval"], json!("30s"));
        assert_eq!(o["tls"]["alpn"], json!("h3"));
        assert_eq!(o["obfs"], json!({"type": "salamander", "password": "salt"}));
    }

    #[test]
    fn hysteria2_without_hopping() {
        let o = hysteria2(&QuicBean::default(), EP);
        assert!(!o.contains_key("server_ports"));
        assert!(!o.contains_key("hop_interval"));
        assert!(!o.contains_key("obfs"));
    }

    #[test]
    fn hysteria_auth_payload_kinds() {
        let mut b = QuicBean {
            auth_payload: "cGF5bG9hZA==".into(),
            auth_payload_type: HysteriaAuth::Base64,
            alpn: "hysteria".into(),
            ..Default::default()
        };
        let o = hysteria(&b, EP);
        assert_eq!(o["auth"], json!("cGF5bG9hZA=="));
        assert_eq!(o["tls"]["alpn"], json!(["hysteria"]));
        b.auth_payload_type = HysteriaAuth::String;
        let o = hysteria(&b, EP);
        assert!(o.get("auth").is_none());
        assert_eq!(o["auth_str"], json!("cGF5bG9hZA=="));
    }

    #[test]
    fn tuic_relay_mode_vs_udp_over_stream() {
        let mut b = QuicBean {
            udp_relay_mode: "native".into(),
            heartbeat: "10s".into(),
            ..Default::default()
        };
        let o = tuic(&b, EP);
        assert_eq!(o["udp_relay_mode"], json!("native"));
        assert_eq!(o["heartbeat"], json!("10s"));
        b.udp_over_stream = true;
        let o = tuic(&b, EP);
        assert_eq!(o["udp_over_stream"], json!(true));
        assert!(o.get("udp_relay_mode").is_none());
    }
}
