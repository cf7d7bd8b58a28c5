//! Transport and TLS sub-objects shared by the TCP-based protocols.

use super::{Outbound, TranslateOptions};
use sb_profile::{Network, Security, StreamSettings};
use serde_json::{json, Map, Value};

const ED_MARKER: &str = "?ed=";
const WS_EARLY_DATA_HEADER: &str = "Sec-WebSocket-Protocol";

fn split_list(s: &str) -> Value {
    Value::from(s.split(',').map(str::to_string).collect::<Vec<_>>())
}

fn transport(stream: &StreamSettings) -> Option<Map<String, Value>> {
    let mut t = Map::new();
    match stream.network {
        Network::Tcp => {
            if stream.header_type != "http" {
                return None;
            }
            // TCP with HTTP header obfuscation
            t.insert("type".into(), json!("http"));
            t.insert("method".into(), json!("GET"));
            t.insert("path".into(), json!(stream.path));
            t.insert("headers".into(), json!({ "Host": split_list(&stream.host) }));
            return Some(t);
        }
        net => {
            t.insert("type".into(), json!(net.as_str()));
        }
    }
    match stream.network {
        Network::Ws => {
            if !stream.host.is_empty() {
                t.insert("headers".into(), json!({ "Host": stream.host }));
            }
            let (clean, ed) = match stream.path.split_once(ED_MARKER) {
                Some((p, ed)) => (p, ed.parse::<u32>().ok()),
                None => (stream.path.as_str(), None),
            };
            if !clean.is_empty() {
                t.insert("path".into(), json!(clean));
            }
            if let Some(ed) = ed.filter(|n| *n > 0) {
                t.insert("max_early_data".into(), json!(ed));
                t.insert("early_data_header_name".into(), json!(WS_EARLY_DATA_HEADER));
            }
            if stream.ws_early_data_length > 0 {
                let name = if stream.ws_early_data_name.is_empty() {
                    WS_EARLY_DATA_HEADER
                } else {
                    stream.ws_early_data_name.as_str()
                };
                t.insert("max_early_data".into(), json!(stream.ws_early_data_length));
                t.insert("early_data_header_name".into(), json!(name));
            }
        }
        Network::Http => {
            if !stream.path.is_empty() {
                t.insert("path".into(), json!(stream.path));
            }
            if !stream.host.is_empty() {
                t.insert("host".into(), split_list(&stream.host));
            }
        }
        Network::Grpc => {
            if !stream.path.is_empty() {
                t.insert("service_name".into(), json!(stream.path));
            }
        }
        Network::HttpUpgrade => {
            if !stream.path.is_empty() {
                t.insert("path".into(), json!(stream.path));
            }
            if !stream.host.is_empty() {
                t.insert("host".into(), json!(stream.host));
            }
        }
        Network::Quic | Network::Tcp => {}
    }
    Some(t)
}

fn tls(stream: &StreamSettings, opts: &TranslateOptions) -> Map<String, Value> {
    let mut tls = Map::new();
    tls.insert("enabled".into(), json!(true));
    if stream.allow_insecure || opts.skip_cert_verify {
        tls.insert("insecure".into(), json!(true));
    }
    if !stream.sni.trim().is_empty() {
        tls.insert("server_name".into(), json!(stream.sni));
    }
    if !stream.certificate.trim().is_empty() {
        tls.insert("certificate".into(), json!(stream.certificate.trim()));
    }
    if !stream.alpn.trim().is_empty() {
        tls.insert("alpn".into(), split_list(&stream.alpn));
    }
    let mut fingerprint = stream.utls_fingerprint.clone();
    if !stream.reality_public_key.trim().is_empty() {
        let short_id = stream.reality_short_id.split(',').next().unwrap_or_default();
        tls.insert(
            "reality".into(),
            json!({
                "enabled": true,
                "public_key": stream.reality_public_key,
                "short_id": short_id,
            }),
        );
        if fingerprint.is_empty() {
            fingerprint = "random".to_string();
        }
    }
    if !fingerprint.is_empty() {
        tls.insert(
            "utls".into(),
            json!({ "enabled": true, "fingerprint": fingerprint }),
        );
    }
    tls
}

/// Attach `transport`, `tls` and (vmess/vless) `packet_encoding` to an outbound
/// whose `type` is already set.
pub fn apply_stream(outbound: &mut Outbound, stream: &StreamSettings, opts: &TranslateOptions) {
    if let Some(t) = transport(stream) {
        outbound.insert("transport".into(), Value::Object(t));
    }
    if stream.security == Security::Tls {
        outbound.insert("tls".into(), Value::Object(tls(stream, opts)));
    }
    let ty = outbound.get("type").and_then(Value::as_str);
    if matches!(ty, Some("vmess" | "vless")) {
        outbound.insert("packet_encoding".into(), json!(stream.packet_encoding));
    }
}
