//! VMess, VLESS and Trojan outbounds.

use super::stream::apply_stream;
use super::{Endpoint, Outbound, TranslateOptions};
use sb_profile::{TrojanVlessBean, VmessBean};
use serde_json::json;

const UDP443_SUFFIX: &str = "-udp443";

pub fn vmess(bean: &VmessBean, ep: Endpoint<'_>, opts: &TranslateOptions) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!("vmess"));
    ep.insert_into(&mut o);
    o.insert("uuid".into(), json!(bean.uuid.trim()));
    o.insert("alter_id".into(), json!(bean.alter_id));
    o.insert("security".into(), json!(bean.security));
    apply_stream(&mut o, &bean.stream, opts);
    o
}

/// Normalize a VLESS flow: drop the `-udp443` suffix, map `none` to empty.
pub fn normalize_flow(flow: &str) -> &str {
    if let Some(f) = flow.strip_suffix(UDP443_SUFFIX) {
        f
    } else if flow == "none" {
        ""
    } else {
        flow
    }
}

pub fn trojan_vless(
    bean: &TrojanVlessBean,
    vless: bool,
    ep: Endpoint<'_>,
    opts: &TranslateOptions,
) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!(if vless { "vless" } else { "trojan" }));
    ep.insert_into(&mut o);
    if vless {
        o.insert("uuid".into(), json!(bean.password.trim()));
        o.insert("flow".into(), json!(normalize_flow(&bean.flow)));
    } else {
        o.insert("password".into(), json!(bean.password));
    }
    apply_stream(&mut o, &bean.stream, opts);
    o
}
