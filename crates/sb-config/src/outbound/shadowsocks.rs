//! Shadowsocks and ShadowsocksR outbounds.

use super::{Endpoint, Outbound};
use sb_profile::{ShadowsocksBean, ShadowsocksRBean};
use serde_json::json;

pub fn shadowsocks(bean: &ShadowsocksBean, ep: Endpoint<'_>) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!("shadowsocks"));
    ep.insert_into(&mut o);
    o.insert("method".into(), json!(bean.method));
    o.insert("password".into(), json!(bean.password));
    let uot = if bean.uot != 0 {
        json!({ "enabled": true, "version": bean.uot })
    } else {
        json!(false)
    };
    o.insert("udp_over_tcp".into(), uot);
    if !bean.plugin.trim().is_empty() {
        let (name, opts) = bean.plugin.split_once(';').unwrap_or((bean.plugin.as_str(), ""));
        o.insert("plugin".into(), json!(name));
        o.insert("plugin_opts".into(), json!(opts));
    }
    o
}

pub fn shadowsocksr(bean: &ShadowsocksRBean, ep: Endpoint<'_>) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!("shadowsocksr"));
    ep.insert_into(&mut o);
    o.insert("method".into(), json!(bean.method));
    o.insert("password".into(), json!(bean.password));
    o.insert("obfs".into(), json!(bean.obfs));
    o.insert("obfs_param".into(), json!(bean.obfs_param));
    o.insert("protocol".into(), json!(bean.protocol));
    o.insert("protocol_param".into(), json!(bean.protocol_param));
    o
}
