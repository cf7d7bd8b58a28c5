//! WireGuard outbound.

use super::{Endpoint, Outbound, TranslateOptions};
use sb_profile::WireGuardBean;
use serde_json::json;

pub fn wireguard(bean: &WireGuardBean, ep: Endpoint<'_>, opts: &TranslateOptions) -> Outbound {
    let mut o = Outbound::new();
    o.insert("type".into(), json!("wireguard"));
    ep.insert_into(&mut o);
    o.insert("interface_name".into(), json!(opts.wireguard_interface));
    o.insert("private_key".into(), json!(bean.private_key));
    o.insert("peer_public_key".into(), json!(bean.public_key));
    o.insert("pre_shared_key".into(), json!(bean.pre_shared_key));
    o.insert("local_address".into(), json!(bean.local_address));
    o.insert("reserved".into(), json!(bean.reserved));
    o.insert("mtu".into(), json!(bean.mtu));
    o.insert("gso".into(), json!(bean.enable_gso));
    o.insert("system_interface".into(), json!(bean.use_system_interface));
    o
}
