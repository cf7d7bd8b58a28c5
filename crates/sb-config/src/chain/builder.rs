//! Chain builder: flattened hops → tagged outbounds, mapping inbounds,
//! link rules and traffic bindings.
//!
//! Tags are computed for the whole chain before any hop is built, so each
//! hop's `detour` (or mapping rule) points at its successor at construction
//! time.

use super::resolve::resolve_chain;
use super::state::BuildState;
use crate::defaults::LOOPBACK;
use crate::external::{build_external, HelperPorts};
use crate::merge::parse_object;
use crate::outbound::{translate, Outbound, TranslateOptions};
use crate::settings::BuildSettings;
use crate::BuildEnv;
use sb_profile::{CustomBean, CustomCore, ExternalMode, MuxState, Network, ProfileBean, ProxyProfile, Security};
use sb_types::{BuildError, TrafficBinding};
use serde_json::{json, Value};
use std::sync::Arc;

/// Tag of the root chain's innermost hop.
pub const PROXY_TAG: &str = "proxy";

#[derive(Clone, Debug, PartialEq, Eq)]
struct HopTag {
    tag: String,
    /// Materialized once per build as `g-<id>`.
    global: bool,
}

fn hop_tags(chain_id: i64, hops: &[Arc<ProxyProfile>]) -> Vec<HopTag> {
    let last = hops.len().saturating_sub(1);
    hops.iter()
        .enumerate()
        .map(|(i, p)| {
            if chain_id == 0 && i == 0 {
                HopTag {
                    tag: PROXY_TAG.to_string(),
                    global: false,
                }
            } else if i == last {
                HopTag {
                    tag: format!("g-{}", p.id),
                    global: true,
                }
            } else {
                HopTag {
                    tag: format!("c-{}-{}", chain_id, p.id),
                    global: false,
                }
            }
        })
        .collect()
}

fn mapping_tag(tag: &str) -> String {
    format!("{tag}-mapping")
}

/// Whether this hop wants a multiplex object, before the one-per-chain cap.
fn wants_mux(profile: &ProxyProfile, outbound: &Outbound, settings: &BuildSettings) -> bool {
    let mut need = matches!(
        profile.bean,
        ProfileBean::Vmess(_)
            | ProfileBean::Trojan(_)
            | ProfileBean::Vless(_)
            | ProfileBean::Shadowsocks(_)
    ) && settings.mux.concurrency > 0;

    if let Some(stream) = profile.bean.stream() {
        if matches!(stream.network, Network::Grpc | Network::Quic)
            || (stream.network == Network::Http && stream.security == Security::Tls)
        {
            need = false;
        }
    }

    match profile.mux_state {
        MuxState::Default => need &= settings.mux.default_on,
        MuxState::On => need = true,
        MuxState::Off => need = false,
    }

    if matches!(profile.bean, ProfileBean::Vless(_)) {
        let flow = outbound.get("flow").and_then(Value::as_str).unwrap_or_default();
        if !flow.is_empty() {
            need = false;
        }
    }
    need
}

fn helper_ports(
    env: &BuildEnv<'_>,
    state: &mut BuildState,
    profile: &ProxyProfile,
) -> Result<HelperPorts, BuildError> {
    let (fixed_mapping, fixed_socks) = match &profile.bean {
        ProfileBean::Custom(c) => (c.mapping_port, c.socks_port),
        _ => (0, 0),
    };
    let mut port = |fixed: u16| -> Result<u16, BuildError> {
        if fixed != 0 {
            return Ok(fixed);
        }
        let p = env.ports.allocate()?;
        state.helper_ports.push(p);
        Ok(p)
    };
    let mapping = port(fixed_mapping)?;
    let socks = port(fixed_socks)?;
    Ok(HelperPorts { mapping, socks })
}

/// Build one flattened chain. Returns the tag of the innermost (exit) hop.
pub fn build_chain_hops(
    env: &BuildEnv<'_>,
    state: &mut BuildState,
    chain_id: i64,
    hops: &[Arc<ProxyProfile>],
) -> Result<String, BuildError> {
    let settings = env.settings;
    let opts = TranslateOptions::from_settings(settings);
    let tags = hop_tags(chain_id, hops);
    let last = hops.len().saturating_sub(1);
    let mut chain_tag_out = String::new();
    let mut mux_applied = false;

    for (index, ent) in hops.iter().enumerate() {
        let HopTag { tag, global } = &tags[index];
        let next_tag = tags.get(index + 1).map(|t| t.tag.as_str());
        let is_first_profile = index == last;

        if index != 0 {
            state.ignore_conn_tags.push(tag.clone());
        } else {
            chain_tag_out = tag.clone();
            state.outbound_stat = Some(TrafficBinding::new(ent.id, tag.as_str()));
        }

        if *global && !state.global_profiles.insert(ent.id) {
            tracing::debug!(tag = %tag, profile = ent.id, "global hop already built");
            continue;
        }

        let mode = ent.bean.external_mode(is_first_profile, settings.tun.enabled);
        if mode == ExternalMode::Unsupported {
            return Err(BuildError::CannotConfigure);
        }

        let mut outbound = if mode.is_external() {
            let ports = helper_ports(env, state, ent)?;
            if mode == ExternalMode::DirectDial {
                state.need_keep_vpn_off = true;
            }
            if mode == ExternalMode::Mapped {
                state.inbounds.push(json!({
                    "type": "direct",
                    "tag": mapping_tag(tag),
                    "listen": LOOPBACK,
                    "listen_port": ports.mapping,
                    "override_address": ent.server,
                    "override_port": ent.server_port,
                }));
                // nothing downstream routes this inbound, send it out directly
                if is_first_profile {
                    state.routing_rules.push(json!({
                        "inbound": [mapping_tag(tag)],
                        "outbound": "direct",
                    }));
                }
            }
            let ProfileBean::Custom(custom @ CustomBean {
                core: CustomCore::External(core),
                ..
            }) = &ent.bean
            else {
                return Err(BuildError::CannotConfigure);
            };
            let launch = build_external(ent, custom, core, ports, mode, settings)?;
            state.external.push(launch);

            if let Some(next) = next_tag {
                state.routing_rules.push(json!({
                    "inbound": [mapping_tag(tag)],
                    "outbound": next,
                }));
            }

            let mut o = Outbound::new();
            o.insert("type".into(), json!("socks"));
            o.insert("server".into(), json!(LOOPBACK));
            o.insert("server_port".into(), json!(ports.socks));
            o
        } else {
            let mut o = translate(ent, &opts)?;
            if let Some(next) = next_tag {
                o.insert("detour".into(), json!(next));
            }
            o
        };

        if let ProfileBean::WireGuard(wg) = &ent.bean {
            if wg.use_system_interface && !settings.elevated {
                return Err(BuildError::NeedElevation);
            }
        }

        outbound.insert("tag".into(), json!(tag));
        state
            .outbound_stats
            .push(TrafficBinding::new(ent.id, tag.as_str()));

        if !settings.routing.outbound_domain_strategy.is_empty() {
            outbound.insert(
                "domain_strategy".into(),
                json!(settings.routing.outbound_domain_strategy),
            );
        }

        if !mux_applied && wants_mux(ent, &outbound, settings) {
            outbound.insert(
                "multiplex".into(),
                json!({
                    "enabled": true,
                    "protocol": settings.mux.protocol,
                    "padding": settings.mux.padding,
                    "max_streams": settings.mux.concurrency,
                }),
            );
            mux_applied = true;
        }

        tracing::debug!(
            tag = %tag,
            profile = ent.id,
            kind = ent.bean.type_name(),
            external = ?mode,
            "hop built"
        );

        state.outbounds.push(Value::Object(outbound));
        if !state.mode.for_test {
            let custom = parse_object(&ent.custom_outbound, "custom_outbound");
            if !custom.is_empty() {
                state.outbounds.push(Value::Object(custom));
            }
        }
    }

    Ok(chain_tag_out)
}

/// Resolve and build the chain for `profile`, the root chain when `chain_id` is 0.
pub fn build_chain(
    env: &BuildEnv<'_>,
    state: &mut BuildState,
    chain_id: i64,
    profile: &Arc<ProxyProfile>,
) -> Result<String, BuildError> {
    let group = env
        .store
        .group(profile.group_id)
        .ok_or(BuildError::GroupNotFound)?;
    let hops = resolve_chain(env.store, profile, &group)?;
    let tag = build_chain_hops(env, state, chain_id, &hops)?;

    // the chain as a whole is accounted on its exit tag
    if hops.len() > 1 {
        state
            .outbound_stats
            .push(TrafficBinding::new(profile.id, tag.as_str()));
    }
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_profile::{SocksHttpBean, StreamSettings, TrojanVlessBean, VmessBean};

    fn p(id: i64, bean: ProfileBean) -> Arc<ProxyProfile> {
        Arc::new(ProxyProfile::new(id, 0, bean))
    }

    #[test]
    fn tags_for_root_and_other_chains() {
        let hops = vec![
            p(1, ProfileBean::Socks(SocksHttpBean::default())),
            p(2, ProfileBean::Socks(SocksHttpBean::default())),
            p(3, ProfileBean::Socks(SocksHttpBean::default())),
        ];
        let root: Vec<_> = hop_tags(0, &hops).into_iter().map(|t| t.tag).collect();
        assert_eq!(root, vec!["proxy", "c-0-2", "g-3"]);
        let other: Vec<_> = hop_tags(5, &hops).into_iter().map(|t| t.tag).collect();
        assert_eq!(other, vec!["c-5-1", "c-5-2", "g-3"]);

        let single = hop_tags(0, &hops[..1]);
        assert_eq!(single[0].tag, "proxy");
        assert!(!single[0].global);
        let single = hop_tags(4, &hops[..1]);
        assert_eq!(single[0].tag, "g-1");
        assert!(single[0].global);
    }

    fn mux_settings(default_on: bool) -> BuildSettings {
        let mut s = BuildSettings::default();
        s.mux.default_on = default_on;
        s
    }

    #[test]
    fn mux_policy() {
        let vmess = ProxyProfile::new(1, 0, ProfileBean::Vmess(VmessBean::default()));
        let empty = Outbound::new();
        assert!(!wants_mux(&vmess, &empty, &mux_settings(false)));
        assert!(wants_mux(&vmess, &empty, &mux_settings(true)));

        let mut forced = vmess.clone();
        forced.mux_state = MuxState::On;
        assert!(wants_mux(&forced, &empty, &mux_settings(false)));
        forced.mux_state = MuxState::Off;
        assert!(!wants_mux(&forced, &empty, &mux_settings(true)));

        let grpc = ProxyProfile::new(
            2,
            0,
            ProfileBean::Trojan(TrojanVlessBean {
                stream: StreamSettings {
                    network: Network::Grpc,
                    ..Default::default()
                },
                ..Default::default()
            }),
        );
        assert!(!wants_mux(&grpc, &empty, &mux_settings(true)));

        let socks = ProxyProfile::new(3, 0, ProfileBean::Socks(SocksHttpBean::default()));
        assert!(!wants_mux(&socks, &empty, &mux_settings(true)));

        let vless = ProxyProfile::new(4, 0, ProfileBean::Vless(TrojanVlessBean::default()));
        let mut with_flow = Outbound::new();
        with_flow.insert("flow".into(), json!("xtls-rprx-vision"));
        assert!(!wants_mux(&vless, &with_flow, &mux_settings(true)));
        assert!(wants_mux(&vless, &empty, &mux_settings(true)));

        let mut zero = mux_settings(true);
        zero.mux.concurrency = 0;
        assert!(!wants_mux(&vmess, &empty, &zero));
    }
}
