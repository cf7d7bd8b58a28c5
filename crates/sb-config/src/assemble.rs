//! Top-level configuration assembly.
//! 顶层配置组装。
//!
//! Order matters and mirrors what the engine expects: log, inbounds, NTP,
//! root chain, `direct`, user rules, DNS, route, control plane.

use crate::chain::builder::build_chain;
use crate::chain::state::{BuildMode, BuildState};
use crate::defaults::{
    tun_interface_name, FAKEIP_INET4_RANGE, FAKEIP_INET6_RANGE, TUN_INET4_ADDRESS,
    TUN_INET6_ADDRESS,
};
use crate::dns::parse_dns_address;
use crate::merge::{merge_into, parse_object};
use crate::rule::{classify, split_rule_lines, RuleMode};
use crate::settings::{BuildSettings, SniffingMode};
use crate::BuildEnv;
use sb_profile::{CustomCore, ProfileBean, ProxyProfile};
use sb_types::{BuildError, ExternalLaunch, ProfileId, TrafficBinding};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Outcome of a successful build.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BuildConfigResult {
    pub core_config: Map<String, Value>,
    /// Helper processes to spawn before the engine starts.
    pub external: Vec<ExternalLaunch>,
    pub outbound_stats: Vec<TrafficBinding>,
    /// Binding of the exit hop, the only one surfaced as the profile's own traffic.
    pub outbound_stat: Option<TrafficBinding>,
    /// Non-exit tags excluded from per-connection statistics.
    pub ignore_conn_tags: Vec<String>,
    /// A helper dials the network itself; VPN capture must stay off.
    pub need_keep_vpn_off: bool,
    /// Allocator ports held by helper hops; hand back with `PortAllocator::release`
    /// once the helpers are gone.
    pub helper_ports: Vec<u16>,
}

/// Build the engine configuration for `profile_id`.
pub fn build_config(
    env: &BuildEnv<'_>,
    profile_id: ProfileId,
    mode: BuildMode,
) -> Result<BuildConfigResult, BuildError> {
    let profile = env
        .store
        .profile(profile_id)
        .ok_or(BuildError::ProfileNotFound(profile_id))?;
    let mut state = BuildState::new(mode);

    if mode.for_export {
        tracing::debug!(profile = profile_id, "export build: nothing to strip");
    }

    let mut core_config = match &profile.bean {
        ProfileBean::Custom(c) if c.core == CustomCore::InternalFull => {
            parse_object(&c.config_simple, "internal-full config")
        }
        _ => match assemble(env, &mut state, &profile) {
            Ok(config) => config,
            Err(e) => {
                for port in state.helper_ports.drain(..) {
                    env.ports.release(port);
                }
                return Err(e);
            }
        },
    };
    merge_into(
        &mut core_config,
        parse_object(&profile.custom_config, "custom_config"),
    );

    let outbounds = outbound_count(&core_config);
    tracing::info!(
        profile = profile_id,
        test = mode.for_test,
        outbounds,
        helpers = state.external.len(),
        "config built"
    );

    Ok(BuildConfigResult {
        core_config,
        external: state.external,
        outbound_stats: state.outbound_stats,
        outbound_stat: state.outbound_stat,
        ignore_conn_tags: state.ignore_conn_tags,
        need_keep_vpn_off: state.need_keep_vpn_off,
        helper_ports: state.helper_ports,
    })
}

/// Outbounds in a finished document, custom additions included.
fn outbound_count(config: &Map<String, Value>) -> usize {
    config
        .get("outbounds")
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn inbounds(settings: &BuildSettings, state: &mut BuildState) {
    if state.mode.for_test {
        return;
    }
    let inbound = &settings.inbound;
    if inbound.mixed_port != 0 {
        let mut obj = json!({
            "tag": "mixed-in",
            "type": "mixed",
            "listen": inbound.address,
            "listen_port": inbound.mixed_port,
        });
        if inbound.need_auth() {
            obj["users"] = json!([{
                "username": inbound.username,
                "password": inbound.password,
            }]);
        }
        state.inbounds.push(obj);
    }

    let tun = &settings.tun;
    if tun.enabled {
        let address = if tun.ipv6 {
            json!([TUN_INET4_ADDRESS, TUN_INET6_ADDRESS])
        } else {
            json!([TUN_INET4_ADDRESS])
        };
        state.inbounds.push(json!({
            "tag": "tun-in",
            "type": "tun",
            "interface_name": tun_interface_name(),
            "auto_route": true,
            "mtu": tun.mtu,
            "stack": tun.stack,
            "strict_route": tun.strict_route,
            "address": address,
        }));
    }

    if let Some(Value::Array(custom)) =
        parse_object(&settings.custom_inbound, "custom_inbound").remove("inbounds")
    {
        state.inbounds.extend(custom);
    }
}

fn collect_user_rules(settings: &BuildSettings, state: &mut BuildState) {
    let routing = &settings.routing;
    let rules = &mut state.rules;
    for line in split_rule_lines(&routing.proxy_domain) {
        if routing.dns_routing {
            rules.domain_dns_remote.push(line.clone());
        }
        rules.domain_remote.push(line);
    }
    for line in split_rule_lines(&routing.direct_domain) {
        if routing.dns_routing {
            rules.domain_dns_direct.push(line.clone());
        }
        rules.domain_direct.push(line);
    }
    rules.domain_block.extend(split_rule_lines(&routing.block_domain));
    rules.ip_block.extend(split_rule_lines(&routing.block_ip));
    rules.ip_remote.extend(split_rule_lines(&routing.proxy_ip));
    rules.ip_direct.extend(split_rule_lines(&routing.direct_ip));
}

/// `rule` with one extra key, or `None` when the classifier produced nothing.
fn tagged_rule(entries: &[String], mode: RuleMode, key: &str, target: &str) -> Option<Value> {
    let mut rule = classify(entries, mode)?.to_json();
    rule.insert(key.to_string(), json!(target));
    Some(Value::Object(rule))
}

fn dns(settings: &BuildSettings, state: &BuildState, tag_proxy: &str) -> Map<String, Value> {
    let routing = &settings.routing;
    let for_test = state.mode.for_test;
    let mut dns = Map::new();
    let mut servers: Vec<Value> = Vec::new();
    let mut rules: Vec<Value> = Vec::new();

    let server_obj = |tag: &str, addr: &str, detour: &str| {
        let parsed = parse_dns_address(addr);
        let mut obj = json!({
            "tag": tag,
            "type": parsed.kind,
            "domain_resolver": "dns-local",
            "detour": detour,
        });
        if !parsed.server.is_empty() {
            obj["server"] = json!(parsed.server);
        }
        obj
    };

    if !for_test {
        servers.push(server_obj("dns-remote", &routing.remote_dns, tag_proxy));
    }
    let direct = server_obj("dns-direct", &routing.direct_dns, "direct");
    if routing.dns_final_out == "direct" {
        servers.insert(0, direct);
    } else {
        servers.push(direct);
    }
    servers.push(json!({ "tag": "dns-local", "type": "local" }));

    if routing.fake_dns && !for_test {
        servers.push(json!({
            "tag": "dns-fake",
            "type": "fakeip",
            "inet4_range": FAKEIP_INET4_RANGE,
            "inet6_range": FAKEIP_INET6_RANGE,
        }));
        rules.push(json!({ "query_type": ["A", "AAAA"], "server": "dns-fake" }));
        dns.insert("independent_cache".into(), json!(true));
    }

    if !for_test {
        let r = &state.rules;
        rules.extend(tagged_rule(&r.domain_dns_remote, RuleMode::Domain, "server", "dns-remote"));
        rules.extend(tagged_rule(&r.domain_dns_direct, RuleMode::Domain, "server", "dns-direct"));
        dns.insert("reverse_mapping".into(), json!(true));
    }

    dns.insert("servers".into(), Value::Array(servers));
    dns.insert("rules".into(), Value::Array(rules));

    if routing.use_dns_object && !for_test {
        dns = parse_object(&routing.dns_object, "dns_object");
    }
    dns
}

fn route_rules(settings: &BuildSettings, state: &mut BuildState, tag_proxy: &str) {
    let routing = &settings.routing;
    let mut rules = Vec::new();

    if !state.mode.for_test {
        if !routing.domain_strategy.is_empty() {
            rules.push(json!({ "action": "resolve" }));
        }
        if routing.sniffing != SniffingMode::Disable {
            rules.push(json!({ "action": "sniff" }));
        }
        rules.push(json!({
            "action": "hijack-dns",
            "mode": "or",
            "type": "logical",
            "rules": [{ "port": 53 }, { "protocol": "dns" }],
        }));
    }

    let r = &state.rules;
    rules.extend(tagged_rule(&r.domain_block, RuleMode::Domain, "outbound", "block"));
    rules.extend(tagged_rule(&r.domain_remote, RuleMode::Domain, "outbound", tag_proxy));
    rules.extend(tagged_rule(&r.domain_direct, RuleMode::Domain, "outbound", "direct"));
    rules.extend(tagged_rule(&r.ip_block, RuleMode::Ip, "outbound", "block"));
    rules.extend(tagged_rule(&r.ip_remote, RuleMode::Ip, "outbound", tag_proxy));
    rules.extend(tagged_rule(&r.ip_direct, RuleMode::Ip, "outbound", "direct"));

    let tun = &settings.tun;
    if tun.enabled && !state.mode.for_test {
        let match_out = if tun.whitelist { "proxy" } else { "direct" };
        let processes = split_rule_lines(&tun.process_rules);
        if !processes.is_empty() {
            rules.push(json!({ "outbound": match_out, "process_name": processes }));
        }
        let cidrs = split_rule_lines(&tun.cidr_rules);
        if !cidrs.is_empty() {
            rules.push(json!({ "outbound": match_out, "ip_cidr": cidrs }));
        }
        let helpers = helper_bypass_paths(&state.external);
        if !helpers.is_empty() {
            rules.push(json!({ "outbound": "direct", "process_name": helpers }));
        }
    }

    state.routing_rules.extend(rules);
}

/// Helper executables whose own traffic must never loop back through the tun.
pub fn helper_bypass_paths(external: &[ExternalLaunch]) -> Vec<String> {
    external
        .iter()
        .filter(|l| !l.program.trim().is_empty())
        .map(|l| l.program.replace('\\', "/"))
        .collect()
}

fn route(settings: &BuildSettings, state: &mut BuildState) -> Map<String, Value> {
    let mut route = Map::new();
    if state.mode.for_test {
        route.insert("default_domain_resolver".into(), json!("dns-direct"));
        // helper hops still need their mapping rules to be reachable
        if !state.routing_rules.is_empty() {
            route.insert(
                "rules".into(),
                Value::Array(std::mem::take(&mut state.routing_rules)),
            );
        }
        return route;
    }

    let mut custom = parse_object(&settings.routing.custom, "custom route");
    if custom.is_empty() {
        route.insert(
            "rules".into(),
            Value::Array(std::mem::take(&mut state.routing_rules)),
        );
        route.insert("final".into(), json!(settings.routing.def_outbound));
        if settings.tun.enabled {
            route.insert("auto_detect_interface".into(), json!(true));
        }
    } else {
        if let Some(Value::Array(outbounds)) = custom.remove("outbounds") {
            state.outbounds.extend(outbounds);
        }
        if let Some(Value::Object(r)) = custom.remove("route") {
            route = r;
        }
    }
    route
}

fn experimental(settings: &BuildSettings, state: &BuildState) -> Map<String, Value> {
    let mut experimental = Map::new();
    let api = &settings.clash_api;
    if !state.mode.for_test && api.port > 0 {
        experimental.insert(
            "clash_api".into(),
            json!({
                "external_controller": format!("{}:{}", api.listen_addr, api.port),
                "secret": api.secret,
                "external_ui": "dashboard",
            }),
        );
    }
    experimental
}

/// Assemble the full configuration around the root chain of `profile`.
pub fn assemble(
    env: &BuildEnv<'_>,
    state: &mut BuildState,
    profile: &Arc<ProxyProfile>,
) -> Result<Map<String, Value>, BuildError> {
    let settings = env.settings;
    let mut config = Map::new();
    config.insert("log".into(), json!({ "level": settings.log_level }));

    inbounds(settings, state);

    if settings.ntp.enabled {
        config.insert(
            "ntp".into(),
            json!({
                "enabled": true,
                "server": settings.ntp.server,
                "server_port": settings.ntp.server_port,
                "interval": settings.ntp.interval,
            }),
        );
    }

    let tag_proxy = build_chain(env, state, 0, profile)?;
    state
        .outbounds
        .push(json!({ "type": "direct", "tag": "direct" }));

    if !state.mode.for_test {
        collect_user_rules(settings, state);
    }

    let dns = dns(settings, state, &tag_proxy);
    route_rules(settings, state, &tag_proxy);
    let route = route(settings, state);
    let experimental = experimental(settings, state);

    config.insert("dns".into(), Value::Object(dns));
    config.insert(
        "inbounds".into(),
        Value::Array(std::mem::take(&mut state.inbounds)),
    );
    config.insert(
        "outbounds".into(),
        Value::Array(std::mem::take(&mut state.outbounds)),
    );
    config.insert("route".into(), Value::Object(route));
    if !experimental.is_empty() {
        config.insert("experimental".into(), Value::Object(experimental));
    }
    Ok(config)
}
