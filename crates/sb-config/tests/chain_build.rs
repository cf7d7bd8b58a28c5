//! Chain building through the public `build_config` entry point.

use sb_config::chain::{build_chain_hops, BuildState};
use sb_config::{build_config, BuildEnv, BuildMode, BuildSettings};
use sb_profile::{
    ChainBean, CustomBean, CustomCore, Group, MemoryStore, ProfileBean, ProxyProfile,
    SocksHttpBean, VmessBean,
};
use sb_types::ports::SequentialPorts;
use sb_types::{BuildError, TrafficBinding};
use serde_json::{json, Value};
use std::sync::Arc;

fn socks(id: i64) -> ProxyProfile {
    ProxyProfile::new(id, 1, ProfileBean::Socks(SocksHttpBean::default()))
        .with_server(format!("s{id}.example"), 1080)
}

fn chain(id: i64, list: &[i64]) -> ProxyProfile {
    ProxyProfile::new(
        id,
        1,
        ProfileBean::Chain(ChainBean {
            list: list.to_vec(),
        }),
    )
}

fn helper(id: i64) -> ProxyProfile {
    ProxyProfile::new(
        id,
        1,
        ProfileBean::Custom(CustomBean {
            core: CustomCore::External("naive".into()),
            command: vec!["--listen=socks://127.0.0.1:%socks_port%".into()],
            ..Default::default()
        }),
    )
    .with_server("n.example", 443)
}

fn group(front: Option<i64>) -> Group {
    Group {
        id: 1,
        front_proxy_id: front,
        ..Default::default()
    }
}

fn settings() -> BuildSettings {
    let mut s = BuildSettings::default();
    s.helper_cores.insert("naive".into(), "/opt/naive".into());
    s
}

fn outbound<'a>(config: &'a serde_json::Map<String, Value>, tag: &str) -> &'a Value {
    config["outbounds"]
        .as_array()
        .and_then(|o| o.iter().find(|o| o["tag"] == json!(tag)))
        .unwrap_or_else(|| panic!("no outbound {tag}"))
}

fn tags(config: &serde_json::Map<String, Value>) -> Vec<String> {
    config["outbounds"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|o| o["tag"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn single_profile_is_proxy_then_direct() {
    let store = MemoryStore::from_parts([socks(1)], [group(None)]).unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 1, BuildMode::NORMAL).unwrap();
    assert_eq!(tags(&r.core_config), vec!["proxy", "direct"]);
    assert!(outbound(&r.core_config, "proxy").get("detour").is_none());
    assert_eq!(r.outbound_stat, Some(TrafficBinding::new(1, "proxy")));
    assert_eq!(r.outbound_stats, vec![TrafficBinding::new(1, "proxy")]);
    assert!(r.ignore_conn_tags.is_empty());
}

#[test]
fn chain_hops_link_innermost_to_outermost() {
    let store = MemoryStore::from_parts(
        [socks(1), socks(2), socks(3), chain(10, &[1, 2, 3])],
        [group(None)],
    )
    .unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 10, BuildMode::NORMAL).unwrap();
    let c = &r.core_config;
    assert_eq!(tags(c), vec!["proxy", "c-0-2", "g-1", "direct"]);
    assert_eq!(outbound(c, "proxy")["detour"], json!("c-0-2"));
    assert_eq!(outbound(c, "proxy")["server"], json!("s3.example"));
    assert_eq!(outbound(c, "c-0-2")["detour"], json!("g-1"));
    assert!(outbound(c, "g-1").get("detour").is_none());

    assert_eq!(r.ignore_conn_tags, vec!["c-0-2", "g-1"]);
    assert_eq!(r.outbound_stat, Some(TrafficBinding::new(3, "proxy")));
    // one binding per hop plus the chain itself on its exit tag
    assert_eq!(r.outbound_stats.len(), 4);
    assert_eq!(r.outbound_stats[3], TrafficBinding::new(10, "proxy"));
}

#[test]
fn front_proxy_becomes_global_hop() {
    let store = MemoryStore::from_parts([socks(1), socks(7)], [group(Some(7))]).unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 1, BuildMode::NORMAL).unwrap();
    assert_eq!(tags(&r.core_config), vec!["proxy", "g-7", "direct"]);
    assert_eq!(outbound(&r.core_config, "proxy")["detour"], json!("g-7"));
}

#[test]
fn chain_errors_surface_unchanged() {
    let store = MemoryStore::from_parts(
        [socks(1), chain(10, &[1, 42]), chain(11, &[1, 10])],
        [group(None)],
    )
    .unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    assert_eq!(
        build_config(&env, 10, BuildMode::NORMAL).unwrap_err(),
        BuildError::ChainMissing(42)
    );
    assert_eq!(
        build_config(&env, 11, BuildMode::NORMAL).unwrap_err(),
        BuildError::NestedChain(10)
    );
    assert_eq!(
        build_config(&env, 99, BuildMode::NORMAL).unwrap_err(),
        BuildError::ProfileNotFound(99)
    );
}

#[test]
fn missing_group_is_reported() {
    let store = MemoryStore::from_parts([socks(1)], Vec::<Group>::new()).unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);
    assert_eq!(
        build_config(&env, 1, BuildMode::NORMAL).unwrap_err(),
        BuildError::GroupNotFound
    );
}

#[test]
fn mux_applied_once_per_chain() {
    let vmess = |id| {
        ProxyProfile::new(id, 1, ProfileBean::Vmess(VmessBean::default()))
            .with_server("v.example", 443)
    };
    let store =
        MemoryStore::from_parts([vmess(1), vmess(2), chain(10, &[1, 2])], [group(None)]).unwrap();
    let mut settings = settings();
    settings.mux.default_on = true;
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 10, BuildMode::NORMAL).unwrap();
    let with_mux = r.core_config["outbounds"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|o| o.get("multiplex").is_some())
        .count();
    assert_eq!(with_mux, 1);
    assert!(outbound(&r.core_config, "proxy").get("multiplex").is_some());
}

#[test]
fn helper_exit_hop_dials_directly_without_tun() {
    let store = MemoryStore::from_parts([helper(5)], [group(None)]).unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 5, BuildMode::NORMAL).unwrap();
    assert!(r.need_keep_vpn_off);
    assert_eq!(r.external.len(), 1);
    assert_eq!(r.external[0].program, "/opt/naive");
    assert_eq!(r.external[0].arguments, vec!["--listen=socks://127.0.0.1:30001"]);

    let o = outbound(&r.core_config, "proxy");
    assert_eq!(o["type"], json!("socks"));
    assert_eq!(o["server"], json!("127.0.0.1"));
    assert_eq!(o["server_port"], json!(30001));
    // no mapping inbound in direct-dial mode
    let inbounds = r.core_config["inbounds"].as_array().unwrap();
    assert!(inbounds.iter().all(|i| i["tag"] != json!("proxy-mapping")));
}

#[test]
fn helper_inside_chain_gets_mapping_inbound_and_rule() {
    let store = MemoryStore::from_parts(
        [helper(5), socks(6), chain(10, &[6, 5])],
        [group(None)],
    )
    .unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 10, BuildMode::NORMAL).unwrap();
    assert!(!r.need_keep_vpn_off);
    let c = &r.core_config;
    assert_eq!(tags(c), vec!["proxy", "g-6", "direct"]);

    let mapping = c["inbounds"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["tag"] == json!("proxy-mapping"))
        .expect("mapping inbound");
    assert_eq!(mapping["listen"], json!("127.0.0.1"));
    assert_eq!(mapping["listen_port"], json!(30000));
    assert_eq!(mapping["override_address"], json!("n.example"));
    assert_eq!(mapping["override_port"], json!(443));

    let rules = c["route"]["rules"].as_array().unwrap();
    assert!(rules.contains(&json!({ "inbound": ["proxy-mapping"], "outbound": "g-6" })));
    // the helper's own traffic bypasses capture only with tun on
    assert!(rules.iter().all(|r| r.get("process_name").is_none()));
}

#[test]
fn helper_without_command_or_config_cannot_be_configured() {
    let mut p = helper(5);
    if let ProfileBean::Custom(c) = &mut p.bean {
        c.command.clear();
    }
    let store = MemoryStore::from_parts([p], [group(None)]).unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);
    assert_eq!(
        build_config(&env, 5, BuildMode::NORMAL).unwrap_err(),
        BuildError::CannotConfigure
    );
}

#[test]
fn unknown_helper_core_is_reported() {
    let store = MemoryStore::from_parts([helper(5)], [group(None)]).unwrap();
    let settings = BuildSettings::default();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);
    let err = build_config(&env, 5, BuildMode::NORMAL).unwrap_err();
    assert_eq!(err, BuildError::CoreNotFound("naive".into()));
}

#[test]
fn shared_exit_hop_built_once_across_chains() {
    let store = MemoryStore::from_parts([socks(1), socks(2), socks(7)], [group(None)]).unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);
    let hop = |id| Arc::new(socks(id));

    let mut state = BuildState::new(BuildMode::NORMAL);
    let root = build_chain_hops(&env, &mut state, 0, &[hop(1), hop(7)]).unwrap();
    let side = build_chain_hops(&env, &mut state, 3, &[hop(2), hop(7)]).unwrap();
    assert_eq!(root, "proxy");
    assert_eq!(side, "c-3-2");

    let tags: Vec<&str> = state
        .outbounds
        .iter()
        .filter_map(|o| o["tag"].as_str())
        .collect();
    assert_eq!(tags, vec!["proxy", "g-7", "c-3-2"]);
    assert_eq!(state.outbounds[0]["detour"], json!("g-7"));
    assert_eq!(state.outbounds[2]["detour"], json!("g-7"));
    assert!(state.outbounds[1].get("detour").is_none());
    assert_eq!(state.ignore_conn_tags, vec!["g-7", "g-7"]);
}

#[test]
fn allocated_helper_ports_are_reported() {
    let mut fixed = helper(3);
    if let ProfileBean::Custom(c) = &mut fixed.bean {
        c.socks_port = 1090;
    }
    let store = MemoryStore::from_parts(
        [socks(1), helper(2), fixed, chain(10, &[1, 2, 3])],
        [group(None)],
    )
    .unwrap();
    let settings = settings();
    let ports = SequentialPorts::starting_at(30000);
    let env = BuildEnv::new(&store, &settings, &ports);

    let r = build_config(&env, 10, BuildMode::NORMAL).unwrap();
    assert_eq!(r.external.len(), 2);
    // hop 3 keeps its fixed socks port; every other helper port is allocated
    assert_eq!(r.helper_ports.len(), 3);
    assert!(!r.helper_ports.contains(&1090));
}
