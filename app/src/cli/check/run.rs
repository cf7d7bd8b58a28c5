//! Concurrent test-mode builds.
//!
//! Each profile is compiled on a blocking worker; all builds share one settings
//! snapshot, one store and one port allocator.

use super::args::CheckArgs;
use super::types::{CheckEntry, CheckReport};
use crate::config_loader;
use anyhow::{Context, Result};
use sb_config::{build_config, BuildEnv, BuildMode, BuildSettings, LoopbackPortAllocator};
use sb_profile::{MemoryStore, ProfileStore};
use sb_types::ports::PortAllocator;
use sb_types::ProfileId;
use std::sync::Arc;
use tokio::task::JoinSet;

fn check_one(
    store: &MemoryStore,
    settings: &BuildSettings,
    ports: &LoopbackPortAllocator,
    id: ProfileId,
) -> CheckEntry {
    let name = store.profile(id).map(|p| p.name.clone()).unwrap_or_default();
    let env = BuildEnv::new(store, settings, ports);
    match build_config(&env, id, BuildMode::TEST) {
        Ok(r) => {
            // nothing is launched, so the helper ports go straight back
            for &port in &r.helper_ports {
                ports.release(port);
            }
            let outbounds = r
                .core_config
                .get("outbounds")
                .and_then(|o| o.as_array())
                .map_or(0, Vec::len);
            CheckEntry::passed(id, name, outbounds)
        }
        Err(e) => {
            tracing::warn!(profile = id, error = %e, "check failed");
            CheckEntry::failed(id, name, &e)
        }
    }
}

/// Returns the process exit code: 0 when every build succeeded.
pub async fn run(args: CheckArgs) -> Result<i32> {
    let inputs = config_loader::load(&args.source)?;
    let ids = if args.profiles.is_empty() {
        inputs.store.profile_ids()
    } else {
        args.profiles.clone()
    };

    let store = Arc::new(inputs.store);
    let settings = Arc::new(inputs.settings);
    let ports = Arc::new(LoopbackPortAllocator::new());

    let mut set = JoinSet::new();
    for id in ids {
        let (store, settings, ports) = (store.clone(), settings.clone(), ports.clone());
        set.spawn_blocking(move || check_one(&store, &settings, &ports, id));
    }
    let mut entries = Vec::new();
    while let Some(joined) = set.join_next().await {
        entries.push(joined.context("check worker")?);
    }

    let report = CheckReport::new(entries);
    tracing::info!(total = report.total, failed = report.failed, "check finished");
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for e in &report.entries {
            println!("{}", e.to_line());
        }
        println!("{} checked, {} failed", report.total, report.failed);
    }
    Ok(if report.ok { 0 } else { 1 })
}
