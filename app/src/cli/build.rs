use crate::config_loader::{self, SourceArgs};
use anyhow::{Context, Result};
use clap::Args;
use sb_config::{build_config, BuildEnv, BuildMode, LoopbackPortAllocator};
use sb_types::ProfileId;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Profile id to compile
    #[arg(short = 'p', long = "profile")]
    pub profile: ProfileId,
    /// Connectivity-test build (no inbounds, no user routing)
    #[arg(long)]
    pub test: bool,
    /// Export build
    #[arg(long)]
    pub export: bool,
    /// Print the whole build result (helper launches, traffic bindings)
    #[arg(long)]
    pub full: bool,
    #[arg(long)]
    pub pretty: bool,
    /// Output file; stdout when omitted or `-`
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

pub fn run(args: BuildArgs) -> Result<()> {
    let inputs = config_loader::load(&args.source)?;
    let ports = LoopbackPortAllocator::new();
    let env = BuildEnv::new(&inputs.store, &inputs.settings, &ports);
    let mode = BuildMode {
        for_test: args.test,
        for_export: args.export,
    };

    let result = build_config(&env, args.profile, mode)
        .with_context(|| format!("build profile {}", args.profile))?;
    for launch in &result.external {
        tracing::info!(tag = %launch.tag, program = %launch.program, "helper required");
    }

    let value = if args.full {
        serde_json::to_value(&result)?
    } else {
        Value::Object(result.core_config)
    };
    let text = if args.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    config_loader::write_output(args.out.as_ref(), &text)
}
