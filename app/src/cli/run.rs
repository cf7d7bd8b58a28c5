//! Service run / 运行
//!
//! Starts one profile through the [`CoreController`] with a process-backed
//! engine and helper supervisor, then waits for Ctrl+C (or SIGTERM on unix)
//! and stops everything.
//! 通过控制器启动档案，等待 Ctrl+C（unix 上也接受 SIGTERM）后停止引擎与辅助进程。

use crate::config_loader::{self, SourceArgs};
use crate::controller::CoreController;
use crate::supervisor::{ProcessEngine, ProcessSupervisor};
use anyhow::{Context, Result};
use clap::Args;
use sb_config::LoopbackPortAllocator;
use sb_types::ProfileId;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[arg(short = 'p', long = "profile")]
    pub profile: ProfileId,
    /// Engine executable, started as `<engine> run -c <config>`
    #[arg(long)]
    pub engine: PathBuf,
    /// Where the engine configuration is written
    #[arg(long = "work-dir")]
    pub work_dir: Option<PathBuf>,
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term = signal(SignalKind::terminate()).context("install SIGTERM handler")?;
    tokio::select! {
        r = tokio::signal::ctrl_c() => r.context("wait for Ctrl+C")?,
        _ = term.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await.context("wait for Ctrl+C")
}

pub async fn run(args: RunArgs) -> Result<()> {
    let inputs = config_loader::load(&args.source)?;
    let work_dir = args
        .work_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("sb-run"));

    let controller = Arc::new(CoreController::new(
        Arc::new(inputs.store),
        Arc::new(inputs.settings),
        Arc::new(LoopbackPortAllocator::new()),
        Arc::new(ProcessEngine::new(&args.engine, work_dir)),
        Arc::new(ProcessSupervisor::new()),
    ));

    let profile = args.profile;
    let c = controller.clone();
    tokio::task::spawn_blocking(move || c.start(profile))
        .await
        .context("start worker")?
        .with_context(|| format!("start profile {profile}"))?;

    shutdown_signal().await?;
    tracing::info!("shutting down");
    tokio::task::spawn_blocking(move || controller.stop())
        .await
        .context("stop worker")?
        .context("stop profile")?;
    Ok(())
}
