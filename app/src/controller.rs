//! Start/stop controller / 启停控制器
//!
//! Serializes profile switches: at most one start and one stop are in flight,
//! and a request that would overlap reports busy instead of queueing.
//! 同一时刻最多一个启动、一个停止；重叠的请求直接报告忙碌而不是排队。
//!
//! ## Flow / 流程
//! `start` -> stop running profile -> `build_config` -> engine start -> spawn helpers
//! `stop`  -> kill helpers -> release helper ports -> engine stop

use parking_lot::Mutex;
use sb_config::{build_config, BuildConfigResult, BuildEnv, BuildMode, BuildSettings};
use sb_profile::ProfileStore;
use sb_types::ports::{EnginePort, HelperSupervisor, PortAllocator};
use sb_types::{BuildError, EngineError, ProfileId};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

pub const BUSY_STARTING: &str = "Another profile is starting...";
pub const BUSY_STOPPING: &str = "Another profile is stopping...";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("{0}")]
    Busy(&'static str),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Profile handed to the engine plus the allocator ports its helpers hold.
#[derive(Debug)]
struct Running {
    profile: ProfileId,
    helper_ports: Vec<u16>,
}

pub struct CoreController {
    store: Arc<dyn ProfileStore>,
    settings: Arc<BuildSettings>,
    ports: Arc<dyn PortAllocator>,
    engine: Arc<dyn EnginePort>,
    helpers: Arc<dyn HelperSupervisor>,
    starting: Mutex<()>,
    stopping: Mutex<()>,
    running: Mutex<Option<Running>>,
}

impl CoreController {
    pub fn new(
        store: Arc<dyn ProfileStore>,
        settings: Arc<BuildSettings>,
        ports: Arc<dyn PortAllocator>,
        engine: Arc<dyn EnginePort>,
        helpers: Arc<dyn HelperSupervisor>,
    ) -> Self {
        Self {
            store,
            settings,
            ports,
            engine,
            helpers,
            starting: Mutex::new(()),
            stopping: Mutex::new(()),
            running: Mutex::new(None),
        }
    }

    /// Profile currently handed to the engine.
    pub fn running(&self) -> Option<ProfileId> {
        self.running.lock().as_ref().map(|r| r.profile)
    }

    fn release_ports(&self, ports: &[u16]) {
        for &port in ports {
            self.ports.release(port);
        }
    }

    /// Build `profile_id` and hand it to the engine, replacing whatever runs.
    pub fn start(&self, profile_id: ProfileId) -> Result<BuildConfigResult, ControllerError> {
        let Some(_starting) = self.starting.try_lock() else {
            return Err(ControllerError::Busy(BUSY_STARTING));
        };
        if self.stopping.is_locked() {
            return Err(ControllerError::Busy(BUSY_STOPPING));
        }

        if self.running().is_some() {
            self.stop()?;
        }

        let env = BuildEnv::new(self.store.as_ref(), &self.settings, self.ports.as_ref());
        let result = build_config(&env, profile_id, BuildMode::NORMAL)?;
        if result.need_keep_vpn_off && self.settings.tun.enabled {
            tracing::warn!(profile = profile_id, "helper dials directly; keep tun off");
        }

        if let Err(e) = self
            .engine
            .start(&Value::Object(result.core_config.clone()))
        {
            self.release_ports(&result.helper_ports);
            return Err(e.into());
        }
        for launch in &result.external {
            if let Err(e) = self.helpers.spawn(launch) {
                tracing::error!(program = %launch.program, error = %e, "helper spawn failed");
                self.helpers.kill_all();
                self.release_ports(&result.helper_ports);
                // best effort, the spawn error is what the caller needs
                if let Err(stop_err) = self.engine.stop() {
                    tracing::warn!(error = %stop_err, "engine stop after failed start");
                }
                return Err(e.into());
            }
        }

        *self.running.lock() = Some(Running {
            profile: profile_id,
            helper_ports: result.helper_ports.clone(),
        });
        tracing::info!(
            profile = profile_id,
            helpers = result.external.len(),
            "profile started"
        );
        Ok(result)
    }

    /// Stop the running profile. A stop that overlaps another stop is a no-op.
    pub fn stop(&self) -> Result<(), ControllerError> {
        let Some(_stopping) = self.stopping.try_lock() else {
            tracing::debug!("stop already in progress");
            return Ok(());
        };
        let Some(running) = self.running.lock().take() else {
            return Ok(());
        };
        self.helpers.kill_all();
        self.release_ports(&running.helper_ports);
        self.engine.stop()?;
        tracing::info!(profile = running.profile, "profile stopped");
        Ok(())
    }
}
