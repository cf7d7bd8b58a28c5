//! Process-backed engine and helper supervisor.
//!
//! The engine is an external executable started as `<program> run -c <file>`
//! with the compiled configuration written to `<work_dir>/config.json`.
//! Helpers get their config file written before they are spawned.

use parking_lot::Mutex;
use sb_types::ports::{EnginePort, HelperSupervisor};
use sb_types::{EngineError, ExternalLaunch};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

fn io_err(what: &str, e: std::io::Error) -> EngineError {
    EngineError::Io(format!("{what}: {e}"))
}

fn terminate(child: &mut Child) {
    let pid = child.id();
    if let Err(e) = child.kill() {
        tracing::debug!(pid, error = %e, "kill");
    }
    if let Err(e) = child.wait() {
        tracing::debug!(pid, error = %e, "wait");
    }
}

pub struct ProcessEngine {
    program: PathBuf,
    work_dir: PathBuf,
    child: Mutex<Option<Child>>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            work_dir: work_dir.into(),
            child: Mutex::new(None),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.work_dir.join("config.json")
    }
}

impl EnginePort for ProcessEngine {
    fn start(&self, config: &Value) -> Result<(), EngineError> {
        let mut slot = self.child.lock();
        if slot.is_some() {
            return Err(EngineError::Rejected("engine already running".into()));
        }
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| EngineError::Rejected(e.to_string()))?;
        fs::create_dir_all(&self.work_dir).map_err(|e| io_err("create work dir", e))?;
        let path = self.config_path();
        fs::write(&path, text).map_err(|e| io_err("write config", e))?;

        let child = Command::new(&self.program)
            .arg("run")
            .arg("-c")
            .arg(&path)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| io_err("spawn engine", e))?;
        tracing::info!(pid = child.id(), program = %self.program.display(), "engine started");
        *slot = Some(child);
        Ok(())
    }

    fn stop(&self) -> Result<(), EngineError> {
        if let Some(mut child) = self.child.lock().take() {
            terminate(&mut child);
            tracing::info!("engine stopped");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ProcessSupervisor {
    children: Mutex<Vec<(String, Child)>>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.children.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HelperSupervisor for ProcessSupervisor {
    fn spawn(&self, launch: &ExternalLaunch) -> Result<(), EngineError> {
        if let Some(file) = &launch.config_file {
            fs::write(&file.path, &file.contents).map_err(|e| io_err("write helper config", e))?;
        }
        let child = Command::new(&launch.program)
            .args(&launch.arguments)
            .envs(launch.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| io_err(&format!("spawn {}", launch.program), e))?;
        tracing::info!(tag = %launch.tag, pid = child.id(), "helper started");
        self.children.lock().push((launch.tag.clone(), child));
        Ok(())
    }

    fn kill_all(&self) {
        let children = std::mem::take(&mut *self.children.lock());
        for (tag, mut child) in children {
            terminate(&mut child);
            tracing::debug!(tag = %tag, "helper stopped");
        }
    }
}
