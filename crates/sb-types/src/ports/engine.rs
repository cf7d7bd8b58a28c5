//! Engine and helper-process ports used by the start/stop controller.

use crate::errors::EngineError;
use crate::ExternalLaunch;
use serde_json::Value;

/// The external proxy engine consuming the compiled configuration.
pub trait EnginePort: Send + Sync {
    /// Start the engine with a complete configuration object.
    fn start(&self, config: &Value) -> Result<(), EngineError>;

    /// Stop the running instance. Stopping an idle engine is not an error.
    fn stop(&self) -> Result<(), EngineError>;
}

/// Spawns and kills helper processes described by [`ExternalLaunch`].
pub trait HelperSupervisor: Send + Sync {
    fn spawn(&self, launch: &ExternalLaunch) -> Result<(), EngineError>;

    /// Kill every helper spawned so far.
    fn kill_all(&self);
}
