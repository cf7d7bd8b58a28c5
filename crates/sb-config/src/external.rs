//! Launch specifications for helper cores.
//!
//! A helper hop runs outside the engine: it listens for SOCKS on one loopback
//! port and, when mapped, dials the real server through a second loopback
//! port owned by the engine. The compiler only describes the process; writing
//! its config file and spawning it belongs to the supervisor.

use crate::defaults::LOOPBACK;
use crate::settings::BuildSettings;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sb_profile::{CustomBean, ExternalMode, ProxyProfile};
use sb_types::{BuildError, ExternalLaunch, HelperConfigFile};

const CONFIG_VAR: &str = "%config%";

/// Loopback ports reserved for one helper hop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HelperPorts {
    pub mapping: u16,
    pub socks: u16,
}

fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect()
}

struct Vars {
    mapping_port: String,
    socks_port: String,
    server_addr: String,
    server_port: String,
}

impl Vars {
    fn apply(&self, s: &str) -> String {
        s.replace("%mapping_port%", &self.mapping_port)
            .replace("%socks_port%", &self.socks_port)
            .replace("%server_addr%", &self.server_addr)
            .replace("%server_port%", &self.server_port)
    }
}

/// Describe the helper process for a custom hop.
///
/// `core` is the helper name; its executable comes from the settings.
pub fn build_external(
    profile: &ProxyProfile,
    bean: &CustomBean,
    core: &str,
    ports: HelperPorts,
    mode: ExternalMode,
    settings: &BuildSettings,
) -> Result<ExternalLaunch, BuildError> {
    let program = settings
        .helper_program(core)
        .ok_or_else(|| BuildError::core_not_found(core))?;

    let uses_config = bean.command.iter().any(|a| a.contains(CONFIG_VAR));
    let has_config = !bean.config_simple.trim().is_empty();
    if uses_config && !has_config {
        return Err(BuildError::rejected(format!(
            "{core}: command references {CONFIG_VAR} but no config is set"
        )));
    }

    // a mapped helper dials the engine's mapping inbound instead of the server
    let (server_addr, server_port) = match mode {
        ExternalMode::Mapped => (LOOPBACK.to_string(), ports.mapping),
        _ => (profile.server.clone(), profile.server_port),
    };
    let vars = Vars {
        mapping_port: ports.mapping.to_string(),
        socks_port: ports.socks.to_string(),
        server_addr,
        server_port: server_port.to_string(),
    };

    let config_file = if has_config {
        let suffix = bean.config_suffix.trim_start_matches('.');
        let name = if suffix.is_empty() {
            format!("custom_{}", random_name())
        } else {
            format!("custom_{}.{}", random_name(), suffix)
        };
        let path = settings.helper_dir().join(name);
        Some(HelperConfigFile {
            path: path.to_string_lossy().into_owned(),
            contents: vars.apply(&bean.config_simple),
        })
    } else {
        None
    };

    let arguments = bean
        .command
        .iter()
        .map(|a| {
            let a = vars.apply(a);
            match &config_file {
                Some(f) => a.replace(CONFIG_VAR, &f.path),
                None => a,
            }
        })
        .collect();

    Ok(ExternalLaunch {
        tag: profile.bean.display_type(),
        program: program.to_string(),
        arguments,
        env: Vec::new(),
        config_file,
    })
}
