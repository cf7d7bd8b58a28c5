//! Input loading for the CLI
//!
//! # Global Strategic Logic / 全局战略逻辑
//! Every subcommand reads the same two documents: the profile store and the
//! settings snapshot. Both accept JSON or YAML; a missing settings path means
//! all defaults.
//! 所有子命令读取相同的两份文档：档案库与设置快照；均支持 JSON 或 YAML，未指定设置时使用默认值。

use anyhow::{Context, Result};
use clap::Args;
use sb_config::BuildSettings;
use sb_profile::MemoryStore;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Profile store (JSON/YAML with `groups` and `profiles`)
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
    /// Settings snapshot (JSON/YAML); defaults when omitted
    #[arg(short = 'c', long = "settings")]
    pub settings: Option<PathBuf>,
}

/// Loaded inputs shared by one command invocation.
pub struct Inputs {
    pub store: MemoryStore,
    pub settings: BuildSettings,
}

pub fn load(args: &SourceArgs) -> Result<Inputs> {
    let store = MemoryStore::load(&args.store)?;
    let settings = match &args.settings {
        Some(path) => BuildSettings::load(path)?,
        None => BuildSettings::default(),
    };
    tracing::debug!(
        store = %args.store.display(),
        settings = ?args.settings,
        "inputs loaded"
    );
    Ok(Inputs { store, settings })
}

/// Write `text` to `out`, or stdout when `out` is `None` or `-`.
pub fn write_output(out: Option<&PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(path) if path.as_os_str() != "-" => std::fs::write(path, text)
            .with_context(|| format!("write {}", path.display())),
        _ => {
            println!("{text}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_when_omitted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = dir.path().join("store.yaml");
        std::fs::write(&store, "groups: [{ id: 1 }]\nprofiles: []\n")?;
        let inputs = load(&SourceArgs {
            store,
            settings: None,
        })?;
        assert_eq!(inputs.settings, BuildSettings::default());
        Ok(())
    }

    #[test]
    fn missing_store_names_the_path() {
        let err = load(&SourceArgs {
            store: PathBuf::from("/nonexistent/store.json"),
            settings: None,
        })
        .err()
        .map(|e| format!("{e:#}"))
        .unwrap_or_default();
        assert!(err.contains("/nonexistent/store.json"), "{err}");
    }
}
