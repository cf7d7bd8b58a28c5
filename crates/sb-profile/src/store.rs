//! Read-only profile store.
//!
//! The compiler only needs lookups by id; [`MemoryStore`] is the in-process
//! implementation, loadable from a JSON or YAML document.

use crate::profile::{Group, ProxyProfile};
use anyhow::{anyhow, Context, Result};
use sb_types::{GroupId, ProfileId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Lookup interface for profiles and groups.
///
/// Absent ids return `None`; callers turn that into a build error.
pub trait ProfileStore: Send + Sync {
    fn profile(&self, id: ProfileId) -> Option<Arc<ProxyProfile>>;

    fn group(&self, id: GroupId) -> Option<Arc<Group>>;

    /// All profile ids in ascending order.
    fn profile_ids(&self) -> Vec<ProfileId>;
}

/// On-disk shape accepted by [`MemoryStore::load`].
#[derive(Debug, Default, Deserialize)]
struct StoreDoc {
    #[serde(default)]
    groups: Vec<Group>,
    #[serde(default)]
    profiles: Vec<ProxyProfile>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    profiles: BTreeMap<ProfileId, Arc<ProxyProfile>>,
    groups: BTreeMap<GroupId, Arc<Group>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from owned values. Duplicate ids are rejected.
    pub fn from_parts(
        profiles: impl IntoIterator<Item = ProxyProfile>,
        groups: impl IntoIterator<Item = Group>,
    ) -> Result<Self> {
        let mut store = Self::new();
        for mut g in groups {
            // Stored data uses a negative id for "no front proxy".
            g.front_proxy_id = g.front_proxy_id.filter(|id| *id >= 0);
            let id = g.id;
            if store.groups.insert(id, Arc::new(g)).is_some() {
                return Err(anyhow!("duplicate group id {id}"));
            }
        }
        for p in profiles {
            let id = p.id;
            if store.profiles.insert(id, Arc::new(p)).is_some() {
                return Err(anyhow!("duplicate profile id {id}"));
            }
        }
        Ok(store)
    }

    /// Parse a store document, trying JSON first and falling back to YAML.
    pub fn from_text(text: &str) -> Result<Self> {
        let doc: StoreDoc = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(json_err) => serde_yaml::from_str(text).map_err(|yaml_err| {
                anyhow!("profile store is neither JSON ({json_err}) nor YAML ({yaml_err})")
            })?,
        };
        let store = Self::from_parts(doc.profiles, doc.groups)?;
        tracing::debug!(
            profiles = store.profiles.len(),
            groups = store.groups.len(),
            "profile store loaded"
        );
        Ok(store)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read profile store {}", path.display()))?;
        Self::from_text(&text).with_context(|| format!("parse profile store {}", path.display()))
    }

    pub fn insert_profile(&mut self, profile: ProxyProfile) {
        self.profiles.insert(profile.id, Arc::new(profile));
    }

    pub fn insert_group(&mut self, group: Group) {
        self.groups.insert(group.id, Arc::new(group));
    }
}

impl ProfileStore for MemoryStore {
    fn profile(&self, id: ProfileId) -> Option<Arc<ProxyProfile>> {
        self.profiles.get(&id).cloned()
    }

    fn group(&self, id: GroupId) -> Option<Arc<Group>> {
        self.groups.get(&id).cloned()
    }

    fn profile_ids(&self) -> Vec<ProfileId> {
        self.profiles.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::ProfileBean;

    #[test]
    fn load_yaml_store() -> anyhow::Result<()> {
        let y = r#"
groups:
  - id: 0
    profiles: [1, 2]
    front_proxy_id: -1
profiles:
  - id: 1
    server: "a.example"
    server_port: 443
    bean: { type: trojan, password: "pw" }
  - id: 2
    bean: { type: chain, list: [1] }
"#;
        let store = MemoryStore::from_text(y)?;
        assert_eq!(store.profile_ids(), vec![1, 2]);
        let g = store.group(0).ok_or_else(|| anyhow!("group"))?;
        assert_eq!(g.front_proxy_id, None);
        let p = store.profile(2).ok_or_else(|| anyhow!("profile"))?;
        assert!(matches!(p.bean, ProfileBean::Chain(_)));
        assert!(store.profile(9).is_none());
        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let j = r#"{"profiles":[{"id":1,"bean":{"type":"http"}},{"id":1,"bean":{"type":"http"}}]}"#;
        let err = MemoryStore::from_text(j).unwrap_err();
        assert!(err.to_string().contains("duplicate profile id 1"));
    }

    #[test]
    fn load_from_file() -> anyhow::Result<()> {
        let f = tempfile::NamedTempFile::new()?;
        std::fs::write(
            f.path(),
            r#"{"groups":[{"id":3}],"profiles":[{"id":5,"group_id":3,"bean":{"type":"socks"}}]}"#,
        )?;
        let store = MemoryStore::load(f.path())?;
        assert_eq!(store.profile(5).map(|p| p.group_id), Some(3));
        Ok(())
    }
}
