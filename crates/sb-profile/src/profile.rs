//! Profiles and groups.

use crate::bean::ProfileBean;
use sb_types::{GroupId, ProfileId};
use serde::{Deserialize, Serialize};

/// Per-profile multiplex override.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuxState {
    /// Follow the global default.
    #[default]
    Default,
    On,
    Off,
}

/// One user-defined proxy profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyProfile {
    pub id: ProfileId,
    /// Owning group.
    /// 所属分组。
    #[serde(default)]
    pub group_id: GroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub server_port: u16,
    #[serde(default)]
    pub mux_state: MuxState,
    /// Raw JSON object appended verbatim after this hop's outbound.
    /// 原样追加在该跳出站之后的 JSON 对象。
    #[serde(default)]
    pub custom_outbound: String,
    /// Raw JSON object deep-merged into the final configuration.
    /// 深度合并到最终配置的 JSON 对象。
    #[serde(default)]
    pub custom_config: String,
    pub bean: ProfileBean,
}

impl ProxyProfile {
    pub fn new(id: ProfileId, group_id: GroupId, bean: ProfileBean) -> Self {
        Self {
            id,
            group_id,
            name: String::new(),
            server: String::new(),
            server_port: 0,
            mux_state: MuxState::Default,
            custom_outbound: String::new(),
            custom_config: String::new(),
            bean,
        }
    }

    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.server = server.into();
        self.server_port = port;
        self
    }

    #[must_use]
    pub fn is_chain(&self) -> bool {
        self.bean.is_chain()
    }
}

/// Ordered set of profiles with an optional group-wide front proxy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub profiles: Vec<ProfileId>,
    /// Appended as the outermost hop of every chain built in this group.
    #[serde(default)]
    pub front_proxy_id: Option<ProfileId>,
}
