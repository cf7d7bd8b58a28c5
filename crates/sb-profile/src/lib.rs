//! Proxy profile data model and store
//! 代理配置档案的数据模型与存储
//!
//! Profiles are created and persisted by an external editor; this crate only
//! describes their shape and exposes a read-only lookup interface.
//! 档案由外部编辑器创建和持久化；本 crate 只描述其结构并提供只读查询接口。
//!
//! ## Key Types / 关键类型
//! - [`ProxyProfile`]: one profile, with a closed [`ProfileBean`] payload.
//! - [`Group`]: ordered profile ids plus an optional front proxy.
//! - [`ProfileStore`]: lookup-by-id port consumed by the compiler.

pub mod bean;
pub mod profile;
pub mod store;

pub use bean::{
    ChainBean, CustomBean, CustomCore, ExternalMode, HysteriaAuth, Network, ProfileBean,
    QuicBean, Security, ShadowsocksBean, ShadowsocksRBean, SocksHttpBean, SocksVersion, SshBean,
    StreamSettings, TrojanVlessBean, VmessBean, WireGuardBean,
};
pub use profile::{Group, MuxState, ProxyProfile};
pub use store::{MemoryStore, ProfileStore};
