//! Chain resolution and hop building.
//! 代理链解析与逐跳构建。

pub mod builder;
pub mod resolve;
pub mod state;

pub use builder::{build_chain, build_chain_hops, PROXY_TAG};
pub use resolve::{resolve_chain, resolve_profile};
pub use state::{BuildMode, BuildState, UserRules};
