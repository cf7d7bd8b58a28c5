//! Proxy chain configuration compiler
//! 代理链配置编译器
//!
//! # Global Strategic Logic / 全局战略逻辑
//! Turns a selected profile plus a settings snapshot into one sing-box
//! configuration document, and describes the helper processes that must run
//! beside the engine.
//! 将选中的档案与设置快照编译为一份 sing-box 配置文档，并描述需要与引擎并行运行的辅助进程。
//!
//! ## Strategic Workflow / 战略工作流
//! `Profile` -> `Resolve chain` -> `Build hops` -> `Assemble (inbounds/DNS/route)` -> `Merge custom_config`
//! `档案` -> `解析链` -> `构建各跳` -> `组装（入站/DNS/路由）` -> `合并自定义配置`
//!
//! ## Key Modules / 关键模块
//! - [`chain`]: hop resolution, tag assignment and linking.
//!   跳解析、标签分配与链接。
//! - [`outbound`]: per-protocol outbound translators.
//!   各协议出站翻译器。
//! - [`assemble`]: top-level document assembly and [`build_config`].
//!   顶层文档组装与 [`build_config`]。
//! - [`settings`]: the read-only settings snapshot.
//!   只读设置快照。

use sb_profile::ProfileStore;
use sb_types::ports::PortAllocator;

pub mod assemble;
pub mod chain;
pub mod defaults;
pub mod dns;
pub mod external;
pub mod merge;
pub mod outbound;
pub mod port_alloc;
pub mod rule;
pub mod settings;

pub use assemble::{build_config, BuildConfigResult};
pub use chain::BuildMode;
pub use port_alloc::LoopbackPortAllocator;
pub use settings::BuildSettings;

/// Read-only collaborators shared by every build.
///
/// Builds may run concurrently against one environment; all mutable state
/// lives in the per-build [`chain::BuildState`].
/// 所有构建共享的只读协作者；可变状态只存在于每次构建自己的 `BuildState` 中。
#[derive(Clone, Copy)]
pub struct BuildEnv<'a> {
    pub store: &'a dyn ProfileStore,
    pub settings: &'a BuildSettings,
    pub ports: &'a dyn PortAllocator,
}

impl<'a> BuildEnv<'a> {
    pub fn new(
        store: &'a dyn ProfileStore,
        settings: &'a BuildSettings,
        ports: &'a dyn PortAllocator,
    ) -> Self {
        Self {
            store,
            settings,
            ports,
        }
    }
}
