//! app library crate
//! 说明：二进制入口在 `main.rs`；这里导出 CLI、控制器与进程管理，供集成测试复用。

pub mod cli;
pub mod config_loader;
pub mod controller;
pub mod logging;
pub mod supervisor;
