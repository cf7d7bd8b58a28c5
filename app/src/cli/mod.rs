pub mod build;
pub mod check;
pub mod run;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "app")]
#[command(about = "Proxy chain configuration compiler", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile one profile into an engine configuration
    Build(build::BuildArgs),
    /// 以测试模式编译档案（并发），报告失败项
    Check(check::CheckArgs),
    /// Start the engine with a profile until Ctrl+C
    Run(run::RunArgs),
}
