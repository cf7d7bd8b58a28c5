//! app entrypoint
//! - tracing 初始化（stderr）
//! - build：编译单个档案并输出配置
//! - check：并发以测试模式编译档案
//! - run：启动引擎与辅助进程，Ctrl+C 停止

use app::{cli, logging};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    logging::init_logging()?;

    match args.command {
        cli::Commands::Build(a) => cli::build::run(a),
        cli::Commands::Check(a) => {
            let code = cli::check::run(a).await?;
            std::process::exit(code);
        }
        cli::Commands::Run(a) => cli::run::run(a).await,
    }
}
