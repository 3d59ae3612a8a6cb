use anyhow::Result;
use clap::Parser;
use question_transfer::utils::logging;
use question_transfer::{App, Command, Config};

/// 题目导入导出工具
#[derive(Debug, Parser)]
#[command(name = "question_transfer", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(&config);

    // 初始化并运行应用
    App::initialize(config).run(cli.command).await?;

    Ok(())
}
