// apps/pq_cli/src/main.rs

//! PetroEquil 命令行界面
//!
//! 提供油藏平衡初始化的命令行工具：从 JSON 场景文件计算初始
//! 压力场与饱和度场，或只做配置验证。
//!
//! 本层遵循零泛型原则：只使用 `ScenarioConfig` 与 `&dyn` 接口，
//! 不暴露引擎内部的类型参数。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// PetroEquil 平衡初始化命令行工具
#[derive(Parser)]
#[command(name = "pq_cli")]
#[command(author = "PetroEquil Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PetroEquil reservoir equilibration tool", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行平衡初始化
    Run(commands::run::RunArgs),
    /// 显示信息
    Info(commands::info::InfoArgs),
    /// 验证场景配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 执行命令
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
