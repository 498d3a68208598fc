//! # DDFI CLI
//!
//! Buell DDFI ECU 数据记录器与离线读取工具。
//!
//! ```bash
//! # 配置默认串口
//! ddfi-cli config set --port /dev/ttyUSB0
//!
//! # 记录（Ctrl+C 停止）
//! ddfi-cli log
//!
//! # 离线读取
//! ddfi-cli read 04-07-24_09-05-30.log
//!
//! # 读取 ECU 版本
//! ddfi-cli probe
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod display;

use commands::{ConfigCommand, LogCommand, ProbeCommand, ReadCommand};

/// DDFI CLI - ECU 数据记录工具
#[derive(Parser, Debug)]
#[command(name = "ddfi-cli")]
#[command(about = "Telemetry logger for Buell DDFI ECUs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 记录运行数据
    Log {
        #[command(flatten)]
        args: LogCommand,
    },

    /// 离线读取会话日志
    Read {
        #[command(flatten)]
        args: ReadCommand,
    },

    /// 发送单个请求并显示原始响应
    Probe {
        #[command(flatten)]
        args: ProbeCommand,
    },

    /// 列出串口设备
    Ports,
}

fn main() -> Result<()> {
    // 初始化日志（stderr，stdout 留给状态显示和读取输出）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ddfi_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(cmd) => cmd.execute(),

        Commands::Log { args } => args.execute(),

        Commands::Read { args } => args.execute(),

        Commands::Probe { args } => args.execute(),

        Commands::Ports => {
            let ports = ddfi_link::available_ports()?;
            if ports.is_empty() {
                println!("(未检测到串口设备)");
            }
            for port in ports {
                println!("{}", port);
            }
            Ok(())
        },
    }
}
