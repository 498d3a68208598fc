//! 配置管理命令

use crate::config::{LoggerConfig, config_file, default_log_dir};
use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 设置配置项
    Set {
        /// 串口设备（如 /dev/ttyUSB0, COM3）
        #[arg(short, long)]
        port: Option<String>,

        /// 波特率
        #[arg(short, long)]
        baud_rate: Option<u32>,

        /// 日志目录
        #[arg(short, long)]
        log_dir: Option<PathBuf>,

        /// 是否写入校验失败的记录
        #[arg(long)]
        persist_invalid: Option<bool>,
    },

    /// 获取配置项
    Get {
        /// 配置项名称
        #[arg(default_value = "all")]
        key: String,
    },

    /// 检查配置
    Check,
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Set {
                port,
                baud_rate,
                log_dir,
                persist_invalid,
            } => Self::set_(port, baud_rate, log_dir, persist_invalid),

            ConfigCommand::Get { key } => Self::get_(&key),

            ConfigCommand::Check => Self::check_(),
        }
    }

    fn set_(
        port: Option<String>,
        baud_rate: Option<u32>,
        log_dir: Option<PathBuf>,
        persist_invalid: Option<bool>,
    ) -> Result<()> {
        let mut config = LoggerConfig::load()?;

        if let Some(port) = port {
            println!("✅ 设置串口: {}", port);
            config.port = Some(port);
        }

        if let Some(baud_rate) = baud_rate {
            println!("✅ 设置波特率: {}", baud_rate);
            config.baud_rate = Some(baud_rate);
        }

        if let Some(dir) = log_dir {
            println!("✅ 设置日志目录: {}", dir.display());
            config.log_dir = Some(dir);
        }

        if let Some(persist) = persist_invalid {
            println!("✅ 写入校验失败的记录: {}", persist);
            config.persist_invalid = Some(persist);
        }

        let path = config.save()?;
        println!("💾 已保存: {}", path.display());
        Ok(())
    }

    fn get_(key: &str) -> Result<()> {
        let config = LoggerConfig::load()?;

        match key {
            "port" => println!("{}", config.port.as_deref().unwrap_or("(未设置)")),

            "baud_rate" => match config.baud_rate {
                Some(baud) => println!("{}", baud),
                None => println!("(未设置)"),
            },

            "log_dir" => match config.log_dir {
                Some(ref dir) => println!("{}", dir.display()),
                None => println!("(未设置)"),
            },

            "persist_invalid" => match config.persist_invalid {
                Some(persist) => println!("{}", persist),
                None => println!("(未设置)"),
            },

            _ => print!("{}", toml::to_string_pretty(&config)?),
        }

        Ok(())
    }

    fn check_() -> Result<()> {
        let path = config_file()?;
        let config = LoggerConfig::load()?;

        println!("配置文件: {}", path.display());
        if !path.exists() {
            println!("  (不存在，使用默认值)");
        }
        println!("  串口: {:?}", config.port);
        println!("  波特率: {:?}", config.baud_rate);
        match config.log_dir {
            Some(ref dir) => println!("  日志目录: {}", dir.display()),
            None => println!("  日志目录: {} (默认)", default_log_dir()?.display()),
        }
        println!("  写入策略: {:?}", config.persist_policy());

        match config.poll.validate() {
            Ok(()) => println!("✅ 轮询参数有效"),
            Err(e) => println!("❌ 轮询参数无效: {}", e),
        }

        Ok(())
    }
}
