//! 记录器配置
//!
//! 保存在 `<config_dir>/ddfi/config.toml`。优先级：命令行参数 > 配置文件 > 内置默认值。

use anyhow::{Context, Result};
use ddfi_driver::{PersistPolicy, PollConfig};
use ddfi_link::DEFAULT_BAUD_RATE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 配置目录
fn config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;

    path.push("ddfi");
    Ok(path)
}

/// 配置文件路径
pub fn config_file() -> Result<PathBuf> {
    let mut path = config_dir()?;
    path.push("config.toml");
    Ok(path)
}

/// 默认日志目录：`<data_dir>/ddfi/logs`
pub fn default_log_dir() -> Result<PathBuf> {
    let mut path = dirs::data_dir().ok_or_else(|| anyhow::anyhow!("无法确定数据目录"))?;
    path.push("ddfi");
    path.push("logs");
    Ok(path)
}

/// 配置文件内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// 串口设备路径
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    /// 波特率
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baud_rate: Option<u32>,

    /// 日志目录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// 是否写入校验失败的记录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_invalid: Option<bool>,

    /// 轮询参数（毫秒）
    pub poll: PollConfig,
}

impl LoggerConfig {
    /// 从默认位置加载，文件不存在时返回默认配置
    pub fn load() -> Result<Self> {
        Self::load_from(config_file()?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("读取配置文件失败")?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 保存到默认位置
    pub fn save(&self) -> Result<PathBuf> {
        let path = config_file()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("创建配置目录失败")?;
        }

        let body = toml::to_string_pretty(self).context("序列化配置失败")?;
        let content = format!("# DDFI Logger Configuration\n\n{}", body);
        fs::write(path, content).context("写入配置文件失败")?;
        Ok(())
    }

    pub fn persist_policy(&self) -> PersistPolicy {
        match self.persist_invalid {
            Some(false) => PersistPolicy::VerifiedOnly,
            _ => PersistPolicy::AllComplete,
        }
    }
}

/// 合并后的运行参数
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub log_dir: PathBuf,
    pub policy: PersistPolicy,
    pub poll: PollConfig,
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub log_dir: Option<PathBuf>,
    pub verified_only: bool,
}

impl Settings {
    pub fn resolve(config: &LoggerConfig, overrides: Overrides) -> Result<Self> {
        let log_dir = match overrides.log_dir.or_else(|| config.log_dir.clone()) {
            Some(dir) => dir,
            None => default_log_dir()?,
        };

        let policy = if overrides.verified_only {
            PersistPolicy::VerifiedOnly
        } else {
            config.persist_policy()
        };

        Ok(Self {
            port: overrides.port.or_else(|| config.port.clone()),
            baud_rate: overrides
                .baud_rate
                .or(config.baud_rate)
                .unwrap_or(DEFAULT_BAUD_RATE),
            log_dir,
            policy,
            poll: config.poll.clone(),
        })
    }
}
