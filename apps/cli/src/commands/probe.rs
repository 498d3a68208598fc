//! 探测命令
//!
//! 发送单个请求并以十六进制输出 ECU 的原始响应，用于检查接线和波特率。

use crate::config::{LoggerConfig, Overrides, Settings};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use ddfi_driver::request_once;
use ddfi_link::{SerialConfig, SerialTransport, available_ports};
use ddfi_protocol::{Command, RECORD_LENGTH, RawRecord};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProbeRequest {
    /// ECU 版本信息（0x56）
    Version,
    /// 一条运行数据记录（0x43）
    Runtime,
}

impl From<ProbeRequest> for Command {
    fn from(request: ProbeRequest) -> Self {
        match request {
            ProbeRequest::Version => Command::Version,
            ProbeRequest::Runtime => Command::RuntimeData,
        }
    }
}

/// 探测命令参数
#[derive(Args, Debug)]
pub struct ProbeCommand {
    /// 串口设备（覆盖配置）
    #[arg(short, long)]
    pub port: Option<String>,

    /// 波特率（覆盖配置）
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// 请求类型
    #[arg(short, long, value_enum, default_value_t = ProbeRequest::Version)]
    pub request: ProbeRequest,

    /// 发送后等待时间（毫秒）
    #[arg(short, long, default_value_t = 200)]
    pub wait_ms: u64,
}

impl ProbeCommand {
    pub fn execute(&self) -> Result<()> {
        let config = LoggerConfig::load()?;
        let settings = Settings::resolve(
            &config,
            Overrides {
                port: self.port.clone(),
                baud_rate: self.baud_rate,
                ..Overrides::default()
            },
        )?;

        let path = match settings.port {
            Some(port) => port,
            None => available_ports()?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("未检测到串口设备"))?,
        };

        println!("⏳ 打开串口 {} ({} baud)...", path, settings.baud_rate);
        let mut transport =
            SerialTransport::open(&SerialConfig::new(path.as_str()).baud_rate(settings.baud_rate))
                .with_context(|| format!("打开串口失败: {}", path))?;

        let command = Command::from(self.request);
        let response = request_once(
            &mut transport,
            command,
            Duration::from_millis(self.wait_ms),
            RECORD_LENGTH,
        )?;

        if response.is_empty() {
            println!("⚠️  无响应");
            return Ok(());
        }

        println!("✅ 收到 {} 字节:", response.len());
        for (i, chunk) in response.chunks(16).enumerate() {
            println!("  {:04X}  {}", i * 16, hex::encode_upper(chunk));
        }

        if command == Command::RuntimeData {
            match RawRecord::try_from(response.as_slice()) {
                Ok(raw) => match raw.validate().decode() {
                    Some(telemetry) => println!("✅ 校验通过\n{}", telemetry.to_line()),
                    None => println!(
                        "❌ 校验失败: 记录 0x{:02X}, 计算 0x{:02X}",
                        raw.recorded_checksum(),
                        raw.computed_checksum()
                    ),
                },
                Err(e) => println!("❌ {}", e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_request_mapping() {
        assert_eq!(Command::from(ProbeRequest::Version), Command::Version);
        assert_eq!(Command::from(ProbeRequest::Runtime), Command::RuntimeData);
    }
}
