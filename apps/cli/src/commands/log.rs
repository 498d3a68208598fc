//! 记录命令
//!
//! 连接 ECU，持续轮询运行数据并写入会话日志，直到 Ctrl+C。

use crate::config::{LoggerConfig, Overrides, Settings};
use crate::display::TerminalSink;
use anyhow::{Context, Result};
use clap::Args;
use ddfi_driver::{AcquisitionBuilder, StatusSink, screens};
use ddfi_link::{SerialConfig, SerialTransport, available_ports};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 记录命令参数
#[derive(Args, Debug)]
pub struct LogCommand {
    /// 日志目录（覆盖配置）
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// 串口设备（覆盖配置，默认使用第一个检测到的串口）
    #[arg(short, long)]
    pub port: Option<String>,

    /// 波特率（覆盖配置）
    #[arg(short, long)]
    pub baud_rate: Option<u32>,

    /// 只写入校验通过的记录
    #[arg(long)]
    pub verified_only: bool,
}

impl LogCommand {
    pub fn execute(&self) -> Result<()> {
        let config = LoggerConfig::load()?;
        let settings = Settings::resolve(
            &config,
            Overrides {
                port: self.port.clone(),
                baud_rate: self.baud_rate,
                log_dir: self.dir.clone(),
                verified_only: self.verified_only,
            },
        )?;

        let mut sink = TerminalSink::new();

        let transport = match open_transport(&settings) {
            Ok(transport) => transport,
            Err(e) => {
                tracing::error!("Failed to open serial port: {:#}", e);
                sink.draw(&screens::serial_not_found());
                sink.present();
                sink.finish();
                std::process::exit(1);
            },
        };

        std::fs::create_dir_all(&settings.log_dir)
            .with_context(|| format!("创建日志目录失败: {}", settings.log_dir.display()))?;

        let mut acquisition = AcquisitionBuilder::new()
            .transport(transport)
            .sink(sink)
            .log_dir(&settings.log_dir)
            .poll_config(settings.poll.clone())
            .persist_policy(settings.policy)
            .build()?;

        println!("💾 记录到: {}", acquisition.writer().path().display());
        println!("⏳ 按 Ctrl+C 停止");

        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        ctrlc::set_handler(move || {
            flag.store(false, Ordering::Release);
        })
        .context("设置信号处理失败")?;

        let stats = acquisition.run_until(&running)?;
        let bytes = acquisition.writer().bytes_written();
        drop(acquisition);

        println!(
            "✅ 记录完成: {} 次轮询, {} 条有效, {} 条校验失败, {} 次不完整, {} 字节",
            stats.cycles, stats.valid, stats.checksum_errors, stats.incomplete, bytes
        );
        Ok(())
    }
}

fn open_transport(settings: &Settings) -> Result<SerialTransport> {
    let path = match &settings.port {
        Some(port) => port.clone(),
        None => available_ports()?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("未检测到串口设备"))?,
    };

    let config = SerialConfig::new(path).baud_rate(settings.baud_rate);
    Ok(SerialTransport::open(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_command_creation() {
        let cmd = LogCommand {
            dir: Some(PathBuf::from("/tmp/ddfi")),
            port: Some("/dev/ttyUSB0".to_string()),
            baud_rate: None,
            verified_only: true,
        };

        assert_eq!(cmd.dir.as_deref(), Some(std::path::Path::new("/tmp/ddfi")));
        assert!(cmd.verified_only);
    }
}
