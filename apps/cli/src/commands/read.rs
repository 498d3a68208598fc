//! 读取命令
//!
//! 离线解码会话日志，逐条输出校验通过的记录。

use anyhow::Result;
use clap::Args;
use ddfi_tools::{LogReader, summarize};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// 读取命令参数
#[derive(Args, Debug)]
pub struct ReadCommand {
    /// 日志文件路径
    pub file: PathBuf,

    /// 每条记录输出一个 JSON 对象（JSON Lines）
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    index: u64,
    #[serde(flatten)]
    telemetry: &'a ddfi_protocol::Telemetry,
}

impl ReadCommand {
    pub fn execute(&self) -> Result<()> {
        let reader = LogReader::open(&self.file)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        if !self.json {
            writeln!(out, "{}", format_header(reader.header()))?;
            writeln!(out)?;
        }

        let mut write_error = None;
        let summary = summarize(reader, |frame, telemetry| {
            if write_error.is_some() {
                return;
            }
            let result = if self.json {
                serde_json::to_string(&JsonRecord {
                    index: frame.index,
                    telemetry,
                })
                .map_err(anyhow::Error::from)
                .and_then(|line| writeln!(out, "{}", line).map_err(anyhow::Error::from))
            } else {
                writeln!(out, "{}", telemetry.to_line()).map_err(anyhow::Error::from)
            };
            if let Err(e) = result {
                write_error = Some(e);
            }
        })?;

        if let Some(e) = write_error {
            return Err(e);
        }

        if self.json {
            eprintln!("{}", serde_json::to_string(&summary)?);
        } else {
            writeln!(out, "Record count: {}", summary.records)?;
            writeln!(out, "Error count: {}", summary.checksum_errors)?;
            if summary.truncated {
                writeln!(out, "⚠️  文件末尾有不完整的记录")?;
            }
        }

        Ok(())
    }
}

/// 文件头显示为可读形式：`BUEKA\x00\x00\x00\x01`
fn format_header(header: &[u8]) -> String {
    header
        .iter()
        .map(|b| {
            if b.is_ascii_graphic() {
                (*b as char).to_string()
            } else {
                format!("\\x{:02x}", b)
            }
        })
        .collect()
}
