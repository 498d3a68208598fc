//! # DDFI Protocol
//!
//! Buell DDFI ECU 串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 协议常量（帧标记、地址、记录长度）
//! - `frame`: 请求帧构建
//! - `checksum`: 异或校验和
//! - `record`: 原始记录与校验结果
//! - `telemetry`: 运行数据通道解码
//!
//! ## 字节序
//!
//! 运行数据记录中的 16 位字段使用小端字节序（低字节在低地址）。
//! 本模块提供了字节序转换工具函数。

pub mod checksum;
pub mod constants;
pub mod frame;
pub mod record;
pub mod telemetry;

// 重新导出常用类型
pub use checksum::{checksum, verify};
pub use constants::*;
pub use frame::{Command, RequestFrame, build_request_frame, expected_record_length};
pub use record::{RawRecord, ValidatedRecord};
pub use telemetry::{Channel, ChannelSpec, FieldWidth, Telemetry, decode_raw};

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid record length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid value for field {field}: 0x{value:02X}")]
    InvalidValue { field: String, value: u8 },
}

/// 小端字节对转 u16
///
/// `low` 位于较低的字节偏移，`high` 位于 `low + 1`。
pub fn u16_from_le_pair(low: u8, high: u8) -> u16 {
    u16::from_le_bytes([low, high])
}

/// 从记录指定偏移读取小端 u16
///
/// 只供通道表使用，调用方保证 `offset + 1 < RECORD_LENGTH`。
pub(crate) fn read_u16_le(record: &[u8; RECORD_LENGTH], offset: usize) -> u16 {
    u16_from_le_pair(record[offset], record[offset + 1])
}
