//! 请求帧构建
//!
//! ECU 采用一问一答的半双工协议：主机发送 9 字节请求帧，ECU 回复一条响应。
//! 帧结构固定，只有命令字节和末尾校验字节随命令变化：
//!
//! ```text
//! ┌─────┬─────┬──────┬─────┬─────┬─────┬─────────┬─────┬──────────┐
//! │ SOH │ SRC │ DEST │ LEN │ EOH │ SOT │ COMMAND │ EOT │ CHECKSUM │
//! │ 01  │ 00  │ 42   │ 02  │ FF  │ 02  │ 43 / 56 │ 03  │ XOR 1..8 │
//! └─────┴─────┴──────┴─────┴─────┴─────┴─────────┴─────┴──────────┘
//! ```

use crate::ProtocolError;
use crate::checksum::checksum;
use crate::constants::*;

/// 请求命令
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::IntoPrimitive)]
#[repr(u8)]
pub enum Command {
    /// 读取运行数据（99 字节记录）
    RuntimeData = 0x43,
    /// 读取 ECU 版本信息
    Version = 0x56,
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x43 => Ok(Command::RuntimeData),
            0x56 => Ok(Command::Version),
            _ => Err(ProtocolError::InvalidValue {
                field: "Command".to_string(),
                value,
            }),
        }
    }
}

/// 请求帧
///
/// 不可变的 9 字节序列，构造时计算校验字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    command: Command,
    bytes: [u8; REQUEST_FRAME_LEN],
}

impl RequestFrame {
    /// 构建指定命令的请求帧
    pub fn new(command: Command) -> Self {
        let mut bytes = [
            SOH,
            SOURCE_ID,
            DESTINATION_ID,
            REQUEST_PAYLOAD_LEN,
            EOH,
            SOT,
            command.into(),
            EOT,
            0x00,
        ];
        bytes[REQUEST_FRAME_LEN - 1] = checksum(&bytes, 1, REQUEST_FRAME_LEN - 1);

        Self { command, bytes }
    }

    /// 获取帧字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 获取命令
    pub fn command(&self) -> Command {
        self.command
    }
}

impl AsRef<[u8]> for RequestFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// 构建"读取运行数据"请求帧
///
/// 在整个进程生命周期内保持不变：`01 00 42 02 FF 02 43 03 FD`。
pub fn build_request_frame() -> RequestFrame {
    RequestFrame::new(Command::RuntimeData)
}

/// 运行数据响应的期望长度（字节）
pub fn expected_record_length() -> usize {
    RECORD_LENGTH
}
