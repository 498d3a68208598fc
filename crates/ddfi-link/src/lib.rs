//! # DDFI Link Layer
//!
//! ECU 传输层抽象，提供统一的半双工收发接口。
//!
//! 协议是严格的一问一答：同一时刻只允许一个未完成的请求。
//! 传输层只负责搬运字节，不关心帧格式：
//!
//! - `write()` 同步写出整个请求
//! - `read(max_len)` 返回当前已到达的字节（可能少于 `max_len`），
//!   短读是正常结果而不是错误，由上层判定为"传输不完整"
//!
//! ## 后端
//!
//! - `serial`（默认）：基于 `serialport` 的 USB 转串口设备
//! - `mock`：脚本化的模拟设备，用于测试

use thiserror::Error;

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport, available_ports};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockResponse, MockTransport};

/// ECU 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serial")]
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// 半双工传输
pub trait Transport {
    /// 写出完整请求
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// 读取最多 `max_len` 字节
    ///
    /// 返回已到达的全部字节，可能少于 `max_len`（包括 0 字节）。
    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, LinkError>;

    /// 丢弃接收缓冲区中的残留字节
    fn discard_input(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        (**self).write(bytes)
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, LinkError> {
        (**self).read(max_len)
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        (**self).discard_input()
    }
}
