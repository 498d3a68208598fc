//! 串口后端
//!
//! 通过 USB 转串口适配器（FTDI 等）连接 ECU 诊断口，固定 8N1、无流控。

use crate::{DEFAULT_BAUD_RATE, LinkError, Transport};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info, trace};

/// 串口配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// 设备路径（如 "/dev/ttyUSB0"）
    pub path: String,
    /// 波特率（默认 9600）
    pub baud_rate: u32,
    /// 单次读取超时
    ///
    /// 上层已在读取前等待过轮询间隔，这里只用于收尾，不宜过长。
    pub read_timeout: Duration,
}

impl SerialConfig {
    /// 使用默认波特率创建配置
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(20),
        }
    }

    /// 设置波特率
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// 设置读取超时
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// 串口传输
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport {
    /// 打开并配置串口
    ///
    /// # Errors
    /// - `LinkError::Serial`: 设备不存在、无权限或参数不被支持
    pub fn open(config: &SerialConfig) -> Result<Self, LinkError> {
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()?;

        // 丢弃打开前积压的字节，避免第一条响应错位
        port.clear(ClearBuffer::All)?;

        info!(
            "Opened serial port: {} at {} baud",
            config.path, config.baud_rate
        );

        Ok(Self {
            port,
            path: config.path.clone(),
        })
    }

    /// 设备路径
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        trace!("TX {} bytes: {:02X?}", bytes.len(), bytes);
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, LinkError> {
        let mut buf = vec![0u8; max_len];
        let mut filled = 0;

        while filled < max_len {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        buf.truncate(filled);
        trace!("RX {} of {} bytes", filled, max_len);
        Ok(buf)
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        let pending = self.port.bytes_to_read()?;
        if pending > 0 {
            debug!("Discarding {} stale bytes on {}", pending, self.path);
        }
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

/// 列出系统中的串口设备
pub fn available_ports() -> Result<Vec<String>, LinkError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}
