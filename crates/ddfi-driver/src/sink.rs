//! 状态显示
//!
//! 采集循环只向显示端写入文本，从不读取，显示端不参与控制流程。

use ddfi_protocol::{Channel, Telemetry};
use std::time::Duration;

/// 状态显示端
pub trait StatusSink {
    /// 替换当前画面的全部文本行
    fn draw(&mut self, lines: &[String]);

    /// 将画面推送到显示设备
    fn present(&mut self) {}
}

impl<S: StatusSink + ?Sized> StatusSink for Box<S> {
    fn draw(&mut self, lines: &[String]) {
        (**self).draw(lines)
    }

    fn present(&mut self) {
        (**self).present()
    }
}

/// 常用画面
pub mod screens {
    use super::*;

    /// 校验通过：累计字节数、错误数和几个关键通道
    pub fn comm_ok(bytes_written: u64, errors: u64, telemetry: &Telemetry) -> Vec<String> {
        let mut lines = vec![
            "Comm OK!".to_string(),
            format!("Bytes: {}", bytes_written),
            format!("Errors: {}", errors),
        ];
        let channels = [Channel::EngineSpeed, Channel::EngineTemp, Channel::BatteryVoltage];
        lines.push(
            channels
                .iter()
                .map(|c| {
                    format!(
                        "{}: {:.prec$}",
                        c.label(),
                        telemetry.get(*c),
                        prec = c.precision()
                    )
                })
                .collect::<Vec<_>>()
                .join(" "),
        );
        lines
    }

    /// 校验失败：错误数和当前等待时间
    pub fn checksum_error(errors: u64, delay: Duration) -> Vec<String> {
        vec![
            "Comm error!".to_string(),
            format!("Errors: {}", errors),
            format!("Delay: {} ms", delay.as_millis()),
        ]
    }

    /// 传输不完整
    pub fn incomplete(received: usize, expected: usize) -> Vec<String> {
        vec![
            "Comm error!".to_string(),
            format!("Incomplete: {}/{} bytes", received, expected),
        ]
    }

    /// 长暂停
    pub fn cooling_down(cooldown: Duration) -> Vec<String> {
        vec![
            "Comm error!".to_string(),
            format!("Pausing {} s", cooldown.as_secs()),
        ]
    }

    /// 串口不可用
    pub fn serial_not_found() -> Vec<String> {
        vec!["Serial not found".to_string()]
    }
}

/// 内存显示端（测试用），保存每一帧画面
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    frames: Vec<Vec<String>>,
    pending: Vec<String>,
    presented: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已推送的所有画面
    pub fn frames(&self) -> &[Vec<String>] {
        &self.frames
    }

    /// 最后一帧画面
    pub fn last(&self) -> Option<&[String]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// `present` 调用次数
    pub fn present_count(&self) -> usize {
        self.presented
    }
}

impl StatusSink for MemorySink {
    fn draw(&mut self, lines: &[String]) {
        self.pending = lines.to_vec();
    }

    fn present(&mut self) {
        self.frames.push(std::mem::take(&mut self.pending));
        self.presented += 1;
    }
}
