//! 终端状态显示

use ddfi_driver::StatusSink;
use std::io::Write;

/// 单行刷新的终端显示（stdout）
///
/// 每次 `present` 用 `\r` 覆盖上一帧，日志输出走 stderr，不会相互打断。
#[derive(Debug, Default)]
pub struct TerminalSink {
    lines: Vec<String>,
    last_width: usize,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 结束单行刷新（换行）
    pub fn finish(&mut self) {
        if self.last_width > 0 {
            println!();
            self.last_width = 0;
        }
    }
}

impl StatusSink for TerminalSink {
    fn draw(&mut self, lines: &[String]) {
        self.lines = lines.to_vec();
    }

    fn present(&mut self) {
        let text = self.lines.join(" | ");
        let width = text.chars().count();
        let padding = self.last_width.saturating_sub(width);
        print!("\r{}{}", text, " ".repeat(padding));
        std::io::stdout().flush().ok();
        self.last_width = width;
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        self.finish();
    }
}
