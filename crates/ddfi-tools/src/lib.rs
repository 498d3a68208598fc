//! # DDFI Tools - 日志文件格式
//!
//! **依赖原则**: 只依赖 `ddfi-protocol`，避免依赖 `ddfi-driver` 和硬件层
//!
//! ## 包含模块
//!
//! - `recording` - 会话日志的写入与离线读取
//! - `timestamp` - 会话文件命名（按会话开始时间）
//!
//! ## 文件格式
//!
//! ```text
//! [Magic: 9 bytes "BUEKA\0\0\0\x01"]
//! [Frame: 99 bytes raw record + 4 bytes filler] × N
//! ```
//!
//! 与外部日志查看器（MegaLogViewer、EcmSpy）按位兼容：没有尾部、计数或索引，
//! 读取方扫描到短读为止。

pub mod recording;
pub mod timestamp;

// 重新导出常用类型
pub use recording::{
    FILLER, FRAME_LEN, LogFrame, LogReader, LogWriter, MAGIC, ReadSummary, summarize,
};
pub use timestamp::{SESSION_FILE_FORMAT, session_file_name};
