//! # DDFI Driver
//!
//! 采集驱动层：
//! - 轮询间隔控制（校验失败时逐级放慢，超过上限后长暂停）
//! - 单线程采集循环（请求 → 等待 → 读取 → 校验 → 写日志 → 显示）
//! - 状态显示抽象
//!
//! # 使用场景
//!
//! 命令行记录器通过 [`AcquisitionBuilder`] 组装传输、日志和显示端，
//! 再调用 [`AcquisitionLoop::run_until`] 直到收到退出信号。

mod builder;
mod error;
pub mod pipeline;
pub mod poll;
pub mod sink;

pub use builder::AcquisitionBuilder;
pub use error::DriverError;
pub use pipeline::{
    AcquisitionLoop, CycleOutcome, CycleReport, PersistPolicy, SessionStats, request_once,
};
pub use poll::{Outcome, PollAction, PollConfig, PollController, PollPhase, PollState};
pub use sink::{MemorySink, StatusSink, screens};
