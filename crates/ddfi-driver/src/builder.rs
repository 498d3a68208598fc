//! Builder 模式实现
//!
//! 提供链式构造 `AcquisitionLoop` 的便捷方式。

use crate::error::DriverError;
use crate::pipeline::{AcquisitionLoop, PersistPolicy};
use crate::poll::PollConfig;
use crate::sink::StatusSink;
use chrono::NaiveDateTime;
use ddfi_link::Transport;
use ddfi_tools::LogWriter;
use std::path::PathBuf;

/// 采集循环 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use ddfi_driver::{AcquisitionBuilder, DriverError, MemorySink, PersistPolicy};
/// use ddfi_link::Transport;
///
/// fn start<T: Transport>(transport: T) -> Result<(), DriverError> {
///     let mut acquisition = AcquisitionBuilder::new()
///         .transport(transport)
///         .sink(MemorySink::new())
///         .log_dir("/var/log/ddfi")
///         .persist_policy(PersistPolicy::VerifiedOnly)
///         .build()?;
///     acquisition.run_cycle()?;
///     Ok(())
/// }
/// ```
pub struct AcquisitionBuilder<T, S> {
    transport: Option<T>,
    sink: Option<S>,
    log_dir: Option<PathBuf>,
    writer: Option<LogWriter>,
    session_start: Option<NaiveDateTime>,
    poll_config: PollConfig,
    policy: PersistPolicy,
}

impl<T: Transport, S: StatusSink> AcquisitionBuilder<T, S> {
    pub fn new() -> Self {
        Self {
            transport: None,
            sink: None,
            log_dir: None,
            writer: None,
            session_start: None,
            poll_config: PollConfig::default(),
            policy: PersistPolicy::default(),
        }
    }

    /// 设置传输（必需）
    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// 设置状态显示端（必需）
    pub fn sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 日志目录，`build()` 时在其中创建会话文件
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// 使用已打开的日志写入器（优先于 `log_dir`）
    pub fn writer(mut self, writer: LogWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// 会话开始时间（默认为 `build()` 时的本地时间）
    pub fn session_start(mut self, start: NaiveDateTime) -> Self {
        self.session_start = Some(start);
        self
    }

    pub fn poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    pub fn persist_policy(mut self, policy: PersistPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 构建采集循环
    ///
    /// # Errors
    /// - `DriverError::MissingField`: 缺少传输、显示端或日志位置
    /// - `DriverError::InvalidConfig`: 轮询配置不自洽
    /// - `DriverError::Storage`: 日志文件创建失败
    pub fn build(self) -> Result<AcquisitionLoop<T, S>, DriverError> {
        self.poll_config
            .validate()
            .map_err(DriverError::InvalidConfig)?;

        let transport = self.transport.ok_or(DriverError::MissingField("transport"))?;
        let sink = self.sink.ok_or(DriverError::MissingField("sink"))?;

        let writer = match (self.writer, self.log_dir) {
            (Some(writer), _) => writer,
            (None, Some(dir)) => {
                let start = self
                    .session_start
                    .unwrap_or_else(|| chrono::Local::now().naive_local());
                LogWriter::open(&start, dir)?
            },
            (None, None) => return Err(DriverError::MissingField("log_dir")),
        };

        Ok(AcquisitionLoop::new(
            transport,
            writer,
            sink,
            self.poll_config,
            self.policy,
        ))
    }
}

impl<T: Transport, S: StatusSink> Default for AcquisitionBuilder<T, S> {
    fn default() -> Self {
        Self::new()
    }
}
