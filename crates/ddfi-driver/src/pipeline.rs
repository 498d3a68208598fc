//! 采集循环
//!
//! 单线程、一问一答：同一时刻只有一个未完成的请求，周期内不重试。
//!
//! 一个周期：
//!
//! 1. 丢弃接收缓冲区中的残留字节（上一周期迟到的响应）
//! 2. 发送运行数据请求
//! 3. 等待当前轮询间隔
//! 4. 读取最多 99 字节
//! 5. 分类：不完整 / 校验失败 / 有效
//! 6. 按策略写入日志（只写完整记录）
//! 7. 更新轮询控制器
//! 8. 刷新状态显示
//! 9. 执行控制器要求的等待（无 / 短读暂停 / 长暂停）

use crate::error::DriverError;
use crate::poll::{Outcome, PollAction, PollConfig, PollController};
use crate::sink::{StatusSink, screens};
use ddfi_link::{LinkError, Transport};
use ddfi_protocol::{
    Command, RECORD_LENGTH, RawRecord, RequestFrame, Telemetry, build_request_frame,
    expected_record_length,
};
use ddfi_tools::LogWriter;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// 日志写入策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistPolicy {
    /// 写入所有完整记录（包括校验失败的）
    #[default]
    AllComplete,
    /// 只写入校验通过的记录
    VerifiedOnly,
}

impl PersistPolicy {
    pub fn should_persist(self, checksum_ok: bool) -> bool {
        match self {
            PersistPolicy::AllComplete => true,
            PersistPolicy::VerifiedOnly => checksum_ok,
        }
    }
}

/// 单周期结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// 校验通过并已解码
    Valid(Telemetry),
    /// 长度正确但校验失败
    ChecksumInvalid,
    /// 收到的字节不足一条记录
    Incomplete { received: usize },
}

impl CycleOutcome {
    fn poll_outcome(&self) -> Outcome {
        match self {
            CycleOutcome::Valid(_) => Outcome::Valid,
            CycleOutcome::ChecksumInvalid => Outcome::ChecksumFailure,
            CycleOutcome::Incomplete { .. } => Outcome::Incomplete,
        }
    }

    pub fn telemetry(&self) -> Option<&Telemetry> {
        match self {
            CycleOutcome::Valid(telemetry) => Some(telemetry),
            _ => None,
        }
    }
}

/// 单周期报告
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    /// 本周期是否写入了日志
    pub persisted: bool,
    /// 本周期读取前的等待时间
    pub delay: Duration,
    /// 周期末尾执行的等待动作
    pub action: PollAction,
    /// 日志文件当前大小
    pub bytes_written: u64,
    /// 会话内校验失败总数
    pub errors: u64,
}

/// 会话统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub cycles: u64,
    pub valid: u64,
    pub checksum_errors: u64,
    pub incomplete: u64,
    pub persisted: u64,
    pub cooldowns: u64,
}

impl SessionStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        match report.outcome {
            CycleOutcome::Valid(_) => self.valid += 1,
            CycleOutcome::ChecksumInvalid => self.checksum_errors += 1,
            CycleOutcome::Incomplete { .. } => self.incomplete += 1,
        }
        if report.persisted {
            self.persisted += 1;
        }
        if matches!(report.action, PollAction::Cooldown(_)) {
            self.cooldowns += 1;
        }
    }
}

/// 采集循环
///
/// 独占传输和日志写入器。通过 [`AcquisitionBuilder`](crate::AcquisitionBuilder) 构造。
pub struct AcquisitionLoop<T, S> {
    transport: T,
    writer: LogWriter,
    sink: S,
    controller: PollController,
    policy: PersistPolicy,
    stats: SessionStats,
}

impl<T: Transport, S: StatusSink> AcquisitionLoop<T, S> {
    pub fn new(
        transport: T,
        writer: LogWriter,
        sink: S,
        poll_config: PollConfig,
        policy: PersistPolicy,
    ) -> Self {
        Self {
            transport,
            writer,
            sink,
            controller: PollController::new(poll_config),
            policy,
            stats: SessionStats::default(),
        }
    }

    /// 执行一个完整周期
    ///
    /// # Errors
    /// - `DriverError::Link`: 传输 IO 错误（设备拔出等），采集无法继续
    /// - `DriverError::Storage`: 日志写入失败
    pub fn run_cycle(&mut self) -> Result<CycleReport, DriverError> {
        // 迟到的字节会错位到下一条记录的开头
        self.transport.discard_input()?;

        let request = build_request_frame();
        self.transport.write(request.as_bytes())?;

        let delay = self.controller.delay();
        spin_sleep::sleep(delay);

        let response = self.transport.read(expected_record_length())?;
        trace!("Received {} bytes after {:?}", response.len(), delay);

        let (outcome, persisted) = match RawRecord::try_from(response.as_slice()) {
            Ok(raw) => {
                let validated = raw.validate();
                let persisted = self.policy.should_persist(validated.checksum_ok());
                if persisted {
                    self.writer.append(validated.raw())?;
                }
                let outcome = match validated.decode() {
                    Some(telemetry) => CycleOutcome::Valid(telemetry),
                    None => {
                        warn!(
                            "Checksum mismatch: recorded 0x{:02X}, computed 0x{:02X}",
                            raw.recorded_checksum(),
                            raw.computed_checksum()
                        );
                        CycleOutcome::ChecksumInvalid
                    },
                };
                (outcome, persisted)
            },
            Err(_) => {
                debug!(
                    "Incomplete response: {} of {} bytes",
                    response.len(),
                    RECORD_LENGTH
                );
                (
                    CycleOutcome::Incomplete {
                        received: response.len(),
                    },
                    false,
                )
            },
        };

        let action = self.controller.observe(outcome.poll_outcome());
        let errors = self.controller.error_count();
        let bytes_written = self.writer.bytes_written();

        let lines = match &outcome {
            CycleOutcome::Valid(telemetry) => screens::comm_ok(bytes_written, errors, telemetry),
            CycleOutcome::ChecksumInvalid => {
                screens::checksum_error(errors, self.controller.delay())
            },
            CycleOutcome::Incomplete { received } => screens::incomplete(*received, RECORD_LENGTH),
        };
        self.sink.draw(&lines);
        self.sink.present();

        match action {
            PollAction::Continue => {},
            PollAction::IncompletePause(pause) => spin_sleep::sleep(pause),
            PollAction::Cooldown(cooldown) => {
                self.sink.draw(&screens::cooling_down(cooldown));
                self.sink.present();
                spin_sleep::sleep(cooldown);
                self.controller.resume();
            },
        }

        let report = CycleReport {
            outcome,
            persisted,
            delay,
            action,
            bytes_written,
            errors,
        };
        self.stats.record(&report);
        Ok(report)
    }

    /// 循环执行，直到 `running` 被清除
    ///
    /// 标志只在周期之间检查，正在进行的等待不会被打断。
    pub fn run_until(&mut self, running: &AtomicBool) -> Result<SessionStats, DriverError> {
        info!(
            "Acquisition started, logging to {}",
            self.writer.path().display()
        );

        while running.load(Ordering::Acquire) {
            if let Err(e) = self.run_cycle() {
                error!("Acquisition stopped: {}", e);
                return Err(e);
            }
        }

        info!(
            "Acquisition stopped after {} cycles ({} valid, {} checksum errors, {} incomplete)",
            self.stats.cycles, self.stats.valid, self.stats.checksum_errors, self.stats.incomplete
        );
        Ok(self.stats)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn controller(&self) -> &PollController {
        &self.controller
    }

    pub fn policy(&self) -> PersistPolicy {
        self.policy
    }

    pub fn writer(&self) -> &LogWriter {
        &self.writer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// 发送单个请求并读取响应（不做校验）
///
/// 用于诊断，例如读取 ECU 版本信息。
pub fn request_once<T: Transport + ?Sized>(
    transport: &mut T,
    command: Command,
    wait: Duration,
    max_len: usize,
) -> Result<Vec<u8>, LinkError> {
    transport.discard_input()?;

    let request = RequestFrame::new(command);
    transport.write(request.as_bytes())?;
    spin_sleep::sleep(wait);

    let response = transport.read(max_len)?;
    debug!("{:?} request returned {} bytes", command, response.len());
    Ok(response)
}
