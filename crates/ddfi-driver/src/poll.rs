//! 轮询间隔控制
//!
//! ECU 在请求过于频繁时会返回损坏的记录。控制器根据每次轮询的结果调整
//! 请求与读取之间的等待时间：
//!
//! ```text
//!            success                     failure (m = n + 1 < threshold)
//!   ┌──────────────────┐           ┌───────────────────────────────┐
//!   ▼                  │           ▼                               │
//! Normal ──failure──▶ Degraded(1) ──┴─ failure (m >= threshold) ──▶ delay += step
//!   ▲                  │                                           count = 0
//!   │ success          │                                           delay > ceiling ──▶ Paused
//!   │ (delay reset)    │                                                                 │
//!   └──────────────────┘              cooldown, delay = recovery baseline ◀──────────────┘
//! ```
//!
//! 短读（传输不完整）不进入该阶梯，固定暂停后重试。

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// 轮询配置
///
/// 所有时间单位为毫秒，便于写入配置文件。
///
/// # Example
///
/// ```
/// use ddfi_driver::PollConfig;
///
/// let config = PollConfig::default();
/// assert_eq!(config.baseline_ms, 100);
///
/// let fast = PollConfig {
///     baseline_ms: 50,
///     ..PollConfig::default()
/// };
/// assert_eq!(fast.baseline().as_millis(), 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// 初始等待时间，校验恢复后也回到该值
    pub baseline_ms: u64,
    /// 每次升级增加的等待时间
    pub step_ms: u64,
    /// 等待时间上限，超过后进入长暂停
    pub ceiling_ms: u64,
    /// 连续失败多少次升级一次
    pub failure_threshold: u32,
    /// 长暂停时长
    pub cooldown_ms: u64,
    /// 长暂停结束后的等待时间
    pub recovery_baseline_ms: u64,
    /// 短读后的固定暂停
    pub incomplete_pause_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            baseline_ms: 100,
            step_ms: 50,
            ceiling_ms: 500,
            failure_threshold: 3,
            cooldown_ms: 30_000,
            recovery_baseline_ms: 200,
            incomplete_pause_ms: 1_000,
        }
    }
}

impl PollConfig {
    pub fn baseline(&self) -> Duration {
        Duration::from_millis(self.baseline_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn incomplete_pause(&self) -> Duration {
        Duration::from_millis(self.incomplete_pause_ms)
    }

    /// 检查配置是否自洽
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be at least 1".to_string());
        }
        if self.step_ms == 0 {
            return Err("step_ms must be greater than 0".to_string());
        }
        if self.baseline_ms > self.ceiling_ms {
            return Err(format!(
                "baseline_ms ({}) exceeds ceiling_ms ({})",
                self.baseline_ms, self.ceiling_ms
            ));
        }
        if self.recovery_baseline_ms > self.ceiling_ms {
            return Err(format!(
                "recovery_baseline_ms ({}) exceeds ceiling_ms ({})",
                self.recovery_baseline_ms, self.ceiling_ms
            ));
        }
        Ok(())
    }
}

/// 单次轮询结果（供控制器使用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 完整记录且校验通过
    Valid,
    /// 完整记录但校验失败
    ChecksumFailure,
    /// 少于 99 字节
    Incomplete,
}

/// 控制器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollPhase {
    Normal,
    /// 连续失败计数（升级后归零）
    Degraded(u32),
    Paused,
}

/// 控制器状态
///
/// 纯数据，[`PollState::next`] 是无副作用的状态转移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollState {
    pub phase: PollPhase,
    /// 当前等待时间（毫秒）
    pub delay_ms: u64,
    /// 会话内校验失败总数
    pub errors: u64,
}

impl PollState {
    /// 初始状态：Normal，等待时间为基线值
    pub fn new(config: &PollConfig) -> Self {
        Self {
            phase: PollPhase::Normal,
            delay_ms: config.baseline_ms,
            errors: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// 根据本次结果计算下一状态
    ///
    /// `Paused` 状态下只累计错误，离开该状态需要 [`PollState::resume`]。
    pub fn next(self, config: &PollConfig, outcome: Outcome) -> Self {
        let mut next = self;

        match outcome {
            Outcome::Incomplete => return next,
            Outcome::ChecksumFailure => next.errors += 1,
            Outcome::Valid => {},
        }

        next.phase = match (self.phase, outcome) {
            (PollPhase::Paused, _) => PollPhase::Paused,
            (PollPhase::Normal, Outcome::Valid) => PollPhase::Normal,
            (PollPhase::Degraded(_), Outcome::Valid) => {
                next.delay_ms = config.baseline_ms;
                PollPhase::Normal
            },
            (PollPhase::Normal, _) => PollPhase::Degraded(1),
            (PollPhase::Degraded(n), _) => {
                let m = n + 1;
                if m < config.failure_threshold {
                    PollPhase::Degraded(m)
                } else {
                    next.delay_ms += config.step_ms;
                    if next.delay_ms > config.ceiling_ms {
                        PollPhase::Paused
                    } else {
                        PollPhase::Degraded(0)
                    }
                }
            },
        };

        next
    }

    /// 长暂停结束：回到 Normal，等待时间为恢复基线
    pub fn resume(self, config: &PollConfig) -> Self {
        Self {
            phase: PollPhase::Normal,
            delay_ms: config.recovery_baseline_ms,
            errors: self.errors,
        }
    }
}

/// 控制器要求循环执行的等待动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// 直接进入下一次轮询
    Continue,
    /// 传输不完整后的固定暂停
    IncompletePause(Duration),
    /// 长暂停，结束后调用 [`PollController::resume`]
    Cooldown(Duration),
}

/// 轮询控制器
#[derive(Debug, Clone)]
pub struct PollController {
    config: PollConfig,
    state: PollState,
}

impl PollController {
    pub fn new(config: PollConfig) -> Self {
        let state = PollState::new(&config);
        Self { config, state }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// 下一次读取前的等待时间
    pub fn delay(&self) -> Duration {
        self.state.delay()
    }

    /// 会话内校验失败总数
    pub fn error_count(&self) -> u64 {
        self.state.errors
    }

    /// 记录一次轮询结果，返回循环必须执行的等待动作
    pub fn observe(&mut self, outcome: Outcome) -> PollAction {
        if outcome == Outcome::Incomplete {
            return PollAction::IncompletePause(self.config.incomplete_pause());
        }

        let previous = self.state;
        self.state = previous.next(&self.config, outcome);

        if self.state.delay_ms > previous.delay_ms {
            warn!(
                "Poll delay raised to {} ms after {} consecutive checksum failures",
                self.state.delay_ms, self.config.failure_threshold
            );
        } else if self.state.delay_ms < previous.delay_ms {
            debug!("Poll delay reset to {} ms", self.state.delay_ms);
        }

        if self.state.phase == PollPhase::Paused {
            warn!(
                "Poll delay {} ms exceeds ceiling {} ms, cooling down for {:?}",
                self.state.delay_ms,
                self.config.ceiling_ms,
                self.config.cooldown()
            );
            return PollAction::Cooldown(self.config.cooldown());
        }

        PollAction::Continue
    }

    /// 长暂停结束后调用
    pub fn resume(&mut self) {
        self.state = self.state.resume(&self.config);
        debug!(
            "Resuming after cooldown with {} ms poll delay",
            self.state.delay_ms
        );
    }
}
