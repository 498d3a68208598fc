//! 驱动层错误类型定义

use ddfi_link::LinkError;
use thiserror::Error;

/// 驱动层错误类型
///
/// 只包含致命错误。单次轮询的结果（短读、校验失败）是普通的分支，
/// 见 [`CycleOutcome`](crate::CycleOutcome)。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误（设备拔出等）
    #[error("Transport error: {0}")]
    Link(#[from] LinkError),

    /// 日志写入失败（创建或追加）
    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    /// 缺少必需的构建参数
    #[error("Missing builder field: {0}")]
    MissingField(&'static str),

    /// 轮询配置不自洽
    #[error("Invalid poll config: {0}")]
    InvalidConfig(String),
}

impl From<anyhow::Error> for DriverError {
    fn from(err: anyhow::Error) -> Self {
        DriverError::Storage(err)
    }
}
