//! 运行数据记录
//!
//! - [`RawRecord`]：一次轮询得到的完整 99 字节响应（长度已确认）
//! - [`ValidatedRecord`]：原始记录 + 校验结果
//!
//! 只有校验通过的记录才能解码，这一前置条件由类型保证：
//! [`ValidatedRecord::decode`] 在校验失败时返回 `None`。

use crate::ProtocolError;
use crate::checksum::{checksum, verify};
use crate::constants::{CHECKSUM_INDEX, CHECKSUM_SPAN_START, RECORD_LENGTH};
use crate::telemetry::{Telemetry, decode_raw};

/// 原始运行数据记录（固定 99 字节）
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawRecord {
    bytes: [u8; RECORD_LENGTH],
}

impl RawRecord {
    /// 从固定长度数组创建
    pub fn new(bytes: [u8; RECORD_LENGTH]) -> Self {
        Self { bytes }
    }

    /// 获取记录字节
    pub fn as_bytes(&self) -> &[u8; RECORD_LENGTH] {
        &self.bytes
    }

    /// 记录中携带的校验和（最后一个字节）
    pub fn recorded_checksum(&self) -> u8 {
        self.bytes[CHECKSUM_INDEX]
    }

    /// 按协议区间重新计算的校验和
    pub fn computed_checksum(&self) -> u8 {
        checksum(&self.bytes, CHECKSUM_SPAN_START, CHECKSUM_INDEX)
    }

    /// 校验记录，得到 [`ValidatedRecord`]
    pub fn validate(self) -> ValidatedRecord {
        let checksum_ok = verify(&self.bytes);
        ValidatedRecord {
            raw: self,
            checksum_ok,
        }
    }
}

impl TryFrom<&[u8]> for RawRecord {
    type Error = ProtocolError;

    /// 长度必须恰好为 [`RECORD_LENGTH`]，否则为传输层错误
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; RECORD_LENGTH] =
            bytes.try_into().map_err(|_| ProtocolError::InvalidLength {
                expected: RECORD_LENGTH,
                actual: bytes.len(),
            })?;

        Ok(Self { bytes })
    }
}

impl AsRef<[u8]> for RawRecord {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for RawRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawRecord")
            .field("len", &RECORD_LENGTH)
            .field("recorded_checksum", &format_args!("0x{:02X}", self.recorded_checksum()))
            .finish()
    }
}

/// 已校验的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedRecord {
    raw: RawRecord,
    checksum_ok: bool,
}

impl ValidatedRecord {
    /// 原始记录
    pub fn raw(&self) -> &RawRecord {
        &self.raw
    }

    /// 校验是否通过
    pub fn checksum_ok(&self) -> bool {
        self.checksum_ok
    }

    /// 解码运行数据
    ///
    /// 校验失败时返回 `None`，绝不会对损坏的记录解码。
    pub fn decode(&self) -> Option<Telemetry> {
        self.checksum_ok.then(|| decode_raw(self.raw.as_bytes()))
    }
}
