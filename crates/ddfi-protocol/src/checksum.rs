//! 异或校验和
//!
//! 请求帧和运行数据记录共用同一种校验：对指定字节区间逐字节异或，初值为 0。
//! 区间必须严格按协议给出（记录为 `1..98`，即跳过首字节和校验字节本身）。

use crate::constants::{CHECKSUM_INDEX, CHECKSUM_SPAN_START, RECORD_LENGTH};

/// 计算 `data[start..end]` 的异或校验和
///
/// 区间越界的部分会被截断到 `data.len()`，空区间返回 0。
///
/// # Example
///
/// ```
/// use ddfi_protocol::checksum;
///
/// let frame = [0x01, 0x00, 0x42, 0x02, 0xFF, 0x02, 0x43, 0x03, 0xFD];
/// assert_eq!(checksum(&frame, 1, 8), 0xFD);
/// ```
pub fn checksum(data: &[u8], start: usize, end: usize) -> u8 {
    let end = end.min(data.len());
    if start >= end {
        return 0;
    }

    data[start..end].iter().fold(0u8, |acc, &b| acc ^ b)
}

/// 校验一条运行数据记录
///
/// 当且仅当记录长度不小于 [`RECORD_LENGTH`]，且
/// `checksum(record, 1, 98) == record[98]` 时返回 `true`。
/// 超出 [`RECORD_LENGTH`] 的尾部字节不参与校验。
///
/// 长度不足的记录一律返回 `false`。长度错误属于传输层问题，
/// 调用方应在调用本函数之前单独判断，而不是把它当作校验错误。
pub fn verify(record: &[u8]) -> bool {
    if record.len() < RECORD_LENGTH {
        return false;
    }

    checksum(record, CHECKSUM_SPAN_START, CHECKSUM_INDEX) == record[CHECKSUM_INDEX]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sealed_record(fill: u8) -> Vec<u8> {
        let mut record = vec![fill; RECORD_LENGTH];
        record[CHECKSUM_INDEX] = checksum(&record, 1, CHECKSUM_INDEX);
        record
    }

    #[test]
    fn test_checksum_empty_range() {
        assert_eq!(checksum(&[0xAA, 0xBB], 1, 1), 0);
        assert_eq!(checksum(&[], 0, 10), 0);
        assert_eq!(checksum(&[0xAA], 3, 1), 0);
    }

    #[test]
    fn test_checksum_clamps_end() {
        assert_eq!(checksum(&[0x0F, 0xF0], 0, 100), 0xFF);
    }

    #[test]
    fn test_checksum_runtime_request() {
        let frame = [0x01, 0x00, 0x42, 0x02, 0xFF, 0x02, 0x43, 0x03, 0xFD];
        assert_eq!(checksum(&frame, 1, 8), frame[8]);
    }

    #[test]
    fn test_verify_sealed_record() {
        assert!(verify(&sealed_record(0x00)));
        assert!(verify(&sealed_record(0x5A)));
    }

    #[test]
    fn test_verify_ignores_first_byte() {
        let mut record = sealed_record(0x11);
        record[0] = 0xEE;
        assert!(verify(&record));
    }

    #[test]
    fn test_verify_detects_single_bit_flip() {
        let mut record = sealed_record(0x11);
        record[42] ^= 0x01;
        assert!(!verify(&record));
    }

    #[test]
    fn test_verify_ignores_trailing_bytes() {
        let mut record = sealed_record(0x22);
        record.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        assert!(verify(&record));
    }

    #[test]
    fn test_verify_short_record_is_false() {
        let record = sealed_record(0x00);
        assert!(!verify(&record[..RECORD_LENGTH - 1]));
        assert!(!verify(&[]));
    }
}
