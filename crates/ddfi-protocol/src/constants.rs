//! 协议常量定义
//!
//! 请求帧的结构标记与地址、运行数据记录长度等固定值。

// ============================================================================
// 帧结构标记
// ============================================================================

/// Start of header
pub const SOH: u8 = 0x01;
/// End of header
pub const EOH: u8 = 0xFF;
/// Start of text
pub const SOT: u8 = 0x02;
/// End of text
pub const EOT: u8 = 0x03;

// ============================================================================
// 地址
// ============================================================================

/// 请求发送方地址（诊断工具）
pub const SOURCE_ID: u8 = 0x00;
/// 请求接收方地址（ECU）
pub const DESTINATION_ID: u8 = 0x42;

/// 请求负载长度（命令字节 + 校验字节）
pub const REQUEST_PAYLOAD_LEN: u8 = 0x02;

// ============================================================================
// 长度
// ============================================================================

/// 请求帧总长度
pub const REQUEST_FRAME_LEN: usize = 9;

/// 运行数据记录长度（一次轮询的完整响应）
pub const RECORD_LENGTH: usize = 99;

/// 记录中校验和字节的位置（最后一个字节）
pub const CHECKSUM_INDEX: usize = RECORD_LENGTH - 1;

/// 校验范围起点（协议约定跳过首字节）
pub const CHECKSUM_SPAN_START: usize = 1;
