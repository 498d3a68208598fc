//! # 会话日志
//!
//! 追加写入的二进制日志，与 Megasquirt 风格的查看器兼容。
//!
//! ```text
//! [MAGIC: 9 bytes]
//! [Raw record: 99 bytes][Filler: 4 bytes]
//! [Raw record: 99 bytes][Filler: 4 bytes]
//! ...
//! ```
//!
//! 填充字段在查看器中通常是递增的时间类数值，其含义尚未确定。
//! 这里始终写入全 0，读取时原样保留，不做任何解释。

use crate::timestamp::session_file_name;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use ddfi_protocol::{RECORD_LENGTH, RawRecord, Telemetry, ValidatedRecord};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 日志文件魔数（DDFI-1 标准二进制头）
pub const MAGIC: &[u8; 9] = b"BUEKA\x00\x00\x00\x01";

/// 记录分隔填充字段（语义未知，保持全 0）
pub const FILLER: [u8; 4] = [0; 4];

/// 单帧长度：原始记录 + 填充
pub const FRAME_LEN: usize = RECORD_LENGTH + FILLER.len();

// ============================================================================
// 写入
// ============================================================================

/// 会话日志写入器
///
/// 会话期间独占文件（单写者，附加排他锁）。每次追加后立即同步到磁盘，
/// 不跨调用缓冲：设备可能随时断电，未落盘的尾部会丢失。
pub struct LogWriter {
    file: File,
    path: PathBuf,
    bytes_written: u64,
    frames: u64,
}

impl LogWriter {
    /// 在目录中创建以会话开始时间命名的新日志
    ///
    /// # Errors
    /// - 目录不可写、文件已存在或无法创建
    /// - 文件已被其他进程锁定
    pub fn open(session_start: &NaiveDateTime, directory: impl AsRef<Path>) -> Result<Self> {
        let path = directory.as_ref().join(session_file_name(session_start));
        Self::create(path)
    }

    /// 在指定路径创建新日志（不覆盖已有文件）
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("创建日志文件失败: {}", path.display()))?;

        if !file.try_lock_exclusive().context("锁定日志文件失败")? {
            anyhow::bail!("日志文件已被其他进程占用: {}", path.display());
        }

        file.write_all(MAGIC).context("写入魔数失败")?;
        file.sync_all().context("同步日志文件失败")?;

        info!("Log session opened: {}", path.display());

        Ok(Self {
            file,
            path,
            bytes_written: MAGIC.len() as u64,
            frames: 0,
        })
    }

    /// 追加一条原始记录（记录 + 全 0 填充），并立即落盘
    pub fn append(&mut self, record: &RawRecord) -> Result<()> {
        let mut frame = [0u8; FRAME_LEN];
        frame[..RECORD_LENGTH].copy_from_slice(record.as_bytes());
        frame[RECORD_LENGTH..].copy_from_slice(&FILLER);

        self.file.write_all(&frame).context("写入日志帧失败")?;
        self.file.flush().context("刷新日志文件失败")?;
        self.file.sync_data().context("同步日志文件失败")?;

        self.bytes_written += FRAME_LEN as u64;
        self.frames += 1;
        Ok(())
    }

    /// 追加一段原始字节
    ///
    /// 长度不是 99 字节时拒绝，且不写入任何内容。
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let record = RawRecord::try_from(bytes).context("拒绝写入长度错误的记录")?;
        self.append(&record)
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 文件当前大小（文件头 + 全部帧）
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// 已写入的帧数
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.file.sync_all() {
            warn!("Failed to sync log {} on close: {}", self.path.display(), e);
        }
        let _ = FileExt::unlock(&self.file);
        debug!(
            "Log session closed: {} ({} frames)",
            self.path.display(),
            self.frames
        );
    }
}

// ============================================================================
// 读取
// ============================================================================

/// 日志中的一帧
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFrame {
    /// 帧序号（从 0 开始）
    pub index: u64,
    /// 原始记录
    pub record: RawRecord,
    /// 填充字段（原样保留）
    pub filler: [u8; 4],
}

impl LogFrame {
    /// 校验记录
    pub fn validate(&self) -> ValidatedRecord {
        self.record.validate()
    }
}

/// 离线读取器
///
/// 逐帧读取：读到不足 99 字节时停止。最后一帧不完整不是错误，
/// 通过 [`LogReader::is_truncated`] 报告。
pub struct LogReader<R> {
    reader: R,
    header: [u8; 9],
    frames: u64,
    truncated: bool,
    finished: bool,
}

impl LogReader<BufReader<File>> {
    /// 打开日志文件
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("打开日志文件失败: {}", path.display()))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> LogReader<R> {
    /// 读取并验证文件头
    pub fn new(mut reader: R) -> Result<Self> {
        let mut header = [0u8; 9];
        let n = read_full(&mut reader, &mut header).context("读取文件头失败")?;
        if n < header.len() {
            anyhow::bail!("文件头不完整: {} / {} 字节", n, header.len());
        }

        if &header != MAGIC {
            anyhow::bail!("无效的日志文件格式（魔数不匹配）: {:02X?}", header);
        }

        Ok(Self {
            reader,
            header,
            frames: 0,
            truncated: false,
            finished: false,
        })
    }

    /// 文件头
    pub fn header(&self) -> &[u8; 9] {
        &self.header
    }

    /// 已读取的完整帧数
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// 是否遇到不完整的尾帧
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// 读取下一帧，文件结束时返回 `None`
    pub fn next_frame(&mut self) -> Result<Option<LogFrame>> {
        if self.finished {
            return Ok(None);
        }

        let mut raw = [0u8; RECORD_LENGTH];
        let n = read_full(&mut self.reader, &mut raw).context("读取日志帧失败")?;
        if n < RECORD_LENGTH {
            self.finished = true;
            if n > 0 {
                debug!("Trailing partial record: {} of {} bytes", n, RECORD_LENGTH);
                self.truncated = true;
            }
            return Ok(None);
        }

        let mut filler = [0u8; 4];
        let n = read_full(&mut self.reader, &mut filler).context("读取填充字段失败")?;
        if n < filler.len() {
            // 记录本身完整，只缺填充：仍然计为一帧
            self.finished = true;
            self.truncated = true;
        }

        let frame = LogFrame {
            index: self.frames,
            record: RawRecord::new(raw),
            filler,
        };
        self.frames += 1;
        Ok(Some(frame))
    }
}

impl<R: Read> Iterator for LogReader<R> {
    type Item = Result<LogFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// 读取摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadSummary {
    /// 完整记录数
    pub records: u64,
    /// 校验失败的记录数
    pub checksum_errors: u64,
    /// 文件末尾是否有不完整的帧
    pub truncated: bool,
}

impl ReadSummary {
    /// 校验通过的记录数
    pub fn valid_records(&self) -> u64 {
        self.records.saturating_sub(self.checksum_errors)
    }
}

/// 扫描整个日志
///
/// 校验通过的记录解码后交给 `on_record`，校验失败的只计数，不中断扫描。
pub fn summarize<R: Read>(
    mut reader: LogReader<R>,
    mut on_record: impl FnMut(&LogFrame, &Telemetry),
) -> Result<ReadSummary> {
    let mut summary = ReadSummary::default();

    while let Some(frame) = reader.next_frame()? {
        summary.records += 1;
        match frame.validate().decode() {
            Some(telemetry) => on_record(&frame, &telemetry),
            None => summary.checksum_errors += 1,
        }
    }

    summary.truncated = reader.is_truncated();
    Ok(summary)
}

/// 尽量读满缓冲区，返回实际读取的字节数（EOF 时可能不足）
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ddfi_protocol::checksum;
    use std::io::Cursor;

    fn sealed_record(fill: u8) -> RawRecord {
        let mut bytes = [fill; RECORD_LENGTH];
        bytes[RECORD_LENGTH - 1] = checksum(&bytes, 1, RECORD_LENGTH - 1);
        RawRecord::new(bytes)
    }

    fn corrupt_record(fill: u8) -> RawRecord {
        let mut bytes = *sealed_record(fill).as_bytes();
        bytes[RECORD_LENGTH - 1] ^= 0xFF;
        RawRecord::new(bytes)
    }

    fn session_start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 4)
            .unwrap()
            .and_hms_opt(9, 5, 30)
            .unwrap()
    }

    #[test]
    fn test_open_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let writer = LogWriter::open(&session_start(), dir.path()).unwrap();

        assert_eq!(writer.path(), dir.path().join("04-07-24_09-05-30.log"));
        assert_eq!(writer.bytes_written(), 9);
        assert_eq!(writer.frame_count(), 0);

        let contents = std::fs::read(writer.path()).unwrap();
        assert_eq!(contents, MAGIC.to_vec());
    }

    #[test]
    fn test_open_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let _first = LogWriter::open(&session_start(), dir.path()).unwrap();
        assert!(LogWriter::open(&session_start(), dir.path()).is_err());
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no/such/dir");
        assert!(LogWriter::open(&session_start(), missing).is_err());
    }

    #[test]
    fn test_append_frame_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = LogWriter::open(&session_start(), dir.path()).unwrap();
        let record = sealed_record(0x11);

        writer.append(&record).unwrap();
        assert_eq!(writer.bytes_written(), (9 + FRAME_LEN) as u64);

        let contents = std::fs::read(writer.path()).unwrap();
        assert_eq!(contents.len(), 9 + 103);
        assert_eq!(&contents[..9], MAGIC);
        assert_eq!(&contents[9..9 + 99], record.as_bytes());
        assert_eq!(&contents[9 + 99..], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_append_bytes_rejects_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = LogWriter::open(&session_start(), dir.path()).unwrap();

        assert!(writer.append_bytes(&[0u8; 98]).is_err());
        assert!(writer.append_bytes(&[0u8; 100]).is_err());
        assert_eq!(writer.frame_count(), 0);
        assert_eq!(std::fs::read(writer.path()).unwrap().len(), 9);

        writer.append_bytes(sealed_record(3).as_bytes()).unwrap();
        assert_eq!(writer.frame_count(), 1);
    }

    #[test]
    fn test_reader_rejects_bad_magic() {
        let data = b"NOTALOG!!".to_vec();
        assert!(LogReader::new(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_reader_rejects_short_header() {
        let data = MAGIC[..5].to_vec();
        assert!(LogReader::new(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_reader_empty_log() {
        let reader = LogReader::new(Cursor::new(MAGIC.to_vec())).unwrap();
        let summary = summarize(reader, |_, _| {}).unwrap();
        assert_eq!(summary, ReadSummary::default());
    }

    #[test]
    fn test_reader_counts_checksum_errors() {
        let mut data = MAGIC.to_vec();
        for record in [sealed_record(1), corrupt_record(2), sealed_record(3)] {
            data.extend_from_slice(record.as_bytes());
            data.extend_from_slice(&FILLER);
        }

        let reader = LogReader::new(Cursor::new(data)).unwrap();
        let mut seen = Vec::new();
        let summary = summarize(reader, |frame, _| seen.push(frame.index)).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.checksum_errors, 1);
        assert_eq!(summary.valid_records(), 2);
        assert!(!summary.truncated);
        assert_eq!(seen, vec![0, 2]);
    }

    #[test]
    fn test_summary_valid_records_never_underflows() {
        let summary = ReadSummary {
            records: 1,
            checksum_errors: 3,
            truncated: false,
        };
        assert_eq!(summary.valid_records(), 0);
        assert_eq!(ReadSummary::default().valid_records(), 0);
    }

    #[test]
    fn test_reader_missing_filler_counts_frame() {
        let mut data = MAGIC.to_vec();
        data.extend_from_slice(sealed_record(7).as_bytes());
        data.extend_from_slice(&[0, 0]);

        let mut reader = LogReader::new(Cursor::new(data)).unwrap();
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.record, sealed_record(7));
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.frame_count(), 1);
        assert!(reader.is_truncated());
    }
}
