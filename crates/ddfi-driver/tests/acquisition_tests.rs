//! 采集循环集成测试
//!
//! 使用脚本化的 MockTransport 代替 ECU，轮询时间压缩到毫秒级。

use ddfi_driver::{
    AcquisitionBuilder, AcquisitionLoop, CycleOutcome, DriverError, MemorySink, PersistPolicy,
    PollAction, PollConfig, PollPhase,
};
use ddfi_link::{LinkError, MockTransport, Transport};
use ddfi_protocol::{RECORD_LENGTH, checksum};
use ddfi_tools::{LogReader, summarize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const RUNTIME_REQUEST: [u8; 9] = [0x01, 0x00, 0x42, 0x02, 0xFF, 0x02, 0x43, 0x03, 0xFD];

fn fast_config() -> PollConfig {
    PollConfig {
        baseline_ms: 0,
        step_ms: 1,
        ceiling_ms: 2,
        failure_threshold: 3,
        cooldown_ms: 1,
        recovery_baseline_ms: 1,
        incomplete_pause_ms: 1,
    }
}

fn valid_record() -> Vec<u8> {
    let mut bytes = vec![0u8; RECORD_LENGTH];
    // 发动机温度原始值 160 → -24.0 °C
    bytes[30] = 0xA0;
    bytes[11] = 0xE8;
    bytes[12] = 0x03;
    bytes[RECORD_LENGTH - 1] = checksum(&bytes, 1, RECORD_LENGTH - 1);
    bytes
}

fn corrupt_record() -> Vec<u8> {
    let mut bytes = valid_record();
    bytes[RECORD_LENGTH - 1] ^= 0x01;
    bytes
}

fn setup(
    dir: &tempfile::TempDir,
    policy: PersistPolicy,
) -> (MockTransport, AcquisitionLoop<MockTransport, MemorySink>) {
    let mock = MockTransport::new();
    let acquisition = AcquisitionBuilder::new()
        .transport(mock.clone())
        .sink(MemorySink::new())
        .writer(ddfi_tools::LogWriter::create(dir.path().join("session.log")).unwrap())
        .poll_config(fast_config())
        .persist_policy(policy)
        .build()
        .unwrap();
    (mock, acquisition)
}

#[test]
fn test_valid_cycle_persists_and_renders() {
    let dir = tempfile::tempdir().unwrap();
    let (mock, mut acquisition) = setup(&dir, PersistPolicy::AllComplete);
    mock.push_bytes(valid_record());

    let report = acquisition.run_cycle().unwrap();

    let telemetry = report.outcome.telemetry().expect("valid record decodes");
    assert!((telemetry.engine_temp_c - (-24.0)).abs() < 1e-9);
    assert!((telemetry.engine_speed - 1000.0).abs() < 1e-9);
    assert!(report.persisted);
    assert_eq!(report.action, PollAction::Continue);
    assert_eq!(report.bytes_written, 9 + 103);
    assert_eq!(report.errors, 0);

    assert_eq!(mock.written(), vec![RUNTIME_REQUEST.to_vec()]);
    assert_eq!(mock.discard_count(), 1);

    let screen = acquisition.sink().last().unwrap();
    assert_eq!(screen[0], "Comm OK!");
    assert_eq!(screen[1], "Bytes: 112");
    assert_eq!(screen[2], "Errors: 0");
}

#[test]
fn test_mixed_session_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let (mock, mut acquisition) = setup(&dir, PersistPolicy::AllComplete);
    mock.push_bytes(valid_record());
    mock.push_bytes(corrupt_record());
    mock.push_bytes(vec![0x01; 40]);
    mock.push_bytes(valid_record());

    let outcomes: Vec<_> = (0..4)
        .map(|_| acquisition.run_cycle().unwrap().outcome)
        .collect();
    assert!(matches!(outcomes[0], CycleOutcome::Valid(_)));
    assert_eq!(outcomes[1], CycleOutcome::ChecksumInvalid);
    assert_eq!(outcomes[2], CycleOutcome::Incomplete { received: 40 });
    assert!(matches!(outcomes[3], CycleOutcome::Valid(_)));

    let stats = acquisition.stats();
    assert_eq!(stats.cycles, 4);
    assert_eq!(stats.valid, 2);
    assert_eq!(stats.checksum_errors, 1);
    assert_eq!(stats.incomplete, 1);
    assert_eq!(stats.persisted, 3);

    let path = acquisition.writer().path().to_path_buf();
    drop(acquisition);

    let summary = summarize(LogReader::open(&path).unwrap(), |_, _| {}).unwrap();
    assert_eq!(summary.records, 3);
    assert_eq!(summary.checksum_errors, 1);
    assert!(!summary.truncated);
}

#[test]
fn test_verified_only_skips_corrupt_records() {
    let dir = tempfile::tempdir().unwrap();
    let (mock, mut acquisition) = setup(&dir, PersistPolicy::VerifiedOnly);
    mock.push_bytes(corrupt_record());
    mock.push_bytes(valid_record());

    let first = acquisition.run_cycle().unwrap();
    assert!(!first.persisted);
    assert_eq!(first.bytes_written, 9);
    assert_eq!(
        acquisition.sink().last().unwrap()[0],
        "Comm error!".to_string()
    );

    let second = acquisition.run_cycle().unwrap();
    assert!(second.persisted);
    assert_eq!(acquisition.writer().frame_count(), 1);
}

#[test]
fn test_incomplete_never_touches_ladder() {
    let dir = tempfile::tempdir().unwrap();
    let (_mock, mut acquisition) = setup(&dir, PersistPolicy::AllComplete);

    // 没有排队响应：每次读取 0 字节
    for _ in 0..5 {
        let report = acquisition.run_cycle().unwrap();
        assert_eq!(report.outcome, CycleOutcome::Incomplete { received: 0 });
        assert_eq!(
            report.action,
            PollAction::IncompletePause(Duration::from_millis(1))
        );
        assert!(!report.persisted);
    }

    assert_eq!(acquisition.controller().state().phase, PollPhase::Normal);
    assert_eq!(acquisition.controller().error_count(), 0);
    assert_eq!(acquisition.writer().frame_count(), 0);
    assert_eq!(
        acquisition.sink().last().unwrap(),
        &["Comm error!".to_string(), "Incomplete: 0/99 bytes".to_string()][..]
    );
}

#[test]
fn test_failure_streak_escalates_then_cools_down() {
    let dir = tempfile::tempdir().unwrap();
    let (mock, mut acquisition) = setup(&dir, PersistPolicy::AllComplete);
    for _ in 0..9 {
        mock.push_bytes(corrupt_record());
    }
    mock.push_bytes(valid_record());

    let delays: Vec<_> = (0..9)
        .map(|_| acquisition.run_cycle().unwrap())
        .map(|r| (r.delay, r.action))
        .collect();

    // 第 3、6 次失败各升级一次，第 9 次超过上限进入长暂停
    assert_eq!(delays[2].0, Duration::ZERO);
    assert_eq!(delays[3].0, Duration::from_millis(1));
    assert_eq!(delays[6].0, Duration::from_millis(2));
    assert_eq!(delays[8].1, PollAction::Cooldown(Duration::from_millis(1)));
    assert!(delays[..8].iter().all(|(_, a)| *a == PollAction::Continue));

    // 暂停结束后以恢复基线继续
    assert_eq!(acquisition.controller().state().phase, PollPhase::Normal);
    assert_eq!(acquisition.controller().delay(), Duration::from_millis(1));

    let report = acquisition.run_cycle().unwrap();
    assert!(matches!(report.outcome, CycleOutcome::Valid(_)));
    assert_eq!(report.errors, 9);
    assert_eq!(acquisition.stats().cooldowns, 1);
}

#[test]
fn test_transport_error_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (mock, mut acquisition) = setup(&dir, PersistPolicy::AllComplete);
    mock.push_bytes(valid_record());
    mock.push_error(std::io::ErrorKind::BrokenPipe);

    let running = AtomicBool::new(true);
    let result = acquisition.run_until(&running);

    assert!(matches!(result, Err(DriverError::Link(_))));
    assert_eq!(acquisition.stats().cycles, 1);
}

#[test]
fn test_run_until_honours_stop_flag() {
    let dir = tempfile::tempdir().unwrap();
    let (_mock, mut acquisition) = setup(&dir, PersistPolicy::AllComplete);

    let stopped = AtomicBool::new(false);
    let stats = acquisition.run_until(&stopped).unwrap();
    assert_eq!(stats.cycles, 0);

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        flag.store(false, Ordering::Release);
    });

    let stats = acquisition.run_until(&running).unwrap();
    stopper.join().unwrap();
    assert!(stats.cycles > 0);
    assert_eq!(stats.cycles, stats.incomplete);
}

/// 字节流传输：模拟串口接收缓冲区，一条响应可以分两段到达
#[derive(Default)]
struct StreamTransport {
    rx: VecDeque<u8>,
    /// 每个请求的响应：(读取前到达, 读取超时后才到达)
    replies: VecDeque<(Vec<u8>, Vec<u8>)>,
    late: Vec<u8>,
}

impl Transport for StreamTransport {
    fn write(&mut self, _bytes: &[u8]) -> Result<(), LinkError> {
        if let Some((on_time, late)) = self.replies.pop_front() {
            self.rx.extend(on_time);
            self.late = late;
        }
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, LinkError> {
        let n = max_len.min(self.rx.len());
        let bytes = self.rx.drain(..n).collect();
        self.rx.extend(std::mem::take(&mut self.late));
        Ok(bytes)
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        self.rx.clear();
        Ok(())
    }
}

#[test]
fn test_late_response_does_not_desynchronise() {
    let dir = tempfile::tempdir().unwrap();
    let record = valid_record();

    let mut stream = StreamTransport::default();
    stream
        .replies
        .push_back((record[..40].to_vec(), record[40..].to_vec()));
    for _ in 0..7 {
        stream.replies.push_back((record.clone(), Vec::new()));
    }

    let mut acquisition = AcquisitionBuilder::new()
        .transport(stream)
        .sink(MemorySink::new())
        .writer(ddfi_tools::LogWriter::create(dir.path().join("late.log")).unwrap())
        .poll_config(fast_config())
        .build()
        .unwrap();

    let outcomes: Vec<_> = (0..8)
        .map(|_| acquisition.run_cycle().unwrap().outcome)
        .collect();

    assert_eq!(outcomes[0], CycleOutcome::Incomplete { received: 40 });
    assert!(
        outcomes[1..]
            .iter()
            .all(|o| matches!(o, CycleOutcome::Valid(_))),
        "stale bytes leaked into later records: {:?}",
        outcomes
    );

    let stats = acquisition.stats();
    assert_eq!(stats.valid, 7);
    assert_eq!(stats.checksum_errors, 0);
    assert_eq!(stats.persisted, 7);
    assert_eq!(acquisition.controller().delay(), Duration::ZERO);
}
