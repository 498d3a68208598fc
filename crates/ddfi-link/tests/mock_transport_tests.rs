//! Mock 传输集成测试
//!
//! 运行方式：`cargo test -p ddfi-link --features mock`
#![cfg(feature = "mock")]

use ddfi_link::{MockTransport, Transport};
use ddfi_protocol::{RECORD_LENGTH, build_request_frame, expected_record_length};

#[test]
fn test_request_response_exchange() {
    let mut link = MockTransport::new();
    link.push_bytes(vec![0x55; RECORD_LENGTH]);

    let request = build_request_frame();
    link.write(request.as_bytes()).unwrap();
    let response = link.read(expected_record_length()).unwrap();

    assert_eq!(response.len(), RECORD_LENGTH);
    assert_eq!(link.written(), vec![request.as_bytes().to_vec()]);
}

#[test]
fn test_short_read_is_not_an_error() {
    let mut link = MockTransport::new();
    link.push_bytes(vec![0x01; 40]);

    let response = link.read(expected_record_length()).unwrap();
    assert_eq!(response.len(), 40);
}

#[test]
fn test_oversized_response_truncated() {
    let mut link = MockTransport::new();
    link.push_bytes(vec![0x01; 150]);

    let response = link.read(expected_record_length()).unwrap();
    assert_eq!(response.len(), RECORD_LENGTH);
}
