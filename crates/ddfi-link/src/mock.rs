//! Mock 传输
//!
//! 脚本化的模拟 ECU：按顺序返回预先排队的响应，并记录所有写出的请求。
//! 克隆得到的句柄共享同一份状态，测试可以在管线持有传输的同时检查它。

use crate::{LinkError, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 一次读取的脚本化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// 返回这些字节（超出 `max_len` 的部分被截断）
    Bytes(Vec<u8>),
    /// 返回 IO 错误
    Error(std::io::ErrorKind),
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    written: Vec<Vec<u8>>,
    reads: usize,
    discards: usize,
}

/// 模拟传输
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// 创建空的模拟传输（没有排队响应时每次读取返回 0 字节）
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 排队一个字节响应
    pub fn push_bytes(&self, bytes: impl Into<Vec<u8>>) {
        self.lock().responses.push_back(MockResponse::Bytes(bytes.into()));
    }

    /// 排队一个 IO 错误
    pub fn push_error(&self, kind: std::io::ErrorKind) {
        self.lock().responses.push_back(MockResponse::Error(kind));
    }

    /// 已写出的所有请求
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.lock().written.clone()
    }

    /// 已执行的读取次数
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    /// `discard_input` 调用次数（排队的响应不受影响）
    pub fn discard_count(&self) -> usize {
        self.lock().discards
    }

    /// 尚未消费的响应数量
    pub fn pending(&self) -> usize {
        self.lock().responses.len()
    }
}

impl Transport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.lock().written.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, LinkError> {
        let mut state = self.lock();
        state.reads += 1;

        match state.responses.pop_front() {
            Some(MockResponse::Bytes(mut bytes)) => {
                bytes.truncate(max_len);
                Ok(bytes)
            },
            Some(MockResponse::Error(kind)) => Err(std::io::Error::from(kind).into()),
            None => Ok(Vec::new()),
        }
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        self.lock().discards += 1;
        Ok(())
    }
}
