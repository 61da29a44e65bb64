//! Scripted in-memory byte source for tests.
//!
//! Each pushed chunk is served by exactly one `read_bytes` call, so a test
//! controls precisely how a telegram is split across polls.

use crate::error::P1Error;
use crate::transport::ByteSource;
use async_trait::async_trait;
use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct MockSource {
    chunks: VecDeque<Vec<u8>>,
}

impl MockSource {
    pub fn new() -> Self {
        MockSource::default()
    }

    /// Queues one chunk to be returned by a future read.
    pub fn push(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.chunks.push_back(bytes.into());
        self
    }

    pub fn is_drained(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl ByteSource for MockSource {
    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, P1Error> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        if chunk.len() > buf.len() {
            // Serve what fits now, requeue the rest for the next read.
            let rest = chunk.split_off(buf.len());
            self.chunks.push_front(rest);
        }
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}
