//! Multipart upload support
//!
//! Splits a body stream of unknown length into upload parts. Only one part
//! (plus whatever the transport has buffered) is held in memory at a time.

use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;

use cx_core::config::DEFAULT_PART_SIZE;
use cx_core::{ByteStream, Result};

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Part size in bytes
    pub part_size: u64,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    /// Part size for an upload whose length may be known up front
    ///
    /// Unknown lengths use the configured size; known lengths grow the part
    /// size when needed to stay within the 10,000 part limit.
    pub fn part_size_for(&self, content_length: Option<u64>) -> u64 {
        let Some(total) = content_length else {
            return self.part_size;
        };

        let parts = total.div_ceil(self.part_size);
        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            total
                .div_ceil(MAX_PARTS as u64)
                .clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Cuts a chunk stream into fixed-size parts
///
/// Every part except the last is exactly `part_size` bytes.
pub struct PartReader {
    body: ByteStream,
    buffer: BytesMut,
    part_size: usize,
    finished: bool,
}

impl PartReader {
    pub fn new(body: ByteStream, part_size: usize) -> Self {
        Self {
            body,
            buffer: BytesMut::new(),
            part_size: part_size.max(1),
            finished: false,
        }
    }

    /// Next part, or `None` once the body is drained
    pub async fn next_part(&mut self) -> Result<Option<Bytes>> {
        while !self.finished && self.buffer.len() < self.part_size {
            match self.body.try_next().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => self.finished = true,
            }
        }

        if self.buffer.is_empty() {
            return Ok(None);
        }

        let take = self.part_size.min(self.buffer.len());
        Ok(Some(self.buffer.split_to(take).freeze()))
    }
}
