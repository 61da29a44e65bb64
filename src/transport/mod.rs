//! # Byte Transport
//!
//! The reader polls bytes from a [`ByteSource`]; the production source is a
//! serial port at the meter's fixed line settings, and tests substitute a
//! scripted in-memory source.

pub mod mock;
pub mod serial;

use crate::error::P1Error;
use async_trait::async_trait;

pub use mock::MockSource;
pub use serial::SerialSource;

/// A pull-based source of raw meter bytes.
#[async_trait]
pub trait ByteSource: Send {
    /// Reads whatever bytes are currently available into `buf` and returns
    /// the count. `Ok(0)` means nothing arrived within the source's read
    /// window; the caller simply polls again later.
    async fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize, P1Error>;
}
