//! # AUTOSAR E2E and SecOC Protection Library
//!
//! This library implements two independent message protection mechanisms
//! used between automotive ECUs:
//!
//! - **E2E Profile 2**: CRC-8H2F plus a 4-bit sequence counter, prepended as a
//!   3-byte header. Detects corruption, loss, repetition and misrouting of a
//!   signal.
//! - **SecOC**: a truncated freshness value and a truncated MAC appended to a
//!   PDU. Detects forgery and replay. Freshness counters are kept per PDU in a
//!   shared [`secoc::FreshnessManager`].
//!
//! Both mechanisms are pure byte transformations: they neither open sockets
//! nor perform I/O, and they can be layered on top of each other.
//!
//! ## Example
//!
//! ```rust
//! use autosar_e2e_secoc::{E2EProfile, E2EResult, E2EStatus};
//! use autosar_e2e_secoc::profile2::{Profile2, Profile2Config};
//!
//! # fn main() -> E2EResult<()> {
//! let config = Profile2Config {
//!     data_id: 0x1234,
//!     max_delta_counter: 1,
//! };
//!
//! let mut sender = Profile2::new(config.clone())?;
//! let mut receiver = Profile2::new(config)?;
//!
//! // [CRC, counter/DataID nibble, DataID low byte, payload ..]
//! let frame = sender.protect(&[0xAA, 0xBB])?;
//! assert_eq!(frame.len(), 5);
//!
//! assert_eq!(receiver.check(&frame), E2EStatus::Ok);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

mod common;
mod profiles;
pub mod secoc;

pub use profiles::profile2;

/// Result type for E2E operations
pub type E2EResult<T> = Result<T, E2EError>;

/// E2E check status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum E2EStatus {
    /// The checks of data in this cycle were successful
    Ok,
    /// Counter check failed - same counter as previous cycle
    Repeated,
    /// Counter check failed - counter went backwards or jumped further than allowed
    WrongSequence,
    /// CRC check failed - data corruption or wrong Data ID
    WrongCrc,
    /// Not enough data received to hold a header and a payload
    NoNewData,
}

/// E2E Error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum E2EError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidDataFormat(String),
}

/// Outcome of [`E2EProfile::check_and_extract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct E2ECheckResult<'a> {
    /// Status reported by the check
    pub status: E2EStatus,
    /// Payload without the E2E header, present only when `status` is `Ok`
    pub payload: Option<&'a [u8]>,
}

/// Main trait for E2E Profile implementations
///
/// Each profile provides three main operations:
/// - `protect`: Add E2E protection to data
/// - `forward`: Re-protect data with the last checked counter (gateway use)
/// - `check`: Verify E2E protection on received data
pub trait E2EProfile {
    /// Configuration type for this profile
    type Config;

    /// Create a new instance with the given configuration
    ///
    /// # Errors
    /// Returns `E2EError::InvalidConfiguration` if the configuration is invalid
    fn new(config: Self::Config) -> E2EResult<Self>
    where
        Self: Sized;

    /// Frame `data` behind a freshly computed E2E header.
    ///
    /// Advances the sender counter before framing.
    ///
    /// # Errors
    /// Returns `E2EError::InvalidDataFormat` if `data` cannot be protected
    fn protect(&mut self, data: &[u8]) -> E2EResult<Vec<u8>>;

    /// Frame `data` with the counter value last accepted by [`check`](Self::check).
    ///
    /// The sender counter is set to that value afterwards, so a relay keeps
    /// the sequence of the messages it forwards.
    ///
    /// # Errors
    /// Returns `E2EError::InvalidDataFormat` if `data` cannot be protected
    fn forward(&mut self, data: &[u8]) -> E2EResult<Vec<u8>>;

    /// Check E2E protection on received data
    ///
    /// Never fails: every problem is reported through the returned status.
    /// The receiver counter follows every frame whose CRC matched (`Ok`,
    /// `Repeated` and `WrongSequence`); `WrongCrc` and `NoNewData` leave it
    /// unchanged.
    fn check(&mut self, data: &[u8]) -> E2EStatus;

    /// Number of header bytes this profile places in front of the payload
    fn header_length(&self) -> usize;

    /// Check `data` and hand back the payload only if the check passed.
    fn check_and_extract<'a>(&mut self, data: &'a [u8]) -> E2ECheckResult<'a> {
        let status = self.check(data);
        let payload = match status {
            E2EStatus::Ok => data.get(self.header_length()..),
            _ => None,
        };
        E2ECheckResult { status, payload }
    }
}
