//! AUTOSAR SecOC (Secure Onboard Communication) protection.
//!
//! A [`SecOcPdu`] appends a truncated freshness value and a truncated MAC to
//! each payload. Freshness counters are kept in a [`FreshnessManager`] that
//! may be shared between many PDUs and threads.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use autosar_e2e_secoc::secoc::{
//!     FreshnessManager, HmacSha256, SecOcPdu, SecOcPduConfig, SecOcResult,
//! };
//!
//! # fn main() -> SecOcResult<()> {
//! let config = SecOcPduConfig {
//!     data_id: 0x0100,
//!     ..Default::default()
//! };
//! let key = [0x2Bu8; 16];
//!
//! // Sender and receiver keep their own counters
//! let sender = SecOcPdu::new(config, key, Box::new(HmacSha256), Arc::new(FreshnessManager::new()))?;
//! let receiver = SecOcPdu::new(config, key, Box::new(HmacSha256), Arc::new(FreshnessManager::new()))?;
//!
//! let secured = sender.protect(b"brake")?;
//! assert_eq!(receiver.verify(&secured)?, b"brake".to_vec());
//!
//! // Replays are rejected
//! assert!(receiver.verify(&secured).is_err());
//! # Ok(())
//! # }
//! ```

mod error;
mod freshness;
mod mac;
mod pdu;

pub use error::{SecOcError, SecOcResult};
pub use freshness::{FreshnessConfig, FreshnessManager, FreshnessValue, PduId};
pub use mac::{macs_match, HmacSha256, HmacSha384, MacProvider};
pub use pdu::{SecOcPdu, SecOcPduConfig};
