//! # Secured PDU
//!
//! # Data layout
//! [DATA ... | FRESHNESS(F) | MAC(M)]
//! - FRESHNESS : lowest `truncated_freshness_length` bytes of the little-endian counter
//! - MAC       : first `truncated_mac_length` bytes of the MAC
//!
//! The MAC is computed over DataID (2 bytes, big-endian), the full-width
//! freshness value and the data, in that order.

use super::error::{SecOcError, SecOcResult};
use super::freshness::{FreshnessConfig, FreshnessManager};
use super::mac::{macs_match, MacProvider};
use crate::common::field_ops::{decode_le_counter, overlay_low_bytes};
use std::fmt;
use std::sync::Arc;

const MAX_FRESHNESS_BYTES: u8 = 8;
const MIN_PAYLOAD_BYTES: usize = 1;

/// Configuration of one secured PDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecOcPduConfig {
    /// Data ID, also used as the freshness counter id
    pub data_id: u16,
    /// Full freshness width in bytes; must equal `freshness_config.counter_width`
    pub freshness_length: u8,
    /// Freshness bytes carried on the wire
    pub truncated_freshness_length: u8,
    /// MAC bytes carried on the wire
    pub truncated_mac_length: u8,
    /// Counter settings registered with the freshness manager
    pub freshness_config: FreshnessConfig,
}

impl Default for SecOcPduConfig {
    fn default() -> Self {
        Self {
            data_id: 0x0000,
            freshness_length: 4,
            truncated_freshness_length: 4,
            truncated_mac_length: 8,
            freshness_config: FreshnessConfig::default(),
        }
    }
}

impl SecOcPduConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> SecOcResult<()> {
        if self.freshness_length == 0 || self.freshness_length > MAX_FRESHNESS_BYTES {
            return Err(SecOcError::ConfigurationError(format!(
                "Freshness length must be between 1 and {} bytes",
                MAX_FRESHNESS_BYTES
            )));
        }
        if self.freshness_length != self.freshness_config.counter_width {
            return Err(SecOcError::ConfigurationError(format!(
                "Freshness length ({}) must equal the counter width ({})",
                self.freshness_length, self.freshness_config.counter_width
            )));
        }
        if self.truncated_freshness_length == 0
            || self.truncated_freshness_length > self.freshness_length
        {
            return Err(SecOcError::ConfigurationError(format!(
                "Truncated freshness length must be between 1 and {} bytes",
                self.freshness_length
            )));
        }
        if self.truncated_mac_length == 0 {
            return Err(SecOcError::ConfigurationError(
                "Truncated MAC length shall be at least 1 byte".into(),
            ));
        }
        Ok(())
    }

    /// Bytes appended to every payload
    pub fn trailer_length(&self) -> usize {
        self.truncated_freshness_length as usize + self.truncated_mac_length as usize
    }
}

/// Protects and verifies one secured PDU.
///
/// Holds no mutable state of its own; freshness counters live in the shared
/// [`FreshnessManager`].
pub struct SecOcPdu {
    config: SecOcPduConfig,
    key: Vec<u8>,
    mac: Box<dyn MacProvider>,
    freshness: Arc<FreshnessManager>,
}

impl fmt::Debug for SecOcPdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecOcPdu")
            .field("config", &self.config)
            .field("key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl SecOcPdu {
    /// Create a secured PDU and register its freshness counter.
    ///
    /// An existing counter for the same Data ID is shared, not reset. It must
    /// have been registered with the same `freshness_config`.
    ///
    /// # Errors
    /// Returns `SecOcError::ConfigurationError` if the configuration is invalid
    /// or disagrees with the counter already registered for the Data ID
    pub fn new(
        config: SecOcPduConfig,
        key: impl Into<Vec<u8>>,
        mac: Box<dyn MacProvider>,
        freshness: Arc<FreshnessManager>,
    ) -> SecOcResult<Self> {
        config.validate()?;
        if !freshness.register_pdu(config.data_id, config.freshness_config) {
            let bound = freshness.config(config.data_id)?;
            if bound != config.freshness_config {
                return Err(SecOcError::ConfigurationError(format!(
                    "Data ID 0x{:04X} is bound to counter width {} and max {}, expected width {} and max {}",
                    config.data_id,
                    bound.counter_width,
                    bound.max_counter,
                    config.freshness_config.counter_width,
                    config.freshness_config.max_counter
                )));
            }
        }
        Ok(Self {
            config,
            key: key.into(),
            mac,
            freshness,
        })
    }

    pub fn config(&self) -> &SecOcPduConfig {
        &self.config
    }

    pub fn data_id(&self) -> u16 {
        self.config.data_id
    }

    /// Length of the secured PDU produced for a payload of `payload_len` bytes
    pub fn secured_length(&self, payload_len: usize) -> usize {
        payload_len + self.config.trailer_length()
    }

    fn build_mac_input(&self, freshness: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut input = Vec::with_capacity(2 + freshness.len() + payload.len());
        input.extend_from_slice(&self.config.data_id.to_be_bytes());
        input.extend_from_slice(freshness);
        input.extend_from_slice(payload);
        input
    }

    /// Full MAC over the PDU contents, checked to be long enough for truncation
    fn authenticator(&self, freshness: &[u8], payload: &[u8]) -> SecOcResult<Vec<u8>> {
        let mac = self
            .mac
            .compute_mac(&self.key, &self.build_mac_input(freshness, payload))?;
        let required = self.config.truncated_mac_length as usize;
        if mac.len() < required {
            return Err(SecOcError::TruncatedMacFailed {
                required,
                actual: mac.len(),
            });
        }
        tracing::trace!(
            "SecOC MAC: data_id=0x{:04X}, freshness={:02X?}, payload_len={}",
            self.config.data_id,
            freshness,
            payload.len()
        );
        Ok(mac)
    }

    /// Authenticate `payload` for transmission.
    ///
    /// The PDU carries the counter value following the stored one; the store
    /// is advanced to that value only after the PDU was built.
    pub fn protect(&self, payload: &[u8]) -> SecOcResult<Vec<u8>> {
        if payload.len() < MIN_PAYLOAD_BYTES {
            return Err(SecOcError::InvalidPayloadLength(
                "Payload shall not be empty".into(),
            ));
        }
        let data_id = self.config.data_id;
        let freshness = self.freshness.next_freshness_value(data_id)?;
        let mac = self.authenticator(&freshness, payload)?;

        let fresh_len = (self.config.truncated_freshness_length as usize).min(freshness.len());
        let mac_len = self.config.truncated_mac_length as usize;
        let mut secured = Vec::with_capacity(self.secured_length(payload.len()));
        secured.extend_from_slice(payload);
        secured.extend_from_slice(&freshness[..fresh_len]);
        secured.extend_from_slice(&mac[..mac_len]);

        // Fails only if another sender on the same Data ID committed this value first
        self.freshness.verify_and_update(data_id, &freshness)?;
        Ok(secured)
    }

    /// Verify a received secured PDU and return its payload.
    ///
    /// The receiver's counter is advanced only when both the freshness value
    /// and the MAC are accepted.
    pub fn verify(&self, secured: &[u8]) -> SecOcResult<Vec<u8>> {
        let data_id = self.config.data_id;
        let min_len = self.config.trailer_length() + MIN_PAYLOAD_BYTES;
        if secured.len() < min_len {
            return Err(SecOcError::InvalidPayloadLength(format!(
                "Expected at least {} bytes, got {} bytes",
                min_len,
                secured.len()
            )));
        }

        let mac_start = secured.len() - self.config.truncated_mac_length as usize;
        let fresh_start = mac_start - self.config.truncated_freshness_length as usize;
        let received_mac = &secured[mac_start..];
        let received_freshness = &secured[fresh_start..mac_start];
        let payload = &secured[..fresh_start];

        // Upper bytes not carried on the wire come from the stored counter
        let mut candidate = self.freshness.freshness_value(data_id)?;
        overlay_low_bytes(&mut candidate, received_freshness);

        if let Err(err) = self.freshness.check_freshness(data_id, &candidate) {
            tracing::warn!("SecOC freshness rejected for data_id=0x{:04X}: {}", data_id, err);
            return Err(err);
        }

        let expected = self.authenticator(&candidate, payload)?;
        if !macs_match(&expected[..received_mac.len()], received_mac) {
            tracing::warn!(
                "SecOC authentication failed for data_id=0x{:04X}, freshness={}",
                data_id,
                decode_le_counter(&candidate)
            );
            return Err(SecOcError::AuthenticationFailed(data_id));
        }

        self.freshness.verify_and_update(data_id, &candidate)?;
        Ok(payload.to_vec())
    }
}
