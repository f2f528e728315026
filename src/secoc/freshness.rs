//! # Freshness Value Manager
//!
//! Keeps one monotonic 64-bit counter per PDU. Counters travel on the wire
//! little-endian, `counter_width` bytes wide.
//!
//! A single lock guards the whole map, so one manager can be shared by any
//! number of [`SecOcPdu`](super::SecOcPdu) instances and threads.

use super::error::{SecOcError, SecOcResult};
use crate::common::field_ops::{decode_le_counter, encode_le_counter};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Identifier of a PDU inside the freshness manager
pub type PduId = u16;

/// Full-width freshness value, little-endian
pub type FreshnessValue = Vec<u8>;

/// Configuration of one freshness counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FreshnessConfig {
    /// Bytes used for the counter on the wire (at most 8 are significant)
    pub counter_width: u8,
    /// Hard ceiling for the counter; 0 means unbounded
    pub max_counter: u64,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            counter_width: 4,
            max_counter: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct FreshnessEntry {
    config: FreshnessConfig,
    counter: u64,
}

impl FreshnessEntry {
    fn value(&self) -> FreshnessValue {
        encode_le_counter(self.counter, self.config.counter_width as usize)
    }

    /// Counter value following the current one, if the ceiling allows it
    fn next(&self, pdu_id: PduId) -> SecOcResult<u64> {
        let max = self.config.max_counter;
        if max != 0 && self.counter >= max {
            return Err(SecOcError::FreshnessOverflow(pdu_id));
        }
        self.counter
            .checked_add(1)
            .ok_or(SecOcError::FreshnessOverflow(pdu_id))
    }

    /// Decode `received` and accept it only if it is strictly newer
    fn accept(&self, pdu_id: PduId, received: &[u8]) -> SecOcResult<u64> {
        if received.len() != self.config.counter_width as usize {
            return Err(SecOcError::InvalidPayloadLength(format!(
                "Expected {} freshness bytes, got {} bytes",
                self.config.counter_width,
                received.len()
            )));
        }
        let received = decode_le_counter(received);
        if received <= self.counter {
            return Err(SecOcError::FreshnessCounterFailed {
                pdu_id,
                received,
                stored: self.counter,
            });
        }
        Ok(received)
    }
}

/// Per-PDU freshness counter store
#[derive(Debug, Default)]
pub struct FreshnessManager {
    entries: Mutex<HashMap<PduId, FreshnessEntry>>,
}

impl FreshnessManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entry<R>(
        &self,
        pdu_id: PduId,
        f: impl FnOnce(&mut FreshnessEntry) -> SecOcResult<R>,
    ) -> SecOcResult<R> {
        let mut entries = self.entries.lock();
        let entry = entries
            .get_mut(&pdu_id)
            .ok_or(SecOcError::NotInitialized(pdu_id))?;
        f(entry)
    }

    /// Register a zero-initialized counter for `pdu_id`.
    ///
    /// Returns `false` and leaves the existing counter untouched if the PDU is
    /// already registered.
    pub fn register_pdu(&self, pdu_id: PduId, config: FreshnessConfig) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(&pdu_id) {
            tracing::debug!("Freshness counter for PDU 0x{:04X} already registered", pdu_id);
            return false;
        }
        entries.insert(pdu_id, FreshnessEntry { config, counter: 0 });
        tracing::debug!(
            "Registered freshness counter for PDU 0x{:04X}: width={}, max={}",
            pdu_id,
            config.counter_width,
            config.max_counter
        );
        true
    }

    /// Drop the counter of `pdu_id`; unknown ids are ignored.
    pub fn unregister_pdu(&self, pdu_id: PduId) {
        if self.entries.lock().remove(&pdu_id).is_some() {
            tracing::debug!("Unregistered freshness counter for PDU 0x{:04X}", pdu_id);
        }
    }

    pub fn is_registered(&self, pdu_id: PduId) -> bool {
        self.entries.lock().contains_key(&pdu_id)
    }

    /// Settings the counter of `pdu_id` was registered with
    pub fn config(&self, pdu_id: PduId) -> SecOcResult<FreshnessConfig> {
        self.with_entry(pdu_id, |entry| Ok(entry.config))
    }

    /// Current counter encoded into `counter_width` little-endian bytes
    pub fn freshness_value(&self, pdu_id: PduId) -> SecOcResult<FreshnessValue> {
        self.with_entry(pdu_id, |entry| Ok(entry.value()))
    }

    /// Encoded value the counter will hold after the next increment.
    ///
    /// Fails with `FreshnessOverflow` exactly when [`increment_counter`](Self::increment_counter) would.
    pub fn next_freshness_value(&self, pdu_id: PduId) -> SecOcResult<FreshnessValue> {
        self.with_entry(pdu_id, |entry| {
            let next = entry.next(pdu_id)?;
            Ok(encode_le_counter(next, entry.config.counter_width as usize))
        })
    }

    /// Advance the counter by one.
    ///
    /// A counter with a nonzero `max_counter` freezes at that value and every
    /// further increment fails with `FreshnessOverflow`.
    pub fn increment_counter(&self, pdu_id: PduId) -> SecOcResult<()> {
        self.with_entry(pdu_id, |entry| {
            entry.counter = entry.next(pdu_id)?;
            Ok(())
        })
    }

    /// Check `received` against the stored counter without updating it.
    pub fn check_freshness(&self, pdu_id: PduId, received: &[u8]) -> SecOcResult<()> {
        self.with_entry(pdu_id, |entry| entry.accept(pdu_id, received).map(|_| ()))
    }

    /// Accept `received` if it is strictly greater than the stored counter and
    /// store it.
    ///
    /// Any larger value is accepted, however far ahead of the stored one.
    pub fn verify_and_update(&self, pdu_id: PduId, received: &[u8]) -> SecOcResult<()> {
        self.with_entry(pdu_id, |entry| {
            let accepted = entry.accept(pdu_id, received)?;
            tracing::debug!(
                "Freshness counter for PDU 0x{:04X} advanced {} -> {}",
                pdu_id,
                entry.counter,
                accepted
            );
            entry.counter = accepted;
            Ok(())
        })
    }

    pub fn counter_value(&self, pdu_id: PduId) -> SecOcResult<u64> {
        self.with_entry(pdu_id, |entry| Ok(entry.counter))
    }

    pub fn reset_counter(&self, pdu_id: PduId) -> SecOcResult<()> {
        self.with_entry(pdu_id, |entry| {
            entry.counter = 0;
            Ok(())
        })
    }
}
