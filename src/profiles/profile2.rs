//! # E2E Profile 2 Implementation
//!
//! Profile 2 protects variable-length signals with a 3-byte header. It uses:
//! - CRC-8H2F (polynomial 0x2F) for data integrity
//! - 4-bit counter for sequence checking (0-15)
//! - 16-bit Data ID for masquerade prevention
//!
//! # Data layout
//! [CRC(1B) | HDR(1B) | DID_LO(1B) | DATA ...]
//! - HDR (bits 7..4) : Data ID bits 15..12
//! - HDR (bits 3..0) : counter
//!
//! The CRC covers DataID high byte, DataID low byte, HDR, DID_LO and the data,
//! in that order.

use crate::common::counter::{Counter4, CounterOps};
use crate::common::crc_ops::compute_crc8_h2f;
use crate::common::field_ops::{compose_nibbles, low_nibble};
use crate::common::validation::{validate_counter_config, validate_min_data_length};
use crate::{E2EProfile, E2EResult, E2EStatus};

// Constants
const HEADER_LENGTH_BYTES: usize = 3;
const MIN_PAYLOAD_BYTES: usize = 1;
const MAX_DELTA_COUNTER: u8 = 7;

/// Configuration for E2E Profile 2
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Profile2Config {
    /// 16-bit data identifier, unique per signal
    pub data_id: u16,
    /// Maximum allowed delta between consecutive counters (lost message tolerance)
    pub max_delta_counter: u8,
}

impl Default for Profile2Config {
    fn default() -> Self {
        Self {
            data_id: 0x0000,
            max_delta_counter: 1,
        }
    }
}

/// Check Item for E2E Profile 2
#[derive(Debug, Clone)]
struct Profile2Check {
    rx_counter: u8,
    rx_crc: u8,
    calculated_crc: u8,
}

/// E2E Profile 2 Implementation
///
/// One instance serves one sender or receiver role; its counters are not
/// synchronized internally.
#[derive(Debug, Clone)]
pub struct Profile2 {
    config: Profile2Config,
    protect_counter: u8,
    check_counter: u8,
}

impl Profile2 {
    /// Validate configuration parameters
    fn validate_config(config: &Profile2Config) -> E2EResult<()> {
        validate_counter_config(config.max_delta_counter, MAX_DELTA_COUNTER)
    }

    /// Counter value last placed in a frame by `protect` or `forward`
    pub fn protecting_counter(&self) -> u8 {
        self.protect_counter
    }

    /// Counter value taken from the last frame that passed the CRC check
    pub fn checking_counter(&self) -> u8 {
        self.check_counter
    }

    /// Return both counters to their initial value
    pub fn reset(&mut self) {
        self.protect_counter = 0;
        self.check_counter = 0;
    }

    fn control_bytes(&self, counter: u8) -> [u8; 2] {
        let [id_hi, id_lo] = self.config.data_id.to_be_bytes();
        [compose_nibbles(id_hi >> 4, counter), id_lo]
    }

    fn compute_crc(&self, control: [u8; 2], payload: &[u8]) -> u8 {
        let data_id = self.config.data_id.to_be_bytes();
        let crc = compute_crc8_h2f(&[&data_id[..], &control[..], payload]);
        tracing::trace!(
            "CRC-8H2F Profile2: data_id=0x{:04X}, control={:02X?}, payload_len={}, crc=0x{:02X}",
            self.config.data_id,
            control,
            payload.len(),
            crc
        );
        crc
    }

    fn frame(&self, counter: u8, payload: &[u8]) -> Vec<u8> {
        let control = self.control_bytes(counter);
        let crc = self.compute_crc(control, payload);

        let mut framed = Vec::with_capacity(HEADER_LENGTH_BYTES + payload.len());
        framed.push(crc);
        framed.extend_from_slice(&control);
        framed.extend_from_slice(payload);
        framed
    }

    fn do_checks(&mut self, check_items: Profile2Check) -> E2EStatus {
        if check_items.calculated_crc != check_items.rx_crc {
            return E2EStatus::WrongCrc;
        }
        let status = Counter4::validate_counter(
            self.check_counter,
            check_items.rx_counter,
            self.config.max_delta_counter,
        );
        self.check_counter = check_items.rx_counter;
        status
    }
}

impl E2EProfile for Profile2 {
    type Config = Profile2Config;

    fn new(config: Self::Config) -> E2EResult<Self> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            protect_counter: 0,
            check_counter: 0,
        })
    }

    fn protect(&mut self, data: &[u8]) -> E2EResult<Vec<u8>> {
        validate_min_data_length(data.len(), MIN_PAYLOAD_BYTES)?;
        self.protect_counter = Counter4::increment_counter(self.protect_counter);
        Ok(self.frame(self.protect_counter, data))
    }

    fn forward(&mut self, data: &[u8]) -> E2EResult<Vec<u8>> {
        validate_min_data_length(data.len(), MIN_PAYLOAD_BYTES)?;
        let framed = self.frame(self.check_counter, data);
        self.protect_counter = self.check_counter;
        Ok(framed)
    }

    fn check(&mut self, data: &[u8]) -> E2EStatus {
        if data.len() < HEADER_LENGTH_BYTES + MIN_PAYLOAD_BYTES {
            return E2EStatus::NoNewData;
        }
        let control = [data[1], data[2]];
        let check_items = Profile2Check {
            rx_counter: low_nibble(control[0]),
            rx_crc: data[0],
            calculated_crc: self.compute_crc(control, &data[HEADER_LENGTH_BYTES..]),
        };
        let status = self.do_checks(check_items);
        if status != E2EStatus::Ok {
            tracing::warn!(
                "E2E Profile 2 check failed: data_id=0x{:04X}, status={:?}",
                self.config.data_id,
                status
            );
        }
        status
    }

    fn header_length(&self) -> usize {
        HEADER_LENGTH_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::E2EError;
    use proptest::prelude::*;

    fn config(data_id: u16, max_delta_counter: u8) -> Profile2Config {
        Profile2Config {
            data_id,
            max_delta_counter,
        }
    }

    #[test]
    fn test_profile2_basic_example() {
        let mut profile_tx = Profile2::new(config(0x1234, 1)).unwrap();
        let mut profile_rx = Profile2::new(config(0x1234, 1)).unwrap();

        let data = profile_tx.protect(&[0xAA, 0xBB]).unwrap();
        assert_eq!(data, vec![0x93, 0x11, 0x34, 0xAA, 0xBB]);
        assert_eq!(profile_rx.check(&data), E2EStatus::Ok);

        let data = profile_tx.protect(&[0xAA, 0xBB]).unwrap();
        assert_eq!(data, vec![0x63, 0x12, 0x34, 0xAA, 0xBB]);
        assert_eq!(profile_rx.check(&data), E2EStatus::Ok);
    }

    #[test]
    fn test_profile2_high_nibble_and_wrap_vectors() {
        let mut profile_tx = Profile2::new(config(0xABCD, 1)).unwrap();
        let payload = [0x01, 0x02, 0x03, 0x04];
        for _ in 0..14 {
            profile_tx.protect(&payload).unwrap();
        }
        let data = profile_tx.protect(&payload).unwrap();
        assert_eq!(data[..3], [0x2B, 0xAF, 0xCD]);
        let data = profile_tx.protect(&payload).unwrap();
        assert_eq!(data[..3], [0x56, 0xA0, 0xCD]);
    }

    #[test]
    fn test_profile2_check_and_extract() {
        let mut profile_tx = Profile2::new(config(0x1234, 1)).unwrap();
        let mut profile_rx = Profile2::new(config(0x1234, 1)).unwrap();

        let data = profile_tx.protect(&[0xAA, 0xBB]).unwrap();
        let result = profile_rx.check_and_extract(&data);
        assert_eq!(result.status, E2EStatus::Ok);
        assert_eq!(result.payload, Some(&[0xAA, 0xBB][..]));

        let result = profile_rx.check_and_extract(&data);
        assert_eq!(result.status, E2EStatus::Repeated);
        assert_eq!(result.payload, None);
    }

    #[test]
    fn test_profile2_empty_payload_rejected() {
        let mut profile = Profile2::new(Profile2Config::default()).unwrap();
        assert!(matches!(
            profile.protect(&[]),
            Err(E2EError::InvalidDataFormat(_))
        ));
        assert!(matches!(
            profile.forward(&[]),
            Err(E2EError::InvalidDataFormat(_))
        ));
        assert_eq!(profile.protecting_counter(), 0);
    }

    #[test]
    fn test_profile2_invalid_config() {
        assert!(matches!(
            Profile2::new(config(0x1, 0)),
            Err(E2EError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            Profile2::new(config(0x1, 8)),
            Err(E2EError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_profile2_no_new_data() {
        let mut profile = Profile2::new(Profile2Config::default()).unwrap();
        assert_eq!(profile.check(&[]), E2EStatus::NoNewData);
        assert_eq!(profile.check(&[0x43, 0x01, 0x00]), E2EStatus::NoNewData);
        assert_eq!(profile.checking_counter(), 0);
        assert_eq!(profile.check(&[0x43, 0x01, 0x00, 0x00]), E2EStatus::Ok);
        assert_eq!(profile.checking_counter(), 1);
    }

    #[test]
    fn test_profile2_crc_error_on_any_bit_flip() {
        let mut profile_tx = Profile2::new(config(0x1234, 1)).unwrap();
        let data = profile_tx.protect(&[0xAA, 0xBB, 0xCC]).unwrap();

        for byte in 0..data.len() {
            for bit in 0..8 {
                let mut corrupted = data.clone();
                corrupted[byte] ^= 1 << bit;
                let mut profile_rx = Profile2::new(config(0x1234, 1)).unwrap();
                assert_eq!(profile_rx.check(&corrupted), E2EStatus::WrongCrc);
                assert_eq!(profile_rx.checking_counter(), 0);
            }
        }
    }

    #[test]
    fn test_profile2_wrong_data_id() {
        let mut profile_tx = Profile2::new(config(0x1234, 1)).unwrap();
        let mut profile_rx = Profile2::new(config(0x1235, 1)).unwrap();
        let data = profile_tx.protect(&[0xAA]).unwrap();
        assert_eq!(profile_rx.check(&data), E2EStatus::WrongCrc);
    }

    #[test]
    fn test_profile2_sequence_gap() {
        let mut tx = Profile2::new(config(0x0042, 1)).unwrap();
        let mut rx = Profile2::new(config(0x0042, 1)).unwrap();

        let first = tx.protect(&[0x01]).unwrap();
        assert_eq!(rx.check(&first), E2EStatus::Ok);

        // One frame lost: delta = 2
        let _lost = tx.protect(&[0x02]).unwrap();
        let third = tx.protect(&[0x03]).unwrap();
        assert_eq!(rx.check(&third), E2EStatus::WrongSequence);
        assert_eq!(rx.checking_counter(), 3);

        // Resynchronized on the rejected frame
        let fourth = tx.protect(&[0x04]).unwrap();
        assert_eq!(rx.check(&fourth), E2EStatus::Ok);
    }

    #[test]
    fn test_profile2_some_lost_tolerated() {
        let mut tx = Profile2::new(config(0x0042, 2)).unwrap();
        let mut rx = Profile2::new(config(0x0042, 2)).unwrap();

        let first = tx.protect(&[0x01]).unwrap();
        assert_eq!(rx.check(&first), E2EStatus::Ok);
        let _lost = tx.protect(&[0x02]).unwrap();
        let third = tx.protect(&[0x03]).unwrap();
        assert_eq!(rx.check(&third), E2EStatus::Ok);
    }

    #[test]
    fn test_profile2_out_of_order() {
        let mut tx = Profile2::new(config(0x0042, 3)).unwrap();
        let mut rx = Profile2::new(config(0x0042, 3)).unwrap();

        let first = tx.protect(&[0x01]).unwrap();
        let second = tx.protect(&[0x02]).unwrap();
        assert_eq!(rx.check(&second), E2EStatus::Ok);
        assert_eq!(rx.check(&first), E2EStatus::WrongSequence);
        assert_eq!(rx.checking_counter(), 1);
    }

    #[test]
    fn test_profile2_counter_wraparound() {
        let mut tx = Profile2::new(config(0x0100, 1)).unwrap();
        let mut rx = Profile2::new(config(0x0100, 1)).unwrap();

        for expected in 1..=15u8 {
            let data = tx.protect(&[expected]).unwrap();
            assert_eq!(tx.protecting_counter(), expected);
            assert_eq!(rx.check(&data), E2EStatus::Ok);
        }
        let data = tx.protect(&[0x10]).unwrap();
        assert_eq!(tx.protecting_counter(), 0);
        assert_eq!(data[1] & 0x0F, 0x00);
        assert_eq!(rx.check(&data), E2EStatus::Ok);
        assert_eq!(rx.checking_counter(), 0);
    }

    #[test]
    fn test_profile2_repeated_frame() {
        let mut tx = Profile2::new(Profile2Config::default()).unwrap();
        let mut rx = tx.clone();
        let data = tx.protect(&[0x55]).unwrap();
        assert_eq!(rx.check(&data), E2EStatus::Ok);
        assert_eq!(rx.check(&data), E2EStatus::Repeated);
    }

    #[test]
    fn test_profile2_forward_uses_checked_counter() {
        let mut source = Profile2::new(config(0x0777, 1)).unwrap();
        let mut gateway = Profile2::new(config(0x0777, 1)).unwrap();
        let mut sink = Profile2::new(config(0x0777, 1)).unwrap();

        for _ in 0..4 {
            source.protect(&[0x00]).unwrap();
        }
        let incoming = source.protect(&[0xC0, 0xFF, 0xEE]).unwrap();
        assert_eq!(gateway.check(&incoming), E2EStatus::WrongSequence);
        assert_eq!(gateway.checking_counter(), 5);

        let relayed = gateway.forward(&incoming[3..]).unwrap();
        assert_eq!(relayed, incoming);
        assert_eq!(gateway.protecting_counter(), 5);

        // The next protected frame continues from the forwarded counter
        let next = gateway.protect(&[0x01]).unwrap();
        assert_eq!(next[1] & 0x0F, 6);

        sink.check(&relayed);
        assert_eq!(sink.check(&next), E2EStatus::Ok);
    }

    #[test]
    fn test_profile2_reset() {
        let mut profile = Profile2::new(Profile2Config::default()).unwrap();
        let data = profile.protect(&[0x01]).unwrap();
        profile.check(&data);
        profile.reset();
        assert_eq!(profile.protecting_counter(), 0);
        assert_eq!(profile.checking_counter(), 0);
    }

    proptest! {
        #[test]
        fn prop_fresh_pair_round_trip(
            data_id in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let mut tx = Profile2::new(config(data_id, 1)).unwrap();
            let mut rx = Profile2::new(config(data_id, 1)).unwrap();
            let data = tx.protect(&payload).unwrap();
            let result = rx.check_and_extract(&data);
            prop_assert_eq!(result.status, E2EStatus::Ok);
            prop_assert_eq!(result.payload, Some(payload.as_slice()));
        }

        #[test]
        fn prop_in_order_stream_always_ok(
            data_id in any::<u16>(),
            frames in 1usize..64,
        ) {
            let mut tx = Profile2::new(config(data_id, 1)).unwrap();
            let mut rx = Profile2::new(config(data_id, 1)).unwrap();
            for i in 0..frames {
                let data = tx.protect(&[i as u8]).unwrap();
                prop_assert_eq!(rx.check(&data), E2EStatus::Ok);
            }
        }
    }
}
