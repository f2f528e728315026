use crate::E2EStatus;

pub trait CounterOps {
    type CounterType;
    const MAX_VALUE: Self::CounterType;
    const MODULO: u8;

    fn increment_counter(current: Self::CounterType) -> Self::CounterType;
    fn signed_delta(current: Self::CounterType, received: Self::CounterType) -> i8;
    fn validate_counter(
        current: Self::CounterType,
        received: Self::CounterType,
        max_delta: Self::CounterType,
    ) -> E2EStatus;
}

/// 4-bit counter for Profile 2 (0-15, modulo 16)
pub struct Counter4;

impl CounterOps for Counter4 {
    type CounterType = u8;
    const MAX_VALUE: u8 = 15;
    const MODULO: u8 = 16;

    fn increment_counter(current: u8) -> u8 {
        if current >= Self::MAX_VALUE {
            0
        } else {
            current + 1
        }
    }

    /// Distance from `current` to `received` as a two's complement nibble (-8..=7).
    fn signed_delta(current: u8, received: u8) -> i8 {
        let raw = received.wrapping_sub(current) % Self::MODULO;
        if raw > 7 {
            raw as i8 - Self::MODULO as i8
        } else {
            raw as i8
        }
    }

    fn validate_counter(current: u8, received: u8, max_delta: u8) -> E2EStatus {
        let delta = Self::signed_delta(current, received);

        if delta == 0 {
            E2EStatus::Repeated
        } else if delta < 0 || delta > max_delta as i8 {
            E2EStatus::WrongSequence
        } else {
            E2EStatus::Ok
        }
    }
}
