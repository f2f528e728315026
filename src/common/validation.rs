use crate::{E2EError, E2EResult};
use std::fmt::Display;

pub fn validate_min_data_length(len: usize, min: usize) -> E2EResult<()> {
    if len < min {
        return Err(E2EError::InvalidDataFormat(format!(
            "Expected at least {} bytes, got {} bytes",
            min, len
        )));
    }
    Ok(())
}

pub fn validate_counter_config<T>(max_delta_counter: T, max: T) -> E2EResult<()>
where
    T: PartialOrd + Display + Copy + From<u8>,
{
    if max_delta_counter < T::from(1) || max_delta_counter > max {
        return Err(E2EError::InvalidConfiguration(format!(
            "Max delta counter must be between 1 and {}",
            max
        )));
    }
    Ok(())
}
