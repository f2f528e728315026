//! MAC providers for SecOC authentication.

use super::error::{SecOcError, SecOcResult};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384};

/// Keyed message authentication code used to authenticate secured PDUs.
///
/// Implementations must be deterministic: the receiver recomputes the MAC and
/// compares it with the transmitted one.
pub trait MacProvider: Send + Sync {
    /// Compute the full-length MAC of `data` under `key`
    fn compute_mac(&self, key: &[u8], data: &[u8]) -> SecOcResult<Vec<u8>>;
}

impl<F> MacProvider for F
where
    F: Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync,
{
    fn compute_mac(&self, key: &[u8], data: &[u8]) -> SecOcResult<Vec<u8>> {
        Ok(self(key, data))
    }
}

/// HMAC-SHA-256, 32-byte MAC
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

impl MacProvider for HmacSha256 {
    fn compute_mac(&self, key: &[u8], data: &[u8]) -> SecOcResult<Vec<u8>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(key)
            .map_err(|e| SecOcError::KeyRejected(e.to_string()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// HMAC-SHA-384, 48-byte MAC
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha384;

impl MacProvider for HmacSha384 {
    fn compute_mac(&self, key: &[u8], data: &[u8]) -> SecOcResult<Vec<u8>> {
        let mut mac = Hmac::<Sha384>::new_from_slice(key)
            .map_err(|e| SecOcError::KeyRejected(e.to_string()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Compare two MACs without stopping at the first differing byte.
///
/// Slices of different length never match.
pub fn macs_match(expected: &[u8], received: &[u8]) -> bool {
    if expected.len() != received.len() {
        return false;
    }
    let mut matched = true;
    for (a, b) in expected.iter().zip(received) {
        matched &= a == b;
    }
    matched
}
