use super::freshness::PduId;
use thiserror::Error;

/// Result type for SecOC operations
pub type SecOcResult<T> = Result<T, SecOcError>;

/// SecOC error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecOcError {
    /// The received MAC does not match the one computed locally
    #[error("MAC authentication failed for data ID 0x{0:04X}")]
    AuthenticationFailed(u16),

    /// The received freshness value is not newer than the stored one
    #[error("Freshness counter verification failed for PDU 0x{pdu_id:04X}: received {received}, stored {stored}")]
    FreshnessCounterFailed {
        pdu_id: PduId,
        received: u64,
        stored: u64,
    },

    /// The MAC provider refused the configured key
    #[error("Cryptographic key rejected: {0}")]
    KeyRejected(String),

    /// Payload or freshness value has the wrong size
    #[error("Invalid payload length: {0}")]
    InvalidPayloadLength(String),

    /// The MAC provider returned fewer bytes than the configured truncated MAC length
    #[error("Truncated MAC length mismatch: need {required} bytes, MAC has {actual}")]
    TruncatedMacFailed { required: usize, actual: usize },

    /// The freshness counter reached its configured ceiling
    #[error("Freshness counter overflow for PDU 0x{0:04X}")]
    FreshnessOverflow(PduId),

    /// The PDU has no freshness counter registered
    #[error("PDU 0x{0:04X} is not registered with the freshness manager")]
    NotInitialized(PduId),

    /// Invalid configuration provided
    #[error("SecOC configuration error: {0}")]
    ConfigurationError(String),
}

impl SecOcError {
    /// Numeric error code as used by the AUTOSAR SecOC error domain
    pub fn code(&self) -> u8 {
        match self {
            SecOcError::AuthenticationFailed(_) => 1,
            SecOcError::FreshnessCounterFailed { .. } => 2,
            SecOcError::KeyRejected(_) => 3,
            SecOcError::InvalidPayloadLength(_) => 4,
            SecOcError::TruncatedMacFailed { .. } => 5,
            SecOcError::FreshnessOverflow(_) => 6,
            SecOcError::NotInitialized(_) => 7,
            SecOcError::ConfigurationError(_) => 8,
        }
    }
}
