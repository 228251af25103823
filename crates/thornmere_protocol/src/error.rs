use thiserror::Error;

/// Errors raised while framing, authenticating, or decrypting an inbound
/// packet. Named after the error taxonomy in the "Protocol" category of the
/// server's error design: each variant is surfaced to the caller as-is and
/// never carries enough detail to help an attacker refine a guess.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("no session exists for this connection")]
    SessionNotFound,
    #[error("session has expired")]
    SessionExpired,
    #[error("packet timestamp is outside the accepted window")]
    InvalidTimestamp,
    #[error("nonce has already been seen for this session")]
    ReplayAttack,
    #[error("sequence number violates the monotonic window")]
    SequenceViolation,
    #[error("HMAC signature does not match")]
    SignatureMismatch,
    #[error("AES-GCM decryption failed")]
    DecryptionFailed,
    #[error("frame is malformed")]
    MalformedFrame,
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
