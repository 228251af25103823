//! The signed, encrypted envelope carried as a frame's payload once a
//! session exists. Matches the wire shape documented in the external
//! interfaces section: `{payload: base64, signature: hex, sequence, timestamp,
//! nonce: hex}`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::{self, SessionKeys};
use crate::error::{ProtocolError, ProtocolResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Base64 of `IV (12B) || TAG (16B) || ENC`.
    pub payload: String,
    /// Hex of the 32-byte HMAC-SHA256 signature.
    pub signature: String,
    pub sequence: u32,
    pub timestamp: u64,
    /// Hex of the per-packet nonce.
    pub nonce: String,
}

impl Envelope {
    /// Encrypts and signs `plaintext`, producing a ready-to-send envelope.
    /// `nonce` must be fresh for every outbound packet (the caller is
    /// responsible for generating it; see `Session::next_outbound_nonce`).
    pub fn seal(keys: &SessionKeys, plaintext: &[u8], sequence: u32, timestamp: u64, nonce: &[u8]) -> Self {
        let ciphertext = crypto::encrypt(keys, plaintext, &[]);
        let signature = crypto::sign(keys, &ciphertext, sequence, timestamp, nonce);
        Self {
            payload: BASE64.encode(&ciphertext),
            signature: hex::encode(signature),
            sequence,
            timestamp,
            nonce: hex::encode(nonce),
        }
    }

    /// Verifies the signature and decrypts the payload, returning the
    /// plaintext bytes. Does not perform session lookup, timestamp-window,
    /// replay, or sequence-window checks — those require session state and
    /// live in `thornmere_server::session::PacketCodec`.
    pub fn open(&self, keys: &SessionKeys) -> ProtocolResult<Vec<u8>> {
        let ciphertext = BASE64
            .decode(&self.payload)
            .map_err(|_| ProtocolError::MalformedFrame)?;

        let signature_bytes = hex::decode(&self.signature).map_err(|_| ProtocolError::MalformedFrame)?;
        let signature: [u8; 32] = signature_bytes
            .try_into()
            .map_err(|_| ProtocolError::MalformedFrame)?;

        let nonce_bytes = hex::decode(&self.nonce).map_err(|_| ProtocolError::MalformedFrame)?;

        crypto::verify(keys, &ciphertext, self.sequence, self.timestamp, &nonce_bytes, &signature)?;

        crypto::decrypt(keys, &ciphertext, &[])
    }

    pub fn nonce_bytes(&self) -> ProtocolResult<Vec<u8>> {
        hex::decode(&self.nonce).map_err(|_| ProtocolError::MalformedFrame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open_recovers_plaintext() {
        let keys = SessionKeys::generate();
        let nonce = b"0123456789abcdef";
        let envelope = Envelope::seal(&keys, b"hello world", 1, 1_000, nonce);
        let plaintext = envelope.open(&keys).unwrap();
        assert_eq!(plaintext, b"hello world");
    }

    #[test]
    fn open_rejects_signature_tampering() {
        let keys = SessionKeys::generate();
        let mut envelope = Envelope::seal(&keys, b"hello", 1, 1_000, b"nonce0123456789");
        envelope.sequence = 2; // signed over sequence=1, now mismatched
        assert!(envelope.open(&keys).is_err());
    }
}
