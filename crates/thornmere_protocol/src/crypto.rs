//! Packet signing and payload encryption primitives.
//!
//! Keys are session-scoped (see `thornmere_server::session::Session`); this
//! module only knows how to turn key bytes + plaintext into wire bytes and
//! back. It deliberately holds no session state so it can be unit-tested in
//! isolation from sequence/nonce/replay bookkeeping.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{ProtocolError, ProtocolResult};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNING_KEY_LEN: usize = 32;
pub const ENCRYPTION_KEY_LEN: usize = 32;
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric keys held by a single [`Session`](crate) for the lifetime of a
/// connection (or until rotated). Cloning is cheap and intentional: the
/// codec needs an owned copy per packet to avoid holding a lock for the
/// crypto operation.
#[derive(Clone)]
pub struct SessionKeys {
    pub signing_key: [u8; SIGNING_KEY_LEN],
    pub encryption_key: [u8; ENCRYPTION_KEY_LEN],
}

impl SessionKeys {
    /// Generates a fresh random key pair, used both at session establishment
    /// and on every key rotation.
    pub fn generate() -> Self {
        let mut signing_key = [0u8; SIGNING_KEY_LEN];
        let mut encryption_key = [0u8; ENCRYPTION_KEY_LEN];
        rand::thread_rng().fill_bytes(&mut signing_key);
        rand::thread_rng().fill_bytes(&mut encryption_key);
        Self {
            signing_key,
            encryption_key,
        }
    }
}

/// Computes the HMAC-SHA256 signature over `ciphertext || sequence ||
/// timestamp || nonce`, per the wire protocol's crypto parameters.
pub fn sign(keys: &SessionKeys, ciphertext: &[u8], sequence: u32, timestamp_ms: u64, nonce: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(&keys.signing_key).expect("HMAC accepts any key length");
    mac.update(ciphertext);
    mac.update(&sequence.to_be_bytes());
    mac.update(&timestamp_ms.to_be_bytes());
    mac.update(nonce);
    mac.finalize().into_bytes().into()
}

/// Verifies a signature in constant time.
pub fn verify(
    keys: &SessionKeys,
    ciphertext: &[u8],
    sequence: u32,
    timestamp_ms: u64,
    nonce: &[u8],
    signature: &[u8; 32],
) -> ProtocolResult<()> {
    let expected = sign(keys, ciphertext, sequence, timestamp_ms, nonce);
    if expected.ct_eq(signature).into() {
        Ok(())
    } else {
        Err(ProtocolError::SignatureMismatch)
    }
}

/// Encrypts `plaintext` under AES-256-GCM, framing the result as
/// `IV (12B) || TAG (16B) || ENC` as specified by the wire protocol.
pub fn encrypt(keys: &SessionKeys, plaintext: &[u8], aad: &[u8]) -> Vec<u8> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&keys.encryption_key));

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    let enc_and_tag = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .expect("AES-256-GCM encryption of a bounded buffer cannot fail");

    // `enc_and_tag` is ENC || TAG; the wire format wants IV || TAG || ENC.
    let split = enc_and_tag.len() - TAG_LEN;
    let (enc, tag) = enc_and_tag.split_at(split);

    let mut framed = Vec::with_capacity(IV_LEN + TAG_LEN + enc.len());
    framed.extend_from_slice(&iv);
    framed.extend_from_slice(tag);
    framed.extend_from_slice(enc);
    framed
}

/// Decrypts a buffer framed as `IV (12B) || TAG (16B) || ENC`.
pub fn decrypt(keys: &SessionKeys, framed: &[u8], aad: &[u8]) -> ProtocolResult<Vec<u8>> {
    if framed.len() < IV_LEN + TAG_LEN {
        return Err(ProtocolError::DecryptionFailed);
    }

    let (iv, rest) = framed.split_at(IV_LEN);
    let (tag, enc) = rest.split_at(TAG_LEN);

    let mut enc_and_tag = Vec::with_capacity(enc.len() + TAG_LEN);
    enc_and_tag.extend_from_slice(enc);
    enc_and_tag.extend_from_slice(tag);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&keys.encryption_key));
    let nonce = Nonce::from_slice(iv);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &enc_and_tag,
                aad,
            },
        )
        .map_err(|_| ProtocolError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt_is_the_identity() {
        let keys = SessionKeys::generate();
        let plaintext = b"move { x: 1.0, y: 2.0, z: 3.0 }";
        let framed = encrypt(&keys, plaintext, b"");
        let decrypted = decrypt(&keys, &framed, b"").unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let keys = SessionKeys::generate();
        let mut framed = encrypt(&keys, b"payload", b"");
        let last = framed.len() - 1;
        framed[last] ^= 0xFF;
        assert!(decrypt(&keys, &framed, b"").is_err());
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let keys = SessionKeys::generate();
        let sig = sign(&keys, b"ciphertext", 7, 1000, b"nonce");
        assert!(verify(&keys, b"ciphertext", 7, 1000, b"nonce", &sig).is_ok());
    }

    #[test]
    fn verify_rejects_wrong_sequence() {
        let keys = SessionKeys::generate();
        let sig = sign(&keys, b"ciphertext", 7, 1000, b"nonce");
        assert!(verify(&keys, b"ciphertext", 8, 1000, b"nonce", &sig).is_err());
    }
}
