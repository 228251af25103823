//! Session lifecycle and the packet validation pipeline (spec §4.1): every
//! inbound envelope passes through decrypt, signature check, replay/sequence
//! check, and clock-skew check before its payload is trusted. Grounded on the
//! key-lifecycle handling the teacher's secure-chat session keys used to do
//! before this repo replaced chat signing with the wider packet-signing
//! scheme described in `SPEC_FULL.md` §C.

use std::collections::VecDeque;

use thornmere_protocol::{Envelope, ProtocolError, ProtocolResult, SessionKeys};

use crate::ids::{CharacterId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticating,
    Active,
    Rotating,
    Closed,
}

/// Tracks the highest accepted sequence number and recent nonces so
/// replayed or out-of-order packets are rejected without an unbounded
/// memory footprint. Sequencing is strictly monotonic: a packet is only
/// accepted if it is newer than the last one and not so far ahead that it
/// looks like a forged jump (spec §4.1, sequence window).
#[derive(Debug)]
struct ReplayWindow {
    window: u32,
    last_sequence: Option<u32>,
    seen_nonces: VecDeque<(String, u64)>,
    nonce_expiry_ms: u64,
}

impl ReplayWindow {
    fn new(window: u32, nonce_expiry_ms: u64) -> Self {
        Self {
            window,
            last_sequence: None,
            seen_nonces: VecDeque::new(),
            nonce_expiry_ms,
        }
    }

    fn accept_sequence(&mut self, sequence: u32) -> ProtocolResult<()> {
        let Some(last) = self.last_sequence else {
            self.last_sequence = Some(sequence);
            return Ok(());
        };
        if sequence <= last {
            return Err(ProtocolError::ReplayAttack);
        }
        if sequence > last.saturating_add(self.window.max(1)) {
            return Err(ProtocolError::SequenceViolation);
        }
        self.last_sequence = Some(sequence);
        Ok(())
    }

    fn accept_nonce(&mut self, nonce: &str, now_ms: u64) -> ProtocolResult<()> {
        self.seen_nonces.retain(|(_, t)| now_ms.saturating_sub(*t) < self.nonce_expiry_ms);
        if self.seen_nonces.iter().any(|(n, _)| n == nonce) {
            return Err(ProtocolError::ReplayAttack);
        }
        self.seen_nonces.push_back((nonce.to_owned(), now_ms));
        Ok(())
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub character_id: CharacterId,
    pub keys: SessionKeys,
    pub state: SessionState,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
    replay: ReplayWindow,
}

impl Session {
    pub fn new(
        character_id: CharacterId,
        keys: SessionKeys,
        now_ms: u64,
        sequence_window: u32,
        nonce_expiry_ms: u64,
    ) -> Self {
        Self {
            id: SessionId::new(),
            character_id,
            keys,
            state: SessionState::Active,
            created_at_ms: now_ms,
            last_activity_ms: now_ms,
            replay: ReplayWindow::new(sequence_window, nonce_expiry_ms),
        }
    }

    pub fn is_expired(&self, now_ms: u64, session_ttl_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) >= session_ttl_ms
    }

    pub fn is_idle(&self, now_ms: u64, idle_timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) >= idle_timeout_ms
    }

    /// Runs an opened envelope through sequence and nonce replay checks,
    /// then the clock-skew check, then touches `last_activity_ms`. Decrypt
    /// and signature verification happen inside `Envelope::open` before this
    /// is called; this stage handles the checks that need session state.
    pub fn validate_envelope(
        &mut self,
        envelope: &Envelope,
        now_ms: u64,
        max_packet_age_ms: u64,
        clock_skew_tolerance_ms: u64,
    ) -> ProtocolResult<()> {
        if self.state != SessionState::Active && self.state != SessionState::Rotating {
            return Err(ProtocolError::SessionExpired);
        }
        let age = now_ms as i64 - envelope.timestamp as i64;
        if age > max_packet_age_ms as i64 || age < -(clock_skew_tolerance_ms as i64) {
            return Err(ProtocolError::InvalidTimestamp);
        }
        self.replay.accept_sequence(envelope.sequence)?;
        self.replay.accept_nonce(&envelope.nonce, now_ms)?;
        self.last_activity_ms = now_ms;
        Ok(())
    }

    pub fn rotate(&mut self, new_keys: SessionKeys, now_ms: u64) {
        self.keys = new_keys;
        self.created_at_ms = now_ms;
        self.state = SessionState::Active;
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(CharacterId::new(), SessionKeys::generate(), 1_000_000, 1000, 60_000)
    }

    fn envelope(seq: u32, ts: u64, nonce: &str) -> Envelope {
        Envelope {
            payload: String::new(),
            signature: String::new(),
            sequence: seq,
            timestamp: ts,
            nonce: nonce.to_owned(),
        }
    }

    #[test]
    fn accepts_monotonic_sequence_within_window() {
        let mut s = session();
        assert!(s.validate_envelope(&envelope(1, 1_000_000, "a"), 1_000_000, 30_000, 5_000).is_ok());
        assert!(s.validate_envelope(&envelope(2, 1_000_000, "b"), 1_000_000, 30_000, 5_000).is_ok());
    }

    #[test]
    fn rejects_replayed_sequence() {
        let mut s = session();
        s.validate_envelope(&envelope(1, 1_000_000, "a"), 1_000_000, 30_000, 5_000).unwrap();
        let err = s.validate_envelope(&envelope(1, 1_000_000, "c"), 1_000_000, 30_000, 5_000).unwrap_err();
        assert_eq!(err, ProtocolError::ReplayAttack);
    }

    #[test]
    fn rejects_out_of_order_sequence() {
        let mut s = session();
        s.validate_envelope(&envelope(5, 1_000_000, "a"), 1_000_000, 30_000, 5_000).unwrap();
        let err = s.validate_envelope(&envelope(3, 1_000_000, "b"), 1_000_000, 30_000, 5_000).unwrap_err();
        assert_eq!(err, ProtocolError::ReplayAttack);
    }

    #[test]
    fn rejects_replayed_nonce_even_with_new_sequence() {
        let mut s = session();
        s.validate_envelope(&envelope(1, 1_000_000, "dup"), 1_000_000, 30_000, 5_000).unwrap();
        let err = s.validate_envelope(&envelope(2, 1_000_000, "dup"), 1_000_000, 30_000, 5_000).unwrap_err();
        assert_eq!(err, ProtocolError::ReplayAttack);
    }

    #[test]
    fn rejects_stale_timestamp() {
        let mut s = session();
        let err = s
            .validate_envelope(&envelope(1, 1_000_000 - 40_000, "a"), 1_000_000, 30_000, 5_000)
            .unwrap_err();
        assert_eq!(err, ProtocolError::InvalidTimestamp);
    }

    #[test]
    fn rejects_future_timestamp_beyond_skew_tolerance() {
        let mut s = session();
        let err = s
            .validate_envelope(&envelope(1, 1_000_000 + 10_000, "a"), 1_000_000, 30_000, 5_000)
            .unwrap_err();
        assert_eq!(err, ProtocolError::InvalidTimestamp);
    }

    #[test]
    fn expires_after_ttl() {
        let s = session();
        assert!(!s.is_expired(1_000_000 + 1000, 3_600_000));
        assert!(s.is_expired(1_000_000 + 3_600_000, 3_600_000));
    }
}
