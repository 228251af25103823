//! The outer wire frame: `length (2B) | type (2B) | seq (4B) | payload`.
//!
//! All integers are big-endian, matching the documented wire protocol.
//! `payload` carries either a plaintext handshake [`crate::message::Message`]
//! or a signed/encrypted [`crate::envelope::Envelope`], both JSON-encoded; the
//! frame header itself is always binary.

use std::io::{self, Read, Write};

use crate::error::ProtocolError;
use crate::packet::PacketType;

/// Maximum payload size accepted for a single frame. Bounds memory used while
/// buffering an inbound frame before the length is known to be sane.
pub const MAX_PAYLOAD_LEN: usize = 1 << 20; // 1 MiB

#[derive(Debug, Clone)]
pub struct Frame {
    pub packet_type: PacketType,
    pub sequence: u32,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(packet_type: PacketType, sequence: u32, payload: Vec<u8>) -> Self {
        Self {
            packet_type,
            sequence,
            payload,
        }
    }

    /// Writes `length || type || seq || payload` to `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        let len: u16 = self
            .payload
            .len()
            .try_into()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "frame payload too large"))?;
        w.write_all(&len.to_be_bytes())?;
        w.write_all(&self.packet_type.0.to_be_bytes())?;
        w.write_all(&self.sequence.to_be_bytes())?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    /// Reads a single frame from `r`. Returns [`ProtocolError::MalformedFrame`]
    /// if the declared length exceeds [`MAX_PAYLOAD_LEN`] or the stream ends
    /// early.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self, ProtocolError> {
        let mut header = [0u8; 8];
        r.read_exact(&mut header)
            .map_err(|_| ProtocolError::MalformedFrame)?;

        let len = u16::from_be_bytes([header[0], header[1]]) as usize;
        if len > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::MalformedFrame);
        }
        let packet_type = PacketType(u16::from_be_bytes([header[2], header[3]]));
        let sequence = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut payload = vec![0u8; len];
        r.read_exact(&mut payload)
            .map_err(|_| ProtocolError::MalformedFrame)?;

        Ok(Self {
            packet_type,
            sequence,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let frame = Frame::new(PacketType::MOVE, 42, b"hello".to_vec());
        let mut buf = Vec::new();
        frame.write_to(&mut buf).unwrap();

        let decoded = Frame::read_from(&buf[..]).unwrap();
        assert_eq!(decoded.packet_type, frame.packet_type);
        assert_eq!(decoded.sequence, frame.sequence);
        assert_eq!(decoded.payload, frame.payload);
    }

    #[test]
    fn truncated_stream_is_malformed() {
        let frame = Frame::new(PacketType::PING, 1, b"abc".to_vec());
        let mut buf = Vec::new();
        frame.write_to(&mut buf).unwrap();
        buf.truncate(buf.len() - 1);
        assert!(matches!(
            Frame::read_from(&buf[..]),
            Err(ProtocolError::MalformedFrame)
        ));
    }
}
