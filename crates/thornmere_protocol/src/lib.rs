//! Wire framing, the decoded message union, and packet cryptography shared
//! between every Thornmere server crate and (eventually) a client.
//!
//! Layered the way `valence_protocol` separates framing/encoding from
//! `valence_network`'s session/crypto concerns, but collapsed into one crate
//! since the custom binary protocol here is far smaller than Minecraft's.

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod message;
pub mod packet;

pub use crypto::SessionKeys;
pub use envelope::Envelope;
pub use error::{ProtocolError, ProtocolResult};
pub use frame::Frame;
pub use message::{
    AttackPacket, AuthRequest, AuthResponse, BankDepositPacket, BankWithdrawPacket, ChatChannel, ChatMessagePacket,
    ClientMessage, EquipItemPacket, EquipmentSlot, GeCreateOfferPacket, InventoryMovePacket, MovePacket,
    MovementKind, OfferKind, ServerMessage, SkillActionKind, SkillActionPacket, SwitchPrayerPacket,
};
pub use packet::PacketType;
