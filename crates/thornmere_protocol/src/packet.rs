//! Nominal packet type codes carried in the frame header.
//!
//! These exist only to route a raw frame to the right decoder before the
//! envelope (if any) is opened; the actual dispatch on decoded content
//! happens against [`crate::message::Message`].

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketType(pub u16);

impl PacketType {
    pub const PING: Self = Self(0x01);
    pub const PONG: Self = Self(0x02);
    pub const AUTH: Self = Self(0x03);
    pub const AUTH_RESPONSE: Self = Self(0x04);
    pub const MOVE: Self = Self(0x10);
    pub const MOVE_SYNC: Self = Self(0x11);
    pub const TELEPORT: Self = Self(0x12);
    pub const ATTACK: Self = Self(0x20);
    pub const DAMAGE: Self = Self(0x21);
    pub const DEATH: Self = Self(0x22);
    pub const RESPAWN: Self = Self(0x23);
    pub const SKILL_ACTION: Self = Self(0x30);
    pub const SKILL_XP: Self = Self(0x31);
    pub const SKILL_LEVEL: Self = Self(0x32);
    pub const ITEM_PICKUP: Self = Self(0x40);
    pub const ITEM_DROP: Self = Self(0x41);
    pub const ITEM_USE: Self = Self(0x42);
    pub const INVENTORY_UPDATE: Self = Self(0x43);
    pub const CHAT_MESSAGE: Self = Self(0x50);
    pub const CHAT_BROADCAST: Self = Self(0x51);
    pub const NPC_SPAWN: Self = Self(0x60);
    pub const NPC_STATE: Self = Self(0x61);
    pub const NPC_DESPAWN: Self = Self(0x62);
    pub const NPC_RESPAWN: Self = Self(0x63);
    pub const PLAYER_JOIN: Self = Self(0x70);
    pub const PLAYER_LEAVE: Self = Self(0x71);
    pub const PLAYER_UPDATE: Self = Self(0x72);
}
