//! The decoded, tagged-message union exchanged once a frame's envelope (or
//! plaintext handshake payload) has been opened. The [`Router`] in
//! `thornmere_server` matches on [`ClientMessage`] and dispatches to the
//! owning subsystem; it never sees raw bytes.
//!
//! [`Router`]: thornmere_server::router::Router

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages a client may send once a session is bound to a character (or,
/// for `Ping`/`Auth`, before one is).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Auth(AuthRequest),
    Move(MovePacket),
    Attack(AttackPacket),
    SkillAction(SkillActionPacket),
    ItemPickup { ground_item_id: Uuid },
    ItemDrop { inventory_slot: u16, quantity: u32 },
    ItemUse { inventory_slot: u16 },
    EquipItem(EquipItemPacket),
    SwitchPrayer(SwitchPrayerPacket),
    Chat(ChatMessagePacket),
    GeCreateOffer(GeCreateOfferPacket),
    GeCancelOffer { offer_id: Uuid },
    GeCollect { offer_id: Uuid },
    InventoryMove(InventoryMovePacket),
    BankDeposit(BankDepositPacket),
    BankWithdraw(BankWithdrawPacket),
}

/// Messages the server sends to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong { server_time_ms: u64 },
    AuthResponse(AuthResponse),
    SessionEstablished { session_id: Uuid, expires_at_ms: u64 },
    SessionRotated { session_id: Uuid, expires_at_ms: u64 },
    PositionCorrection { x: f64, y: f64, z: f64, rotation: f32 },
    ActionRejected { reason: String, cooldown_remaining_ms: Option<u64> },
    PacketRejected { reason: String },
    PlayerMoved { character_id: Uuid, x: f64, y: f64, z: f64, rotation: f32 },
    XpDrop { character_id: Uuid, skill: String, xp_gained: u32 },
    LevelUp { character_id: Uuid, skill: String, new_level: u32 },
    InventoryUpdate { character_id: Uuid },
    ChatBroadcast { channel: ChatChannel, sender: Option<String>, body: String },
    NpcState { npc_id: Uuid, state: String, x: f64, y: f64, z: f64 },
    BankUpdate { character_id: Uuid },
    Disconnect { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub access_token: String,
    pub character_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub ok: bool,
    pub session_id: Option<Uuid>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Walk,
    Run,
    Teleport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovePacket {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rotation: f32,
    pub kind: MovementKind,
    /// The client's own clock at the moment of the move, used only for
    /// movement-ability recency checks; never trusted for packet timing.
    pub client_timestamp_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackPacket {
    pub target_npc_id: Option<Uuid>,
    pub target_character_id: Option<Uuid>,
    pub ability_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillActionKind {
    MineOre,
    ChopTree,
    CatchFish,
    CookFood,
    SmithItem,
    Generic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillActionPacket {
    pub action: SkillActionKind,
    pub target_resource_id: Uuid,
    pub claimed_x: f64,
    pub claimed_y: f64,
    pub claimed_z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Cape,
    Neck,
    MainHand,
    OffHand,
    Body,
    Legs,
    Hands,
    Feet,
    Ring,
    Ammo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipItemPacket {
    pub inventory_slot: u16,
    pub equipment_slot: EquipmentSlot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchPrayerPacket {
    pub prayer_id: u32,
    pub enable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatChannel {
    Local,
    Zone,
    Global,
    Trade,
    Guild,
    Party,
    Whisper,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessagePacket {
    pub channel: ChatChannel,
    pub body: String,
    /// Required and only meaningful when `channel == Whisper`.
    pub whisper_target_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeCreateOfferPacket {
    pub kind: OfferKind,
    pub item_id: u32,
    pub quantity: u32,
    pub price_per_unit: u64,
}

/// Rearranges a character's inventory by swapping (or relocating into an
/// empty) two slots. Carries no item id: the server trusts only the slot
/// indices and reads their current contents itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovePacket {
    pub from_slot: u16,
    pub to_slot: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankDepositPacket {
    pub tab: u8,
    pub inventory_slot: u16,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankWithdrawPacket {
    pub tab: u8,
    pub bank_slot: u16,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_round_trips_through_json() {
        let msg = ClientMessage::Move(MovePacket {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            rotation: 0.5,
            kind: MovementKind::Walk,
            client_timestamp_ms: 1234,
        });
        let json = serde_json::to_string(&msg).unwrap();
        let decoded: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(decoded, ClientMessage::Move(_)));
    }
}
