//! Packet dispatch (spec §4.12): decodes an opened envelope into a
//! [`ClientMessage`](thornmere_protocol::ClientMessage) and hands it to the
//! matching per-kind handler on [`World`]. Grounded on `valence_network`'s
//! receive-loop-to-event dispatch in `crates/valence_network/src/lib.rs`,
//! generalized from a fixed Minecraft packet enum to this server's tagged
//! message union.

use thornmere_protocol::{ClientMessage, ProtocolError, ServerMessage};

use crate::error::GameResult;
use crate::ids::CharacterId;
use crate::world::World;

/// Decodes `raw` as a [`ClientMessage`] and routes it to the matching
/// handler on `world` for `character`. Handlers run synchronously against
/// the world's per-character state; see the concurrency model's
/// single-writer-per-character rule for why that's safe without a lock per
/// packet. `Auth` never reaches here — it is handled during session
/// establishment, before a character is bound.
pub fn dispatch(world: &mut World, character: CharacterId, raw: &[u8]) -> GameResult<Vec<ServerMessage>> {
    let message: ClientMessage =
        serde_json::from_slice(raw).map_err(|_| ProtocolError::MalformedFrame)?;

    match message {
        ClientMessage::Ping => Ok(vec![ServerMessage::Pong {
            server_time_ms: crate::tick::now_ms(),
        }]),
        ClientMessage::Auth(_) => Ok(Vec::new()),
        ClientMessage::Move(packet) => world.handle_move(character, packet),
        ClientMessage::Attack(packet) => world.handle_attack(character, packet),
        ClientMessage::SkillAction(packet) => world.handle_skill_action(character, packet),
        ClientMessage::ItemPickup { ground_item_id } => world.handle_item_pickup(character, ground_item_id),
        ClientMessage::ItemDrop { inventory_slot, quantity } => {
            world.handle_item_drop(character, inventory_slot, quantity)
        }
        ClientMessage::ItemUse { inventory_slot } => world.handle_item_use(character, inventory_slot),
        ClientMessage::EquipItem(packet) => world.handle_equip_item(character, packet),
        ClientMessage::SwitchPrayer(packet) => world.handle_switch_prayer(character, packet),
        ClientMessage::Chat(packet) => world.handle_chat_message(character, packet),
        ClientMessage::GeCreateOffer(packet) => world.handle_ge_create_offer(character, packet),
        ClientMessage::GeCancelOffer { offer_id } => world.handle_ge_cancel_offer(character, offer_id),
        ClientMessage::GeCollect { offer_id } => world.handle_ge_collect(character, offer_id),
        ClientMessage::InventoryMove(packet) => world.handle_inventory_move(character, packet),
        ClientMessage::BankDeposit(packet) => world.handle_bank_deposit(character, packet),
        ClientMessage::BankWithdraw(packet) => world.handle_bank_withdraw(character, packet),
    }
}
