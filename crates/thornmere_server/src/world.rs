//! The central simulation state: every registry the game loop and router
//! touch, held behind one struct the way the teacher's `SharedServer` holds
//! the ECS `World` plus its connection and event-loop state in
//! `crates/valence/src/server.rs`. `World` itself is not `Send`-shared; the
//! game loop owns it exclusively and per-character handlers run against it
//! one at a time within a tick, per the concurrency model.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thornmere_protocol::ServerMessage;

use crate::catalog::DataCatalog;
use crate::character::Character;
use crate::chat::{ChatChannel as DomainChatChannel, ChatMessage as DomainChatMessage, ChatRouter};
use crate::config::ServerConfig;
use crate::error::{ActionError, ExchangeError, GameError, GameResult, InventoryError, MovementError};
use crate::exchange::{ExchangeEngine, OfferKind as DomainOfferKind};
use crate::ids::{CharacterId, ItemId, NpcId, ResourceId, ZoneId};
use crate::inventory::EquipmentSlot as DomainEquipmentSlot;
use crate::npc::NpcManager;
use crate::resource::ResourceManager;
use crate::skill;
use crate::spatial::{EntityRef, ZoneIndex};
use crate::tick::{Tick, TickClock};
use crate::validation::ValidationRegistry;
use rustc_hash::FxHashMap;
use uuid::Uuid;

pub struct World {
    pub config: ServerConfig,
    pub catalog: Arc<dyn DataCatalog>,
    pub characters: FxHashMap<CharacterId, Character>,
    pub zones: ZoneIndex,
    pub npcs: NpcManager,
    pub resources: ResourceManager,
    pub exchange: ExchangeEngine,
    pub validation: ValidationRegistry,
    pub clock: TickClock,
    pub current_tick: Tick,
    rng: StdRng,
}

impl World {
    pub fn new(config: ServerConfig, catalog: Arc<dyn DataCatalog>) -> Self {
        let clock = TickClock::new(config.validation.tick_duration_ms);
        Self {
            config,
            catalog,
            characters: FxHashMap::default(),
            zones: ZoneIndex::new(),
            npcs: NpcManager::new(),
            resources: ResourceManager::new(),
            exchange: ExchangeEngine::new(),
            validation: ValidationRegistry::new(),
            clock,
            current_tick: 0,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn spawn_character(&mut self, character: Character) {
        self.zones.upsert(character.zone, EntityRef::Character(character.id), character.position);
        self.characters.insert(character.id, character);
    }

    pub fn despawn_character(&mut self, id: CharacterId) -> Option<Character> {
        self.zones.remove(EntityRef::Character(id));
        self.validation.remove(id);
        self.characters.remove(&id)
    }

    fn now_ms(&self) -> u64 {
        self.clock.tick_start_ms(self.current_tick)
    }

    pub fn handle_move(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::MovePacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let now = self.now_ms();
        let to = thornmere_math::Vec3::new(packet.x, packet.y, packet.z);
        let samples = self.config.validation.position_history_samples;

        if packet.kind == thornmere_protocol::MovementKind::Teleport {
            let zone = self
                .characters
                .get(&character)
                .map(|c| c.zone)
                .ok_or(GameError::from(ActionError::InvalidAction))?;
            // Stand-in navmesh oracle: the zone's registered bounds are the
            // only notion of "walkable" this server has, so a teleport
            // destination outside them is rejected the same way a real
            // navmesh query would reject an unwalkable point.
            if let Some(zone_def) = self.catalog.zone(zone) {
                let out_of_bounds = if to.x < zone_def.min.x
                    || to.x > zone_def.max.x
                    || to.z < zone_def.min.z
                    || to.z > zone_def.max.z
                {
                    Some(MovementError::WallClip)
                } else if to.y < zone_def.min.y || to.y > zone_def.max.y {
                    Some(MovementError::FlyHack)
                } else {
                    None
                };
                if let Some(err) = out_of_bounds {
                    return self.reject_move(character, err, now, to);
                }
            }
            let validation = self.validation.entry(character, samples);
            validation.movement.reset_to(to, now);
            return self.accept_move(character, to, packet.rotation);
        }

        let validation = self.validation.entry(character, samples);
        match validation.movement.validate_move(to, now, packet.kind, &self.config.validation) {
            Ok(()) => self.accept_move(character, to, packet.rotation),
            Err(err) => self.reject_move(character, err, now, to),
        }
    }

    fn accept_move(
        &mut self,
        character: CharacterId,
        to: thornmere_math::Vec3,
        rotation: f32,
    ) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get_mut(&character).ok_or(GameError::from(ActionError::InvalidAction))?;
        char.position = to;
        let zone = char.zone;
        self.zones.upsert(zone, EntityRef::Character(character), to);
        Ok(vec![ServerMessage::PlayerMoved {
            character_id: character.0,
            x: to.x,
            y: to.y,
            z: to.z,
            rotation,
        }])
    }

    /// Flags the violation, then either sends a rubber-band correction back
    /// to the last known-good position or, once the per-minute correction
    /// budget is spent, propagates the error (spec §4.2.1).
    fn reject_move(
        &mut self,
        character: CharacterId,
        err: MovementError,
        now: u64,
        attempted: thornmere_math::Vec3,
    ) -> GameResult<Vec<ServerMessage>> {
        let samples = self.config.validation.position_history_samples;
        let validation = self.validation.entry(character, samples);
        let flagged = crate::validation::anticheat::movement_severity(err);
        validation
            .flags
            .raise(flagged, now, crate::config::ValidationConfig::RUBBER_BAND_WINDOW_MS * 1440);
        if !validation.movement.record_correction(now, self.config.validation.max_corrections_per_minute) {
            return Err(GameError::from(err));
        }
        let last_good = self.characters.get(&character).map(|c| c.position).unwrap_or(attempted);
        Ok(vec![ServerMessage::PositionCorrection {
            x: last_good.x,
            y: last_good.y,
            z: last_good.z,
            rotation: 0.0,
        }])
    }

    pub fn handle_attack(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::AttackPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let now = self.now_ms();
        let samples = self.config.validation.position_history_samples;
        let validation = self.validation.entry(character, samples);
        validation.actions.check_and_record_action(self.current_tick, now, &self.config.validation)?;

        if let Some(ability) = &packet.ability_id {
            validation.actions.check_ability_cooldown(ability, now)?;
            if self.config.validation.movement_abilities.iter().any(|a| a == ability) {
                validation.movement.note_ability_use(now);
            }
        }

        let Some(npc_id_raw) = packet.target_npc_id else {
            return Ok(Vec::new());
        };
        let npc_id = NpcId(npc_id_raw);
        let Some(npc) = self.npcs.get(npc_id) else {
            return Err(GameError::from(ActionError::InvalidAction));
        };
        let template = self
            .catalog
            .npc_template(npc.template)
            .ok_or(crate::error::InfrastructureError::CatalogMissing)?
            .clone();
        let last_position = npc.position;

        let damage = 5i64;
        let loot = self.npcs.apply_damage(npc_id, damage, now, &template, &mut self.rng);

        let mut out = vec![ServerMessage::NpcState {
            npc_id: npc_id_raw,
            state: if loot.is_some() { "dead".to_owned() } else { "alive".to_owned() },
            x: last_position.x,
            y: last_position.y,
            z: last_position.z,
        }];

        if let Some(drops) = loot {
            if let Some(char) = self.characters.get_mut(&character) {
                for stack in drops {
                    let (stackable, max_stack) = self
                        .catalog
                        .item(stack.item)
                        .map(|d| (d.stackable, d.max_stack))
                        .unwrap_or((true, 1));
                    let _ = char.inventory.add(stack.item, stack.quantity, stackable, max_stack);
                }
                out.push(ServerMessage::InventoryUpdate {
                    character_id: character.0,
                });
            }
        }
        Ok(out)
    }

    pub fn handle_skill_action(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::SkillActionPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let now = self.now_ms();
        let samples = self.config.validation.position_history_samples;
        self.validation
            .entry(character, samples)
            .actions
            .check_and_record_action(self.current_tick, now, &self.config.validation)?;

        let resource_id = ResourceId(packet.target_resource_id);
        let Some(node) = self.resources.get(resource_id) else {
            return Err(GameError::from(ActionError::InvalidAction));
        };
        let template = self
            .catalog
            .resource_template(node.template)
            .ok_or(crate::error::InfrastructureError::CatalogMissing)?
            .clone();
        let node_position = node.position;

        let char = self.characters.get(&character).ok_or(GameError::from(ActionError::InvalidAction))?;
        let claimed = thornmere_math::Vec3::new(packet.claimed_x, packet.claimed_y, packet.claimed_z);
        if thornmere_math::distance(claimed, char.position) > self.config.validation.position_claim_tolerance_units {
            return Err(GameError::from(ActionError::InvalidAction));
        }
        if thornmere_math::distance(char.position, node_position) > self.config.validation.interaction_range_units {
            return Err(GameError::from(ActionError::InvalidAction));
        }
        let skill_id = template.required_skill.clone();
        let harvester_level = char.skill(&skill_id).level;

        let outcome = self.resources.gather(resource_id, now, &template, harvester_level, &mut self.rng);
        let result = match outcome {
            crate::resource::GatherOutcome::Unavailable => return Err(GameError::from(ActionError::InvalidAction)),
            crate::resource::GatherOutcome::LevelTooLow => {
                return Err(GameError::from(ActionError::InsufficientResources))
            }
            crate::resource::GatherOutcome::NoYield => return Ok(Vec::new()),
            crate::resource::GatherOutcome::Yielded(result) => result,
        };

        let (stackable, max_stack) = self
            .catalog
            .item(result.item)
            .map(|d| (d.stackable, d.max_stack))
            .unwrap_or((true, 1));
        let max_level = self.catalog.skill(&skill_id).map(|s| s.max_level).unwrap_or(99);

        let char = self.characters.get_mut(&character).ok_or(GameError::from(ActionError::InvalidAction))?;
        char.inventory.add(result.item, 1, stackable, max_stack).map_err(GameError::from)?;
        let xp_gained = result.xp.round() as u64;
        let gained = skill::grant_xp(char, &skill_id, xp_gained, max_level);
        char.combat_level = skill::combat_level(&char.skills);
        char.total_level = skill::total_level(&char.skills);
        let new_level = char.skill(&skill_id).level;

        let mut out = vec![
            ServerMessage::XpDrop {
                character_id: character.0,
                skill: skill_id.clone(),
                xp_gained: xp_gained as u32,
            },
            ServerMessage::InventoryUpdate {
                character_id: character.0,
            },
        ];
        if gained > 0 {
            out.push(ServerMessage::LevelUp {
                character_id: character.0,
                skill: skill_id,
                new_level,
            });
        }
        Ok(out)
    }

    pub fn handle_item_pickup(&mut self, _character: CharacterId, _ground_item_id: Uuid) -> GameResult<Vec<ServerMessage>> {
        Ok(Vec::new())
    }

    pub fn handle_item_drop(&mut self, character: CharacterId, slot: u16, quantity: u32) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        char.inventory.remove_from_slot(slot as usize, quantity).map_err(GameError::from)?;
        Ok(vec![ServerMessage::InventoryUpdate { character_id: character.0 }])
    }

    pub fn handle_item_use(&mut self, _character: CharacterId, _slot: u16) -> GameResult<Vec<ServerMessage>> {
        Ok(Vec::new())
    }

    pub fn handle_equip_item(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::EquipItemPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        let stack = char
            .inventory
            .remove_from_slot(packet.inventory_slot as usize, 1)
            .map_err(GameError::from)?;
        let slot = map_equipment_slot(packet.equipment_slot);
        if let Some(previous) = char.equipment.equip(slot, stack.item) {
            let (stackable, max_stack) = self
                .catalog
                .item(previous)
                .map(|d| (d.stackable, d.max_stack))
                .unwrap_or((true, 1));
            let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
            char.inventory.add(previous, 1, stackable, max_stack).map_err(GameError::from)?;
        }
        Ok(vec![ServerMessage::InventoryUpdate { character_id: character.0 }])
    }

    pub fn handle_switch_prayer(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::SwitchPrayerPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let _ = packet;
        let samples = self.config.validation.position_history_samples;
        self.validation
            .entry(character, samples)
            .actions
            .check_and_record_prayer_switch(self.current_tick, &self.config.validation)?;
        Ok(Vec::new())
    }

    pub fn handle_chat_message(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::ChatMessagePacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get(&character).ok_or(GameError::from(ActionError::InvalidAction))?;
        let domain_channel = map_chat_channel(packet.channel);
        let recipient = packet
            .whisper_target_name
            .as_ref()
            .and_then(|name| self.characters.values().find(|c| &c.name == name))
            .map(|c| c.id);
        let message = DomainChatMessage {
            sender: character,
            channel: domain_channel,
            body: packet.body.clone(),
            recipient,
        };
        let recipients = ChatRouter::route(&message, char.position, char.zone, &self.zones)
            .map_err(|_| GameError::from(ActionError::InvalidAction))?;

        Ok(recipients
            .into_iter()
            .map(|_| ServerMessage::ChatBroadcast {
                channel: packet.channel,
                sender: Some(char.name.clone()),
                body: packet.body.clone(),
            })
            .collect())
    }

    pub fn handle_ge_create_offer(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::GeCreateOfferPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let now = self.now_ms();
        let item = ItemId(packet.item_id);
        let kind = map_offer_kind(packet.kind);
        let item_def = self.catalog.item(item);
        let item_buy_limit = item_def.map(|d| d.buy_limit).unwrap_or(u32::MAX);
        let (stackable, max_stack) = item_def.map(|d| (d.stackable, d.max_stack)).unwrap_or((true, 1));

        {
            let char = self.characters.get_mut(&character).ok_or(GameError::from(ActionError::InvalidAction))?;
            match kind {
                DomainOfferKind::Sell => {
                    char.inventory.remove(item, packet.quantity).map_err(GameError::from)?;
                }
                DomainOfferKind::Buy => {
                    let cost = packet.price_per_unit.saturating_mul(packet.quantity as u64);
                    if char.gold < cost {
                        return Err(GameError::from(ExchangeError::InsufficientGold));
                    }
                    char.gold -= cost;
                }
            }
        }

        let offer_id = self
            .exchange
            .create_offer(
                character,
                kind,
                item,
                packet.price_per_unit,
                packet.quantity,
                now,
                &self.config.exchange,
                item_buy_limit,
            )
            .map_err(GameError::from)?;
        let settled = self.exchange.match_offer(offer_id, now).map_err(GameError::from)?;

        let mut out = Vec::new();
        for txn in &settled {
            if let Some(seller) = self.characters.get_mut(&txn.seller) {
                seller.gold += txn.price_per_item.saturating_mul(txn.quantity as u64);
            }
            if let Some(buyer) = self.characters.get_mut(&txn.buyer) {
                let _ = buyer.inventory.add(txn.item, txn.quantity, stackable, max_stack);
            }
            out.push(ServerMessage::InventoryUpdate { character_id: txn.seller.0 });
            out.push(ServerMessage::InventoryUpdate { character_id: txn.buyer.0 });
        }
        Ok(out)
    }

    pub fn handle_ge_cancel_offer(&mut self, character: CharacterId, offer_id: Uuid) -> GameResult<Vec<ServerMessage>> {
        let offer = self
            .exchange
            .cancel_offer(crate::ids::OfferId(offer_id), character)
            .map_err(GameError::from)?;
        if offer.kind == DomainOfferKind::Sell {
            let (stackable, max_stack) = self
                .catalog
                .item(offer.item)
                .map(|d| (d.stackable, d.max_stack))
                .unwrap_or((true, 1));
            if let Some(char) = self.characters.get_mut(&character) {
                let _ = char.inventory.add(offer.item, offer.escrow_remaining as u32, stackable, max_stack);
            }
        } else if let Some(char) = self.characters.get_mut(&character) {
            char.gold += offer.escrow_remaining;
        }
        Ok(vec![ServerMessage::InventoryUpdate { character_id: character.0 }])
    }

    pub fn handle_inventory_move(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::InventoryMovePacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        char.inventory
            .move_slot(packet.from_slot as usize, packet.to_slot as usize)
            .map_err(GameError::from)?;
        Ok(vec![ServerMessage::InventoryUpdate { character_id: character.0 }])
    }

    pub fn handle_bank_deposit(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::BankDepositPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        let existing = char
            .inventory
            .slot(packet.inventory_slot as usize)
            .ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        if existing.quantity < packet.quantity {
            return Err(GameError::from(InventoryError::InsufficientQuantity));
        }
        let item = existing.item;
        char.bank.deposit(packet.tab as usize, item, packet.quantity).map_err(GameError::from)?;
        char.inventory
            .remove_from_slot(packet.inventory_slot as usize, packet.quantity)
            .map_err(GameError::from)?;
        Ok(vec![ServerMessage::BankUpdate { character_id: character.0 }])
    }

    pub fn handle_bank_withdraw(
        &mut self,
        character: CharacterId,
        packet: thornmere_protocol::BankWithdrawPacket,
    ) -> GameResult<Vec<ServerMessage>> {
        let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        let stack = char
            .bank
            .withdraw(packet.tab as usize, packet.bank_slot as usize, packet.quantity)
            .map_err(GameError::from)?;
        let (stackable, max_stack) = self
            .catalog
            .item(stack.item)
            .map(|d| (d.stackable, d.max_stack))
            .unwrap_or((true, 1));
        let char = self.characters.get_mut(&character).ok_or(GameError::from(InventoryError::SlotOutOfRange))?;
        char.inventory.add(stack.item, stack.quantity, stackable, max_stack).map_err(GameError::from)?;
        Ok(vec![ServerMessage::InventoryUpdate { character_id: character.0 }])
    }

    /// Refunds the leftover escrow spread on a completed buy offer (the gap
    /// between the offer's own posted price and the cheaper price it
    /// actually settled at). Items and gold from the trade itself are
    /// delivered immediately at match time in `handle_ge_create_offer`, so
    /// this is the only balance left to reconcile.
    pub fn handle_ge_collect(&mut self, character: CharacterId, offer_id: Uuid) -> GameResult<Vec<ServerMessage>> {
        let remainder = self
            .exchange
            .take_escrow_remainder(crate::ids::OfferId(offer_id), character)
            .map_err(GameError::from)?;
        if remainder > 0 {
            if let Some(char) = self.characters.get_mut(&character) {
                char.gold += remainder;
            }
        }
        Ok(vec![ServerMessage::InventoryUpdate { character_id: character.0 }])
    }
}

fn map_equipment_slot(slot: thornmere_protocol::EquipmentSlot) -> DomainEquipmentSlot {
    use thornmere_protocol::EquipmentSlot as P;
    match slot {
        P::Head => DomainEquipmentSlot::Head,
        P::Cape => DomainEquipmentSlot::Cape,
        P::Neck => DomainEquipmentSlot::Amulet,
        P::MainHand => DomainEquipmentSlot::Weapon,
        P::OffHand => DomainEquipmentSlot::Shield,
        P::Body => DomainEquipmentSlot::Body,
        P::Legs => DomainEquipmentSlot::Legs,
        P::Hands => DomainEquipmentSlot::Gloves,
        P::Feet => DomainEquipmentSlot::Boots,
        P::Ring => DomainEquipmentSlot::Ring,
        P::Ammo => DomainEquipmentSlot::Weapon,
    }
}

fn map_chat_channel(channel: thornmere_protocol::ChatChannel) -> DomainChatChannel {
    use thornmere_protocol::ChatChannel as P;
    match channel {
        P::Whisper => DomainChatChannel::Private,
        P::Guild | P::Party => DomainChatChannel::Guild,
        P::Local | P::Zone | P::Global | P::Trade | P::System => DomainChatChannel::Zone,
    }
}

fn map_offer_kind(kind: thornmere_protocol::OfferKind) -> DomainOfferKind {
    match kind {
        thornmere_protocol::OfferKind::Buy => DomainOfferKind::Buy,
        thornmere_protocol::OfferKind::Sell => DomainOfferKind::Sell,
    }
}
