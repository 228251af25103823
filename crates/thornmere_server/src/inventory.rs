//! Inventory, bank, and equipment, per the data model's item-storage rules:
//! stackable items occupy a single slot, non-stackable items occupy one slot
//! per unit. Grounded on `valence_inventory`'s `Inventory` slot-array
//! approach, generalized from a 46-slot player inventory to the handful of
//! named containers this design calls for.

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::ids::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemId,
    pub quantity: u32,
}

impl ItemStack {
    pub fn new(item: ItemId, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&ItemStack> {
        self.slots.get(index)?.as_ref()
    }

    pub fn free_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    pub fn total_quantity(&self, item: ItemId) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item == item)
            .map(|s| s.quantity)
            .sum()
    }

    /// Adds `quantity` units of `item`. Non-stackable items occupy one slot
    /// per unit. Stackable items coalesce onto existing stacks up to
    /// `max_stack`, spilling into further free slots (each capped at
    /// `max_stack`) once existing stacks are full.
    pub fn add(&mut self, item: ItemId, quantity: u32, stackable: bool, max_stack: u32) -> Result<(), InventoryError> {
        if !stackable {
            for _ in 0..quantity {
                let free = self
                    .slots
                    .iter_mut()
                    .find(|s| s.is_none())
                    .ok_or(InventoryError::NoFreeSlot)?;
                *free = Some(ItemStack::new(item, 1));
            }
            return Ok(());
        }

        let max_stack = max_stack.max(1);
        let mut remaining = quantity;

        for slot in self.slots.iter_mut().flatten() {
            if remaining == 0 {
                break;
            }
            if slot.item == item && slot.quantity < max_stack {
                let take = (max_stack - slot.quantity).min(remaining);
                slot.quantity += take;
                remaining -= take;
            }
        }

        while remaining > 0 {
            let free = self
                .slots
                .iter_mut()
                .find(|s| s.is_none())
                .ok_or(InventoryError::NoFreeSlot)?;
            let take = remaining.min(max_stack);
            *free = Some(ItemStack::new(item, take));
            remaining -= take;
        }

        Ok(())
    }

    /// Swaps the contents of two slots (or moves into an empty one),
    /// backing the client-driven inventory rearrange operation.
    pub fn move_slot(&mut self, from: usize, to: usize) -> Result<(), InventoryError> {
        if from >= self.slots.len() || to >= self.slots.len() {
            return Err(InventoryError::SlotOutOfRange);
        }
        self.slots.swap(from, to);
        Ok(())
    }

    pub fn remove(&mut self, item: ItemId, quantity: u32) -> Result<(), InventoryError> {
        if self.total_quantity(item) < quantity {
            return Err(InventoryError::InsufficientQuantity);
        }
        let mut remaining = quantity;
        for slot in self.slots.iter_mut() {
            let Some(stack) = slot else { continue };
            if stack.item != item {
                continue;
            }
            let take = remaining.min(stack.quantity);
            stack.quantity -= take;
            remaining -= take;
            if stack.quantity == 0 {
                *slot = None;
            }
            if remaining == 0 {
                break;
            }
        }
        Ok(())
    }

    pub fn remove_from_slot(&mut self, index: usize, quantity: u32) -> Result<ItemStack, InventoryError> {
        let slot = self.slots.get_mut(index).ok_or(InventoryError::SlotOutOfRange)?;
        let stack = slot.as_mut().ok_or(InventoryError::InsufficientQuantity)?;
        if stack.quantity < quantity {
            return Err(InventoryError::InsufficientQuantity);
        }
        stack.quantity -= quantity;
        let item = stack.item;
        if stack.quantity == 0 {
            *slot = None;
        }
        Ok(ItemStack::new(item, quantity))
    }
}

/// Number of bank tabs, per spec §3/§4.8.
pub const BANK_TABS: usize = 10;
/// Slots per bank tab, per spec §3/§4.8.
pub const BANK_SLOTS_PER_TAB: usize = 50;

/// A `(character, tab ∈ [0, BANK_TABS), slot ∈ [0, BANK_SLOTS_PER_TAB))`
/// store, separate from [`Inventory`] and with no stack-count limit of its
/// own (every item is effectively stackable once banked).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    tabs: Vec<Vec<Option<ItemStack>>>,
}

impl Bank {
    pub fn new() -> Self {
        Self {
            tabs: vec![vec![None; BANK_SLOTS_PER_TAB]; BANK_TABS],
        }
    }

    pub fn slot(&self, tab: usize, slot: usize) -> Option<&ItemStack> {
        self.tabs.get(tab)?.get(slot)?.as_ref()
    }

    /// Deposits into `tab`, preferring an existing stack of `item` in that
    /// tab before claiming its lowest-index empty slot (spec §4.8).
    pub fn deposit(&mut self, tab: usize, item: ItemId, quantity: u32) -> Result<(), InventoryError> {
        let slots = self.tabs.get_mut(tab).ok_or(InventoryError::SlotOutOfRange)?;
        if let Some(stack) = slots.iter_mut().flatten().find(|s| s.item == item) {
            stack.quantity = stack.quantity.saturating_add(quantity);
            return Ok(());
        }
        let free = slots.iter_mut().find(|s| s.is_none()).ok_or(InventoryError::NoFreeSlot)?;
        *free = Some(ItemStack::new(item, quantity));
        Ok(())
    }

    pub fn withdraw(&mut self, tab: usize, slot: usize, quantity: u32) -> Result<ItemStack, InventoryError> {
        let slots = self.tabs.get_mut(tab).ok_or(InventoryError::SlotOutOfRange)?;
        let cell = slots.get_mut(slot).ok_or(InventoryError::SlotOutOfRange)?;
        let stack = cell.as_mut().ok_or(InventoryError::InsufficientQuantity)?;
        if stack.quantity < quantity {
            return Err(InventoryError::InsufficientQuantity);
        }
        stack.quantity -= quantity;
        let item = stack.item;
        if stack.quantity == 0 {
            *cell = None;
        }
        Ok(ItemStack::new(item, quantity))
    }

    pub fn total_quantity(&self, item: ItemId) -> u32 {
        self.tabs
            .iter()
            .flatten()
            .flatten()
            .filter(|s| s.item == item)
            .map(|s| s.quantity)
            .sum()
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Body,
    Legs,
    Weapon,
    Shield,
    Gloves,
    Boots,
    Cape,
    Amulet,
    Ring,
}

pub const ALL_EQUIPMENT_SLOTS: [EquipmentSlot; 10] = [
    EquipmentSlot::Head,
    EquipmentSlot::Body,
    EquipmentSlot::Legs,
    EquipmentSlot::Weapon,
    EquipmentSlot::Shield,
    EquipmentSlot::Gloves,
    EquipmentSlot::Boots,
    EquipmentSlot::Cape,
    EquipmentSlot::Amulet,
    EquipmentSlot::Ring,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Equipment {
    slots: std::collections::HashMap<EquipmentSlot, ItemId>,
}

impl Equipment {
    pub fn get(&self, slot: EquipmentSlot) -> Option<ItemId> {
        self.slots.get(&slot).copied()
    }

    pub fn equip(&mut self, slot: EquipmentSlot, item: ItemId) -> Option<ItemId> {
        self.slots.insert(slot, item)
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<ItemId> {
        self.slots.remove(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_stacks_same_item_into_one_slot_when_stackable() {
        let mut inv = Inventory::new(4);
        inv.add(ItemId(1), 5, true, 1000).unwrap();
        inv.add(ItemId(1), 3, true, 1000).unwrap();
        assert_eq!(inv.total_quantity(ItemId(1)), 8);
        assert_eq!(inv.free_slot_count(), 3);
    }

    #[test]
    fn add_spills_into_a_new_slot_once_max_stack_is_reached() {
        let mut inv = Inventory::new(4);
        inv.add(ItemId(1), 90, true, 100).unwrap();
        inv.add(ItemId(1), 20, true, 100).unwrap();
        assert_eq!(inv.total_quantity(ItemId(1)), 110);
        assert_eq!(inv.free_slot_count(), 2);
        assert_eq!(inv.slot(0).unwrap().quantity, 100);
        assert_eq!(inv.slot(1).unwrap().quantity, 10);
    }

    #[test]
    fn non_stackable_items_occupy_one_slot_per_unit() {
        let mut inv = Inventory::new(4);
        inv.add(ItemId(1), 3, false, 1).unwrap();
        assert_eq!(inv.total_quantity(ItemId(1)), 3);
        assert_eq!(inv.free_slot_count(), 1);
    }

    #[test]
    fn add_fails_when_full_and_item_is_new() {
        let mut inv = Inventory::new(1);
        inv.add(ItemId(1), 1, true, 100).unwrap();
        let err = inv.add(ItemId(2), 1, true, 100).unwrap_err();
        assert_eq!(err, InventoryError::NoFreeSlot);
    }

    #[test]
    fn remove_clears_slot_when_quantity_reaches_zero() {
        let mut inv = Inventory::new(2);
        inv.add(ItemId(1), 5, true, 100).unwrap();
        inv.remove(ItemId(1), 5).unwrap();
        assert_eq!(inv.free_slot_count(), 2);
    }

    #[test]
    fn remove_more_than_held_is_rejected() {
        let mut inv = Inventory::new(2);
        inv.add(ItemId(1), 2, true, 100).unwrap();
        assert_eq!(inv.remove(ItemId(1), 3), Err(InventoryError::InsufficientQuantity));
    }

    #[test]
    fn move_slot_swaps_two_occupied_slots() {
        let mut inv = Inventory::new(2);
        inv.add(ItemId(1), 1, false, 1).unwrap();
        inv.add(ItemId(2), 1, false, 1).unwrap();
        inv.move_slot(0, 1).unwrap();
        assert_eq!(inv.slot(0).unwrap().item, ItemId(2));
        assert_eq!(inv.slot(1).unwrap().item, ItemId(1));
    }

    #[test]
    fn bank_deposit_prefers_existing_stack_in_the_target_tab() {
        let mut bank = Bank::new();
        bank.deposit(0, ItemId(9), 1).unwrap();
        bank.deposit(0, ItemId(9), 4).unwrap();
        assert_eq!(bank.total_quantity(ItemId(9)), 5);
    }

    #[test]
    fn bank_withdraw_removes_empty_stacks() {
        let mut bank = Bank::new();
        bank.deposit(0, ItemId(9), 1).unwrap();
        bank.withdraw(0, 0, 1).unwrap();
        assert_eq!(bank.total_quantity(ItemId(9)), 0);
        assert!(bank.slot(0, 0).is_none());
    }

    #[test]
    fn equip_returns_previously_equipped_item() {
        let mut eq = Equipment::default();
        assert_eq!(eq.equip(EquipmentSlot::Weapon, ItemId(1)), None);
        assert_eq!(eq.equip(EquipmentSlot::Weapon, ItemId(2)), Some(ItemId(1)));
    }
}
