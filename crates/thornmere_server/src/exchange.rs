//! The buy/sell exchange (spec §4.9): escrowed offers matched by price-time
//! priority, with per-item buy limits over a rolling window. Grounded on
//! `valence_inventory`'s slot-array discipline for per-player state (here,
//! per-character active offer slots) and on the teacher's general "cap a
//! per-entity resource, reject past the cap" pattern.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::config::ExchangeConfig;
use crate::error::ExchangeError;
use crate::ids::{CharacterId, ItemId, OfferId, TransactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferState {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Offer {
    pub id: OfferId,
    pub owner: CharacterId,
    pub kind: OfferKind,
    pub item: ItemId,
    pub price_per_item: u64,
    pub quantity: u32,
    pub quantity_filled: u32,
    pub state: OfferState,
    pub created_at_ms: u64,
    /// Gold (for buy offers) or items (for sell offers) held by the
    /// exchange until the offer completes or is cancelled.
    pub escrow_remaining: u64,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub item: ItemId,
    pub quantity: u32,
    pub price_per_item: u64,
    pub buyer: CharacterId,
    pub seller: CharacterId,
    pub settled_at_ms: u64,
}

#[derive(Default)]
pub struct ExchangeEngine {
    offers: FxHashMap<OfferId, Offer>,
    /// Active offer ids per character, capped at `max_active_offers`.
    active_by_character: FxHashMap<CharacterId, Vec<OfferId>>,
    /// Purchase timestamps per (character, item) for the buy-limit window.
    purchases: FxHashMap<(CharacterId, ItemId), VecDeque<(u64, u32)>>,
}

impl ExchangeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn active_offer_count(&self, character: CharacterId) -> usize {
        self.active_by_character.get(&character).map(Vec::len).unwrap_or(0)
    }

    fn purchased_in_window(&mut self, character: CharacterId, item: ItemId, now_ms: u64, window_ms: u64) -> u32 {
        let key = (character, item);
        if let Some(log) = self.purchases.get_mut(&key) {
            log.retain(|(t, _)| now_ms.saturating_sub(*t) < window_ms);
            log.iter().map(|(_, q)| q).sum()
        } else {
            0
        }
    }

    /// Creates a new offer after validating quantity/price bounds, the
    /// per-character active-offer cap, and — for buy offers — the catalog's
    /// per-item buy limit over the rolling window (spec §4.9: enforced at
    /// creation, not mid-match), holding escrow up front. The caller is
    /// responsible for having already debited the escrowed gold or items
    /// from the character before calling this.
    pub fn create_offer(
        &mut self,
        owner: CharacterId,
        kind: OfferKind,
        item: ItemId,
        price_per_item: u64,
        quantity: u32,
        now_ms: u64,
        config: &ExchangeConfig,
        item_buy_limit: u32,
    ) -> Result<OfferId, ExchangeError> {
        if quantity == 0 || quantity > config.max_quantity_per_offer {
            return Err(ExchangeError::InvalidQuantity);
        }
        if price_per_item < config.min_price_per_item || price_per_item > config.max_price_per_item {
            return Err(ExchangeError::InvalidPrice);
        }
        if self.active_offer_count(owner) >= config.max_active_offers {
            return Err(ExchangeError::NoAvailableSlot);
        }
        if kind == OfferKind::Buy {
            let purchased = self.purchased_in_window(owner, item, now_ms, config.buy_limit_window_ms);
            if purchased.saturating_add(quantity) > item_buy_limit {
                return Err(ExchangeError::BuyLimitExceeded);
            }
        }

        let id = OfferId::new();
        let escrow = match kind {
            OfferKind::Buy => price_per_item.saturating_mul(quantity as u64),
            OfferKind::Sell => quantity as u64,
        };
        self.offers.insert(
            id,
            Offer {
                id,
                owner,
                kind,
                item,
                price_per_item,
                quantity,
                quantity_filled: 0,
                state: OfferState::Active,
                created_at_ms: now_ms,
                escrow_remaining: escrow,
            },
        );
        self.active_by_character.entry(owner).or_default().push(id);
        Ok(id)
    }

    pub fn offer(&self, id: OfferId) -> Option<&Offer> {
        self.offers.get(&id)
    }

    /// Zeroes and returns a completed offer's leftover escrow (the spread
    /// between a buy offer's posted price and the cheaper price it actually
    /// settled at). Sell offers never have leftover escrow: their escrow
    /// unit is the item itself, debited exactly at the traded quantity.
    pub fn take_escrow_remainder(&mut self, id: OfferId, requester: CharacterId) -> Result<u64, ExchangeError> {
        let offer = self.offers.get_mut(&id).ok_or(ExchangeError::OfferNotFound)?;
        if offer.owner != requester {
            return Err(ExchangeError::NotOwner);
        }
        if offer.state != OfferState::Completed {
            return Err(ExchangeError::InvalidOfferState);
        }
        Ok(std::mem::take(&mut offer.escrow_remaining))
    }

    pub fn cancel_offer(&mut self, id: OfferId, requester: CharacterId) -> Result<Offer, ExchangeError> {
        let offer = self.offers.get_mut(&id).ok_or(ExchangeError::OfferNotFound)?;
        if offer.owner != requester {
            return Err(ExchangeError::NotOwner);
        }
        if offer.state != OfferState::Active {
            return Err(ExchangeError::InvalidOfferState);
        }
        offer.state = OfferState::Cancelled;
        let result = offer.clone();
        self.deactivate(id, requester);
        Ok(result)
    }

    fn deactivate(&mut self, id: OfferId, owner: CharacterId) {
        if let Some(list) = self.active_by_character.get_mut(&owner) {
            list.retain(|o| *o != id);
        }
    }

    /// Finds the best-priced opposing active offer for `item` (lowest sell
    /// price for a buy order, highest buy price for a sell order), ties
    /// broken by earliest `created_at_ms` (price-time priority).
    fn best_match(&self, kind: OfferKind, item: ItemId, limit_price: u64) -> Option<OfferId> {
        let opposing = match kind {
            OfferKind::Buy => OfferKind::Sell,
            OfferKind::Sell => OfferKind::Buy,
        };
        self.offers
            .values()
            .filter(|o| o.state == OfferState::Active && o.kind == opposing && o.item == item)
            .filter(|o| match kind {
                OfferKind::Buy => o.price_per_item <= limit_price,
                OfferKind::Sell => o.price_per_item >= limit_price,
            })
            .min_by(|a, b| match kind {
                OfferKind::Buy => a
                    .price_per_item
                    .cmp(&b.price_per_item)
                    .then(a.created_at_ms.cmp(&b.created_at_ms)),
                OfferKind::Sell => b
                    .price_per_item
                    .cmp(&a.price_per_item)
                    .then(a.created_at_ms.cmp(&b.created_at_ms)),
            })
            .map(|o| o.id)
    }

    /// Repeatedly matches `offer_id` against the best opposing offer until
    /// either it is fully filled or no eligible match remains. The buy-limit
    /// window is enforced once, at offer creation; matching only records the
    /// purchase into that same window. Returns the settled transactions.
    pub fn match_offer(&mut self, offer_id: OfferId, now_ms: u64) -> Result<Vec<Transaction>, ExchangeError> {
        let mut settled = Vec::new();
        loop {
            let (kind, item, price, owner, remaining) = {
                let offer = self.offers.get(&offer_id).ok_or(ExchangeError::OfferNotFound)?;
                if offer.state != OfferState::Active {
                    break;
                }
                let remaining = offer.quantity - offer.quantity_filled;
                if remaining == 0 {
                    break;
                }
                (offer.kind, offer.item, offer.price_per_item, offer.owner, remaining)
            };

            let Some(match_id) = self.best_match(kind, item, price) else { break };
            let match_remaining = {
                let m = self.offers.get(&match_id).unwrap();
                m.quantity - m.quantity_filled
            };
            let trade_qty = remaining.min(match_remaining);
            let trade_price = self.offers.get(&match_id).unwrap().price_per_item;

            let (buyer, seller) = match kind {
                OfferKind::Buy => (owner, self.offers.get(&match_id).unwrap().owner),
                OfferKind::Sell => (self.offers.get(&match_id).unwrap().owner, owner),
            };

            for (id, qty) in [(offer_id, trade_qty), (match_id, trade_qty)] {
                let o = self.offers.get_mut(&id).unwrap();
                o.quantity_filled += qty;
                let escrow_delta = match o.kind {
                    OfferKind::Buy => trade_price.saturating_mul(qty as u64),
                    OfferKind::Sell => qty as u64,
                };
                o.escrow_remaining = o.escrow_remaining.saturating_sub(escrow_delta);
                if o.quantity_filled >= o.quantity {
                    o.state = OfferState::Completed;
                    let owner = o.owner;
                    self.deactivate(id, owner);
                }
            }

            self.purchases
                .entry((buyer, item))
                .or_default()
                .push_back((now_ms, trade_qty));

            settled.push(Transaction {
                id: TransactionId::new(),
                item,
                quantity: trade_qty,
                price_per_item: trade_price,
                buyer,
                seller,
                settled_at_ms: now_ms,
            });
        }
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExchangeConfig {
        ExchangeConfig::default()
    }

    #[test]
    fn matching_buy_and_sell_settle_at_the_resting_offers_price() {
        let mut ex = ExchangeEngine::new();
        let seller = CharacterId::new();
        let buyer = CharacterId::new();
        ex.create_offer(seller, OfferKind::Sell, ItemId(1), 100, 10, 0, &config(), 1000).unwrap();
        let buy_id = ex.create_offer(buyer, OfferKind::Buy, ItemId(1), 150, 5, 1, &config(), 1000).unwrap();
        let txns = ex.match_offer(buy_id, 1).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].price_per_item, 100);
        assert_eq!(txns[0].quantity, 5);
    }

    #[test]
    fn partial_fill_leaves_offer_active() {
        let mut ex = ExchangeEngine::new();
        let seller = CharacterId::new();
        let buyer = CharacterId::new();
        ex.create_offer(seller, OfferKind::Sell, ItemId(1), 100, 3, 0, &config(), 1000).unwrap();
        let buy_id = ex.create_offer(buyer, OfferKind::Buy, ItemId(1), 100, 10, 1, &config(), 1000).unwrap();
        ex.match_offer(buy_id, 1).unwrap();
        assert_eq!(ex.offer(buy_id).unwrap().state, OfferState::Active);
        assert_eq!(ex.offer(buy_id).unwrap().quantity_filled, 3);
    }

    #[test]
    fn offer_cap_is_enforced_per_character() {
        let mut ex = ExchangeEngine::new();
        let owner = CharacterId::new();
        let cfg = ExchangeConfig {
            max_active_offers: 1,
            ..config()
        };
        ex.create_offer(owner, OfferKind::Sell, ItemId(1), 10, 1, 0, &cfg, 1000).unwrap();
        let err = ex.create_offer(owner, OfferKind::Sell, ItemId(2), 10, 1, 0, &cfg, 1000);
        assert_eq!(err, Err(ExchangeError::NoAvailableSlot));
    }

    #[test]
    fn cancel_requires_ownership() {
        let mut ex = ExchangeEngine::new();
        let owner = CharacterId::new();
        let other = CharacterId::new();
        let id = ex.create_offer(owner, OfferKind::Sell, ItemId(1), 10, 1, 0, &config(), 1000).unwrap();
        assert_eq!(ex.cancel_offer(id, other), Err(ExchangeError::NotOwner));
        assert!(ex.cancel_offer(id, owner).is_ok());
    }

    #[test]
    fn buy_limit_is_enforced_at_offer_creation() {
        let mut ex = ExchangeEngine::new();
        let buyer = CharacterId::new();
        ex.create_offer(buyer, OfferKind::Buy, ItemId(1), 10, 80, 0, &config(), 100).unwrap();
        let err = ex.create_offer(buyer, OfferKind::Buy, ItemId(1), 10, 30, 0, &config(), 100);
        assert_eq!(err, Err(ExchangeError::BuyLimitExceeded));
    }

    #[test]
    fn price_time_priority_prefers_cheaper_sell_offer() {
        let mut ex = ExchangeEngine::new();
        let cheap_seller = CharacterId::new();
        let pricey_seller = CharacterId::new();
        let buyer = CharacterId::new();
        ex.create_offer(pricey_seller, OfferKind::Sell, ItemId(1), 200, 5, 0, &config(), 1000).unwrap();
        ex.create_offer(cheap_seller, OfferKind::Sell, ItemId(1), 100, 5, 1, &config(), 1000).unwrap();
        let buy_id = ex.create_offer(buyer, OfferKind::Buy, ItemId(1), 200, 5, 2, &config(), 1000).unwrap();
        let txns = ex.match_offer(buy_id, 2).unwrap();
        assert_eq!(txns[0].seller, cheap_seller);
    }
}
