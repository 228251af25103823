//! The error taxonomy from the design's error-handling section, grouped by
//! category. `thiserror`-derived the way `valence_protocol`'s decode errors
//! are, with a `GameError` umbrella for code that spans categories (e.g. the
//! [`Router`](crate::router::Router)).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MovementError {
    #[error("movement speed exceeds the permitted maximum")]
    SpeedHack,
    #[error("movement distance exceeds the teleport threshold")]
    TeleportHack,
    #[error("path is not walkable per the navmesh oracle")]
    WallClip,
    #[error("position is implausibly above ground level")]
    FlyHack,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("tick action budget exceeded")]
    TickBudgetExceeded,
    #[error("ability on cooldown, {remaining_ms}ms remaining")]
    AbilityOnCooldown { remaining_ms: u64 },
    #[error("global cooldown has not elapsed")]
    GlobalCooldown,
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("invalid action")]
    InvalidAction,
    #[error("insufficient resources")]
    InsufficientResources,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("insufficient gold")]
    InsufficientGold,
    #[error("insufficient items")]
    InsufficientItems,
    #[error("no available offer slot")]
    NoAvailableSlot,
    #[error("invalid item")]
    InvalidItem,
    #[error("invalid quantity")]
    InvalidQuantity,
    #[error("invalid price")]
    InvalidPrice,
    #[error("item is not tradeable")]
    ItemNotTradeable,
    #[error("buy limit exceeded for this item in the current window")]
    BuyLimitExceeded,
    #[error("exchange operations for this item are rate limited")]
    RateLimited,
    #[error("offer not found")]
    OfferNotFound,
    #[error("only the offer owner may perform this action")]
    NotOwner,
    #[error("offer is not in a state that allows this action")]
    InvalidOfferState,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no free slot available")]
    NoFreeSlot,
    #[error("slot index out of range")]
    SlotOutOfRange,
    #[error("requested quantity exceeds what is available")]
    InsufficientQuantity,
    #[error("destination cannot accept the full requested quantity")]
    DestinationFull,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfrastructureError {
    #[error("durable store is unreachable")]
    StoreUnreachable,
    #[error("data catalog is missing required entries")]
    CatalogMissing,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Protocol(#[from] thornmere_protocol::ProtocolError),
    #[error(transparent)]
    Movement(#[from] MovementError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

pub type GameResult<T> = Result<T, GameError>;
