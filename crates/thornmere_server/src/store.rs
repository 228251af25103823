//! The durable-storage collaborator (spec §6), grounded on the same
//! `AsyncCallbacks` pattern as [`auth`](crate::auth): the game loop never
//! talks to a database directly, it calls through this trait so storage
//! backends are swappable and testable against an in-memory double.

use async_trait::async_trait;

use crate::character::Character;
use crate::error::InfrastructureError;
use crate::ids::CharacterId;

#[async_trait]
pub trait Store: Send + Sync {
    async fn load_character(&self, id: CharacterId) -> Result<Option<Character>, InfrastructureError>;
    async fn save_character(&self, character: &Character) -> Result<(), InfrastructureError>;
    async fn delete_character(&self, id: CharacterId) -> Result<(), InfrastructureError>;
}
