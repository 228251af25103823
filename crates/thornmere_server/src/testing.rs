//! In-memory collaborator doubles, available under the `testing` feature so
//! both this crate's integration tests and downstream embedders can exercise
//! the server without standing up a real auth provider or database.
//! Grounded on `valence`'s own test-only `AsyncCallbacks` stub in
//! `crates/valence/src/tests.rs`.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::auth::{AuthError, Authenticated, AuthProvider};
use crate::character::Character;
use crate::error::InfrastructureError;
use crate::ids::{AccountId, CharacterId};
use crate::store::Store;

#[derive(Default)]
pub struct InMemoryAuth {
    users: Mutex<HashMap<String, (String, AccountId)>>,
    banned: Mutex<std::collections::HashSet<AccountId>>,
}

impl InMemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, username: &str, password: &str) -> AccountId {
        let id = AccountId::new();
        self.users.lock().insert(username.to_owned(), (password.to_owned(), id));
        id
    }

    pub fn ban(&self, account_id: AccountId) {
        self.banned.lock().insert(account_id);
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Authenticated, AuthError> {
        let users = self.users.lock();
        let (password, account_id) = users.get(username).ok_or(AuthError::InvalidCredentials)?;
        if password != credential {
            return Err(AuthError::InvalidCredentials);
        }
        if self.banned.lock().contains(account_id) {
            return Err(AuthError::Banned);
        }
        Ok(Authenticated {
            account_id: *account_id,
            username: username.to_owned(),
        })
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    characters: Mutex<HashMap<CharacterId, Character>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn load_character(&self, id: CharacterId) -> Result<Option<Character>, InfrastructureError> {
        Ok(self.characters.lock().get(&id).cloned())
    }

    async fn save_character(&self, character: &Character) -> Result<(), InfrastructureError> {
        self.characters.lock().insert(character.id, character.clone());
        Ok(())
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), InfrastructureError> {
        self.characters.lock().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thornmere_math::Vec3;

    #[tokio::test]
    async fn in_memory_auth_accepts_registered_credentials() {
        let auth = InMemoryAuth::new();
        auth.register("rowan", "hunter2");
        let result = auth.authenticate("rowan", "hunter2").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn in_memory_auth_rejects_banned_account() {
        let auth = InMemoryAuth::new();
        let id = auth.register("rowan", "hunter2");
        auth.ban(id);
        let err = auth.authenticate("rowan", "hunter2").await.unwrap_err();
        assert_eq!(err, AuthError::Banned);
    }

    #[tokio::test]
    async fn in_memory_store_round_trips_a_character() {
        let store = InMemoryStore::new();
        let character = Character::new(
            CharacterId::new(),
            AccountId::new(),
            "Rowan".to_owned(),
            Vec3::new(0.0, 0.0, 0.0),
            crate::ids::ZoneId(1),
        );
        store.save_character(&character).await.unwrap();
        let loaded = store.load_character(character.id).await.unwrap();
        assert_eq!(loaded.unwrap().name, "Rowan");
    }
}
