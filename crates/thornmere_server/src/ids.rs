//! Newtype identifiers. Every cross-subsystem reference is by identifier,
//! never by pointer or ECS `Entity`, per the data-model ownership rules: an
//! offer references a character by `CharacterId`, not the other way around.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(AccountId);
uuid_id!(CharacterId);
uuid_id!(SessionId);
uuid_id!(NpcId);
uuid_id!(ResourceId);
uuid_id!(OfferId);
uuid_id!(TransactionId);

/// Static zone identifiers are small integers assigned by the data catalog,
/// not UUIDs, since the zone set is fixed at world-build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// Item and NPC/resource template identifiers come from the static
/// [`DataCatalog`](crate::catalog::DataCatalog) and are likewise small
/// integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NpcTemplateId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceTemplateId(pub u32);
