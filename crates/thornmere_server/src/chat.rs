//! Chat routing (spec §4.10): channel-scoped delivery, grounded on
//! `valence_chat`'s message-validation-then-broadcast pipeline, generalized
//! from its single global channel to zone/private/guild scoping.

use thornmere_math::Vec3;

use crate::ids::{CharacterId, ZoneId};
use crate::spatial::{EntityRef, ZoneIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatChannel {
    Zone,
    Private,
    Guild,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: CharacterId,
    pub channel: ChatChannel,
    pub body: String,
    pub recipient: Option<CharacterId>,
}

/// Chat-local radius; distinct from movement broadcast radius since chat
/// should carry further than nearby movement updates.
const ZONE_CHAT_RADIUS: f64 = 64.0;
const MAX_MESSAGE_LEN: usize = 256;

#[derive(Debug)]
pub enum ChatRouteError {
    MessageTooLong,
    MissingRecipient,
}

pub struct ChatRouter;

impl ChatRouter {
    /// Resolves the set of characters a message should be delivered to.
    /// Zone messages fan out to everyone within [`ZONE_CHAT_RADIUS`] of the
    /// sender in the same zone; private messages go to exactly one
    /// recipient; guild messages are left to the caller's guild-roster
    /// lookup and simply validated here.
    pub fn route(
        message: &ChatMessage,
        sender_position: Vec3,
        sender_zone: ZoneId,
        zones: &ZoneIndex,
    ) -> Result<Vec<CharacterId>, ChatRouteError> {
        if message.body.chars().count() > MAX_MESSAGE_LEN {
            return Err(ChatRouteError::MessageTooLong);
        }
        match message.channel {
            ChatChannel::Zone => Ok(zones
                .entities_within_radius(sender_zone, sender_position, ZONE_CHAT_RADIUS)
                .into_iter()
                .filter_map(|e| match e {
                    EntityRef::Character(c) => Some(c),
                    _ => None,
                })
                .collect()),
            ChatChannel::Private => message
                .recipient
                .map(|r| vec![r])
                .ok_or(ChatRouteError::MissingRecipient),
            ChatChannel::Guild => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_message_reaches_nearby_characters_only() {
        let mut zones = ZoneIndex::new();
        let sender = CharacterId::new();
        let near = CharacterId::new();
        let far = CharacterId::new();
        zones.upsert(ZoneId(1), EntityRef::Character(sender), Vec3::new(0.0, 0.0, 0.0));
        zones.upsert(ZoneId(1), EntityRef::Character(near), Vec3::new(10.0, 0.0, 0.0));
        zones.upsert(ZoneId(1), EntityRef::Character(far), Vec3::new(1000.0, 0.0, 0.0));

        let msg = ChatMessage {
            sender,
            channel: ChatChannel::Zone,
            body: "hello".to_owned(),
            recipient: None,
        };
        let recipients = ChatRouter::route(&msg, Vec3::new(0.0, 0.0, 0.0), ZoneId(1), &zones).unwrap();
        assert!(recipients.contains(&near));
        assert!(!recipients.contains(&far));
    }

    #[test]
    fn private_message_without_recipient_is_rejected() {
        let zones = ZoneIndex::new();
        let msg = ChatMessage {
            sender: CharacterId::new(),
            channel: ChatChannel::Private,
            body: "hi".to_owned(),
            recipient: None,
        };
        assert!(matches!(
            ChatRouter::route(&msg, Vec3::new(0.0, 0.0, 0.0), ZoneId(1), &zones),
            Err(ChatRouteError::MissingRecipient)
        ));
    }

    #[test]
    fn overlong_message_is_rejected() {
        let zones = ZoneIndex::new();
        let msg = ChatMessage {
            sender: CharacterId::new(),
            channel: ChatChannel::Zone,
            body: "a".repeat(MAX_MESSAGE_LEN + 1),
            recipient: None,
        };
        assert!(matches!(
            ChatRouter::route(&msg, Vec3::new(0.0, 0.0, 0.0), ZoneId(1), &zones),
            Err(ChatRouteError::MessageTooLong)
        ));
    }
}
