//! Row structs returned by repositories.
//!
//! Keep these focused on the columns a query selects; conversion to domain
//! types happens in the `From` impls below.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::model::{OrgType, ReactionType, Realm, StoredMessage, StoredReaction, UserProfile};

#[derive(Debug, Clone, FromRow)]
pub struct RealmRow {
    pub id: i64,
    pub string_id: String,
    pub name: String,
    pub host: String,
    pub org_type: i64,
    pub default_language: String,
}

impl From<RealmRow> for Realm {
    fn from(row: RealmRow) -> Self {
        Realm {
            id: row.id,
            string_id: row.string_id,
            name: row.name,
            host: row.host,
            org_type: OrgType::from_id(row.org_type),
            default_language: row.default_language,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub realm_id: i64,
    pub email: String,
    pub full_name: String,
    pub is_bot: bool,
    pub default_language: String,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            realm_id: row.realm_id,
            email: row.email,
            full_name: row.full_name,
            is_bot: row.is_bot,
            default_language: row.default_language,
        }
    }
}

/// Message joined with sender, recipient and stream names.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub realm_id: i64,
    pub sender_email: String,
    pub recipient_email: Option<String>,
    pub stream: Option<String>,
    pub topic: Option<String>,
    pub content: String,
    pub disable_external_notifications: bool,
    pub date_sent: DateTime<Utc>,
}

impl From<MessageRow> for StoredMessage {
    fn from(row: MessageRow) -> Self {
        StoredMessage {
            id: row.id,
            realm_id: row.realm_id,
            sender_email: row.sender_email,
            recipient_email: row.recipient_email,
            stream: row.stream,
            topic: row.topic,
            content: row.content,
            disable_external_notifications: row.disable_external_notifications,
            date_sent: row.date_sent,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ReactionRow {
    pub message_id: i64,
    pub user_email: String,
    pub emoji_name: String,
    pub emoji_code: String,
    pub reaction_type: String,
}

impl From<ReactionRow> for StoredReaction {
    fn from(row: ReactionRow) -> Self {
        StoredReaction {
            message_id: row.message_id,
            user_email: row.user_email,
            emoji_name: row.emoji_name,
            emoji_code: row.emoji_code,
            reaction_type: ReactionType::parse_type(&row.reaction_type)
                .unwrap_or(ReactionType::UnicodeEmoji),
        }
    }
}
