use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MessageId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrgType {
    Unspecified,
    Business,
    Opensource,
    EducationNonprofit,
    Education,
    Research,
    Event,
    Nonprofit,
    Government,
    PoliticalGroup,
    Community,
    Personal,
    Other,
}

impl OrgType {
    pub fn id(&self) -> i64 {
        match self {
            OrgType::Unspecified => 0,
            OrgType::Business => 10,
            OrgType::Opensource => 20,
            OrgType::EducationNonprofit => 30,
            OrgType::Education => 35,
            OrgType::Research => 40,
            OrgType::Event => 50,
            OrgType::Nonprofit => 60,
            OrgType::Government => 70,
            OrgType::PoliticalGroup => 80,
            OrgType::Community => 90,
            OrgType::Personal => 100,
            OrgType::Other => 1000,
        }
    }

    pub fn from_id(id: i64) -> Self {
        match id {
            10 => OrgType::Business,
            20 => OrgType::Opensource,
            30 => OrgType::EducationNonprofit,
            35 => OrgType::Education,
            40 => OrgType::Research,
            50 => OrgType::Event,
            60 => OrgType::Nonprofit,
            70 => OrgType::Government,
            80 => OrgType::PoliticalGroup,
            90 => OrgType::Community,
            100 => OrgType::Personal,
            1000 => OrgType::Other,
            _ => OrgType::Unspecified,
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "unspecified" => Some(OrgType::Unspecified),
            "business" => Some(OrgType::Business),
            "opensource" => Some(OrgType::Opensource),
            "education_nonprofit" => Some(OrgType::EducationNonprofit),
            "education" => Some(OrgType::Education),
            "research" => Some(OrgType::Research),
            "event" => Some(OrgType::Event),
            "nonprofit" => Some(OrgType::Nonprofit),
            "government" => Some(OrgType::Government),
            "political_group" => Some(OrgType::PoliticalGroup),
            "community" => Some(OrgType::Community),
            "personal" => Some(OrgType::Personal),
            "other" => Some(OrgType::Other),
            _ => None,
        }
    }

    pub fn is_education(&self) -> bool {
        matches!(self, OrgType::EducationNonprofit | OrgType::Education)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Realm {
    pub id: i64,
    pub string_id: String,
    pub name: String,
    pub host: String,
    pub org_type: OrgType,
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub realm_id: i64,
    pub email: String,
    pub full_name: String,
    pub is_bot: bool,
    pub default_language: String,
}

/// One message of a stream batch send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamMessage {
    pub stream: String,
    pub topic: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Suppress email and push notifications for the recipient.
    pub disable_external_notifications: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReactionType {
    UnicodeEmoji,
    RealmEmoji,
}

impl ReactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionType::UnicodeEmoji => "unicode_emoji",
            ReactionType::RealmEmoji => "realm_emoji",
        }
    }

    pub fn parse_type(s: &str) -> Option<Self> {
        match s {
            "unicode_emoji" => Some(ReactionType::UnicodeEmoji),
            "realm_emoji" => Some(ReactionType::RealmEmoji),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmojiCode {
    pub name: String,
    pub code: String,
    pub reaction_type: ReactionType,
}

/// An incoming message as handed to the event handlers.
#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub sender: UserProfile,
    pub recipient: UserProfile,
    pub content: String,
}

/// Message row as read back for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub realm_id: i64,
    pub sender_email: String,
    pub recipient_email: Option<String>,
    pub stream: Option<String>,
    pub topic: Option<String>,
    pub content: String,
    pub disable_external_notifications: bool,
    pub date_sent: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReaction {
    pub message_id: MessageId,
    pub user_email: String,
    pub emoji_name: String,
    pub emoji_code: String,
    pub reaction_type: ReactionType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn org_type_ids_round_trip_known_values() {
        assert_eq!(OrgType::from_id(35), OrgType::Education);
        assert_eq!(OrgType::from_id(30), OrgType::EducationNonprofit);
        assert_eq!(OrgType::from_id(12345), OrgType::Unspecified);
        assert_eq!(OrgType::Other.id(), 1000);
    }

    #[test]
    fn only_education_types_are_education() {
        assert!(OrgType::Education.is_education());
        assert!(OrgType::EducationNonprofit.is_education());
        assert!(!OrgType::Business.is_education());
        assert!(!OrgType::Research.is_education());
    }
}
