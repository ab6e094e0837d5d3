//! Capabilities the onboarding flows consume from the host chat platform.
//!
//! The flows never talk to storage directly; they go through these traits so
//! any host (the bundled SQLite one in [`crate::db`], or a test double) can
//! back them.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{EmojiCode, MessageId, Realm, SendOptions, StreamMessage, UserProfile};

/// Read access to realms and accounts.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn realm_count(&self) -> Result<i64>;

    async fn all_realms(&self) -> Result<Vec<Realm>>;

    async fn realm(&self, realm_id: i64) -> Result<Realm>;

    async fn user(&self, user_id: i64) -> Result<UserProfile>;

    /// Number of accounts per email, across all realms. Emails without any
    /// account are absent from the map.
    async fn account_counts_by_email(&self, emails: &[String]) -> Result<HashMap<String, i64>>;

    /// The system bot with `email` in `realm_id`; fails if it does not exist.
    async fn system_bot(&self, email: &str, realm_id: i64) -> Result<UserProfile>;
}

/// Creates the internal bots of a realm. Must be idempotent.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn setup_realm_internal_bots(&self, realm: &Realm) -> Result<()>;
}

/// Message delivery and reactions.
#[async_trait]
pub trait Messaging: Send + Sync {
    async fn send_direct_message(
        &self,
        sender: &UserProfile,
        recipient: &UserProfile,
        content: &str,
        options: SendOptions,
    ) -> Result<MessageId>;

    /// Sends every message or none. Ids are returned in input order.
    async fn send_stream_messages(
        &self,
        realm: &Realm,
        sender: &UserProfile,
        messages: &[StreamMessage],
    ) -> Result<Vec<MessageId>>;

    async fn emoji_code(&self, realm: &Realm, name: &str) -> Result<EmojiCode>;

    async fn add_reaction(
        &self,
        user: &UserProfile,
        message_id: MessageId,
        emoji: &EmojiCode,
    ) -> Result<()>;
}

/// A unit of work. Dropping it without `commit` rolls everything back.
#[async_trait]
pub trait HostTransaction: Send + Sync {
    async fn commit(self) -> Result<()>;
}

#[async_trait]
pub trait Transactional: Send + Sync {
    type Tx: Directory + Messaging + HostTransaction;

    async fn begin(&self) -> Result<Self::Tx>;
}
