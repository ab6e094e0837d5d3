//! Platform traits backed by the SQLite schema.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use super::repo::{self, Pool};
use crate::config::Config;
use crate::model::{EmojiCode, MessageId, Realm, SendOptions, StreamMessage, UserProfile};
use crate::platform::{Directory, HostTransaction, Messaging, Provisioner, Transactional};

/// Pool-backed host. Each call runs on its own connection; batch sends get
/// their own transaction.
#[derive(Clone)]
pub struct SqliteHost {
    pool: Pool,
    config: Arc<Config>,
}

impl SqliteHost {
    pub fn new(pool: Pool, config: Arc<Config>) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

/// Transaction-backed host handed out by [`SqliteHost::begin`].
pub struct SqliteTx {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

#[async_trait]
impl Directory for SqliteHost {
    async fn realm_count(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        repo::realm_count(&mut conn).await
    }

    async fn all_realms(&self) -> Result<Vec<Realm>> {
        let mut conn = self.pool.acquire().await?;
        repo::all_realms(&mut conn).await
    }

    async fn realm(&self, realm_id: i64) -> Result<Realm> {
        let mut conn = self.pool.acquire().await?;
        repo::get_realm(&mut conn, realm_id).await
    }

    async fn user(&self, user_id: i64) -> Result<UserProfile> {
        let mut conn = self.pool.acquire().await?;
        repo::get_user(&mut conn, user_id).await
    }

    async fn account_counts_by_email(&self, emails: &[String]) -> Result<HashMap<String, i64>> {
        let mut conn = self.pool.acquire().await?;
        repo::account_counts_by_email(&mut conn, emails).await
    }

    async fn system_bot(&self, email: &str, realm_id: i64) -> Result<UserProfile> {
        let mut conn = self.pool.acquire().await?;
        repo::get_system_bot(&mut conn, email, realm_id).await
    }
}

#[async_trait]
impl Provisioner for SqliteHost {
    /// Creates every configured internal bot plus the realm's Clinical and
    /// Office bots. Existing accounts are left alone.
    #[instrument(skip_all, fields(realm = realm.id))]
    async fn setup_realm_internal_bots(&self, realm: &Realm) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let domain = &self.config.server.internal_bot_domain;
        let mut bots: Vec<(String, &str)> = self
            .config
            .bots
            .realm_internal_bots
            .iter()
            .map(|bot| (bot.email(domain), bot.name.as_str()))
            .collect();
        bots.push((self.config.clinical_bot_email(realm), "Clinical Bot"));
        bots.push((self.config.office_bot_email(realm), "Office Bot"));

        let mut created = 0;
        for (email, name) in &bots {
            if repo::ensure_bot(&mut tx, realm.id, email, name, &realm.default_language).await? {
                debug!(email = %email, "created internal bot");
                created += 1;
            }
        }
        tx.commit().await?;
        info!(realm = realm.id, created, "internal bots provisioned");
        Ok(())
    }
}

#[async_trait]
impl Messaging for SqliteHost {
    async fn send_direct_message(
        &self,
        sender: &UserProfile,
        recipient: &UserProfile,
        content: &str,
        options: SendOptions,
    ) -> Result<MessageId> {
        let mut conn = self.pool.acquire().await?;
        repo::insert_direct_message(
            &mut conn,
            sender,
            recipient,
            content,
            options.disable_external_notifications,
        )
        .await
    }

    async fn send_stream_messages(
        &self,
        realm: &Realm,
        sender: &UserProfile,
        messages: &[StreamMessage],
    ) -> Result<Vec<MessageId>> {
        let mut tx = self.pool.begin().await?;
        let ids = repo::insert_stream_messages(&mut tx, realm, sender, messages).await?;
        tx.commit().await?;
        Ok(ids)
    }

    async fn emoji_code(&self, realm: &Realm, name: &str) -> Result<EmojiCode> {
        let mut conn = self.pool.acquire().await?;
        repo::emoji_code(&mut conn, realm.id, name).await
    }

    async fn add_reaction(
        &self,
        user: &UserProfile,
        message_id: MessageId,
        emoji: &EmojiCode,
    ) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        repo::insert_reaction(&mut conn, user, message_id, emoji).await
    }
}

#[async_trait]
impl Transactional for SqliteHost {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTx { tx: Mutex::new(tx) })
    }
}

#[async_trait]
impl HostTransaction for SqliteTx {
    async fn commit(self) -> Result<()> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Directory for SqliteTx {
    async fn realm_count(&self) -> Result<i64> {
        let mut tx = self.tx.lock().await;
        repo::realm_count(&mut tx).await
    }

    async fn all_realms(&self) -> Result<Vec<Realm>> {
        let mut tx = self.tx.lock().await;
        repo::all_realms(&mut tx).await
    }

    async fn realm(&self, realm_id: i64) -> Result<Realm> {
        let mut tx = self.tx.lock().await;
        repo::get_realm(&mut tx, realm_id).await
    }

    async fn user(&self, user_id: i64) -> Result<UserProfile> {
        let mut tx = self.tx.lock().await;
        repo::get_user(&mut tx, user_id).await
    }

    async fn account_counts_by_email(&self, emails: &[String]) -> Result<HashMap<String, i64>> {
        let mut tx = self.tx.lock().await;
        repo::account_counts_by_email(&mut tx, emails).await
    }

    async fn system_bot(&self, email: &str, realm_id: i64) -> Result<UserProfile> {
        let mut tx = self.tx.lock().await;
        repo::get_system_bot(&mut tx, email, realm_id).await
    }
}

#[async_trait]
impl Messaging for SqliteTx {
    async fn send_direct_message(
        &self,
        sender: &UserProfile,
        recipient: &UserProfile,
        content: &str,
        options: SendOptions,
    ) -> Result<MessageId> {
        let mut tx = self.tx.lock().await;
        repo::insert_direct_message(
            &mut tx,
            sender,
            recipient,
            content,
            options.disable_external_notifications,
        )
        .await
    }

    async fn send_stream_messages(
        &self,
        realm: &Realm,
        sender: &UserProfile,
        messages: &[StreamMessage],
    ) -> Result<Vec<MessageId>> {
        let mut tx = self.tx.lock().await;
        repo::insert_stream_messages(&mut tx, realm, sender, messages).await
    }

    async fn emoji_code(&self, realm: &Realm, name: &str) -> Result<EmojiCode> {
        let mut tx = self.tx.lock().await;
        repo::emoji_code(&mut tx, realm.id, name).await
    }

    async fn add_reaction(
        &self,
        user: &UserProfile,
        message_id: MessageId,
        emoji: &EmojiCode,
    ) -> Result<()> {
        let mut tx = self.tx.lock().await;
        repo::insert_reaction(&mut tx, user, message_id, emoji).await
    }
}
