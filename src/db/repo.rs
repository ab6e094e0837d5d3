use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::instrument;

use super::model::{MessageRow, ReactionRow, RealmRow, UserRow};
use crate::emoji;
use crate::model::{
    EmojiCode, MessageId, OrgType, ReactionType, Realm, StoredMessage, StoredReaction,
    StreamMessage, UserProfile,
};

pub type Pool = SqlitePool;

const REALM_COLUMNS: &str = "id, string_id, name, host, org_type, default_language";
const USER_COLUMNS: &str = "id, realm_id, email, full_name, is_bot, default_language";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/`, ensure the parent
/// directory exists and ask SQLite to create the file. Leaves in-memory URLs
/// untouched.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    rebuilt.push('?');
    rebuilt.push_str(query_part.unwrap_or("mode=rwc"));
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

// --- realms and accounts ---

#[instrument(skip_all, fields(string_id = %string_id))]
pub async fn create_realm(
    conn: &mut SqliteConnection,
    string_id: &str,
    name: &str,
    host: &str,
    org_type: OrgType,
    default_language: &str,
) -> Result<Realm> {
    let row: RealmRow = sqlx::query_as(&format!(
        "INSERT INTO realms (string_id, name, host, org_type, default_language) \
         VALUES (?, ?, ?, ?, ?) RETURNING {REALM_COLUMNS}"
    ))
    .bind(string_id)
    .bind(name)
    .bind(host)
    .bind(org_type.id())
    .bind(default_language)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("failed to create realm '{string_id}'"))?;
    Ok(row.into())
}

#[instrument(skip_all, fields(realm_id = realm_id, name = %name))]
pub async fn create_stream(
    conn: &mut SqliteConnection,
    realm_id: i64,
    name: &str,
    invite_only: bool,
) -> Result<i64> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO streams (realm_id, name, invite_only) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(realm_id)
    .bind(name)
    .bind(invite_only)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

#[instrument(skip_all, fields(realm_id = realm_id, email = %email))]
pub async fn create_user(
    conn: &mut SqliteConnection,
    realm_id: i64,
    email: &str,
    full_name: &str,
    is_bot: bool,
    default_language: &str,
) -> Result<UserProfile> {
    let row: UserRow = sqlx::query_as(&format!(
        "INSERT INTO user_profiles (realm_id, email, full_name, is_bot, default_language) \
         VALUES (?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(realm_id)
    .bind(email)
    .bind(full_name)
    .bind(is_bot)
    .bind(default_language)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("failed to create user '{email}'"))?;
    Ok(row.into())
}

/// Insert a bot account unless one with the same email already exists in the realm.
#[instrument(skip_all, fields(realm_id = realm_id, email = %email))]
pub async fn ensure_bot(
    conn: &mut SqliteConnection,
    realm_id: i64,
    email: &str,
    full_name: &str,
    default_language: &str,
) -> Result<bool> {
    let res = sqlx::query(
        "INSERT INTO user_profiles (realm_id, email, full_name, is_bot, default_language) \
         VALUES (?, ?, ?, 1, ?) ON CONFLICT (realm_id, email) DO NOTHING",
    )
    .bind(realm_id)
    .bind(email)
    .bind(full_name)
    .bind(default_language)
    .execute(&mut *conn)
    .await?;
    Ok(res.rows_affected() > 0)
}

pub async fn realm_count(conn: &mut SqliteConnection) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM realms")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn all_realms(conn: &mut SqliteConnection) -> Result<Vec<Realm>> {
    let rows: Vec<RealmRow> =
        sqlx::query_as(&format!("SELECT {REALM_COLUMNS} FROM realms ORDER BY id"))
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows.into_iter().map(Realm::from).collect())
}

pub async fn get_realm(conn: &mut SqliteConnection, realm_id: i64) -> Result<Realm> {
    let row: Option<RealmRow> =
        sqlx::query_as(&format!("SELECT {REALM_COLUMNS} FROM realms WHERE id = ?"))
            .bind(realm_id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Realm::from)
        .ok_or_else(|| anyhow!("realm {realm_id} does not exist"))
}

pub async fn get_realm_by_string_id(conn: &mut SqliteConnection, string_id: &str) -> Result<Realm> {
    let row: Option<RealmRow> =
        sqlx::query_as(&format!("SELECT {REALM_COLUMNS} FROM realms WHERE string_id = ?"))
            .bind(string_id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(Realm::from)
        .ok_or_else(|| anyhow!("realm '{string_id}' does not exist"))
}

pub async fn get_user(conn: &mut SqliteConnection, user_id: i64) -> Result<UserProfile> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM user_profiles WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    row.map(UserProfile::from)
        .ok_or_else(|| anyhow!("user {user_id} does not exist"))
}

pub async fn get_system_bot(
    conn: &mut SqliteConnection,
    email: &str,
    realm_id: i64,
) -> Result<UserProfile> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM user_profiles WHERE email = ? AND realm_id = ? AND is_bot = 1"
    ))
    .bind(email)
    .bind(realm_id)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(UserProfile::from)
        .ok_or_else(|| anyhow!("system bot '{email}' does not exist in realm {realm_id}"))
}

#[instrument(skip_all, fields(emails = emails.len()))]
pub async fn account_counts_by_email(
    conn: &mut SqliteConnection,
    emails: &[String],
) -> Result<HashMap<String, i64>> {
    if emails.is_empty() {
        return Ok(HashMap::new());
    }
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT email, COUNT(id) FROM user_profiles WHERE email IN (");
    let mut separated = qb.separated(", ");
    for email in emails {
        separated.push_bind(email.as_str());
    }
    separated.push_unseparated(") GROUP BY email");
    let rows: Vec<(String, i64)> = qb.build_query_as::<(String, i64)>().fetch_all(&mut *conn).await?;
    Ok(rows.into_iter().collect())
}

// --- messages and reactions ---

async fn stream_id_by_name(conn: &mut SqliteConnection, realm_id: i64, name: &str) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM streams WHERE realm_id = ? AND name = ?")
        .bind(realm_id)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| anyhow!("stream '{name}' does not exist in realm {realm_id}"))
}

#[instrument(skip_all, fields(sender = sender.id, recipient = recipient.id))]
pub async fn insert_direct_message(
    conn: &mut SqliteConnection,
    sender: &UserProfile,
    recipient: &UserProfile,
    content: &str,
    disable_external_notifications: bool,
) -> Result<MessageId> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO messages (realm_id, sender_id, recipient_user_id, content, disable_external_notifications, date_sent) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(recipient.realm_id)
    .bind(sender.id)
    .bind(recipient.id)
    .bind(content)
    .bind(disable_external_notifications)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

/// Insert stream messages in order. Callers wrap this in a transaction when
/// the batch must be all-or-nothing.
#[instrument(skip_all, fields(realm_id = realm.id, count = messages.len()))]
pub async fn insert_stream_messages(
    conn: &mut SqliteConnection,
    realm: &Realm,
    sender: &UserProfile,
    messages: &[StreamMessage],
) -> Result<Vec<MessageId>> {
    let mut ids = Vec::with_capacity(messages.len());
    for message in messages {
        let stream_id = stream_id_by_name(conn, realm.id, &message.stream).await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO messages (realm_id, sender_id, stream_id, topic, content, date_sent) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(realm.id)
        .bind(sender.id)
        .bind(stream_id)
        .bind(&message.topic)
        .bind(&message.content)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

#[instrument(skip_all, fields(realm_id = realm_id, name = %name))]
pub async fn create_realm_emoji(conn: &mut SqliteConnection, realm_id: i64, name: &str) -> Result<i64> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO realm_emoji (realm_id, name) VALUES (?, ?) RETURNING id")
            .bind(realm_id)
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
    Ok(id)
}

/// Realm custom emoji take precedence over built-in unicode names.
pub async fn emoji_code(conn: &mut SqliteConnection, realm_id: i64, name: &str) -> Result<EmojiCode> {
    let realm_emoji: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM realm_emoji WHERE realm_id = ? AND name = ? AND deactivated = 0",
    )
    .bind(realm_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(id) = realm_emoji {
        return Ok(EmojiCode {
            name: name.to_string(),
            code: id.to_string(),
            reaction_type: ReactionType::RealmEmoji,
        });
    }
    let code = emoji::unicode_code(name).ok_or_else(|| anyhow!("Emoji '{name}' does not exist"))?;
    Ok(EmojiCode {
        name: name.to_string(),
        code: code.to_string(),
        reaction_type: ReactionType::UnicodeEmoji,
    })
}

#[instrument(skip_all, fields(user = user.id, message_id = message_id, emoji = %emoji.name))]
pub async fn insert_reaction(
    conn: &mut SqliteConnection,
    user: &UserProfile,
    message_id: MessageId,
    emoji: &EmojiCode,
) -> Result<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(anyhow!("message {message_id} does not exist"));
    }
    sqlx::query(
        "INSERT INTO reactions (message_id, user_id, emoji_name, emoji_code, reaction_type) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(message_id)
    .bind(user.id)
    .bind(&emoji.name)
    .bind(&emoji.code)
    .bind(emoji.reaction_type.as_str())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("failed to add reaction to message {message_id}"))?;
    Ok(())
}

// --- inspection ---

const MESSAGE_SELECT: &str = "SELECT m.id, m.realm_id, s.email AS sender_email, r.email AS recipient_email, \
     st.name AS stream, m.topic, m.content, m.disable_external_notifications, m.date_sent \
     FROM messages m \
     JOIN user_profiles s ON s.id = m.sender_id \
     LEFT JOIN user_profiles r ON r.id = m.recipient_user_id \
     LEFT JOIN streams st ON st.id = m.stream_id";

pub async fn realm_messages(conn: &mut SqliteConnection, realm_id: i64) -> Result<Vec<StoredMessage>> {
    let rows: Vec<MessageRow> =
        sqlx::query_as(&format!("{MESSAGE_SELECT} WHERE m.realm_id = ? ORDER BY m.id"))
            .bind(realm_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows.into_iter().map(StoredMessage::from).collect())
}

/// Direct messages received by `user_id`, oldest first.
pub async fn direct_messages_to(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<StoredMessage>> {
    let rows: Vec<MessageRow> = sqlx::query_as(&format!(
        "{MESSAGE_SELECT} WHERE m.recipient_user_id = ? ORDER BY m.id"
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(StoredMessage::from).collect())
}

pub async fn realm_reactions(conn: &mut SqliteConnection, realm_id: i64) -> Result<Vec<StoredReaction>> {
    let rows: Vec<ReactionRow> = sqlx::query_as(
        "SELECT x.message_id, u.email AS user_email, x.emoji_name, x.emoji_code, x.reaction_type \
         FROM reactions x \
         JOIN messages m ON m.id = x.message_id \
         JOIN user_profiles u ON u.id = x.user_id \
         WHERE m.realm_id = ? ORDER BY x.id",
    )
    .bind(realm_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(StoredReaction::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> Pool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[test]
    fn sqlite_url_memory_untouched() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(prepare_sqlite_url("postgres://x"), "postgres://x");
    }

    #[test]
    fn sqlite_url_gets_create_mode() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested/db.sqlite");
        let url = prepare_sqlite_url(&format!("sqlite://{}", path.display()));
        assert_eq!(url, format!("sqlite://{}?mode=rwc", path.display()));
        assert!(path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn account_counts_group_by_email() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let a = create_realm(&mut conn, "a", "A", "a.example.com", OrgType::Business, "en")
            .await
            .unwrap();
        let b = create_realm(&mut conn, "b", "B", "b.example.com", OrgType::Business, "en")
            .await
            .unwrap();
        assert!(ensure_bot(&mut conn, a.id, "bot@x", "Bot", "en").await.unwrap());
        assert!(!ensure_bot(&mut conn, a.id, "bot@x", "Bot", "en").await.unwrap());
        ensure_bot(&mut conn, b.id, "bot@x", "Bot", "en").await.unwrap();

        let counts = account_counts_by_email(&mut conn, &["bot@x".into(), "other@x".into()])
            .await
            .unwrap();
        assert_eq!(counts.get("bot@x"), Some(&2));
        assert_eq!(counts.get("other@x"), None);
        assert!(account_counts_by_email(&mut conn, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_send_to_unknown_stream_fails() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let realm = create_realm(&mut conn, "a", "A", "a.example.com", OrgType::Business, "en")
            .await
            .unwrap();
        let bot = create_user(&mut conn, realm.id, "bot@x", "Bot", true, "en").await.unwrap();
        let err = insert_stream_messages(
            &mut conn,
            &realm,
            &bot,
            &[StreamMessage {
                stream: "nope".into(),
                topic: "t".into(),
                content: "c".into(),
            }],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("stream 'nope'"));
    }

    #[tokio::test]
    async fn realm_emoji_shadows_unicode() {
        let pool = setup_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let realm = create_realm(&mut conn, "a", "A", "a.example.com", OrgType::Business, "en")
            .await
            .unwrap();
        let unicode = emoji_code(&mut conn, realm.id, "turtle").await.unwrap();
        assert_eq!(unicode.code, "1f422");
        assert_eq!(unicode.reaction_type, ReactionType::UnicodeEmoji);

        let id = create_realm_emoji(&mut conn, realm.id, "turtle").await.unwrap();
        let custom = emoji_code(&mut conn, realm.id, "turtle").await.unwrap();
        assert_eq!(custom.code, id.to_string());
        assert_eq!(custom.reaction_type, ReactionType::RealmEmoji);

        let err = emoji_code(&mut conn, realm.id, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Emoji 'nope' does not exist");
    }
}
