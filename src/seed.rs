//! Messages posted into the default streams of a freshly created realm.

use anyhow::{bail, Result};
use tracing::{info, instrument};

use crate::config::RealmDefaults;
use crate::i18n::{fill, Localizer};
use crate::model::{MessageId, Realm, StreamMessage};
use crate::onboarding::Onboarding;
use crate::platform::{Directory, HostTransaction, Messaging, Transactional};

pub const TURTLE_IMAGE: &str = "/static/images/cute/turtle.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMessage {
    pub message: StreamMessage,
    /// Emoji the Welcome Bot reacts with once the message is sent.
    pub reaction: Option<&'static str>,
}

/// The seed messages, in sidebar order of their streams.
pub fn initial_realm_messages(l10n: &Localizer<'_>, streams: &RealmDefaults) -> Vec<SeedMessage> {
    let t = move |msgid: &'static str| l10n.gettext(msgid);
    let private_stream = streams.initial_private_stream_name.as_str();
    let notification_stream = streams.default_notification_stream_name.as_str();

    let private_streams_topic = fill(
        &format!(
            "{} {}\n\n{}",
            t("This is a private stream, as indicated by the lock icon next to the stream name."),
            t("Private streams are only visible to stream members."),
            t("To manage this stream, go to [Stream settings]({stream_settings_url}) and click on `{initial_private_stream_name}`."),
        ),
        &[
            ("stream_settings_url", "#streams/subscribed"),
            ("initial_private_stream_name", private_stream),
        ],
    );

    let topic_demonstration_1 = fill(
        t("This is a message on stream #**{default_notification_stream_name}** with the topic `topic demonstration`."),
        &[("default_notification_stream_name", notification_stream)],
    );

    let topic_demonstration_2 = fill(
        &format!(
            "{} {}",
            t("Topics are a lightweight tool to keep conversations organized."),
            t("You can learn more about topics at [Streams and topics]({about_topics_help_url})."),
        ),
        &[("about_topics_help_url", "/help/streams-and-topics")],
    );

    let swimming_turtles = fill(
        &format!(
            "{}\n\n[]({TURTLE_IMAGE})\n\n{}",
            t("This is a message on stream #**{default_notification_stream_name}** with the topic `swimming turtles`."),
            t("[Start a new topic]({start_topic_help_url}) any time you're not replying to a previous message."),
        ),
        &[
            ("default_notification_stream_name", notification_stream),
            ("start_topic_help_url", "/help/start-a-new-topic"),
        ],
    );

    let seed = |stream: &str, topic: &str, content: String, reaction| SeedMessage {
        message: StreamMessage {
            stream: stream.to_string(),
            topic: topic.to_string(),
            content,
        },
        reaction,
    };

    vec![
        seed(private_stream, "private streams", private_streams_topic, None),
        seed(notification_stream, "topic demonstration", topic_demonstration_1, None),
        seed(notification_stream, "topic demonstration", topic_demonstration_2, None),
        seed(notification_stream, "swimming turtles", swimming_turtles, Some("turtle")),
    ]
}

impl<P: Transactional> Onboarding<P> {
    /// Post the seed messages and the Welcome Bot's reaction in one
    /// transaction. Returns the ids of the sent messages.
    #[instrument(skip_all, fields(realm = realm.id))]
    pub async fn send_initial_realm_messages(&self, realm: &Realm) -> Result<Vec<MessageId>> {
        let tx = self.platform.begin().await?;
        let welcome_bot = tx.system_bot(&self.config.bots.welcome_bot, realm.id).await?;
        let l10n = self.catalog.localizer(&realm.default_language);
        let seeds = initial_realm_messages(&l10n, &self.config.realm);

        let messages: Vec<StreamMessage> = seeds.iter().map(|s| s.message.clone()).collect();
        let message_ids = tx.send_stream_messages(realm, &welcome_bot, &messages).await?;
        if message_ids.len() != seeds.len() {
            bail!(
                "expected {} message ids from batch send, got {}",
                seeds.len(),
                message_ids.len()
            );
        }

        for (seed, message_id) in seeds.iter().zip(&message_ids) {
            if let Some(name) = seed.reaction {
                let emoji = tx.emoji_code(realm, name).await?;
                tx.add_reaction(&welcome_bot, *message_id, &emoji).await?;
            }
        }

        tx.commit().await?;
        info!(realm = realm.id, count = message_ids.len(), "initial realm messages sent");
        Ok(message_ids)
    }
}
