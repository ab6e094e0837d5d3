use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;

use practice_onboarding::config::{self, Config};
use practice_onboarding::i18n::Catalog;
use practice_onboarding::model::{
    EmojiCode, MessageId, OrgType, ReactionType, Realm, SendMessageRequest, SendOptions,
    StreamMessage, UserProfile,
};
use practice_onboarding::platform::{
    Directory, HostTransaction, Messaging, Provisioner, Transactional,
};
use practice_onboarding::Onboarding;

#[derive(Debug, Clone)]
struct DirectCall {
    sender: String,
    recipient: String,
    content: String,
    options: SendOptions,
}

#[derive(Debug, Default)]
struct State {
    realms: Vec<Realm>,
    accounts: Vec<UserProfile>,
    direct: Vec<DirectCall>,
    stream: Vec<StreamMessage>,
    reactions: Vec<(MessageId, String)>,
    provisioned: Vec<i64>,
    commits: usize,
}

/// Records every call; `fail_reactions` makes `add_reaction` error out.
#[derive(Clone, Default)]
struct RecordingHost {
    state: Arc<Mutex<State>>,
    fail_reactions: bool,
}

impl RecordingHost {
    async fn add_realm(&self, id: i64, host: &str, org_type: OrgType) -> Realm {
        let realm = Realm {
            id,
            string_id: host.split('.').next().unwrap_or(host).to_string(),
            name: host.to_string(),
            host: host.to_string(),
            org_type,
            default_language: "en".into(),
        };
        self.state.lock().await.realms.push(realm.clone());
        realm
    }

    async fn add_account(&self, realm_id: i64, email: &str, is_bot: bool) -> UserProfile {
        let mut state = self.state.lock().await;
        let user = UserProfile {
            id: state.accounts.len() as i64 + 1,
            realm_id,
            email: email.to_string(),
            full_name: email.to_string(),
            is_bot,
            default_language: "en".into(),
        };
        state.accounts.push(user.clone());
        user
    }
}

#[async_trait::async_trait]
impl Directory for RecordingHost {
    async fn realm_count(&self) -> Result<i64> {
        Ok(self.state.lock().await.realms.len() as i64)
    }

    async fn all_realms(&self) -> Result<Vec<Realm>> {
        Ok(self.state.lock().await.realms.clone())
    }

    async fn realm(&self, realm_id: i64) -> Result<Realm> {
        self.state
            .lock()
            .await
            .realms
            .iter()
            .find(|r| r.id == realm_id)
            .cloned()
            .ok_or_else(|| anyhow!("no realm {realm_id}"))
    }

    async fn user(&self, user_id: i64) -> Result<UserProfile> {
        self.state
            .lock()
            .await
            .accounts
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| anyhow!("no user {user_id}"))
    }

    async fn account_counts_by_email(&self, emails: &[String]) -> Result<HashMap<String, i64>> {
        let state = self.state.lock().await;
        let mut counts = HashMap::new();
        for account in state.accounts.iter().filter(|a| emails.contains(&a.email)) {
            *counts.entry(account.email.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn system_bot(&self, email: &str, realm_id: i64) -> Result<UserProfile> {
        self.state
            .lock()
            .await
            .accounts
            .iter()
            .find(|a| a.is_bot && a.email == email && a.realm_id == realm_id)
            .cloned()
            .ok_or_else(|| anyhow!("no bot {email}"))
    }
}

#[async_trait::async_trait]
impl Provisioner for RecordingHost {
    async fn setup_realm_internal_bots(&self, realm: &Realm) -> Result<()> {
        self.state.lock().await.provisioned.push(realm.id);
        for email in ["welcome-bot@zulip.com", "notification-bot@zulip.com"] {
            if self.system_bot(email, realm.id).await.is_err() {
                self.add_account(realm.id, email, true).await;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Messaging for RecordingHost {
    async fn send_direct_message(
        &self,
        sender: &UserProfile,
        recipient: &UserProfile,
        content: &str,
        options: SendOptions,
    ) -> Result<MessageId> {
        let mut state = self.state.lock().await;
        state.direct.push(DirectCall {
            sender: sender.email.clone(),
            recipient: recipient.email.clone(),
            content: content.to_string(),
            options,
        });
        Ok(state.direct.len() as i64)
    }

    async fn send_stream_messages(
        &self,
        _realm: &Realm,
        _sender: &UserProfile,
        messages: &[StreamMessage],
    ) -> Result<Vec<MessageId>> {
        let mut state = self.state.lock().await;
        let first = state.stream.len() as i64 + 100;
        state.stream.extend(messages.iter().cloned());
        Ok((first..first + messages.len() as i64).collect())
    }

    async fn emoji_code(&self, _realm: &Realm, name: &str) -> Result<EmojiCode> {
        Ok(EmojiCode {
            name: name.to_string(),
            code: "1f422".into(),
            reaction_type: ReactionType::UnicodeEmoji,
        })
    }

    async fn add_reaction(
        &self,
        _user: &UserProfile,
        message_id: MessageId,
        emoji: &EmojiCode,
    ) -> Result<()> {
        if self.fail_reactions {
            return Err(anyhow!("reaction subsystem unavailable"));
        }
        self.state
            .lock()
            .await
            .reactions
            .push((message_id, emoji.name.clone()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl HostTransaction for RecordingHost {
    async fn commit(self) -> Result<()> {
        self.state.lock().await.commits += 1;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Transactional for RecordingHost {
    type Tx = RecordingHost;

    async fn begin(&self) -> Result<RecordingHost> {
        Ok(self.clone())
    }
}

fn load_config() -> Arc<Config> {
    Arc::new(serde_yaml::from_str(config::example()).unwrap())
}

fn onboarding(host: RecordingHost) -> Onboarding<RecordingHost> {
    Onboarding::new(host, load_config(), Arc::new(Catalog::empty()))
}

#[tokio::test]
async fn no_realms_means_no_repair() {
    let host = RecordingHost::default();
    let onboarding = onboarding(host.clone());

    assert!(!onboarding.missing_any_realm_internal_bots().await.unwrap());
    onboarding.create_if_missing_realm_internal_bots().await.unwrap();
    assert!(host.state.lock().await.provisioned.is_empty());
}

#[tokio::test]
async fn repair_runs_for_every_realm_only_when_needed() {
    let host = RecordingHost::default();
    let onboarding = onboarding(host.clone());
    let a = host.add_realm(1, "a.example.com", OrgType::Business).await;
    host.add_realm(2, "b.example.com", OrgType::Business).await;
    host.setup_realm_internal_bots(&a).await.unwrap();
    host.state.lock().await.provisioned.clear();

    onboarding.create_if_missing_realm_internal_bots().await.unwrap();
    assert_eq!(host.state.lock().await.provisioned, vec![1, 2]);
    assert!(!onboarding.missing_any_realm_internal_bots().await.unwrap());

    host.state.lock().await.provisioned.clear();
    onboarding.create_if_missing_realm_internal_bots().await.unwrap();
    assert!(host.state.lock().await.provisioned.is_empty());
}

#[tokio::test]
async fn seed_reacts_to_the_turtle_message_by_id() {
    let host = RecordingHost::default();
    let onboarding = onboarding(host.clone());
    let realm = host.add_realm(1, "a.example.com", OrgType::Business).await;
    host.setup_realm_internal_bots(&realm).await.unwrap();

    let ids = onboarding.send_initial_realm_messages(&realm).await.unwrap();
    assert_eq!(ids, vec![100, 101, 102, 103]);

    let state = host.state.lock().await;
    assert_eq!(state.stream.len(), 4);
    assert_eq!(state.reactions, vec![(103, "turtle".to_string())]);
    assert!(state.stream[3].content.contains("cute/turtle.png"));
    assert_eq!(state.commits, 1);
}

#[tokio::test]
async fn seed_does_not_commit_when_reaction_fails() {
    let host = RecordingHost {
        fail_reactions: true,
        ..Default::default()
    };
    let onboarding = onboarding(host.clone());
    let realm = host.add_realm(1, "a.example.com", OrgType::Business).await;
    host.setup_realm_internal_bots(&realm).await.unwrap();

    let err = onboarding.send_initial_realm_messages(&realm).await.unwrap_err();
    assert!(err.to_string().contains("reaction subsystem unavailable"));
    assert_eq!(host.state.lock().await.commits, 0);
}

#[tokio::test]
async fn direct_messages_are_quiet_and_from_each_persona() {
    let host = RecordingHost::default();
    let onboarding = onboarding(host.clone());
    let realm = host.add_realm(1, "clinic.example.com", OrgType::Education).await;
    host.setup_realm_internal_bots(&realm).await.unwrap();
    host.add_account(1, "clinical-bot@clinic.example.com", true).await;
    host.add_account(1, "office-bot@clinic.example.com", true).await;
    let user = host.add_account(1, "new@clinic.example.com", false).await;

    onboarding.send_initial_direct_message(&user).await.unwrap();

    let state = host.state.lock().await;
    assert_eq!(state.direct.len(), 3);
    assert!(state.direct.iter().all(|c| c.recipient == "new@clinic.example.com"));
    assert!(state
        .direct
        .iter()
        .all(|c| c.options.disable_external_notifications));
    assert_eq!(state.direct[1].sender, "clinical-bot@clinic.example.com");
    assert_eq!(state.direct[2].sender, "office-bot@clinic.example.com");
    assert!(state.direct[0]
        .content
        .contains("https://clinic.example.com/help/using-zulip-for-a-class"));
}

#[tokio::test]
async fn missing_persona_bot_propagates() {
    let host = RecordingHost::default();
    let onboarding = onboarding(host.clone());
    let realm = host.add_realm(1, "clinic.example.com", OrgType::Business).await;
    host.setup_realm_internal_bots(&realm).await.unwrap();
    let user = host.add_account(1, "new@clinic.example.com", false).await;

    let err = onboarding.send_initial_direct_message(&user).await.unwrap_err();
    assert!(err.to_string().contains("clinical-bot@clinic.example.com"));
    // The welcome message went out before the failure.
    assert_eq!(host.state.lock().await.direct.len(), 1);
}

#[tokio::test]
async fn welcome_bot_reply_goes_back_to_sender() {
    let host = RecordingHost::default();
    let onboarding = onboarding(host.clone());
    let realm = host.add_realm(1, "a.example.com", OrgType::Business).await;
    host.setup_realm_internal_bots(&realm).await.unwrap();
    let user = host.add_account(1, "asker@a.example.com", false).await;
    let bot = onboarding
        .platform()
        .system_bot("welcome-bot@zulip.com", 1)
        .await
        .unwrap();

    onboarding
        .send_welcome_bot_response(&SendMessageRequest {
            sender: user,
            recipient: bot,
            content: "Profile".into(),
        })
        .await
        .unwrap();

    let state = host.state.lock().await;
    assert_eq!(state.direct.len(), 1);
    assert_eq!(state.direct[0].sender, "welcome-bot@zulip.com");
    assert_eq!(state.direct[0].recipient, "asker@a.example.com");
    assert!(state.direct[0].content.starts_with("Go to [Profile settings]"));
}
