//! Direct messages a new user receives from the Welcome, Clinical and Office
//! bots.

use anyhow::Result;
use tracing::{info, instrument};

use crate::i18n::{fill, Localizer};
use crate::model::{SendOptions, UserProfile};
use crate::onboarding::Onboarding;
use crate::platform::{Directory, Messaging};

/// Welcome bot messages are meant to be read in the app, never pushed.
const QUIET: SendOptions = SendOptions {
    disable_external_notifications: true,
};

/// Link to the getting-started guide, switched on the realm's org type.
pub fn getting_started(l10n: &Localizer<'_>, realm_uri: &str, education: bool) -> String {
    if education {
        let url = format!("{realm_uri}/help/using-zulip-for-a-class");
        fill(
            l10n.gettext("If you are new to Practice Chat, check out our [Using Zulip for a class guide]({getting_started_url})!"),
            &[("getting_started_url", url.as_str())],
        )
    } else {
        let url = format!("{realm_uri}/help/getting-started-with-zulip");
        fill(
            l10n.gettext("If you are new to Practice Chat, check out our [Getting started guide]({getting_started_url})!"),
            &[("getting_started_url", url.as_str())],
        )
    }
}

pub fn welcome_bot_content(l10n: &Localizer<'_>, realm_uri: &str, education: bool) -> String {
    let t = move |msgid: &'static str| l10n.gettext(msgid);
    [
        format!("🤖{}🤖\n", t("Welcome to Practice Chat!")),
        format!("{}\n\n", t("I'm your friendly Welcome Bot, here to assist you as you embark on your journey with us. We're thrilled to have you as a new user and look forward to supporting you every step of the way.")),
        format!("{}\n", t("At Practice Chat, we offer a range of powerful features designed to streamline your practice and enhance communication. Allow me to introduce you to two helpful bots that will make your experience even more efficient:")),
        format!("{}\n", t("Meet our Office Bot: It specializes in answering questions related to office procedures and protocols. For example, you can ask, \"What is our procedure for dealing with a difficult patient?\" or \"How do we handle insurance claims?\" The Office Bot is here to provide you with valuable insights and guidance.")),
        format!("{}\n\n", t("Introducing our Clinical Bot: It's trained to answer specific clinical questions and provide expert knowledge. For instance, you can ask, \"Do I need to pre-medicate a patient who had a joint replaced?\" or \"What's the normal HbA1c range for a diabetic patient?\" The Clinical Bot is equipped with vast information from dental textbooks, ADA journals, and more.")),
        format!("{}\n\n", getting_started(l10n, realm_uri, education)),
        format!("{}🌟\n", t("If you have any queries, need guidance, or simply want to say hello, just type your message, and I'll be here to assist you. Welcome once again, and let's make your experience with Practice Chat exceptional!")),
    ]
    .concat()
}

pub fn clinical_bot_content(l10n: &Localizer<'_>) -> String {
    let t = move |msgid: &'static str| l10n.gettext(msgid);
    [
        format!("🤖{}🤖\n", t("Clinical Bot Welcomes You!")),
        format!("{}\n\n", t("Greetings! I'm your Clinical Bot, equipped with a wealth of knowledge sourced from a vast array of dental textbooks, ADA journals, and various reputable resources. I'm here to assist you with any questions you may have regarding dental procedures, protocols, and patient care. It's a pleasure to meet you!")),
        format!("{}\n", t("If you're seeking guidance on specific dental scenarios or need information about best practices in dentistry, feel free to ask. With my extensive training, I can provide you with accurate and reliable information. Here are a few examples of questions you can ask me:")),
        format!("{}\n", t("\"Do I need to pre-medicate a patient who had a joint replaced?\"")),
        format!("{}\n", t("\"What's the recommended fluoride concentration for pediatric patients?\"")),
        format!("{}\n", t("\"What are the steps for performing a root canal treatment?\"")),
        format!("{}\n\n", t("Please remember that while I strive to offer comprehensive and up-to-date information, I am an AI language model and not a substitute for professional dental advice. For complex cases or personalized treatment plans, it's always advisable to consult a qualified dentist or dental professional.")),
        format!("{}\n\n", t("Rest assured that I'm here to support you in understanding dental procedures, interpreting guidelines, and exploring the latest research. Together, we can ensure the delivery of exceptional dental care to our patients.")),
        format!("{}🦷🌟\n", t("Welcome to Practice Chat! If you have any questions or need assistance, don't hesitate to ask. Just type in your queries, and I'll provide you with the information you need. Let's work together to promote dental health and provide the highest standard of care!")),
    ]
    .concat()
}

pub fn office_bot_content(l10n: &Localizer<'_>) -> String {
    let t = move |msgid: &'static str| l10n.gettext(msgid);
    [
        format!("🤖{}🤖\n", t("Office Bot Welcomes You!")),
        format!("{}\n\n", t("Hey there! I'm your Office Bot, here to assist you with all your questions regarding office procedures and protocols. It's a pleasure to meet you! Whether you're new to the office or just need a refresher, I'm here to provide you with the information you need.")),
        format!("{}\n", t("If you have any inquiries about our protocols or need guidance on specific office procedures, feel free to ask. I'm well-versed in a wide range of topics and can help you navigate through various situations. For instance, you can ask me questions like:")),
        format!("{}\n", t("\"What is our procedure for dealing with a difficult patient?\"")),
        format!("{}\n", t("\"How should I handle a scheduling conflict?\"")),
        format!("{}\n", t("\"What are the protocols for maintaining patient privacy and confidentiality?\"")),
        format!("{}\n\n", t("No matter what your question is, I'll do my best to provide you with accurate and up-to-date information. If there's something I can't assist with, I'll let you know and direct you to the appropriate resources or personnel.")),
        format!("{}\n\n", t("Remember, I'm here to support you and ensure a smooth experience in our office. Just type your questions, and I'll be ready to lend a virtual hand. Let's get started and make your time here as efficient and productive as possible!")),
        format!("{}🦷🌟\n", t("Once again, welcome to Practice Chat, and don't hesitate to reach out whenever you need assistance.")),
    ]
    .concat()
}

impl<P: Directory + Messaging> Onboarding<P> {
    /// Send the Welcome, Clinical and Office bot greetings to a new user, in
    /// the user's own language.
    #[instrument(skip_all, fields(user = user.id, realm = user.realm_id))]
    pub async fn send_initial_direct_message(&self, user: &UserProfile) -> Result<()> {
        let realm = self.platform.realm(user.realm_id).await?;
        let l10n = self.catalog.localizer(&user.default_language);
        let realm_uri = self.config.realm_uri(&realm);

        let welcome_bot = self
            .platform
            .system_bot(&self.config.bots.welcome_bot, realm.id)
            .await?;
        let content = welcome_bot_content(&l10n, &realm_uri, realm.org_type.is_education());
        self.platform
            .send_direct_message(&welcome_bot, user, &content, QUIET)
            .await?;

        let clinical_bot = self
            .platform
            .system_bot(&self.config.clinical_bot_email(&realm), realm.id)
            .await?;
        self.platform
            .send_direct_message(&clinical_bot, user, &clinical_bot_content(&l10n), QUIET)
            .await?;

        let office_bot = self
            .platform
            .system_bot(&self.config.office_bot_email(&realm), realm.id)
            .await?;
        self.platform
            .send_direct_message(&office_bot, user, &office_bot_content(&l10n), QUIET)
            .await?;

        info!(user = user.id, lang = %user.default_language, "initial direct messages sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;

    #[test]
    fn education_links_class_guide() {
        let l10n = Localizer::source();
        let content = welcome_bot_content(&l10n, "https://school.example.com", true);
        assert!(content.contains(
            "[Using Zulip for a class guide](https://school.example.com/help/using-zulip-for-a-class)"
        ));
        assert!(!content.contains("getting-started-with-zulip"));
    }

    #[test]
    fn other_orgs_link_getting_started() {
        let l10n = Localizer::source();
        let content = welcome_bot_content(&l10n, "https://clinic.example.com", false);
        assert!(content
            .contains("https://clinic.example.com/help/getting-started-with-zulip"));
        assert!(!content.contains("using-zulip-for-a-class"));
        assert!(content.starts_with("🤖Welcome to Practice Chat!🤖\n"));
    }

    #[test]
    fn translated_template_keeps_placeholder_substitution() {
        let mut catalog = Catalog::empty();
        catalog
            .insert_yaml(
                "de",
                "\"If you are new to Practice Chat, check out our [Getting started guide]({getting_started_url})!\": \"Neu hier? Lies die [Anleitung]({getting_started_url})!\"\n",
            )
            .unwrap();
        let l10n = catalog.localizer("de");
        assert_eq!(
            getting_started(&l10n, "https://x.example.com", false),
            "Neu hier? Lies die [Anleitung](https://x.example.com/help/getting-started-with-zulip)!"
        );
    }

    #[test]
    fn persona_messages_have_headers() {
        let l10n = Localizer::source();
        assert!(clinical_bot_content(&l10n).starts_with("🤖Clinical Bot Welcomes You!🤖\n"));
        assert!(office_bot_content(&l10n).ends_with("🦷🌟\n"));
    }
}
