//! Welcome Bot replies to direct messages.
//!
//! Replies are picked from a fixed table of commands and their aliases. The
//! lookup is case-insensitive and exact: no trimming, no partial matches.

use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::{debug, instrument};

use crate::i18n::Localizer;
use crate::model::{SendMessageRequest, SendOptions};
use crate::onboarding::Onboarding;
use crate::platform::{Directory, Messaging};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reply {
    Apps,
    Profile,
    Theme,
    Streams,
    Topics,
    MessageFormatting,
    KeyboardShortcuts,
    Help,
}

#[derive(Debug)]
pub struct Command {
    /// Name shown in the command list.
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub reply: Reply,
}

/// Ordered as listed to users.
pub static COMMANDS: &[Command] = &[
    Command { name: "apps", aliases: &["app", "apps"], reply: Reply::Apps },
    Command { name: "profile", aliases: &["profile"], reply: Reply::Profile },
    Command { name: "theme", aliases: &["theme"], reply: Reply::Theme },
    Command {
        name: "streams",
        aliases: &["stream", "streams", "channel", "channels"],
        reply: Reply::Streams,
    },
    Command { name: "topics", aliases: &["topic", "topics"], reply: Reply::Topics },
    Command {
        name: "message formatting",
        aliases: &["formatting", "message formatting"],
        reply: Reply::MessageFormatting,
    },
    Command {
        name: "keyboard shortcuts",
        aliases: &["keyboard", "shortcuts", "keyboard shortcuts"],
        reply: Reply::KeyboardShortcuts,
    },
    Command { name: "help", aliases: &["help", "?"], reply: Reply::Help },
];

static ALIASES: Lazy<HashMap<&'static str, Reply>> = Lazy::new(|| {
    COMMANDS
        .iter()
        .flat_map(|cmd| cmd.aliases.iter().map(move |alias| (*alias, cmd.reply)))
        .collect()
});

/// The reply for `text`, if it names a known command.
pub fn lookup(text: &str) -> Option<Reply> {
    ALIASES.get(text.to_lowercase().as_str()).copied()
}

/// Backticked, comma-separated list of commands, ending with a period.
pub fn bot_commands(no_help_command: bool) -> String {
    let names: Vec<String> = COMMANDS
        .iter()
        .filter(|cmd| !(no_help_command && cmd.reply == Reply::Help))
        .map(|cmd| format!("`{}`", cmd.name))
        .collect();
    format!("{}.", names.join(", "))
}

impl Reply {
    pub fn render(&self, l10n: &Localizer<'_>) -> String {
        let t = move |msgid: &'static str| l10n.gettext(msgid);
        match self {
            Reply::Apps => t("You can [download](/apps/) the [mobile and desktop apps](/apps/). Zulip also works great in a browser.").to_string(),
            Reply::Profile => t("Go to [Profile settings](#settings/profile) to add a [profile picture](/help/change-your-profile-picture) and edit your [profile information](/help/edit-your-profile).").to_string(),
            Reply::Theme => t("Go to [Display settings](#settings/display-settings) to [switch between the light and dark themes](/help/dark-theme), [pick your favorite emoji theme](/help/emoji-and-emoticons#change-your-emoji-set), [change your language](/help/change-your-language), and make other tweaks to your Zulip experience.").to_string(),
            Reply::Streams => format!(
                "{}\n\n{}",
                t("In Zulip, streams [determine who gets a message](/help/streams-and-topics). They are similar to channels in other chat apps."),
                t("[Browse and subscribe to streams](#streams/all)."),
            ),
            Reply::Topics => format!(
                "{}\n\n{}",
                t("In Zulip, topics [tell you what a message is about](/help/streams-and-topics). They are light-weight subjects, very similar to the subject line of an email."),
                t("Check out [Recent conversations](#recent) to see what's happening! You can return to this conversation by clicking \"Direct messages\" in the upper left."),
            ),
            Reply::KeyboardShortcuts => format!(
                "{}\n\n{}",
                t("Zulip's [keyboard shortcuts](#keyboard-shortcuts) let you navigate the app quickly and efficiently."),
                t("Press `?` any time to see a [cheat sheet](#keyboard-shortcuts)."),
            ),
            Reply::MessageFormatting => format!(
                "{}\n\n{}",
                t("Zulip uses [Markdown](/help/format-your-message-using-markdown), an intuitive format for **bold**, *italics*, bulleted lists, and more. Click [here](#message-formatting) for a cheat sheet."),
                t("Check out our [messaging tips](/help/messaging-tips) to learn about emoji reactions, code blocks and much more!"),
            ),
            Reply::Help => format!(
                "{} {}\n\n{}",
                t("Here are a few messages I understand:"),
                bot_commands(true),
                t("Check out our [Getting started guide](/help/getting-started-with-zulip), or browse the [Help center](/help/) to learn more!"),
            ),
        }
    }
}

/// Pick the Welcome Bot's answer to `text`. Unknown input gets the list of
/// commands.
pub fn select_welcome_bot_response(l10n: &Localizer<'_>, text: &str) -> String {
    match lookup(text) {
        Some(reply) => reply.render(l10n),
        None => format!(
            "{} {}",
            l10n.gettext("I’m sorry, I did not understand your message. Please try one of the following commands:"),
            bot_commands(false),
        ),
    }
}

impl<P: Directory + Messaging> Onboarding<P> {
    /// Answer a direct message sent to the Welcome Bot.
    #[instrument(skip_all, fields(sender = request.sender.id))]
    pub async fn send_welcome_bot_response(&self, request: &SendMessageRequest) -> Result<()> {
        let sender = &request.sender;
        let welcome_bot = self
            .platform
            .system_bot(&self.config.bots.welcome_bot, sender.realm_id)
            .await?;
        let human_response_lower = request.content.to_lowercase();
        let l10n = self.catalog.localizer(&sender.default_language);
        let content = select_welcome_bot_response(&l10n, &human_response_lower);
        debug!(matched = lookup(&human_response_lower).is_some(), "welcome bot reply selected");

        self.platform
            .send_direct_message(
                &welcome_bot,
                sender,
                &content,
                SendOptions {
                    disable_external_notifications: true,
                },
            )
            .await?;
        Ok(())
    }
}
