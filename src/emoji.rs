//! Built-in unicode emoji names used when a realm has no custom emoji of the
//! requested name.

use std::collections::HashMap;

use once_cell::sync::Lazy;

static UNICODE_EMOJI: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("+1", "1f44d"),
        ("check", "2705"),
        ("eyes", "1f440"),
        ("heart", "2764"),
        ("octopus", "1f419"),
        ("robot", "1f916"),
        ("rocket", "1f680"),
        ("smile", "1f642"),
        ("star", "2b50"),
        ("tada", "1f389"),
        ("tooth", "1f9b7"),
        ("turtle", "1f422"),
        ("wave", "1f44b"),
    ])
});

/// Unicode codepoint (lowercase hex) for a built-in emoji name.
pub fn unicode_code(name: &str) -> Option<&'static str> {
    UNICODE_EMOJI.get(name).copied()
}
