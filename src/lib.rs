//! Onboarding content for Practice Chat: internal bot repair, welcome direct
//! messages, the Welcome Bot responder and realm seed messages.

pub mod bots;
pub mod config;
pub mod db;
pub mod emoji;
pub mod handlers;
pub mod i18n;
pub mod model;
pub mod platform;
pub mod responder;
pub mod seed;
pub mod welcome;

mod onboarding;

pub use onboarding::Onboarding;
pub use responder::{bot_commands, select_welcome_bot_response};
