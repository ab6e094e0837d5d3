use std::sync::Arc;

use crate::config::Config;
use crate::i18n::{Catalog, Localizer};

/// Onboarding flows bound to one host platform.
///
/// Operations live in `impl` blocks next to their content: bot checks in
/// [`crate::bots`], welcome messages in [`crate::welcome`], the Welcome Bot
/// responder in [`crate::responder`] and realm seeding in [`crate::seed`].
pub struct Onboarding<P> {
    pub(crate) platform: P,
    pub(crate) config: Arc<Config>,
    pub(crate) catalog: Arc<Catalog>,
}

impl<P> Onboarding<P> {
    pub fn new(platform: P, config: Arc<Config>, catalog: Arc<Catalog>) -> Self {
        Self {
            platform,
            config,
            catalog,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn localizer(&self, lang: &str) -> Localizer<'_> {
        self.catalog.localizer(lang)
    }
}
