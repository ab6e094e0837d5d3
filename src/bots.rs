//! Detection and repair of missing per-realm internal bots.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{info, instrument};

use crate::onboarding::Onboarding;
use crate::platform::{Directory, Provisioner};

/// Emails whose account count differs from the realm count, in input order.
///
/// A bot present in some realms but not others counts as missing, the same as
/// a bot present nowhere.
pub fn missing_bot_emails<'a>(
    bot_emails: &'a [String],
    counts: &HashMap<String, i64>,
    realm_count: i64,
) -> Vec<&'a str> {
    bot_emails
        .iter()
        .filter(|email| counts.get(email.as_str()).copied().unwrap_or(0) != realm_count)
        .map(String::as_str)
        .collect()
}

impl<P: Directory + Provisioner> Onboarding<P> {
    #[instrument(skip_all)]
    pub async fn missing_any_realm_internal_bots(&self) -> Result<bool> {
        let bot_emails = self.config.internal_bot_emails();
        let realm_count = self.platform.realm_count().await?;
        let counts = self.platform.account_counts_by_email(&bot_emails).await?;
        let missing = missing_bot_emails(&bot_emails, &counts, realm_count);
        if !missing.is_empty() {
            info!(realm_count, ?missing, "internal bots missing");
        }
        Ok(!missing.is_empty())
    }

    /// Re-run provisioning for every realm if any internal bot is missing.
    #[instrument(skip_all)]
    pub async fn create_if_missing_realm_internal_bots(&self) -> Result<()> {
        if !self.missing_any_realm_internal_bots().await? {
            return Ok(());
        }
        for realm in self.platform.all_realms().await? {
            self.platform.setup_realm_internal_bots(&realm).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emails() -> Vec<String> {
        vec!["welcome-bot@zulip.com".into(), "notification-bot@zulip.com".into()]
    }

    #[test]
    fn fully_provisioned() {
        let counts = HashMap::from([
            ("welcome-bot@zulip.com".to_string(), 3),
            ("notification-bot@zulip.com".to_string(), 3),
        ]);
        assert!(missing_bot_emails(&emails(), &counts, 3).is_empty());
    }

    #[test]
    fn partially_provisioned_counts_as_missing() {
        let counts = HashMap::from([
            ("welcome-bot@zulip.com".to_string(), 3),
            ("notification-bot@zulip.com".to_string(), 2),
        ]);
        assert_eq!(
            missing_bot_emails(&emails(), &counts, 3),
            vec!["notification-bot@zulip.com"]
        );
    }

    #[test]
    fn absent_everywhere_counts_as_missing() {
        let counts = HashMap::from([("welcome-bot@zulip.com".to_string(), 1)]);
        assert_eq!(
            missing_bot_emails(&emails(), &counts, 1),
            vec!["notification-bot@zulip.com"]
        );
    }

    #[test]
    fn no_realms_means_nothing_missing() {
        assert!(missing_bot_emails(&emails(), &HashMap::new(), 0).is_empty());
    }
}
