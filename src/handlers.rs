//! Entry points wired to platform events: realm creation, account creation
//! and incoming direct messages.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::model::{Realm, SendMessageRequest, UserProfile};
use crate::onboarding::Onboarding;
use crate::platform::{Directory, Messaging, Provisioner, Transactional};

#[instrument(skip_all, fields(realm = realm.id))]
pub async fn on_realm_created<P>(onboarding: &Onboarding<P>, realm: &Realm) -> Result<()>
where
    P: Directory + Provisioner + Transactional,
{
    onboarding.platform.setup_realm_internal_bots(realm).await?;
    onboarding.send_initial_realm_messages(realm).await?;
    Ok(())
}

#[instrument(skip_all, fields(user = user.id))]
pub async fn on_user_created<P>(onboarding: &Onboarding<P>, user: &UserProfile) -> Result<()>
where
    P: Directory + Messaging,
{
    onboarding.send_initial_direct_message(user).await
}

/// Returns whether the Welcome Bot replied.
#[instrument(skip_all, fields(sender = request.sender.id, recipient = request.recipient.id))]
pub async fn on_direct_message<P>(
    onboarding: &Onboarding<P>,
    request: &SendMessageRequest,
) -> Result<bool>
where
    P: Directory + Messaging,
{
    let recipient = &request.recipient;
    let to_welcome_bot =
        recipient.is_bot && recipient.email == onboarding.config.bots.welcome_bot;
    if !to_welcome_bot || request.sender.is_bot {
        debug!("not a message to the welcome bot; ignoring");
        return Ok(false);
    }
    onboarding.send_welcome_bot_response(request).await?;
    Ok(true)
}
