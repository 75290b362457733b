use campus_notify_domain::{NotificationPreferences, ID};
use campus_notify_infra::Context;

/// Maps a list of user ids to the push tokens that should actually
/// receive a notification. Users without a registered device, with a
/// blank token or with the relevant preference switched off are
/// filtered out quietly.
pub async fn resolve_recipient_tokens<F>(
    user_ids: &[ID],
    ctx: &Context,
    opted_in: F,
) -> anyhow::Result<Vec<String>>
where
    F: Fn(&NotificationPreferences) -> bool,
{
    let devices = ctx.repos.devices.find_many(user_ids).await?;
    Ok(devices
        .into_iter()
        .filter(|d| d.has_token() && opted_in(&d.preferences))
        .map(|d| d.token)
        .collect())
}
