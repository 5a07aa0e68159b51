// Small helpers shared by commands and event handlers.

use poise::serenity_prelude as serenity;

use crate::discord::{Context, Error};

/// Reply that only the invoking user can see.
pub async fn say_ephemeral(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Interaction response for buttons and modals, visible only to the clicker.
pub fn ephemeral_response(content: impl Into<String>) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    )
}

pub fn ephemeral_followup(content: impl Into<String>) -> serenity::CreateInteractionResponseFollowup {
    serenity::CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true)
}

/// Discord answered 403: the bot lacks a permission or the target sits above
/// the bot in the role hierarchy.
pub fn is_forbidden(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(resp))
            if resp.status_code.as_u16() == 403
    )
}

/// Discord answered 404: the message, channel or user is gone.
pub fn is_not_found(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(resp))
            if resp.status_code.as_u16() == 404
    )
}

/// Guild owner, or holder of a role (including @everyone) with Administrator.
/// Answers from the cache; an uncached guild counts as "not admin".
pub fn member_is_admin(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    roles: &[serenity::RoleId],
) -> bool {
    let Some(guild) = cache.guild(guild_id) else {
        return false;
    };

    if guild.owner_id == user_id {
        return true;
    }

    let everyone = serenity::RoleId::new(guild_id.get());
    roles
        .iter()
        .chain(std::iter::once(&everyone))
        .filter_map(|role_id| guild.roles.get(role_id))
        .any(|role| role.permissions.administrator())
}

/// Permission overwrites of a channel as currently cached.
pub fn cached_overwrites(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> Option<Vec<serenity::PermissionOverwrite>> {
    let guild = cache.guild(guild_id)?;
    guild
        .channels
        .get(&channel_id)
        .map(|channel| channel.permission_overwrites.clone())
}

/// Whether a channel still exists according to the cache.
pub fn channel_exists(
    cache: &serenity::Cache,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> bool {
    cache
        .guild(guild_id)
        .is_some_and(|guild| guild.channels.contains_key(&channel_id))
}

/// Text value of the input with `custom_id` in a submitted modal.
pub fn modal_value<'a>(
    modal: &'a serenity::ModalInteraction,
    custom_id: &str,
) -> Option<&'a str> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.as_deref()
            }
            _ => None,
        })
}
