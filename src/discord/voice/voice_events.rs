// Voice state updates -> temporary channel creation and cleanup.

use crate::core::voice::TempChannel;
use crate::discord::replies::{cached_overwrites, is_not_found};
use crate::discord::voice_panel::{control_panel_components, control_panel_embed};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) -> Result<(), Error> {
    let Some(guild_id) = new.guild_id else {
        return Ok(());
    };

    let old_channel = old.and_then(|state| state.channel_id);
    let plan = data
        .voice
        .plan_update(
            guild_id.get(),
            old_channel.map(|c| c.get()),
            new.channel_id.map(|c| c.get()),
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if let Some(hub_id) = plan.create_from_hub {
        if let Err(e) =
            create_temp_channel(ctx, data, guild_id, new, serenity::ChannelId::new(hub_id)).await
        {
            tracing::error!(guild_id = guild_id.get(), "Error creating voice channel: {}", e);
        }
    }

    if let Some(channel_id) = plan.cleanup_candidate {
        cleanup_if_empty(ctx, data, guild_id, serenity::ChannelId::new(channel_id)).await?;
    }

    Ok(())
}

async fn create_temp_channel(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    state: &serenity::VoiceState,
    hub_id: serenity::ChannelId,
) -> Result<(), Error> {
    let user_id = state.user_id;
    let display_name = match &state.member {
        Some(member) => member.display_name().to_string(),
        None => user_id.to_user(ctx).await?.name,
    };

    let name = data
        .voice
        .channel_name_for(user_id.get(), &display_name)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    // New channel sits next to the hub and inherits its category's overwrites
    let category = ctx
        .cache
        .guild(guild_id)
        .and_then(|g| g.channels.get(&hub_id).and_then(|c| c.parent_id));
    let mut overwrites = category
        .and_then(|category| cached_overwrites(&ctx.cache, guild_id, category))
        .unwrap_or_default();
    overwrites.retain(|o| o.kind != serenity::PermissionOverwriteType::Member(user_id));
    overwrites.push(serenity::PermissionOverwrite {
        allow: serenity::Permissions::MANAGE_CHANNELS
            | serenity::Permissions::MOVE_MEMBERS
            | serenity::Permissions::CONNECT,
        deny: serenity::Permissions::empty(),
        kind: serenity::PermissionOverwriteType::Member(user_id),
    });

    let mut builder = serenity::CreateChannel::new(name)
        .kind(serenity::ChannelType::Voice)
        .permissions(overwrites);
    if let Some(category) = category {
        builder = builder.category(category);
    }

    let channel = guild_id.create_channel(&ctx.http, builder).await?;
    data.voice
        .register_temp_channel(TempChannel {
            channel_id: channel.id.get(),
            guild_id: guild_id.get(),
            owner_id: user_id.get(),
        })
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    if let Err(e) = guild_id.move_member(&ctx.http, user_id, channel.id).await {
        // The member left before the move; the empty channel goes away now
        tracing::warn!(user_id = user_id.get(), "Failed to move member: {}", e);
        cleanup_if_empty(ctx, data, guild_id, channel.id).await?;
        return Ok(());
    }

    channel
        .id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .embed(control_panel_embed(user_id))
                .components(control_panel_components()),
        )
        .await?;

    Ok(())
}

/// A temp channel stops being tracked once deleted. Already gone counts as
/// deleted; any other failure leaves it tracked.
fn should_forget(deleted: &Result<(), serenity::Error>) -> bool {
    match deleted {
        Ok(()) => true,
        Err(e) => is_not_found(e),
    }
}

/// Delete a temporary channel once nobody is connected to it.
async fn cleanup_if_empty(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> Result<(), Error> {
    let occupied = ctx.cache.guild(guild_id).is_some_and(|g| {
        g.voice_states
            .values()
            .any(|state| state.channel_id == Some(channel_id))
    });
    if occupied {
        return Ok(());
    }

    let deleted = channel_id.delete(&ctx.http).await.map(|_| ());
    if !should_forget(&deleted) {
        // Keep tracking it so the next leave event retries
        if let Err(e) = deleted {
            tracing::warn!(channel_id = channel_id.get(), "Error deleting channel: {}", e);
        }
        return Ok(());
    }

    data.voice
        .forget_temp_channel(channel_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_delete_keeps_channel_tracked() {
        assert!(should_forget(&Ok(())));
        assert!(!should_forget(&Err(serenity::Error::Other("gateway hiccup"))));
    }
}
