// Welcome configuration commands.

use crate::core::welcome::WelcomeError;
use crate::discord::replies::say_ephemeral;
use crate::discord::welcome_events::send_welcome;
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// Sets the channel for welcome messages.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn setwelcome(
    ctx: Context<'_>,
    #[description = "The channel to send welcome messages in"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .welcome
        .set_channel(guild_id.get(), channel.id.get())
        .await?;

    ctx.say(format!(
        "Welcome messages will now be sent to {}.",
        channel.mention()
    ))
    .await?;
    Ok(())
}

/// Sets the custom welcome message.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn setwelcomemsg(
    ctx: Context<'_>,
    #[description = "The message (use {user}, {server}, {member_count})"] message: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    match ctx.data().welcome.set_message(guild_id.get(), &message).await {
        Ok(()) => {
            ctx.say(format!("Welcome message set to:\n{message}")).await?;
            Ok(())
        }
        Err(WelcomeError::StorageError(e)) => Err(e.into()),
        Err(e) => say_ephemeral(ctx, e.to_string()).await,
    }
}

/// Tests the welcome message.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn testwelcome(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let sent = send_welcome(
        ctx.serenity_context(),
        ctx.data(),
        guild_id,
        ctx.author(),
    )
    .await?;

    if sent {
        say_ephemeral(ctx, "Sending test welcome message...").await
    } else {
        say_ephemeral(ctx, WelcomeError::ChannelNotSet.to_string()).await
    }
}
