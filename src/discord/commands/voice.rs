// Join-to-create voice commands.

use crate::core::voice::VoiceError;
use crate::discord::replies::say_ephemeral;
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// Setup the Join to Create channel.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn voice_setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let category = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new("Voice Channels").kind(serenity::ChannelType::Category),
        )
        .await?;
    let hub = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new("Join to Create")
                .kind(serenity::ChannelType::Voice)
                .category(category.id),
        )
        .await?;

    ctx.data()
        .voice
        .set_hub(guild_id.get(), hub.id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!(
        "Setup complete! Join {} to create a temporary voice channel.",
        hub.mention()
    ))
    .await?;
    Ok(())
}

/// Set your default temporary channel name.
#[poise::command(slash_command, guild_only)]
pub async fn voice_setname(
    ctx: Context<'_>,
    #[description = "The name for your channel (use {user} for your username)"] name: String,
) -> Result<(), Error> {
    match ctx
        .data()
        .voice
        .set_name_template(ctx.author().id.get(), &name)
        .await
    {
        Ok(name) => {
            say_ephemeral(
                ctx,
                format!("Your default channel name has been set to: `{name}`"),
            )
            .await
        }
        Err(VoiceError::StorageError(e)) => Err(e.into()),
        Err(e) => say_ephemeral(ctx, e.to_string()).await,
    }
}
