use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Replies with Pong!
#[poise::command(slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say("Pong!").await?;
    Ok(())
}

/// Shows information about the bot.
#[poise::command(slash_command)]
pub async fn info(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    let embed = build_info_embed(ctx.serenity_context(), latency).await;
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Gateway latency reads as zero until the first heartbeat is acknowledged.
fn format_latency(latency: std::time::Duration) -> String {
    if latency.is_zero() {
        "N/A".to_string()
    } else {
        format!("{}ms", latency.as_millis())
    }
}

pub async fn build_info_embed(
    ctx: &serenity::Context,
    latency: std::time::Duration,
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title("Bot Information")
        .description("A comprehensive server bot.")
        .color(0x5865F2)
        .field("Ping", format_latency(latency), true)
        .field("Servers", ctx.cache.guild_count().to_string(), true)
        .timestamp(serenity::Timestamp::now());

    // Set thumbnail to bot avatar
    let avatar_url = ctx.cache.current_user().avatar_url();
    if let Some(avatar_url) = avatar_url {
        embed = embed.thumbnail(avatar_url);
    }

    embed
}
