// Giveaway commands: start, end early, reroll.

use crate::core::giveaways::{pick_reroll, GiveawayError, NewGiveaway};
use crate::discord::giveaway_runner::{active_embed, collect_entrants, finalize, giveaway_reaction};
use crate::discord::replies::{is_not_found, say_ephemeral};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

fn parse_message_id(raw: &str) -> Option<serenity::MessageId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::MessageId::new)
}

/// Start a giveaway.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_EVENTS")]
pub async fn gstart(
    ctx: Context<'_>,
    #[description = "Duration (e.g. 10m, 1h, 2d)"] duration: String,
    #[description = "Number of winners"] winners: u32,
    #[description = "Prize to win"] prize: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let now = chrono::Utc::now();

    let end_time = match ctx.data().giveaways.validate(&duration, winners, now) {
        Ok(end_time) => end_time,
        Err(e) => return say_ephemeral(ctx, e.to_string()).await,
    };

    say_ephemeral(ctx, "Giveaway started!").await?;

    let message = ctx
        .channel_id()
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new().embed(active_embed(&prize, winners, end_time.timestamp())),
        )
        .await?;
    message.react(ctx.http(), giveaway_reaction()).await?;

    ctx.data()
        .giveaways
        .create(
            NewGiveaway {
                message_id: message.id.get(),
                channel_id: ctx.channel_id().get(),
                guild_id: guild_id.get(),
                prize: &prize,
                duration: &duration,
                winners_count: winners,
            },
            now,
        )
        .await?;

    Ok(())
}

/// End a giveaway immediately.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_EVENTS")]
pub async fn gend(
    ctx: Context<'_>,
    #[description = "The message ID of the giveaway"] message_id: String,
) -> Result<(), Error> {
    let Some(message_id) = parse_message_id(&message_id) else {
        return say_ephemeral(ctx, "Invalid ID").await;
    };

    let giveaway = match ctx.data().giveaways.end(message_id.get()).await {
        Ok(giveaway) => giveaway,
        Err(GiveawayError::StorageError(e)) => return Err(e.into()),
        Err(_) => return say_ephemeral(ctx, "Giveaway not found or already ended.").await,
    };

    ctx.defer_ephemeral().await?;
    finalize(ctx.http(), &giveaway).await?;
    say_ephemeral(ctx, "Giveaway ended.").await
}

/// Reroll a giveaway winner.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_EVENTS")]
pub async fn greroll(
    ctx: Context<'_>,
    #[description = "The message ID of the giveaway"] message_id: String,
) -> Result<(), Error> {
    let Some(message_id) = parse_message_id(&message_id) else {
        return say_ephemeral(ctx, "Invalid ID").await;
    };

    let channel_id = ctx.channel_id();
    let message = match channel_id.message(ctx.http(), message_id).await {
        Ok(message) => message,
        Err(e) if is_not_found(&e) => {
            return say_ephemeral(ctx, "Giveaway message not found.").await
        }
        Err(e) => return Err(e.into()),
    };

    let has_reaction = message
        .reactions
        .iter()
        .any(|r| r.reaction_type == giveaway_reaction());
    if !has_reaction {
        return say_ephemeral(ctx, "No 🎉 reaction found on that message.").await;
    }

    let entrants = collect_entrants(ctx.http(), channel_id, message_id).await?;
    // The thread-local rng must not live across an await
    let winner = pick_reroll(&entrants, &mut rand::thread_rng());
    let Some(winner) = winner else {
        return say_ephemeral(ctx, "No valid entrants to reroll.").await;
    };

    ctx.say(format!("🎉 The new winner is <@{winner}>! Congratulations!"))
        .await?;
    Ok(())
}
