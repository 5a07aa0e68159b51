// Reaction role commands.

use std::collections::HashSet;

use crate::core::reaction_roles::{render_listing, ReactionRoleError};
use crate::discord::replies::say_ephemeral;
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

fn parse_message_id(raw: &str) -> Option<serenity::MessageId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::MessageId::new)
}

/// Add a reaction role to a message.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn rr_add(
    ctx: Context<'_>,
    #[description = "ID of a message in this channel"] message_id: String,
    #[description = "Role to give"] role: serenity::Role,
    #[description = "Emoji to react with"] emoji: String,
) -> Result<(), Error> {
    let channel_id = ctx.channel_id();
    let message = match parse_message_id(&message_id) {
        Some(id) => channel_id.message(ctx.http(), id).await.ok(),
        None => None,
    };
    let Some(message) = message else {
        return say_ephemeral(ctx, "Invalid message ID or I cannot read that message.").await;
    };

    let reaction = match serenity::ReactionType::try_from(emoji.trim()) {
        Ok(reaction) => reaction,
        Err(_) => {
            return say_ephemeral(
                ctx,
                "Failed to add reaction. Is the emoji valid and do I have permission?",
            )
            .await
        }
    };
    // Store the emoji the way gateway events will report it
    let emoji_key = reaction.to_string();

    let reaction_roles = &ctx.data().reaction_roles;
    match reaction_roles
        .bind(message.id.get(), &emoji_key, role.id.get(), channel_id.get())
        .await
    {
        Ok(_) => {}
        Err(ReactionRoleError::StorageError(e)) => return Err(e.into()),
        Err(e) => return say_ephemeral(ctx, e.to_string()).await,
    }

    if let Err(e) = message.react(ctx.http(), reaction).await {
        tracing::warn!(message_id = message.id.get(), "Failed to add reaction: {}", e);
        reaction_roles.unbind(message.id.get(), &emoji_key).await?;
        return say_ephemeral(
            ctx,
            "Failed to add reaction. Is the emoji valid and do I have permission?",
        )
        .await;
    }

    say_ephemeral(
        ctx,
        format!("✅ Added reaction role: {} -> {}", emoji_key, role.mention()),
    )
    .await
}

/// Remove a reaction role from a message.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn rr_remove(
    ctx: Context<'_>,
    #[description = "ID of the message"] message_id: String,
    #[description = "Emoji of the reaction role"] emoji: String,
) -> Result<(), Error> {
    let Some(message_id) = parse_message_id(&message_id) else {
        return say_ephemeral(ctx, "No reaction role found for that message and emoji.").await;
    };

    let reaction = serenity::ReactionType::try_from(emoji.trim()).ok();
    let emoji_key = reaction
        .as_ref()
        .map(|r| r.to_string())
        .unwrap_or_else(|| emoji.trim().to_string());

    match ctx
        .data()
        .reaction_roles
        .unbind(message_id.get(), &emoji_key)
        .await
    {
        Ok(()) => {}
        Err(ReactionRoleError::StorageError(e)) => return Err(e.into()),
        Err(e) => return say_ephemeral(ctx, e.to_string()).await,
    }

    // Clearing the bot's reaction is best effort
    if let Some(reaction) = reaction {
        if let Err(e) = ctx
            .channel_id()
            .delete_reaction_emoji(ctx.http(), message_id, reaction)
            .await
        {
            tracing::debug!("Failed to clear reaction: {}", e);
        }
    }

    say_ephemeral(ctx, format!("Removed reaction role for {emoji_key}.")).await
}

/// List active reaction roles for this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn rr_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let bindings = ctx
        .data()
        .reaction_roles
        .list_for_channel(ctx.channel_id().get())
        .await?;

    if bindings.is_empty() {
        return say_ephemeral(ctx, "No reaction roles set up for this channel.").await;
    }

    let existing_roles: HashSet<u64> = ctx
        .guild()
        .map(|g| g.roles.keys().map(|r| r.get()).collect())
        .unwrap_or_default();

    let listing = render_listing(guild_id.get(), &bindings, |role_id| {
        if existing_roles.contains(&role_id) {
            format!("<@&{role_id}>")
        } else {
            format!("Deleted Role ({role_id})")
        }
    });

    say_ephemeral(ctx, listing).await
}
