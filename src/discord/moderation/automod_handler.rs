// Discord-specific auto-moderation - translates core verdicts to Discord actions.

use std::time::Duration;

use crate::core::automod::{AutoModService, AutoModStore, InboundMessage, Violation};
use crate::discord::replies::member_is_admin;
use crate::discord::Error;
use poise::serenity_prelude::{self as serenity, Mentionable};

/// How long the channel warning stays up.
const WARNING_LIFETIME: Duration = Duration::from_secs(5);

/// Check a message against the guild's filters and remove it on a violation.
///
/// Returns `true` if the message was removed.
pub async fn handle_message_for_automod<S: AutoModStore>(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    automod: &AutoModService<S>,
) -> Result<bool, Error> {
    // Skip bots
    if msg.author.bot {
        return Ok(false);
    }

    // Only check guild messages
    let Some(guild_id) = msg.guild_id else {
        return Ok(false);
    };

    let role_ids: Vec<serenity::RoleId> = msg
        .member
        .as_ref()
        .map(|member| member.roles.clone())
        .unwrap_or_default();
    let author_roles: Vec<u64> = role_ids.iter().map(|r| r.get()).collect();
    let author_is_admin = member_is_admin(&ctx.cache, guild_id, msg.author.id, &role_ids);

    let inbound = InboundMessage {
        content: &msg.content,
        mention_count: msg.mentions.len(),
        author_roles: &author_roles,
        author_is_admin,
    };

    let violation = automod
        .check_message(guild_id.get(), &inbound)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let Some(violation) = violation else {
        return Ok(false);
    };

    apply_violation(ctx, msg, violation).await;
    Ok(true)
}

/// Delete the offending message and post a short-lived warning.
async fn apply_violation(ctx: &serenity::Context, msg: &serenity::Message, violation: Violation) {
    if let Err(e) = msg.delete(&ctx.http).await {
        tracing::warn!(
            message_id = msg.id.get(),
            %violation,
            "Failed to delete automod violation: {}",
            e
        );
        return;
    }

    tracing::info!(
        user_id = msg.author.id.get(),
        channel_id = msg.channel_id.get(),
        %violation,
        "Removed message"
    );

    let warning_text = format!("{}, {}", msg.author.mention(), violation.warning());
    let warning = match msg.channel_id.say(&ctx.http, warning_text).await {
        Ok(warning) => warning,
        Err(e) => {
            tracing::warn!("Failed to send automod warning: {}", e);
            return;
        }
    };

    let http = ctx.http.clone();
    tokio::spawn(async move {
        tokio::time::sleep(WARNING_LIFETIME).await;
        if let Err(e) = warning.delete(&http).await {
            tracing::debug!("Failed to delete automod warning: {}", e);
        }
    });
}
