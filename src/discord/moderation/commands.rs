// Moderation slash commands: member discipline and channel controls.

use crate::discord::replies::{cached_overwrites, is_forbidden, is_not_found, say_ephemeral};
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// Discord caps a timeout at 28 days.
const MAX_TIMEOUT_MINUTES: u32 = 28 * 24 * 60;
/// Highest slowmode Discord accepts (6 hours).
const MAX_SLOWMODE_SECS: u16 = 21_600;
/// Bulk delete refuses messages older than this.
const BULK_DELETE_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;

/// Reply with `success`, or explain a missing bot permission ephemerally.
/// Any other Discord error bubbles up to the framework error handler.
async fn report(
    ctx: Context<'_>,
    result: Result<(), serenity::Error>,
    success: String,
    forbidden: &str,
) -> Result<(), Error> {
    match result {
        Ok(()) => {
            ctx.say(success).await?;
            Ok(())
        }
        Err(e) if is_forbidden(&e) => say_ephemeral(ctx, forbidden).await,
        Err(e) => Err(e.into()),
    }
}

fn reason_text(reason: &Option<String>) -> &str {
    reason.as_deref().unwrap_or("No reason provided")
}

/// Kicks a member from the server.
#[poise::command(slash_command, guild_only, required_permissions = "KICK_MEMBERS")]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "The member to kick"] member: serenity::User,
    #[description = "The reason for kicking"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    if member.id == ctx.author().id {
        return say_ephemeral(ctx, "You cannot kick yourself.").await;
    }

    let result = match &reason {
        Some(reason) => guild_id.kick_with_reason(ctx.http(), member.id, reason).await,
        None => guild_id.kick(ctx.http(), member.id).await,
    };

    report(
        ctx,
        result,
        format!("Kicked {} for reason: {}", member.mention(), reason_text(&reason)),
        "I do not have permission to kick this user.",
    )
    .await
}

/// Bans a member from the server.
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "The member to ban"] member: serenity::User,
    #[description = "The reason for banning"] reason: Option<String>,
    #[description = "Days of their messages to delete (0-7)"]
    #[max = 7]
    delete_message_days: Option<u8>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    if member.id == ctx.author().id {
        return say_ephemeral(ctx, "You cannot ban yourself.").await;
    }

    let days = delete_message_days.unwrap_or(0);
    let result = match &reason {
        Some(reason) => {
            guild_id
                .ban_with_reason(ctx.http(), member.id, days, reason)
                .await
        }
        None => guild_id.ban(ctx.http(), member.id, days).await,
    };

    report(
        ctx,
        result,
        format!("Banned {} for reason: {}", member.mention(), reason_text(&reason)),
        "I do not have permission to ban this user.",
    )
    .await
}

/// Unbans a user by ID.
#[poise::command(slash_command, guild_only, required_permissions = "BAN_MEMBERS")]
pub async fn unban(
    ctx: Context<'_>,
    #[description = "The ID of the user to unban"] user_id: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let Ok(user_id) = user_id.trim().parse::<u64>() else {
        return say_ephemeral(ctx, "User not found.").await;
    };
    if user_id == 0 {
        return say_ephemeral(ctx, "User not found.").await;
    }
    let user_id = serenity::UserId::new(user_id);

    match guild_id.unban(ctx.http(), user_id).await {
        Ok(()) => {
            ctx.say(format!("Unbanned {}.", user_id.mention())).await?;
            Ok(())
        }
        Err(e) if is_not_found(&e) => say_ephemeral(ctx, "User not found.").await,
        Err(e) if is_forbidden(&e) => {
            say_ephemeral(ctx, "I do not have permission to unban users.").await
        }
        Err(e) => Err(e.into()),
    }
}

/// Timeouts a member.
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "The member to timeout"] member: serenity::User,
    #[description = "Duration in minutes"]
    #[min = 1]
    #[max = 40320]
    duration: u32,
    #[description = "Reason for timeout"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    if member.id == ctx.author().id {
        return say_ephemeral(ctx, "You cannot timeout yourself.").await;
    }
    if duration == 0 || duration > MAX_TIMEOUT_MINUTES {
        return say_ephemeral(ctx, "Duration must be between 1 and 40320 minutes.").await;
    }

    let until = serenity::Timestamp::from_unix_timestamp(
        chrono::Utc::now().timestamp() + i64::from(duration) * 60,
    )
    .map_err(|e| Error::from(e.to_string()))?;

    let mut edit = serenity::EditMember::new().disable_communication_until_datetime(until);
    if let Some(reason) = &reason {
        edit = edit.audit_log_reason(reason);
    }

    let result = guild_id
        .edit_member(ctx.http(), member.id, edit)
        .await
        .map(|_| ());

    report(
        ctx,
        result,
        format!(
            "Timed out {} for {} minutes. Reason: {}",
            member.mention(),
            duration,
            reason_text(&reason)
        ),
        "I do not have permission to timeout this user.",
    )
    .await
}

/// Removes timeout from a member.
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn untimeout(
    ctx: Context<'_>,
    #[description = "The member to untimeout"] member: serenity::User,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = guild_id
        .edit_member(
            ctx.http(),
            member.id,
            serenity::EditMember::new().enable_communication(),
        )
        .await
        .map(|_| ());

    report(
        ctx,
        result,
        format!("Removed timeout from {}.", member.mention()),
        "I do not have permission to moderate this user.",
    )
    .await
}

/// Clears a specified number of messages.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "The number of messages to clear"]
    #[min = 1]
    #[max = 100]
    amount: u8,
) -> Result<(), Error> {
    if amount < 1 {
        return say_ephemeral(ctx, "Amount must be at least 1.").await;
    }
    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    let cutoff = chrono::Utc::now().timestamp() - BULK_DELETE_MAX_AGE_SECS;
    let ids: Vec<serenity::MessageId> = channel_id
        .messages(ctx.http(), serenity::GetMessages::new().limit(amount.min(100)))
        .await?
        .into_iter()
        .filter(|m| m.timestamp.unix_timestamp() > cutoff)
        .map(|m| m.id)
        .collect();

    let result = match ids.as_slice() {
        [] => Ok(()),
        [single] => channel_id.delete_message(ctx.http(), *single).await,
        many => channel_id.delete_messages(ctx.http(), many).await,
    };

    match result {
        Ok(()) => {
            say_ephemeral(ctx, format!("Deleted {} messages.", ids.len())).await
        }
        Err(e) if is_forbidden(&e) => {
            say_ephemeral(ctx, "I do not have permission to manage messages.").await
        }
        Err(e) => Err(e.into()),
    }
}

/// Set or clear the @everyone send-messages overwrite on the current channel.
async fn set_channel_lock(ctx: Context<'_>, locked: bool) -> Result<(), serenity::Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(());
    };
    let channel_id = ctx.channel_id();
    let everyone = serenity::RoleId::new(guild_id.get());

    let current = cached_overwrites(&ctx.serenity_context().cache, guild_id, channel_id)
        .unwrap_or_default()
        .into_iter()
        .find(|o| o.kind == serenity::PermissionOverwriteType::Role(everyone));
    let (mut allow, mut deny) = current
        .map(|o| (o.allow, o.deny))
        .unwrap_or((serenity::Permissions::empty(), serenity::Permissions::empty()));

    if locked {
        allow.remove(serenity::Permissions::SEND_MESSAGES);
        deny.insert(serenity::Permissions::SEND_MESSAGES);
    } else {
        deny.remove(serenity::Permissions::SEND_MESSAGES);
        allow.insert(serenity::Permissions::SEND_MESSAGES);
    }

    channel_id
        .create_permission(
            ctx.http(),
            serenity::PermissionOverwrite {
                allow,
                deny,
                kind: serenity::PermissionOverwriteType::Role(everyone),
            },
        )
        .await
}

/// Locks the current channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn lock(ctx: Context<'_>) -> Result<(), Error> {
    let result = set_channel_lock(ctx, true).await;
    report(
        ctx,
        result,
        "Channel locked. 🔒".to_string(),
        "I do not have permission to manage channels.",
    )
    .await
}

/// Unlocks the current channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn unlock(ctx: Context<'_>) -> Result<(), Error> {
    let result = set_channel_lock(ctx, false).await;
    report(
        ctx,
        result,
        "Channel unlocked. 🔓".to_string(),
        "I do not have permission to manage channels.",
    )
    .await
}

/// Sets the slowmode delay for the channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn slowmode(
    ctx: Context<'_>,
    #[description = "Seconds for slowmode (0 to disable)"] seconds: u32,
) -> Result<(), Error> {
    let Ok(seconds) = u16::try_from(seconds) else {
        return say_ephemeral(ctx, "Slowmode must be between 0 and 21600 seconds.").await;
    };
    if seconds > MAX_SLOWMODE_SECS {
        return say_ephemeral(ctx, "Slowmode must be between 0 and 21600 seconds.").await;
    }

    let result = ctx
        .channel_id()
        .edit(
            ctx.http(),
            serenity::EditChannel::new().rate_limit_per_user(seconds),
        )
        .await
        .map(|_| ());

    let success = if seconds == 0 {
        "Slowmode disabled.".to_string()
    } else {
        format!("Slowmode set to {seconds} seconds.")
    };
    report(
        ctx,
        result,
        success,
        "I do not have permission to manage channels.",
    )
    .await
}

/// Changes a member's nickname.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_NICKNAMES")]
pub async fn setnick(
    ctx: Context<'_>,
    #[description = "The member to change nickname"] member: serenity::User,
    #[description = "The new nickname"] nickname: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = guild_id
        .edit_member(
            ctx.http(),
            member.id,
            serenity::EditMember::new().nickname(&nickname),
        )
        .await
        .map(|_| ());

    report(
        ctx,
        result,
        format!("Changed nickname for {} to {}.", member.mention(), nickname),
        "I do not have permission to manage nicknames.",
    )
    .await
}

/// Adds a role to a member.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn addrole(
    ctx: Context<'_>,
    #[description = "The member to add role to"] member: serenity::User,
    #[description = "The role to add"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = ctx
        .http()
        .add_member_role(guild_id, member.id, role.id, None)
        .await;

    report(
        ctx,
        result,
        format!("Added {} to {}.", role.mention(), member.mention()),
        "I do not have permission to manage roles.",
    )
    .await
}

/// Removes a role from a member.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_ROLES")]
pub async fn removerole(
    ctx: Context<'_>,
    #[description = "The member to remove role from"] member: serenity::User,
    #[description = "The role to remove"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let result = ctx
        .http()
        .remove_member_role(guild_id, member.id, role.id, None)
        .await;

    report(
        ctx,
        result,
        format!("Removed {} from {}.", role.mention(), member.mention()),
        "I do not have permission to manage roles.",
    )
    .await
}
