// Gateway reactions -> role grants and removals.

use crate::core::reaction_roles::{ReactionRoleService, ReactionRoleStore};
use crate::discord::replies::is_forbidden;
use crate::discord::Error;
use poise::serenity_prelude as serenity;

/// Role bound to this reaction, if the reaction happened in a guild.
async fn bound_role<S: ReactionRoleStore>(
    reaction: &serenity::Reaction,
    reaction_roles: &ReactionRoleService<S>,
) -> Result<Option<(serenity::GuildId, serenity::RoleId)>, Error> {
    let Some(guild_id) = reaction.guild_id else {
        return Ok(None);
    };

    let role_id = reaction_roles
        .role_for(reaction.message_id.get(), &reaction.emoji.to_string())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    Ok(role_id.map(|id| (guild_id, serenity::RoleId::new(id))))
}

fn log_role_failure(action: &str, role_id: serenity::RoleId, err: &serenity::Error) {
    if is_forbidden(err) {
        tracing::warn!(role_id = role_id.get(), "Missing permission to {} reaction role", action);
    } else {
        tracing::error!(role_id = role_id.get(), "Failed to {} reaction role: {}", action, err);
    }
}

pub async fn handle_reaction_add<S: ReactionRoleStore>(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    reaction_roles: &ReactionRoleService<S>,
) -> Result<(), Error> {
    let Some(user_id) = reaction.user_id else {
        return Ok(());
    };
    let bot_id = ctx.cache.current_user().id;
    if user_id == bot_id {
        return Ok(());
    }
    if reaction.member.as_ref().is_some_and(|m| m.user.bot) {
        return Ok(());
    }

    let Some((guild_id, role_id)) = bound_role(reaction, reaction_roles).await? else {
        return Ok(());
    };

    if let Err(e) = ctx
        .http
        .add_member_role(guild_id, user_id, role_id, Some("Reaction role"))
        .await
    {
        log_role_failure("grant", role_id, &e);
    }
    Ok(())
}

pub async fn handle_reaction_remove<S: ReactionRoleStore>(
    ctx: &serenity::Context,
    reaction: &serenity::Reaction,
    reaction_roles: &ReactionRoleService<S>,
) -> Result<(), Error> {
    let Some(user_id) = reaction.user_id else {
        return Ok(());
    };
    let bot_id = ctx.cache.current_user().id;
    if user_id == bot_id {
        return Ok(());
    }

    let Some((guild_id, role_id)) = bound_role(reaction, reaction_roles).await? else {
        return Ok(());
    };

    if let Err(e) = ctx
        .http
        .remove_member_role(guild_id, user_id, role_id, Some("Reaction role"))
        .await
    {
        log_role_failure("revoke", role_id, &e);
    }
    Ok(())
}
