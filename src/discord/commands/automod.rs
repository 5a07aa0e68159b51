// Auto-moderation slash commands for configuration.

use crate::core::automod::{AutoModError, LimitFeature, ToggleFeature};
use crate::discord::replies::say_ephemeral;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum ToggleChoice {
    #[name = "Anti-Invite"]
    AntiInvite,
    #[name = "Anti-Links"]
    AntiLinks,
    #[name = "Anti-Caps"]
    AntiCaps,
}

impl From<ToggleChoice> for ToggleFeature {
    fn from(choice: ToggleChoice) -> Self {
        match choice {
            ToggleChoice::AntiInvite => ToggleFeature::AntiInvite,
            ToggleChoice::AntiLinks => ToggleFeature::AntiLinks,
            ToggleChoice::AntiCaps => ToggleFeature::AntiCaps,
        }
    }
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum LimitChoice {
    #[name = "Max Mentions"]
    MaxMentions,
    #[name = "Max Emojis"]
    MaxEmojis,
}

impl From<LimitChoice> for LimitFeature {
    fn from(choice: LimitChoice) -> Self {
        match choice {
            LimitChoice::MaxMentions => LimitFeature::MaxMentions,
            LimitChoice::MaxEmojis => LimitFeature::MaxEmojis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ListAction {
    Add,
    Remove,
    List,
}

/// Auto-moderation configuration commands.
///
/// Configure the message filters for your server.
#[poise::command(
    slash_command,
    subcommands("setup", "toggle", "limits", "badwords", "exempt"),
    required_permissions = "ADMINISTRATOR",
    guild_only
)]
pub async fn automod(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - shows help
    Ok(())
}

fn check_mark(enabled: bool) -> &'static str {
    if enabled {
        "✅"
    } else {
        "❌"
    }
}

/// Show the current auto-moderation configuration.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let settings = ctx
        .data()
        .automod
        .get_settings(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let status = format!(
        "**Anti-Invite:** {}\n**Anti-Link:** {}\n**Anti-Caps:** {}\n**Max Mentions:** {}\n**Max Emojis:** {}\n**Bad Words:** {} words\n**Exempt Roles:** {} roles",
        check_mark(settings.anti_invite),
        check_mark(settings.anti_links),
        check_mark(settings.anti_caps),
        settings.max_mentions,
        settings.max_emojis,
        settings.bad_words.len(),
        settings.exempt_roles.len(),
    );

    let embed = serenity::CreateEmbed::new()
        .title("🛡️ Auto-Moderation Setup")
        .description(
            "Use the following commands to configure AutoMod:\n\n\
             • `/automod toggle <feature>` - Enable/Disable filters\n\
             • `/automod limits <feature> <number>` - Set numeric limits\n\
             • `/automod badwords <action> <word>` - Manage bad words\n\
             • `/automod exempt <action> <role>` - Manage exempt roles",
        )
        .color(0x3498DB)
        .field("Current Configuration", status, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Enable or disable a filter.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn toggle(
    ctx: Context<'_>,
    #[description = "Filter to toggle"] feature: ToggleChoice,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let feature = ToggleFeature::from(feature);

    let enabled = ctx
        .data()
        .automod
        .toggle(guild_id.get(), feature)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let status = if enabled { "enabled" } else { "disabled" };
    ctx.say(format!("✅ **{}** has been **{}**.", feature.label(), status))
        .await?;
    Ok(())
}

/// Set the mention or emoji limit (0 turns the check off).
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn limits(
    ctx: Context<'_>,
    #[description = "Limit to change"] feature: LimitChoice,
    #[description = "Maximum per message (0 to disable)"] limit: u32,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let feature = LimitFeature::from(feature);

    ctx.data()
        .automod
        .set_limit(guild_id.get(), feature, limit)
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    ctx.say(format!("✅ **{}** limit set to **{}**.", feature.label(), limit))
        .await?;
    Ok(())
}

/// Manage banned words.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn badwords(
    ctx: Context<'_>,
    #[description = "What to do"] action: ListAction,
    #[description = "The word (for add/remove)"] word: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let automod = &ctx.data().automod;

    if action == ListAction::List {
        let settings = automod
            .get_settings(guild_id)
            .await
            .map_err(|e| Error::from(e.to_string()))?;
        if settings.bad_words.is_empty() {
            return say_ephemeral(ctx, "No bad words configured.").await;
        }
        return say_ephemeral(
            ctx,
            format!("🚫 **Banned Words:** {}", settings.bad_words.join(", ")),
        )
        .await;
    }

    let word = word.unwrap_or_default();
    let result = match action {
        ListAction::Add => automod.add_bad_word(guild_id, &word).await,
        _ => automod.remove_bad_word(guild_id, &word).await,
    };

    match result {
        Ok(word) if action == ListAction::Add => {
            ctx.say(format!("✅ Added **'{word}'** to banned words."))
                .await?;
        }
        Ok(word) => {
            ctx.say(format!("✅ Removed **'{word}'** from banned words."))
                .await?;
        }
        Err(AutoModError::StorageError(e)) => return Err(e.into()),
        Err(e) => return say_ephemeral(ctx, e.to_string()).await,
    }
    Ok(())
}

/// Manage roles that bypass every filter.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn exempt(
    ctx: Context<'_>,
    #[description = "What to do"] action: ListAction,
    #[description = "The role (for add/remove)"] role: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?.get();
    let automod = &ctx.data().automod;

    if action == ListAction::List {
        let settings = automod
            .get_settings(guild_id)
            .await
            .map_err(|e| Error::from(e.to_string()))?;
        if settings.exempt_roles.is_empty() {
            return say_ephemeral(ctx, "No roles are exempt.").await;
        }
        let roles: Vec<String> = settings
            .exempt_roles
            .iter()
            .map(|id| format!("<@&{id}>"))
            .collect();
        return say_ephemeral(ctx, format!("🛡️ **Exempt Roles:** {}", roles.join(", "))).await;
    }

    let Some(role) = role else {
        return say_ephemeral(ctx, "Please specify a role.").await;
    };

    let result = match action {
        ListAction::Add => automod.add_exempt_role(guild_id, role.id.get()).await,
        _ => automod.remove_exempt_role(guild_id, role.id.get()).await,
    };

    match result {
        Ok(()) if action == ListAction::Add => {
            ctx.say(format!("✅ Exempted <@&{}> from AutoMod.", role.id))
                .await?;
        }
        Ok(()) => {
            ctx.say(format!("✅ Removed exemption for <@&{}>.", role.id))
                .await?;
        }
        Err(AutoModError::StorageError(e)) => return Err(e.into()),
        Err(e) => return say_ephemeral(ctx, e.to_string()).await,
    }
    Ok(())
}
