// Discord commands for the leveling system.
//
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result

use crate::discord::leveling_announcements::build_rank_embed;
use crate::discord::replies::say_ephemeral;
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// How many records `/leaderboard` shows.
const LEADERBOARD_SIZE: usize = 10;
/// How deep `/rank` looks for a member's position.
const RANK_SEARCH_DEPTH: usize = 1000;

/// Check your current level and XP.
#[poise::command(slash_command, guild_only)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "Member to check (defaults to you)"] member: Option<serenity::User>,
) -> Result<(), Error> {
    let target = member.as_ref().unwrap_or_else(|| ctx.author());
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let leveling = &ctx.data().leveling;
    let Some(record) = leveling.get_user_stats(target.id.get(), guild_id).await? else {
        return say_ephemeral(
            ctx,
            format!("{} has not earned any XP yet.", target.mention()),
        )
        .await;
    };

    let position = leveling
        .get_leaderboard(guild_id, RANK_SEARCH_DEPTH)
        .await?
        .iter()
        .position(|r| r.user_id == record.user_id)
        .map(|i| i + 1);

    ctx.send(poise::CreateReply::default().embed(build_rank_embed(target, &record, position)))
        .await?;
    Ok(())
}

/// Shows the top 10 users in the server.
#[poise::command(slash_command, guild_only)]
pub async fn leaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?;

    let records = ctx
        .data()
        .leveling
        .get_leaderboard(guild_id.get(), LEADERBOARD_SIZE)
        .await?;

    if records.is_empty() {
        return say_ephemeral(ctx, "No data found for this server.").await;
    }

    let guild_name = ctx
        .guild()
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "this server".to_string());

    let description = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            format!(
                "**{}.** <@{}> - Level {} ({} XP)",
                index + 1,
                record.user_id,
                record.level,
                record.xp
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title(format!("Leaderboard - {guild_name}"))
        .description(description)
        .color(serenity::Colour::GOLD);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Configure level-up role rewards.
#[poise::command(
    slash_command,
    subcommands("set", "list", "remove"),
    required_permissions = "ADMINISTRATOR",
    guild_only
)]
pub async fn setup_rewards(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Give a role to members who reach a level.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Level that unlocks the role"]
    #[min = 1]
    level: u32,
    #[description = "Role to award"] role: serenity::Role,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    ctx.data()
        .leveling
        .set_reward(guild_id.get(), level, role.id.get())
        .await?;

    say_ephemeral(
        ctx,
        format!("✅ Set **{}** for **Level {}**.", role.name, level),
    )
    .await
}

/// List the configured level rewards.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let rewards = ctx.data().leveling.list_rewards(guild_id.get()).await?;
    if rewards.is_empty() {
        return say_ephemeral(ctx, "No level rewards configured.").await;
    }

    let description = rewards
        .iter()
        .map(|r| format!("**Level {}**: <@&{}>", r.level, r.role_id))
        .collect::<Vec<_>>()
        .join("\n");

    let embed = serenity::CreateEmbed::new()
        .title("Level Rewards Config")
        .description(description)
        .color(serenity::Colour::GOLD);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Stop awarding a role for a level.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Level to clear"] level: u32,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let removed = ctx
        .data()
        .leveling
        .remove_reward(guild_id.get(), level)
        .await?;

    if removed {
        say_ephemeral(ctx, format!("✅ Removed the reward for **Level {level}**.")).await
    } else {
        say_ephemeral(ctx, format!("No reward is configured for **Level {level}**.")).await
    }
}
