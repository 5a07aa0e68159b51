use crate::core::leveling::{LevelRecord, LevelUpEvent};
use crate::discord::replies::is_forbidden;
use poise::serenity_prelude::{self as serenity, builder::CreateMessage};
use rand::seq::SliceRandom;

/// Announce a level-up in the channel where it happened and hand out the
/// level's reward role, if one is configured.
pub async fn send_level_up_embed(
    ctx: &serenity::Context,
    message: &serenity::Message,
    level_up: &LevelUpEvent,
) -> Result<(), serenity::Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Level Up!")
        .description(format!(
            "🎉 <@{}> has leveled up to **Level {}**!",
            level_up.user_id, level_up.new_level
        ))
        .color(level_color(level_up.new_level))
        .footer(serenity::CreateEmbedFooter::new(random_flavor_line()));

    message
        .channel_id
        .send_message(ctx, CreateMessage::new().embed(embed))
        .await?;

    if let Some(role_id) = level_up.reward_role_id {
        grant_reward_role(ctx, message, level_up, serenity::RoleId::new(role_id)).await?;
    }

    Ok(())
}

/// Give the reward role. A role the bot may not assign (or that was deleted)
/// is logged and skipped.
async fn grant_reward_role(
    ctx: &serenity::Context,
    message: &serenity::Message,
    level_up: &LevelUpEvent,
    role_id: serenity::RoleId,
) -> Result<(), serenity::Error> {
    let guild_id = serenity::GuildId::new(level_up.guild_id);
    let user_id = serenity::UserId::new(level_up.user_id);

    let role_name = ctx
        .cache
        .guild(guild_id)
        .and_then(|g| g.roles.get(&role_id).map(|r| r.name.clone()));
    let Some(role_name) = role_name else {
        tracing::warn!(
            guild_id = level_up.guild_id,
            role_id = role_id.get(),
            "Level reward role no longer exists"
        );
        return Ok(());
    };

    match ctx
        .http
        .add_member_role(guild_id, user_id, role_id, Some("Level reward"))
        .await
    {
        Ok(()) => {}
        Err(e) if is_forbidden(&e) => {
            tracing::warn!(
                guild_id = level_up.guild_id,
                role_id = role_id.get(),
                "Missing permission to grant level reward"
            );
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    message
        .channel_id
        .say(
            &ctx.http,
            format!("🏆 You have been awarded the **{role_name}** role!"),
        )
        .await?;
    Ok(())
}

/// Embed-based rank card for `/rank`.
pub fn build_rank_embed(
    user: &serenity::User,
    record: &LevelRecord,
    position: Option<usize>,
) -> serenity::CreateEmbed {
    let needed = record.xp_needed().max(1);
    let progress = record.xp as f64 / needed as f64;

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("{}'s Rank", user.name))
        .thumbnail(user.face())
        .color(level_color(record.level))
        .field("Level", record.level.to_string(), true)
        .field("XP", format!("{}/{}", record.xp, needed), true);

    if let Some(position) = position {
        embed = embed.field("Rank", format!("#{position}"), true);
    }

    embed.field("Progress", build_progress_bar(progress, 18), false)
}

pub fn level_color(level: u32) -> serenity::Colour {
    if level >= 50 {
        serenity::Colour::DARK_PURPLE
    } else if level >= 25 {
        serenity::Colour::ORANGE
    } else if level >= 10 {
        serenity::Colour::GOLD
    } else if level >= 5 {
        serenity::Colour::BLURPLE
    } else {
        serenity::Colour::LIGHT_GREY
    }
}

pub fn build_progress_bar(progress: f64, length: usize) -> String {
    let clamped = progress.clamp(0.0, 1.0);
    let mut filled = (clamped * length as f64).round() as usize;
    if clamped > 0.0 && filled == 0 {
        filled = 1;
    }
    filled = filled.min(length);
    let bar = "▰".repeat(filled) + &"▱".repeat(length - filled);
    format!("{} ({}%)", bar, (clamped * 100.0).round() as u32)
}

fn random_flavor_line() -> &'static str {
    const FLAVOR_LINES: [&str; 4] = [
        "Keep chatting to climb higher!",
        "Every message counts.",
        "Another level down.",
        "The leaderboard is watching.",
    ];

    FLAVOR_LINES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FLAVOR_LINES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(build_progress_bar(0.0, 4), "▱▱▱▱ (0%)");
        assert_eq!(build_progress_bar(1.0, 4), "▰▰▰▰ (100%)");
        assert_eq!(build_progress_bar(2.5, 4), "▰▰▰▰ (100%)");
        assert_eq!(build_progress_bar(0.5, 4), "▰▰▱▱ (50%)");
    }

    #[test]
    fn test_tiny_progress_shows_one_segment() {
        assert!(build_progress_bar(0.01, 18).starts_with("▰▱"));
    }

    #[test]
    fn test_level_color_tiers() {
        assert_eq!(level_color(0), serenity::Colour::LIGHT_GREY);
        assert_eq!(level_color(5), serenity::Colour::BLURPLE);
        assert_eq!(level_color(12), serenity::Colour::GOLD);
        assert_eq!(level_color(30), serenity::Colour::ORANGE);
        assert_eq!(level_color(99), serenity::Colour::DARK_PURPLE);
    }
}
