// Member join -> welcome embed.

use crate::core::welcome::{render_welcome, WelcomeContext, WelcomeError};
use crate::discord::{Data, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

/// Post the welcome embed for `user`. Returns `false` when the guild has no
/// welcome channel configured.
pub async fn send_welcome(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) -> Result<bool, Error> {
    let (channel_id, template) = match data.welcome.greeting_target(guild_id.get()).await {
        Ok(target) => target,
        Err(WelcomeError::ChannelNotSet) => return Ok(false),
        Err(e) => return Err(e.into()),
    };

    let (server_name, member_count) = ctx
        .cache
        .guild(guild_id)
        .map(|g| (g.name.clone(), g.member_count))
        .unwrap_or_else(|| ("the server".to_string(), 0));

    let mention = user.mention().to_string();
    let body = render_welcome(
        template.as_deref(),
        &WelcomeContext {
            user_mention: &mention,
            server_name: &server_name,
            member_count,
        },
    );

    let embed = serenity::CreateEmbed::new()
        .title(format!("Welcome to {server_name}!"))
        .description(body)
        .color(0x1ABC9C)
        .thumbnail(user.face())
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Member #{member_count}"
        )));

    serenity::ChannelId::new(channel_id)
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await?;
    Ok(true)
}

pub async fn handle_member_join(
    ctx: &serenity::Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<(), Error> {
    send_welcome(ctx, data, member.guild_id, &member.user).await?;
    Ok(())
}
