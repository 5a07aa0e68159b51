// Ticket commands: setup and per-ticket member management.

use crate::core::tickets::{TicketError, TicketSettings};
use crate::discord::replies::say_ephemeral;
use crate::discord::ticket_panel::{panel_components, panel_embed};
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

fn everyone(guild_id: serenity::GuildId) -> serenity::PermissionOverwriteType {
    serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get()))
}

/// A category only the bot (and whoever staff grants later) can see.
fn private_category(
    name: &str,
    guild_id: serenity::GuildId,
    bot_id: serenity::UserId,
) -> serenity::CreateChannel<'static> {
    serenity::CreateChannel::new(name)
        .kind(serenity::ChannelType::Category)
        .permissions(vec![
            serenity::PermissionOverwrite {
                allow: serenity::Permissions::empty(),
                deny: serenity::Permissions::VIEW_CHANNEL,
                kind: everyone(guild_id),
            },
            serenity::PermissionOverwrite {
                allow: serenity::Permissions::VIEW_CHANNEL | serenity::Permissions::MANAGE_CHANNELS,
                deny: serenity::Permissions::empty(),
                kind: serenity::PermissionOverwriteType::Member(bot_id),
            },
        ])
}

/// Setup ticket categories and panel.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn ticket_setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let bot_id = ctx.serenity_context().cache.current_user().id;

    ctx.defer_ephemeral().await?;

    let active = guild_id
        .create_channel(ctx.http(), private_category("Tickets", guild_id, bot_id))
        .await?;
    let archive = guild_id
        .create_channel(
            ctx.http(),
            private_category("Archived Tickets", guild_id, bot_id),
        )
        .await?;

    let panel = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new("support-tickets")
                .kind(serenity::ChannelType::Text)
                .permissions(vec![
                    serenity::PermissionOverwrite {
                        allow: serenity::Permissions::VIEW_CHANNEL,
                        deny: serenity::Permissions::SEND_MESSAGES,
                        kind: everyone(guild_id),
                    },
                    serenity::PermissionOverwrite {
                        allow: serenity::Permissions::VIEW_CHANNEL
                            | serenity::Permissions::SEND_MESSAGES,
                        deny: serenity::Permissions::empty(),
                        kind: serenity::PermissionOverwriteType::Member(bot_id),
                    },
                ]),
        )
        .await?;

    panel
        .id
        .send_message(
            ctx.http(),
            serenity::CreateMessage::new()
                .embed(panel_embed())
                .components(panel_components()),
        )
        .await?;

    ctx.data()
        .tickets
        .save_settings(
            guild_id.get(),
            TicketSettings {
                active_category_id: active.id.get(),
                archive_category_id: archive.id.get(),
                panel_channel_id: panel.id.get(),
            },
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    say_ephemeral(
        ctx,
        format!(
            "Setup complete!\nPanel: {}\nActive Category: {}\nArchive Category: {}\n\n**Note**: Please adjust category permissions to ensure your Staff roles can view the 'Tickets' category.",
            panel.mention(),
            active.name,
            archive.name
        ),
    )
    .await
}

/// Make sure the command runs inside a recorded ticket channel.
async fn require_ticket(ctx: Context<'_>) -> Result<bool, Error> {
    match ctx
        .data()
        .tickets
        .ticket_for_channel(ctx.channel_id().get())
        .await
    {
        Ok(_) => Ok(true),
        Err(TicketError::StorageError(e)) => Err(e.into()),
        Err(_) => {
            say_ephemeral(ctx, "This does not look like a ticket channel.").await?;
            Ok(false)
        }
    }
}

/// Add a user to the ticket.
#[poise::command(slash_command, guild_only)]
pub async fn ticket_add(
    ctx: Context<'_>,
    #[description = "User to add"] user: serenity::User,
) -> Result<(), Error> {
    if !require_ticket(ctx).await? {
        return Ok(());
    }

    ctx.channel_id()
        .create_permission(
            ctx.http(),
            serenity::PermissionOverwrite {
                allow: serenity::Permissions::VIEW_CHANNEL | serenity::Permissions::SEND_MESSAGES,
                deny: serenity::Permissions::empty(),
                kind: serenity::PermissionOverwriteType::Member(user.id),
            },
        )
        .await?;

    ctx.say(format!("Added {} to the ticket.", user.mention()))
        .await?;
    Ok(())
}

/// Remove a user from the ticket.
#[poise::command(slash_command, guild_only)]
pub async fn ticket_remove(
    ctx: Context<'_>,
    #[description = "User to remove"] user: serenity::User,
) -> Result<(), Error> {
    if !require_ticket(ctx).await? {
        return Ok(());
    }

    ctx.channel_id()
        .delete_permission(
            ctx.http(),
            serenity::PermissionOverwriteType::Member(user.id),
        )
        .await?;

    ctx.say(format!("Removed {} from the ticket.", user.mention()))
        .await?;
    Ok(())
}
