// Ticket buttons: "Create Ticket" on the panel, "Close Ticket" in each ticket.

use crate::core::tickets::{ticket_channel_name, TicketError, TicketPreparation};
use crate::discord::replies::{
    cached_overwrites, channel_exists, ephemeral_followup, ephemeral_response,
};
use crate::discord::{Data, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

pub const CREATE_ID: &str = "ticket_create";
pub const CLOSE_ID: &str = "ticket_close";

pub fn is_ticket_component(custom_id: &str) -> bool {
    matches!(custom_id, CREATE_ID | CLOSE_ID)
}

pub fn panel_embed() -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Support Tickets")
        .description("Click the button below to open a ticket with staff.")
        .color(serenity::Colour::BLUE)
}

pub fn panel_components() -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(CREATE_ID)
            .label("Create Ticket")
            .emoji('📩')
            .style(serenity::ButtonStyle::Primary),
    ])]
}

fn close_components() -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(CLOSE_ID)
            .label("Close Ticket")
            .emoji('🔒')
            .style(serenity::ButtonStyle::Danger),
    ])]
}

/// Overwrites of a new ticket: hidden from everyone but the owner and the bot.
fn ticket_overwrites(
    guild_id: serenity::GuildId,
    owner: serenity::UserId,
    bot: serenity::UserId,
) -> Vec<serenity::PermissionOverwrite> {
    vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL | serenity::Permissions::SEND_MESSAGES,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(owner),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL
                | serenity::Permissions::SEND_MESSAGES
                | serenity::Permissions::MANAGE_CHANNELS,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(bot),
        },
    ]
}

pub async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    match component.data.custom_id.as_str() {
        CREATE_ID => create_ticket(ctx, data, component).await,
        CLOSE_ID => close_ticket(ctx, data, component).await,
        _ => Ok(()),
    }
}

async fn create_ticket(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let user = &component.user;

    // Released when this function returns, whatever the outcome
    let _guard = match data.tickets.begin_creation(user.id.get()) {
        Ok(guard) => guard,
        Err(e) => {
            component
                .create_response(&ctx.http, ephemeral_response(e.to_string()))
                .await?;
            return Ok(());
        }
    };

    component.defer_ephemeral(&ctx.http).await?;

    let preparation = data
        .tickets
        .prepare_ticket(guild_id.get(), user.id.get(), |channel_id| {
            channel_exists(&ctx.cache, guild_id, serenity::ChannelId::new(channel_id))
        })
        .await;

    let category_id = match preparation {
        Ok(TicketPreparation::Existing(channel_id)) => {
            component
                .create_followup(
                    &ctx.http,
                    ephemeral_followup(format!(
                        "You already have an open ticket: {}",
                        serenity::ChannelId::new(channel_id).mention()
                    )),
                )
                .await?;
            return Ok(());
        }
        Ok(TicketPreparation::Create { category_id }) => serenity::ChannelId::new(category_id),
        Err(TicketError::StorageError(e)) => return Err(e.into()),
        Err(e) => {
            component
                .create_followup(&ctx.http, ephemeral_followup(e.to_string()))
                .await?;
            return Ok(());
        }
    };

    if !channel_exists(&ctx.cache, guild_id, category_id) {
        component
            .create_followup(
                &ctx.http,
                ephemeral_followup("Ticket category not found. Setup might be broken."),
            )
            .await?;
        return Ok(());
    }

    let bot_id = ctx.cache.current_user().id;
    let builder = serenity::CreateChannel::new(ticket_channel_name(&user.name))
        .kind(serenity::ChannelType::Text)
        .category(category_id)
        .permissions(ticket_overwrites(guild_id, user.id, bot_id));

    let channel = match guild_id.create_channel(&ctx.http, builder).await {
        Ok(channel) => channel,
        Err(e) => {
            tracing::warn!(guild_id = guild_id.get(), "Failed to create ticket: {}", e);
            component
                .create_followup(
                    &ctx.http,
                    ephemeral_followup(format!("Failed to create ticket: {e}")),
                )
                .await?;
            return Ok(());
        }
    };

    data.tickets
        .record_ticket(
            channel.id.get(),
            guild_id.get(),
            user.id.get(),
            chrono::Utc::now(),
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    let embed = serenity::CreateEmbed::new()
        .title(format!("Ticket - {}", user.name))
        .description("Support will be with you shortly.\nClick below to close this ticket.")
        .color(serenity::Colour::DARK_GREEN);
    channel
        .id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(user.mention().to_string())
                .embed(embed)
                .components(close_components()),
        )
        .await?;

    component
        .create_followup(
            &ctx.http,
            ephemeral_followup(format!("Ticket created: {}", channel.mention())),
        )
        .await?;
    Ok(())
}

async fn close_ticket(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let channel_id = component.channel_id;

    let archive_id = match data
        .tickets
        .archive_category(guild_id.get(), channel_id.get())
        .await
    {
        Ok(id) => serenity::ChannelId::new(id),
        Err(TicketError::StorageError(e)) => return Err(e.into()),
        Err(e) => {
            component
                .create_response(&ctx.http, ephemeral_response(e.to_string()))
                .await?;
            return Ok(());
        }
    };

    // Moving under the archive takes the archive's permissions
    let Some(archive_overwrites) = cached_overwrites(&ctx.cache, guild_id, archive_id) else {
        component
            .create_response(
                &ctx.http,
                ephemeral_response("Archive category removed. Cannot archive."),
            )
            .await?;
        return Ok(());
    };

    component.defer(&ctx.http).await?;

    let edit = serenity::EditChannel::new()
        .category(archive_id)
        .permissions(archive_overwrites);
    if let Err(e) = channel_id.edit(&ctx.http, edit).await {
        component
            .create_followup(
                &ctx.http,
                serenity::CreateInteractionResponseFollowup::new()
                    .content(format!("Error closing ticket: {e}")),
            )
            .await?;
        return Ok(());
    }

    data.tickets
        .mark_closed(channel_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;
    tracing::info!(channel_id = channel_id.get(), "Ticket closed");

    component
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content("Ticket closed and archived. 🔒"),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_overwrites_hide_from_everyone() {
        let guild = serenity::GuildId::new(1);
        let overwrites = ticket_overwrites(guild, serenity::UserId::new(5), serenity::UserId::new(9));

        let everyone = overwrites
            .iter()
            .find(|o| o.kind == serenity::PermissionOverwriteType::Role(serenity::RoleId::new(1)))
            .unwrap();
        assert!(everyone.deny.contains(serenity::Permissions::VIEW_CHANNEL));

        let owner = overwrites
            .iter()
            .find(|o| o.kind == serenity::PermissionOverwriteType::Member(serenity::UserId::new(5)))
            .unwrap();
        assert!(owner.allow.contains(serenity::Permissions::SEND_MESSAGES));
        assert!(!owner.allow.contains(serenity::Permissions::MANAGE_CHANNELS));
    }
}
