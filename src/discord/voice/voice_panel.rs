// Control panel posted into each temporary voice channel.
//
// The panel lives in the voice channel's text chat, so the interaction's
// channel is the temporary channel being controlled.

use crate::core::voice::{parse_user_limit, validate_channel_name, VoiceError};
use crate::discord::replies::{cached_overwrites, ephemeral_response, modal_value};
use crate::discord::{Data, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

pub const LOCK_TOGGLE_ID: &str = "voice_lock_toggle";
pub const RENAME_ID: &str = "voice_rename";
pub const LIMIT_ID: &str = "voice_limit";

const RENAME_MODAL_PREFIX: &str = "voice_rename_modal:";
const LIMIT_MODAL_PREFIX: &str = "voice_limit_modal:";
const RENAME_INPUT_ID: &str = "name";
const LIMIT_INPUT_ID: &str = "limit";

pub fn is_voice_component(custom_id: &str) -> bool {
    matches!(custom_id, LOCK_TOGGLE_ID | RENAME_ID | LIMIT_ID)
}

pub fn is_voice_modal(custom_id: &str) -> bool {
    custom_id.starts_with(RENAME_MODAL_PREFIX) || custom_id.starts_with(LIMIT_MODAL_PREFIX)
}

pub fn control_panel_embed(owner: serenity::UserId) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Voice Control Panel")
        .description(format!(
            "Welcome to your temporary channel, {}!\nUse the buttons below to manage your channel.",
            owner.mention()
        ))
        .color(serenity::Colour::BLUE)
}

pub fn control_panel_components() -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(LOCK_TOGGLE_ID)
            .label("Lock/Unlock")
            .emoji('🔒')
            .style(serenity::ButtonStyle::Secondary),
        serenity::CreateButton::new(RENAME_ID)
            .label("Rename")
            .emoji('✏')
            .style(serenity::ButtonStyle::Secondary),
        serenity::CreateButton::new(LIMIT_ID)
            .label("Limit")
            .emoji('👥')
            .style(serenity::ButtonStyle::Secondary),
    ])]
}

/// Channel id encoded after a modal prefix.
fn modal_channel(custom_id: &str, prefix: &str) -> Option<serenity::ChannelId> {
    custom_id
        .strip_prefix(prefix)?
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::ChannelId::new)
}

/// Owner check shared by buttons and modals. `Some(reason)` means the user
/// may not use the panel.
async fn owner_error(
    data: &Data,
    channel_id: serenity::ChannelId,
    user_id: serenity::UserId,
) -> Result<Option<String>, Error> {
    match data
        .voice
        .authorize_owner(channel_id.get(), user_id.get())
        .await
    {
        Ok(_) => Ok(None),
        Err(VoiceError::StorageError(e)) => Err(e.into()),
        Err(e) => Ok(Some(e.to_string())),
    }
}

pub async fn handle_component(
    ctx: &serenity::Context,
    data: &Data,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let channel_id = component.channel_id;

    if let Some(reason) = owner_error(data, channel_id, component.user.id).await? {
        component
            .create_response(&ctx.http, ephemeral_response(reason))
            .await?;
        return Ok(());
    }

    match component.data.custom_id.as_str() {
        LOCK_TOGGLE_ID => toggle_lock(ctx, component).await,
        RENAME_ID => {
            let input = serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "New Channel Name",
                RENAME_INPUT_ID,
            )
            .placeholder("Enter new name...")
            .min_length(1)
            .max_length(100);

            let modal = serenity::CreateModal::new(
                format!("{RENAME_MODAL_PREFIX}{channel_id}"),
                "Rename Channel",
            )
            .components(vec![serenity::CreateActionRow::InputText(input)]);

            component
                .create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                .await?;
            Ok(())
        }
        LIMIT_ID => {
            let input = serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "User Limit (0 for unlimited)",
                LIMIT_INPUT_ID,
            )
            .placeholder("Enter number...")
            .min_length(1)
            .max_length(2);

            let modal = serenity::CreateModal::new(
                format!("{LIMIT_MODAL_PREFIX}{channel_id}"),
                "Set User Limit",
            )
            .components(vec![serenity::CreateActionRow::InputText(input)]);

            component
                .create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
                .await?;
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Flip the @everyone connect deny on the channel.
async fn toggle_lock(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
) -> Result<(), Error> {
    let Some(guild_id) = component.guild_id else {
        return Ok(());
    };
    let channel_id = component.channel_id;
    let everyone = serenity::RoleId::new(guild_id.get());

    let current = cached_overwrites(&ctx.cache, guild_id, channel_id)
        .unwrap_or_default()
        .into_iter()
        .find(|o| o.kind == serenity::PermissionOverwriteType::Role(everyone));
    let (allow, mut deny) = current
        .map(|o| (o.allow, o.deny))
        .unwrap_or((serenity::Permissions::empty(), serenity::Permissions::empty()));

    let locking = !deny.contains(serenity::Permissions::CONNECT);
    deny.set(serenity::Permissions::CONNECT, locking);

    channel_id
        .create_permission(
            &ctx.http,
            serenity::PermissionOverwrite {
                allow: allow - serenity::Permissions::CONNECT,
                deny,
                kind: serenity::PermissionOverwriteType::Role(everyone),
            },
        )
        .await?;

    let reply = if locking {
        "🔒 Channel **locked**."
    } else {
        "🔊 Channel **unlocked** for everyone."
    };
    component
        .create_response(&ctx.http, ephemeral_response(reply))
        .await?;
    Ok(())
}

pub async fn handle_modal(
    ctx: &serenity::Context,
    data: &Data,
    modal: &serenity::ModalInteraction,
) -> Result<(), Error> {
    let custom_id = modal.data.custom_id.as_str();

    let (channel_id, renaming) = if let Some(id) = modal_channel(custom_id, RENAME_MODAL_PREFIX) {
        (id, true)
    } else if let Some(id) = modal_channel(custom_id, LIMIT_MODAL_PREFIX) {
        (id, false)
    } else {
        return Ok(());
    };

    // Ownership may have changed while the modal was open
    if let Some(reason) = owner_error(data, channel_id, modal.user.id).await? {
        modal
            .create_response(&ctx.http, ephemeral_response(reason))
            .await?;
        return Ok(());
    }

    let reply = if renaming {
        match validate_channel_name(modal_value(modal, RENAME_INPUT_ID).unwrap_or_default()) {
            Ok(name) => {
                channel_id
                    .edit(&ctx.http, serenity::EditChannel::new().name(&name))
                    .await?;
                format!("Channel renamed to **{name}**")
            }
            Err(e) => e.to_string(),
        }
    } else {
        match parse_user_limit(modal_value(modal, LIMIT_INPUT_ID).unwrap_or_default()) {
            Ok(limit) => {
                channel_id
                    .edit(&ctx.http, serenity::EditChannel::new().user_limit(limit))
                    .await?;
                format!("User limit set to **{limit}**")
            }
            Err(e) => e.to_string(),
        }
    };

    modal
        .create_response(&ctx.http, ephemeral_response(reply))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_channel_round_trip() {
        let id = format!("{RENAME_MODAL_PREFIX}{}", 1234);
        assert!(is_voice_modal(&id));
        assert_eq!(
            modal_channel(&id, RENAME_MODAL_PREFIX),
            Some(serenity::ChannelId::new(1234))
        );
        assert_eq!(modal_channel(&id, LIMIT_MODAL_PREFIX), None);
        assert_eq!(modal_channel("voice_limit_modal:abc", LIMIT_MODAL_PREFIX), None);
        assert_eq!(modal_channel("voice_limit_modal:0", LIMIT_MODAL_PREFIX), None);
    }

    #[test]
    fn test_component_ids() {
        assert!(is_voice_component("voice_lock_toggle"));
        assert!(is_voice_component("voice_limit"));
        assert!(!is_voice_component("ticket_create"));
        assert!(!is_voice_modal("voice_limit"));
    }
}
