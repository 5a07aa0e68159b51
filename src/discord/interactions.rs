// Routes button presses and modal submissions to the panel that owns them.

use crate::discord::{ticket_panel, voice_panel, Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_interaction(
    ctx: &serenity::Context,
    data: &Data,
    interaction: &serenity::Interaction,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(component) => {
            let custom_id = component.data.custom_id.as_str();
            if voice_panel::is_voice_component(custom_id) {
                voice_panel::handle_component(ctx, data, component).await?;
            } else if ticket_panel::is_ticket_component(custom_id) {
                ticket_panel::handle_component(ctx, data, component).await?;
            }
        }
        serenity::Interaction::Modal(modal) => {
            if voice_panel::is_voice_modal(&modal.data.custom_id) {
                voice_panel::handle_modal(ctx, data, modal).await?;
            }
        }
        // Slash commands are dispatched by poise.
        _ => {}
    }
    Ok(())
}
