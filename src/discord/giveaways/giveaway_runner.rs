// Giveaway finalisation and the background poller.
//
// `finalize` is only ever called with a giveaway that the caller itself moved
// to `ended`, so the draw and the announcement happen once per giveaway.

use std::sync::Arc;
use std::time::Duration;

use crate::core::giveaways::{pick_winners, Giveaway, GiveawayService, GiveawayStore};
use crate::discord::replies::is_not_found;
use poise::serenity_prelude as serenity;

pub const GIVEAWAY_EMOJI: &str = "🎉";

/// Discord returns at most this many users per reaction page.
const REACTION_PAGE_SIZE: u8 = 100;

pub fn giveaway_reaction() -> serenity::ReactionType {
    serenity::ReactionType::Unicode(GIVEAWAY_EMOJI.to_string())
}

/// Embed posted by `/gstart`.
pub fn active_embed(prize: &str, winners: u32, end_unix: i64) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("🎉 GIVEAWAY 🎉")
        .description(format!(
            "**Prize:** {prize}\n**Winners:** {winners}\n**Ends:** <t:{end_unix}:R>"
        ))
        .color(serenity::Colour::PURPLE)
        .footer(serenity::CreateEmbedFooter::new("React with 🎉 to enter!"))
}

fn ended_embed(giveaway: &Giveaway) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("🎉 GIVEAWAY 🎉")
        .description(format!(
            "**Prize:** {}\n**Winners:** {}\n**Ended**",
            giveaway.prize, giveaway.winners_count
        ))
        .color(serenity::Colour::LIGHT_GREY)
}

/// Every non-bot user who reacted with 🎉, across all reaction pages.
pub async fn collect_entrants(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) -> Result<Vec<u64>, serenity::Error> {
    let mut entrants = Vec::new();
    let mut after: Option<serenity::UserId> = None;

    loop {
        let page = channel_id
            .reaction_users(
                http,
                message_id,
                giveaway_reaction(),
                Some(REACTION_PAGE_SIZE),
                after,
            )
            .await?;

        let page_len = page.len();
        after = page.last().map(|u| u.id);
        entrants.extend(page.into_iter().filter(|u| !u.bot).map(|u| u.id.get()));

        if page_len < usize::from(REACTION_PAGE_SIZE) {
            break;
        }
    }

    Ok(entrants)
}

/// Result line posted under an ended giveaway. The prize is user text, so its
/// markdown is neutralised before it goes inside the bold markers.
pub fn announcement(giveaway: &Giveaway, winners: &[u64]) -> String {
    let mut builder = serenity::MessageBuilder::new();
    if winners.is_empty() {
        builder
            .push("Giveaway for ")
            .push_bold_safe(giveaway.prize.as_str())
            .push(" ended, but no one entered! 😞");
    } else {
        let mentions = winners
            .iter()
            .map(|id| format!("<@{id}>"))
            .collect::<Vec<_>>()
            .join(", ");
        builder
            .push("🎉 Congratulations ")
            .push(mentions)
            .push("! You won ")
            .push_bold_safe(giveaway.prize.as_str())
            .push("! 🎉");
    }
    builder.build()
}

/// Mark the giveaway message as ended, draw winners and announce them.
pub async fn finalize(http: &serenity::Http, giveaway: &Giveaway) -> Result<(), serenity::Error> {
    let channel_id = serenity::ChannelId::new(giveaway.channel_id);
    let message_id = serenity::MessageId::new(giveaway.message_id);

    let mut message = match channel_id.message(http, message_id).await {
        Ok(message) => message,
        Err(e) if is_not_found(&e) => {
            tracing::info!(
                message_id = giveaway.message_id,
                "Giveaway message is gone; nothing to finalise"
            );
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    message
        .edit(http, serenity::EditMessage::new().embed(ended_embed(giveaway)))
        .await?;

    let entrants = collect_entrants(http, channel_id, message_id).await?;
    let winners = pick_winners(
        &entrants,
        giveaway.winners_count as usize,
        &mut rand::thread_rng(),
    );

    tracing::info!(
        message_id = giveaway.message_id,
        entrants = entrants.len(),
        winners = winners.len(),
        "Giveaway finalised"
    );

    channel_id
        .say(http, announcement(giveaway, &winners))
        .await?;
    Ok(())
}

/// Scan for expired giveaways every `interval` and finalise each one.
pub fn spawn_poller<S: GiveawayStore + 'static>(
    http: Arc<serenity::Http>,
    giveaways: Arc<GiveawayService<S>>,
    interval: Duration,
) {
    tokio::spawn(async move {
        loop {
            match giveaways.claim_due(chrono::Utc::now()).await {
                Ok(due) => {
                    if !due.is_empty() {
                        tracing::debug!("Ending {} due giveaways", due.len());
                    }
                    for giveaway in due {
                        if let Err(e) = finalize(&http, &giveaway).await {
                            tracing::warn!(
                                message_id = giveaway.message_id,
                                "Failed to finalise giveaway: {}",
                                e
                            );
                        }
                    }
                }
                Err(e) => tracing::warn!("Giveaway poll failed: {}", e),
            }

            tokio::time::sleep(interval).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::giveaways::GiveawayStatus;

    fn giveaway(prize: &str) -> Giveaway {
        Giveaway {
            message_id: 10,
            channel_id: 20,
            guild_id: 30,
            prize: prize.to_string(),
            end_time: chrono::Utc::now(),
            winners_count: 2,
            status: GiveawayStatus::Ended,
        }
    }

    #[test]
    fn test_announcement_without_entrants() {
        assert_eq!(
            announcement(&giveaway("Nitro"), &[]),
            "Giveaway for **Nitro** ended, but no one entered! 😞"
        );
    }

    #[test]
    fn test_announcement_mentions_every_winner() {
        assert_eq!(
            announcement(&giveaway("Nitro"), &[1, 2]),
            "🎉 Congratulations <@1>, <@2>! You won **Nitro**! 🎉"
        );
    }

    #[test]
    fn test_announcement_keeps_prize_markdown_contained() {
        let text = announcement(&giveaway("**Free** Nitro"), &[1]);
        assert!(text.starts_with("🎉 Congratulations <@1>! You won **"));
        assert!(text.contains("Free"));
        assert_eq!(text.matches("**").count(), 2);
    }
}
