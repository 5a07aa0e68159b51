// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = SQLite implementations of core traits
// - `discord/` = Discord-specific adapters (commands, events, panels)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands, event handlers and background tasks

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "config.rs"]
mod config;
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use crate::config::BotConfig;
use crate::core::automod::AutoModService;
use crate::core::giveaways::GiveawayService;
use crate::core::leveling::{LevelingError, LevelingService};
use crate::core::reaction_roles::ReactionRoleService;
use crate::core::tickets::TicketService;
use crate::core::voice::VoiceService;
use crate::core::welcome::WelcomeService;
use crate::discord::automod_handler::handle_message_for_automod;
use crate::discord::giveaway_runner::spawn_poller;
use crate::discord::interactions::handle_interaction;
use crate::discord::leveling_announcements::send_level_up_embed;
use crate::discord::reaction_events::{handle_reaction_add, handle_reaction_remove};
use crate::discord::voice_events::handle_voice_state_update;
use crate::discord::welcome_events::handle_member_join;
use crate::discord::{Data, Error};
use crate::infra::automod::SqliteAutoModStore;
use crate::infra::database::Database;
use crate::infra::giveaways::SqliteGiveawayStore;
use crate::infra::leveling::SqliteLevelStore;
use crate::infra::reaction_roles::SqliteReactionRoleStore;
use crate::infra::tickets::SqliteTicketStore;
use crate::infra::voice::SqliteVoiceStore;
use crate::infra::welcome::SqliteWelcomeStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;

/// Automod runs first; a removed message earns no XP.
async fn handle_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &Data,
) -> Result<(), Error> {
    if message.author.bot {
        return Ok(());
    }

    if handle_message_for_automod(ctx, message, data.automod.as_ref()).await? {
        return Ok(());
    }

    // Only guild messages earn XP
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };

    match data
        .leveling
        .process_message(message.author.id.get(), guild_id.get())
        .await
    {
        Ok(Some(level_up)) => {
            tracing::info!(
                user_id = level_up.user_id,
                guild_id = level_up.guild_id,
                old_level = level_up.old_level,
                new_level = level_up.new_level,
                "User leveled up"
            );

            if let Err(err) = send_level_up_embed(ctx, message, &level_up).await {
                tracing::warn!("Failed to send level-up embed: {err}");
            }
        }
        Ok(None) => {}
        Err(LevelingError::OnCooldown(_)) => {
            // User is on cooldown - silently ignore
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = handle_message(ctx, new_message, data).await {
                tracing::error!("Error processing message {}: {}", new_message.id, e);
            }
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            if let Err(e) = handle_member_join(ctx, data, new_member).await {
                tracing::error!("Error sending welcome message: {}", e);
            }
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            if let Err(e) =
                handle_reaction_add(ctx, add_reaction, data.reaction_roles.as_ref()).await
            {
                tracing::error!("Error handling reaction add: {}", e);
            }
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            if let Err(e) =
                handle_reaction_remove(ctx, removed_reaction, data.reaction_roles.as_ref()).await
            {
                tracing::error!("Error handling reaction remove: {}", e);
            }
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            if let Err(e) = handle_voice_state_update(ctx, data, old.as_ref(), new).await {
                tracing::error!("Error handling voice state update: {}", e);
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Err(e) = handle_interaction(ctx, data, interaction).await {
                tracing::error!("Error handling interaction: {}", e);
            }
        }
        _ => {}
    }

    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Error in command `{}`: {}", ctx.command().qualified_name, error);
            let reply = poise::CreateReply::default()
                .content(format!("An error occurred: {error}"))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::warn!("Failed to report command error: {e}");
            }
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            let reply = poise::CreateReply::default()
                .content("You don't have permission to use this command.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                tracing::warn!("Failed to report missing permissions: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One database file, one pool; every store gets a clone of it.

    let database = Database::connect(&config.database_path)
        .await
        .context("Failed to open the bot database")?;
    database
        .migrate()
        .await
        .context("Failed to create database tables")?;
    let pool = database.pool();

    let data = Data {
        automod: Arc::new(AutoModService::new(SqliteAutoModStore::new(pool.clone()))),
        giveaways: Arc::new(GiveawayService::new(SqliteGiveawayStore::new(pool.clone()))),
        leveling: Arc::new(LevelingService::new(SqliteLevelStore::new(pool.clone()))),
        reaction_roles: Arc::new(ReactionRoleService::new(SqliteReactionRoleStore::new(
            pool.clone(),
        ))),
        tickets: Arc::new(TicketService::new(SqliteTicketStore::new(pool.clone()))),
        voice: Arc::new(VoiceService::new(SqliteVoiceStore::new(pool.clone()))),
        welcome: Arc::new(WelcomeService::new(SqliteWelcomeStore::new(pool))),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let dev_guild_id = config.dev_guild_id;
    let poll_interval = config.giveaway_poll_interval;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: discord::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("Logged in as {}", ready.user.name);

                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        tracing::info!(guild_id, "Commands registered in development guild");
                    }
                    None => {
                        // Global registration can take up to an hour to propagate
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        tracing::info!("Commands registered globally");
                    }
                }

                spawn_poller(ctx.http.clone(), Arc::clone(&data.giveaways), poll_interval);

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
