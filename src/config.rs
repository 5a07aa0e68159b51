// Runtime configuration, read from the environment (or `.env`).

use anyhow::{bail, Context as _};
use std::time::Duration;

const DEFAULT_DATABASE_PATH: &str = "data/bot_database.db";
const DEFAULT_GIVEAWAY_POLL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub database_path: String,
    /// How often the giveaway poller scans for expired giveaways.
    pub giveaway_poll_interval: Duration,
    /// When set, slash commands are registered in this guild only so changes
    /// show up immediately during development.
    pub dev_guild_id: Option<u64>,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .context(
                "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
            )?;

        let database_path =
            lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let poll_secs = match lookup("GIVEAWAY_POLL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("GIVEAWAY_POLL_SECS is not a number: {raw}"))?,
            None => DEFAULT_GIVEAWAY_POLL_SECS,
        };
        if poll_secs == 0 {
            bail!("GIVEAWAY_POLL_SECS must be at least 1");
        }

        let dev_guild_id = lookup("DEV_GUILD_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("DEV_GUILD_ID is not a valid guild id: {raw}"))
            })
            .transpose()?;

        Ok(Self {
            token,
            database_path,
            giveaway_poll_interval: Duration::from_secs(poll_secs),
            dev_guild_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply() {
        let config = BotConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.database_path, "data/bot_database.db");
        assert_eq!(config.giveaway_poll_interval, Duration::from_secs(30));
        assert_eq!(config.dev_guild_id, None);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(BotConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(BotConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = BotConfig::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("DATABASE_PATH", "/tmp/bot.db"),
            ("GIVEAWAY_POLL_SECS", "5"),
            ("DEV_GUILD_ID", "1234"),
        ]))
        .unwrap();
        assert_eq!(config.database_path, "/tmp/bot.db");
        assert_eq!(config.giveaway_poll_interval, Duration::from_secs(5));
        assert_eq!(config.dev_guild_id, Some(1234));
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        for (key, value) in [
            ("GIVEAWAY_POLL_SECS", "soon"),
            ("GIVEAWAY_POLL_SECS", "0"),
            ("DEV_GUILD_ID", "guild"),
        ] {
            let result = BotConfig::from_lookup(lookup_from(&[("DISCORD_TOKEN", "abc"), (key, value)]));
            assert!(result.is_err(), "{key}={value} should be rejected");
        }
    }
}
