// Discord commands module.
// Each feature gets its own command file.

use crate::discord::{Data, Error};

pub mod automod;

pub mod fun;

pub mod giveaways;

pub mod info;

pub mod leveling;

pub mod reaction_roles;

pub mod tickets;

pub mod voice;

pub mod welcome;

/// Every slash command the bot registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        // Auto-moderation
        automod::automod(),
        // Giveaways
        giveaways::gstart(),
        giveaways::gend(),
        giveaways::greroll(),
        // Leveling
        leveling::rank(),
        leveling::leaderboard(),
        leveling::setup_rewards(),
        // Reaction roles
        reaction_roles::rr_add(),
        reaction_roles::rr_remove(),
        reaction_roles::rr_list(),
        // Join-to-create voice
        voice::voice_setup(),
        voice::voice_setname(),
        // Tickets
        tickets::ticket_setup(),
        tickets::ticket_add(),
        tickets::ticket_remove(),
        // Welcome
        welcome::setwelcome(),
        welcome::setwelcomemsg(),
        welcome::testwelcome(),
        // Moderation
        crate::discord::moderation::kick(),
        crate::discord::moderation::ban(),
        crate::discord::moderation::unban(),
        crate::discord::moderation::timeout(),
        crate::discord::moderation::untimeout(),
        crate::discord::moderation::clear(),
        crate::discord::moderation::lock(),
        crate::discord::moderation::unlock(),
        crate::discord::moderation::slowmode(),
        crate::discord::moderation::setnick(),
        crate::discord::moderation::addrole(),
        crate::discord::moderation::removerole(),
        // Essentials and fun
        info::ping(),
        info::info(),
        fun::coinflip(),
        fun::roll(),
        fun::eightball(),
        fun::rps(),
        fun::choose(),
        fun::poll(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_command_names_are_unique() {
        let commands = all();
        let names: HashSet<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), commands.len());
        assert!(names.contains("8ball"));
        assert!(names.contains("automod"));
    }

    #[test]
    fn test_automod_subcommands() {
        let automod = automod::automod();
        let subcommands: Vec<&str> = automod
            .subcommands
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            subcommands,
            vec!["setup", "toggle", "limits", "badwords", "exempt"]
        );
    }
}
