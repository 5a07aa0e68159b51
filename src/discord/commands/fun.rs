// Fun commands: coins, dice, the magic 8-ball, rock-paper-scissors,
// random choices and quick polls.

use crate::discord::replies::say_ephemeral;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use rand::seq::SliceRandom;
use rand::Rng;

const EIGHT_BALL_ANSWERS: [&str; 20] = [
    "It is certain.",
    "It is decidedly so.",
    "Without a doubt.",
    "Yes - definitely.",
    "You may rely on it.",
    "As I see it, yes.",
    "Most likely.",
    "Outlook good.",
    "Yes.",
    "Signs point to yes.",
    "Reply hazy, try again.",
    "Ask again later.",
    "Better not tell you now.",
    "Cannot predict now.",
    "Concentrate and ask again.",
    "Don't count on it.",
    "My reply is no.",
    "My sources say no.",
    "Outlook not so good.",
    "Very doubtful.",
];

const POLL_EMOJIS: [&str; 10] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum Hand {
    Rock,
    Paper,
    Scissors,
}

impl Hand {
    const ALL: [Hand; 3] = [Hand::Rock, Hand::Paper, Hand::Scissors];

    fn name(self) -> &'static str {
        match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        }
    }

    fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }
}

fn rps_verdict(user: Hand, bot: Hand) -> &'static str {
    if user == bot {
        "It's a tie!"
    } else if user.beats(bot) {
        "You win!"
    } else {
        "I win!"
    }
}

/// Split a comma-separated list, dropping blank entries.
fn split_options(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn poll_description(options: &[&str]) -> String {
    options
        .iter()
        .zip(POLL_EMOJIS)
        .map(|(option, emoji)| format!("{emoji} {option}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flips a coin.
#[poise::command(slash_command)]
pub async fn coinflip(ctx: Context<'_>) -> Result<(), Error> {
    let result = if rand::thread_rng().gen_bool(0.5) {
        "Heads"
    } else {
        "Tails"
    };
    ctx.say(format!("It's **{result}**!")).await?;
    Ok(())
}

/// Rolls a dice.
#[poise::command(slash_command)]
pub async fn roll(
    ctx: Context<'_>,
    #[description = "Number of sides on the dice (default 6)"] sides: Option<u32>,
) -> Result<(), Error> {
    let sides = sides.unwrap_or(6);
    if sides < 2 {
        return say_ephemeral(ctx, "A dice must have at least 2 sides.").await;
    }

    let result = rand::thread_rng().gen_range(1..=sides);
    ctx.say(format!("You rolled a **{result}** (1-{sides})!"))
        .await?;
    Ok(())
}

/// Ask the magic 8-ball a question.
#[poise::command(slash_command, rename = "8ball")]
pub async fn eightball(
    ctx: Context<'_>,
    #[description = "The question to ask"] question: String,
) -> Result<(), Error> {
    let answer = EIGHT_BALL_ANSWERS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(EIGHT_BALL_ANSWERS[0]);

    ctx.say(format!("🎱 **Question:** {question}\n**Answer:** {answer}"))
        .await?;
    Ok(())
}

/// Play Rock, Paper, Scissors.
#[poise::command(slash_command)]
pub async fn rps(
    ctx: Context<'_>,
    #[description = "Your choice"] choice: Hand,
) -> Result<(), Error> {
    let bot_choice = Hand::ALL
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(Hand::Rock);

    ctx.say(format!(
        "You chose **{}**. I chose **{}**.\n{}",
        choice.name(),
        bot_choice.name(),
        rps_verdict(choice, bot_choice)
    ))
    .await?;
    Ok(())
}

/// Chooses between multiple options.
#[poise::command(slash_command)]
pub async fn choose(
    ctx: Context<'_>,
    #[description = "Options separated by commas"] options: String,
) -> Result<(), Error> {
    let choices = split_options(&options);
    if choices.len() < 2 {
        return say_ephemeral(
            ctx,
            "Please provide at least two options separated by commas.",
        )
        .await;
    }

    let choice = choices
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(choices[0]);
    ctx.say(format!("I choose... **{choice}**!")).await?;
    Ok(())
}

/// Creates a simple poll.
#[poise::command(slash_command)]
pub async fn poll(
    ctx: Context<'_>,
    #[description = "The question for the poll"] question: String,
    #[description = "Options separated by commas"] options: String,
) -> Result<(), Error> {
    let choices = split_options(&options);
    if !(2..=POLL_EMOJIS.len()).contains(&choices.len()) {
        return say_ephemeral(
            ctx,
            "Please provide between 2 and 10 options separated by commas.",
        )
        .await;
    }

    let author_name = ctx
        .author_member()
        .await
        .map(|m| m.display_name().to_string())
        .unwrap_or_else(|| ctx.author().name.clone());

    let embed = serenity::CreateEmbed::new()
        .title(format!("📊 {question}"))
        .description(poll_description(&choices))
        .color(serenity::Colour::BLUE)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Poll created by {author_name}"
        )));

    let reply = ctx
        .send(poise::CreateReply::default().embed(embed))
        .await?;
    let message = reply.message().await?;

    for emoji in POLL_EMOJIS.iter().take(choices.len()) {
        message
            .react(
                ctx.http(),
                serenity::ReactionType::Unicode(emoji.to_string()),
            )
            .await?;
    }
    Ok(())
}
