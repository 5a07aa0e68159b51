// Giveaway domain models and the pure helpers around them.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle of a giveaway. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GiveawayStatus {
    Active,
    Ended,
}

impl GiveawayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GiveawayStatus::Active => "active",
            GiveawayStatus::Ended => "ended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(GiveawayStatus::Active),
            "ended" => Some(GiveawayStatus::Ended),
            _ => None,
        }
    }
}

/// A giveaway, keyed by the id of the message people react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Giveaway {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: u64,
    pub prize: String,
    pub end_time: DateTime<Utc>,
    pub winners_count: u32,
    pub status: GiveawayStatus,
}

impl Giveaway {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == GiveawayStatus::Active && self.end_time <= now
    }
}

/// Parse a giveaway duration such as `30s`, `10m`, `2h` or `1d`.
///
/// An unknown trailing letter counts as seconds, and a bare number is taken
/// as seconds too. Zero, non-numeric values and overflowing values are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    let last = input.chars().last()?;

    let (number, multiplier) = if last.is_ascii_digit() {
        (input.as_str(), 1)
    } else {
        let multiplier = match last {
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            _ => 1,
        };
        (input[..input.len() - last.len_utf8()].trim(), multiplier)
    };

    let value: u64 = number.parse().ok()?;
    let seconds = value.checked_mul(multiplier)?;
    if seconds == 0 {
        return None;
    }

    Some(Duration::from_secs(seconds))
}

/// Draw winners from the entrants without replacement.
/// When there are no more entrants than winner slots, everyone wins.
pub fn pick_winners<R: rand::Rng + ?Sized>(
    entrants: &[u64],
    winners_count: usize,
    rng: &mut R,
) -> Vec<u64> {
    if entrants.len() <= winners_count {
        return entrants.to_vec();
    }

    entrants
        .choose_multiple(rng, winners_count)
        .copied()
        .collect()
}

/// Pick a single new winner for a reroll.
pub fn pick_reroll<R: rand::Rng + ?Sized>(entrants: &[u64], rng: &mut R) -> Option<u64> {
    entrants.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("45s"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration("10m"), Some(Duration::from_secs(600)));
        assert_eq!(parse_duration("2H"), Some(Duration::from_secs(7_200)));
        assert_eq!(parse_duration(" 1d "), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_parse_duration_unknown_suffix_is_seconds() {
        assert_eq!(parse_duration("15x"), Some(Duration::from_secs(15)));
        assert_eq!(parse_duration("90"), Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("h"), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("0m"), None);
        assert_eq!(parse_duration("-5m"), None);
        assert_eq!(parse_duration("99999999999999999999d"), None);
    }

    #[test]
    fn test_everyone_wins_when_few_entrants() {
        let mut rng = StdRng::seed_from_u64(7);
        let entrants = vec![1, 2];
        assert_eq!(pick_winners(&entrants, 3, &mut rng), vec![1, 2]);
        assert_eq!(pick_winners(&entrants, 2, &mut rng), vec![1, 2]);
        assert!(pick_winners(&[], 1, &mut rng).is_empty());
    }

    #[test]
    fn test_winners_are_distinct_entrants() {
        let mut rng = StdRng::seed_from_u64(42);
        let entrants: Vec<u64> = (1..=50).collect();

        for count in 1..10 {
            let winners = pick_winners(&entrants, count, &mut rng);
            assert_eq!(winners.len(), count);

            let unique: HashSet<_> = winners.iter().collect();
            assert_eq!(unique.len(), count);
            assert!(winners.iter().all(|w| entrants.contains(w)));
        }
    }

    #[test]
    fn test_reroll_picks_an_entrant() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_reroll(&[], &mut rng), None);

        let winner = pick_reroll(&[10, 20, 30], &mut rng).unwrap();
        assert!([10, 20, 30].contains(&winner));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        assert_eq!(GiveawayStatus::parse("active"), Some(GiveawayStatus::Active));
        assert_eq!(GiveawayStatus::parse(GiveawayStatus::Ended.as_str()), Some(GiveawayStatus::Ended));
        assert_eq!(GiveawayStatus::parse("paused"), None);
    }
}
