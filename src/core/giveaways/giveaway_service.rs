// Giveaway service - creation, ending and the due-giveaway scan.
//
// The status transition active -> ended goes through `GiveawayStore::mark_ended`,
// which only succeeds for the caller that actually flipped the row. Whoever gets
// `true` back owns the finalisation (edit the embed, draw winners, announce).

use super::giveaway_models::{parse_duration, Giveaway, GiveawayStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Upper bound on winners per giveaway.
pub const MAX_WINNERS: u32 = 50;

#[derive(Debug, Error)]
pub enum GiveawayError {
    #[error("Giveaway not found or already ended.")]
    NotFound,

    #[error("Giveaway has already ended.")]
    AlreadyEnded,

    #[error("Invalid duration format. Use 10s, 10m, 1h, or 1d.")]
    InvalidDuration,

    #[error("Winner count must be between 1 and 50.")]
    InvalidWinnerCount,

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait GiveawayStore: Send + Sync {
    async fn insert(&self, giveaway: &Giveaway) -> Result<(), GiveawayError>;

    async fn get(&self, message_id: u64) -> Result<Option<Giveaway>, GiveawayError>;

    /// Flip an active giveaway to ended. Returns `false` if it was not active.
    async fn mark_ended(&self, message_id: u64) -> Result<bool, GiveawayError>;

    /// Active giveaways whose end time is at or before `now`.
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Giveaway>, GiveawayError>;
}

/// What the caller asked for in `/gstart`, before validation.
#[derive(Debug, Clone)]
pub struct NewGiveaway<'a> {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: u64,
    pub prize: &'a str,
    pub duration: &'a str,
    pub winners_count: u32,
}

pub struct GiveawayService<S: GiveawayStore> {
    store: S,
}

impl<S: GiveawayStore> GiveawayService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Check the user input before anything is posted to Discord.
    /// Returns the computed end time.
    pub fn validate(
        &self,
        duration: &str,
        winners_count: u32,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, GiveawayError> {
        let duration = parse_duration(duration).ok_or(GiveawayError::InvalidDuration)?;
        if winners_count == 0 || winners_count > MAX_WINNERS {
            return Err(GiveawayError::InvalidWinnerCount);
        }

        let duration =
            chrono::Duration::from_std(duration).map_err(|_| GiveawayError::InvalidDuration)?;
        now.checked_add_signed(duration)
            .ok_or(GiveawayError::InvalidDuration)
    }

    /// Persist a giveaway whose message has already been posted.
    pub async fn create(
        &self,
        request: NewGiveaway<'_>,
        now: DateTime<Utc>,
    ) -> Result<Giveaway, GiveawayError> {
        let end_time = self.validate(request.duration, request.winners_count, now)?;

        let giveaway = Giveaway {
            message_id: request.message_id,
            channel_id: request.channel_id,
            guild_id: request.guild_id,
            prize: request.prize.to_string(),
            end_time,
            winners_count: request.winners_count,
            status: GiveawayStatus::Active,
        };

        self.store.insert(&giveaway).await?;
        tracing::info!(
            message_id = giveaway.message_id,
            guild_id = giveaway.guild_id,
            end_time = %giveaway.end_time,
            "Giveaway created"
        );
        Ok(giveaway)
    }

    pub async fn get(&self, message_id: u64) -> Result<Giveaway, GiveawayError> {
        self.store
            .get(message_id)
            .await?
            .ok_or(GiveawayError::NotFound)
    }

    /// End a giveaway on request. Only the call that performs the transition succeeds.
    pub async fn end(&self, message_id: u64) -> Result<Giveaway, GiveawayError> {
        let giveaway = self.get(message_id).await?;
        if giveaway.status == GiveawayStatus::Ended {
            return Err(GiveawayError::AlreadyEnded);
        }

        if !self.store.mark_ended(message_id).await? {
            return Err(GiveawayError::AlreadyEnded);
        }

        Ok(Giveaway {
            status: GiveawayStatus::Ended,
            ..giveaway
        })
    }

    /// Claim every due giveaway. Each returned giveaway has been transitioned
    /// by this call and by no other.
    pub async fn claim_due(&self, now: DateTime<Utc>) -> Result<Vec<Giveaway>, GiveawayError> {
        let due = self.store.find_due(now).await?;
        let mut claimed = Vec::with_capacity(due.len());

        for giveaway in due {
            if self.store.mark_ended(giveaway.message_id).await? {
                claimed.push(Giveaway {
                    status: GiveawayStatus::Ended,
                    ..giveaway
                });
            }
        }

        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    struct MockGiveawayStore {
        rows: DashMap<u64, Giveaway>,
    }

    #[async_trait]
    impl GiveawayStore for MockGiveawayStore {
        async fn insert(&self, giveaway: &Giveaway) -> Result<(), GiveawayError> {
            self.rows.insert(giveaway.message_id, giveaway.clone());
            Ok(())
        }

        async fn get(&self, message_id: u64) -> Result<Option<Giveaway>, GiveawayError> {
            Ok(self.rows.get(&message_id).map(|g| g.clone()))
        }

        async fn mark_ended(&self, message_id: u64) -> Result<bool, GiveawayError> {
            match self.rows.get_mut(&message_id) {
                Some(mut row) if row.status == GiveawayStatus::Active => {
                    row.status = GiveawayStatus::Ended;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Giveaway>, GiveawayError> {
            Ok(self
                .rows
                .iter()
                .filter(|g| g.is_due(now))
                .map(|g| g.clone())
                .collect())
        }
    }

    fn request(message_id: u64, duration: &str) -> NewGiveaway<'_> {
        NewGiveaway {
            message_id,
            channel_id: 10,
            guild_id: 20,
            prize: "Nitro",
            duration,
            winners_count: 1,
        }
    }

    #[tokio::test]
    async fn test_create_computes_end_time() {
        let service = GiveawayService::new(MockGiveawayStore::default());
        let now = Utc::now();

        let giveaway = service.create(request(1, "10m"), now).await.unwrap();
        assert_eq!(giveaway.end_time, now + chrono::Duration::minutes(10));
        assert_eq!(giveaway.status, GiveawayStatus::Active);
        assert_eq!(service.get(1).await.unwrap(), giveaway);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let service = GiveawayService::new(MockGiveawayStore::default());
        let now = Utc::now();

        assert!(matches!(
            service.create(request(1, "soon"), now).await,
            Err(GiveawayError::InvalidDuration)
        ));

        let mut zero_winners = request(2, "1h");
        zero_winners.winners_count = 0;
        assert!(matches!(
            service.create(zero_winners, now).await,
            Err(GiveawayError::InvalidWinnerCount)
        ));
        assert!(service.store.rows.is_empty());
    }

    #[tokio::test]
    async fn test_due_giveaway_is_claimed_exactly_once() {
        let service = GiveawayService::new(MockGiveawayStore::default());
        let start = Utc::now();
        service.create(request(1, "30s"), start).await.unwrap();
        service.create(request(2, "1d"), start).await.unwrap();

        let later = start + chrono::Duration::minutes(1);
        let first = service.claim_due(later).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].message_id, 1);
        assert_eq!(first[0].status, GiveawayStatus::Ended);

        assert!(service.claim_due(later).await.unwrap().is_empty());
        assert_eq!(service.get(1).await.unwrap().status, GiveawayStatus::Ended);
        assert_eq!(service.get(2).await.unwrap().status, GiveawayStatus::Active);
    }

    #[tokio::test]
    async fn test_manual_end_and_scan_do_not_both_finalise() {
        let service = GiveawayService::new(MockGiveawayStore::default());
        let start = Utc::now();
        service.create(request(1, "30s"), start).await.unwrap();

        service.end(1).await.unwrap();
        assert!(matches!(service.end(1).await, Err(GiveawayError::AlreadyEnded)));

        let later = start + chrono::Duration::hours(1);
        assert!(service.claim_due(later).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_unknown_giveaway() {
        let service = GiveawayService::new(MockGiveawayStore::default());
        assert!(matches!(service.end(404).await, Err(GiveawayError::NotFound)));
    }
}
