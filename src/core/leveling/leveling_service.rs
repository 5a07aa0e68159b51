// This is the leveling module - it contains ALL the business logic for the leveling system.
// No serenity or poise imports here: the service works with plain ids so the
// rules (cooldown, XP curve, level rewards) can be tested without Discord.

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A user's progress in one guild. `xp` is the progress inside the current level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRecord {
    pub user_id: u64,
    pub guild_id: u64,
    pub xp: u64,
    pub level: u32,
}

impl LevelRecord {
    pub fn new(user_id: u64, guild_id: u64) -> Self {
        Self {
            user_id,
            guild_id,
            xp: 0,
            level: 0,
        }
    }

    /// XP required to leave the current level.
    pub fn xp_needed(&self) -> u64 {
        xp_for_level(self.level)
    }
}

/// Returned when a message pushes a user into a new level.
/// The Discord layer announces it and hands out the reward role, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpEvent {
    pub user_id: u64,
    pub guild_id: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub reward_role_id: Option<u64>,
}

/// A role handed out when a member reaches a level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelReward {
    pub level: u32,
    pub role_id: u64,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("User is on cooldown. Time remaining: {0:?}")]
    OnCooldown(Duration),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid user or guild ID")]
    InvalidId,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait LevelStore: Send + Sync {
    /// Get a user's record in a guild, `None` if they never earned XP there.
    async fn get_record(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<LevelRecord>, LevelingError>;

    /// Insert or replace a user's record.
    async fn save_record(&self, record: &LevelRecord) -> Result<(), LevelingError>;

    /// Top records in a guild, ordered by level then XP (both descending).
    async fn get_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<LevelRecord>, LevelingError>;

    async fn set_reward(&self, guild_id: u64, reward: &LevelReward) -> Result<(), LevelingError>;

    async fn get_reward(&self, guild_id: u64, level: u32) -> Result<Option<u64>, LevelingError>;

    /// All rewards of a guild, ordered by level.
    async fn list_rewards(&self, guild_id: u64) -> Result<Vec<LevelReward>, LevelingError>;

    /// Returns `false` when no reward was configured for that level.
    async fn remove_reward(&self, guild_id: u64, level: u32) -> Result<bool, LevelingError>;
}

// ============================================================================
// XP CURVE
// ============================================================================

/// XP needed to go from `level` to `level + 1`.
pub fn xp_for_level(level: u32) -> u64 {
    (level as u64 + 1) * 100
}

/// Add XP to a record. Returns the previous level when the gain crossed a level boundary.
///
/// At most one level is gained per call; the remainder carries over into the new level.
pub fn apply_xp(record: &mut LevelRecord, gain: u64) -> Option<u32> {
    let total = record.xp.saturating_add(gain);
    let needed = record.xp_needed();

    if total >= needed {
        let old_level = record.level;
        record.level += 1;
        record.xp = total - needed;
        Some(old_level)
    } else {
        record.xp = total;
        None
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The main service for leveling operations.
pub struct LevelingService<S: LevelStore> {
    store: S,

    /// Last XP gain per (user, guild). Lives in memory only; resets on restart.
    cooldowns: DashMap<(u64, u64), Instant>,

    cooldown: Duration,

    /// Expired cooldowns are swept once the map holds this many entries.
    prune_threshold: usize,

    xp_per_message: RangeInclusive<u64>,
}

impl<S: LevelStore> LevelingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cooldowns: DashMap::new(),
            cooldown: Duration::from_secs(60),
            prune_threshold: 10_000,
            xp_per_message: 15..=25,
        }
    }

    fn validate_ids(user_id: u64, guild_id: u64) -> Result<(), LevelingError> {
        if user_id == 0 || guild_id == 0 {
            Err(LevelingError::InvalidId)
        } else {
            Ok(())
        }
    }

    /// Start the cooldown for a user, or report how long is left.
    fn enter_cooldown(&self, user_id: u64, guild_id: u64) -> Result<(), LevelingError> {
        let now = Instant::now();

        // Must run before `entry` takes a shard lock
        if self.cooldowns.len() >= self.prune_threshold {
            self.cooldowns
                .retain(|_, last| now.duration_since(*last) < self.cooldown);
        }

        match self.cooldowns.entry((user_id, guild_id)) {
            dashmap::mapref::entry::Entry::Occupied(mut last) => {
                let elapsed = now.duration_since(*last.get());
                if elapsed < self.cooldown {
                    return Err(LevelingError::OnCooldown(self.cooldown - elapsed));
                }
                last.insert(now);
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(now);
            }
        }

        Ok(())
    }

    /// Process a message and potentially award XP.
    ///
    /// **Returns:**
    /// - `Ok(Some(LevelUpEvent))` if the user leveled up
    /// - `Ok(None)` if XP was awarded but no level up occurred
    /// - `Err(LevelingError::OnCooldown)` if the user is on cooldown
    pub async fn process_message(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<LevelUpEvent>, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;
        self.enter_cooldown(user_id, guild_id)?;

        let gain = rand::thread_rng().gen_range(self.xp_per_message.clone());
        self.award_xp(user_id, guild_id, gain).await
    }

    /// Award a fixed amount of XP, bypassing the cooldown.
    pub async fn award_xp(
        &self,
        user_id: u64,
        guild_id: u64,
        amount: u64,
    ) -> Result<Option<LevelUpEvent>, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;

        let mut record = self
            .store
            .get_record(user_id, guild_id)
            .await?
            .unwrap_or_else(|| LevelRecord::new(user_id, guild_id));

        let leveled_from = apply_xp(&mut record, amount);
        self.store.save_record(&record).await?;

        let Some(old_level) = leveled_from else {
            return Ok(None);
        };

        let reward_role_id = self.store.get_reward(guild_id, record.level).await?;
        tracing::debug!(user_id, guild_id, level = record.level, "User leveled up");

        Ok(Some(LevelUpEvent {
            user_id,
            guild_id,
            old_level,
            new_level: record.level,
            reward_role_id,
        }))
    }

    /// Get a user's current record. `None` until they earn their first XP.
    pub async fn get_user_stats(
        &self,
        user_id: u64,
        guild_id: u64,
    ) -> Result<Option<LevelRecord>, LevelingError> {
        Self::validate_ids(user_id, guild_id)?;
        self.store.get_record(user_id, guild_id).await
    }

    pub async fn get_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<LevelRecord>, LevelingError> {
        if guild_id == 0 {
            return Err(LevelingError::InvalidId);
        }
        self.store.get_leaderboard(guild_id, limit).await
    }

    pub async fn set_reward(
        &self,
        guild_id: u64,
        level: u32,
        role_id: u64,
    ) -> Result<(), LevelingError> {
        self.store
            .set_reward(guild_id, &LevelReward { level, role_id })
            .await
    }

    pub async fn list_rewards(&self, guild_id: u64) -> Result<Vec<LevelReward>, LevelingError> {
        self.store.list_rewards(guild_id).await
    }

    pub async fn remove_reward(&self, guild_id: u64, level: u32) -> Result<bool, LevelingError> {
        self.store.remove_reward(guild_id, level).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockLevelStore {
        records: DashMap<(u64, u64), LevelRecord>,
        rewards: DashMap<(u64, u32), u64>,
    }

    #[async_trait]
    impl LevelStore for MockLevelStore {
        async fn get_record(
            &self,
            user_id: u64,
            guild_id: u64,
        ) -> Result<Option<LevelRecord>, LevelingError> {
            Ok(self.records.get(&(user_id, guild_id)).map(|r| r.clone()))
        }

        async fn save_record(&self, record: &LevelRecord) -> Result<(), LevelingError> {
            self.records
                .insert((record.user_id, record.guild_id), record.clone());
            Ok(())
        }

        async fn get_leaderboard(
            &self,
            guild_id: u64,
            limit: usize,
        ) -> Result<Vec<LevelRecord>, LevelingError> {
            let mut rows: Vec<LevelRecord> = self
                .records
                .iter()
                .filter(|r| r.guild_id == guild_id)
                .map(|r| r.clone())
                .collect();
            rows.sort_by(|a, b| b.level.cmp(&a.level).then(b.xp.cmp(&a.xp)));
            rows.truncate(limit);
            Ok(rows)
        }

        async fn set_reward(
            &self,
            guild_id: u64,
            reward: &LevelReward,
        ) -> Result<(), LevelingError> {
            self.rewards.insert((guild_id, reward.level), reward.role_id);
            Ok(())
        }

        async fn get_reward(&self, guild_id: u64, level: u32) -> Result<Option<u64>, LevelingError> {
            Ok(self.rewards.get(&(guild_id, level)).map(|r| *r))
        }

        async fn list_rewards(&self, guild_id: u64) -> Result<Vec<LevelReward>, LevelingError> {
            let mut rewards: Vec<LevelReward> = self
                .rewards
                .iter()
                .filter(|r| r.key().0 == guild_id)
                .map(|r| LevelReward {
                    level: r.key().1,
                    role_id: *r.value(),
                })
                .collect();
            rewards.sort_by_key(|r| r.level);
            Ok(rewards)
        }

        async fn remove_reward(&self, guild_id: u64, level: u32) -> Result<bool, LevelingError> {
            Ok(self.rewards.remove(&(guild_id, level)).is_some())
        }
    }

    fn make_service() -> LevelingService<MockLevelStore> {
        LevelingService::new(MockLevelStore::default())
    }

    #[test]
    fn test_xp_for_level() {
        assert_eq!(xp_for_level(0), 100);
        assert_eq!(xp_for_level(1), 200);
        assert_eq!(xp_for_level(9), 1_000);
    }

    #[test]
    fn test_apply_xp_carries_remainder() {
        let mut record = LevelRecord::new(1, 2);
        assert_eq!(apply_xp(&mut record, 90), None);
        assert_eq!((record.level, record.xp), (0, 90));

        assert_eq!(apply_xp(&mut record, 25), Some(0));
        assert_eq!((record.level, record.xp), (1, 15));

        // Level 1 needs 200
        assert_eq!(apply_xp(&mut record, 184), None);
        assert_eq!(apply_xp(&mut record, 1), Some(1));
        assert_eq!((record.level, record.xp), (2, 0));
    }

    #[tokio::test]
    async fn test_first_message_creates_level_zero_record() {
        let service = make_service();

        assert!(service.process_message(1, 2).await.unwrap().is_none());

        let record = service.get_user_stats(1, 2).await.unwrap().unwrap();
        assert_eq!(record.level, 0);
        assert!((15..=25).contains(&record.xp));
    }

    #[tokio::test]
    async fn test_cooldown_blocks_second_message() {
        let service = make_service();

        service.process_message(1, 2).await.unwrap();
        assert!(matches!(
            service.process_message(1, 2).await,
            Err(LevelingError::OnCooldown(_))
        ));

        // Cooldowns are per guild
        assert!(service.process_message(1, 3).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_cooldowns_are_pruned() {
        let mut service = make_service();
        service.cooldown = Duration::from_millis(5);
        service.prune_threshold = 3;

        for user_id in 1..=3 {
            service.process_message(user_id, 9).await.unwrap();
        }
        assert_eq!(service.cooldowns.len(), 3);

        tokio::time::sleep(Duration::from_millis(20)).await;

        // The next write sweeps the three expired entries first
        service.process_message(4, 9).await.unwrap();
        assert_eq!(service.cooldowns.len(), 1);
        assert!(service.cooldowns.contains_key(&(4, 9)));
    }

    #[tokio::test]
    async fn test_level_up_reports_reward_role() {
        let service = make_service();
        service.set_reward(2, 1, 555).await.unwrap();

        assert!(service.award_xp(1, 2, 99).await.unwrap().is_none());
        let event = service.award_xp(1, 2, 1).await.unwrap().unwrap();

        assert_eq!(event.old_level, 0);
        assert_eq!(event.new_level, 1);
        assert_eq!(event.reward_role_id, Some(555));

        // Level 2 has no reward
        let event = service.award_xp(1, 2, 200).await.unwrap().unwrap();
        assert_eq!(event.new_level, 2);
        assert_eq!(event.reward_role_id, None);
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_level_then_xp() {
        let service = make_service();
        service.award_xp(1, 9, 50).await.unwrap();
        service.award_xp(2, 9, 120).await.unwrap(); // level 1, 20 xp
        service.award_xp(3, 9, 90).await.unwrap();
        service.award_xp(4, 8, 500).await.unwrap(); // other guild

        let board = service.get_leaderboard(9, 10).await.unwrap();
        let order: Vec<u64> = board.iter().map(|r| r.user_id).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_reward_management() {
        let service = make_service();
        service.set_reward(1, 10, 100).await.unwrap();
        service.set_reward(1, 5, 50).await.unwrap();
        service.set_reward(1, 5, 51).await.unwrap();

        let rewards = service.list_rewards(1).await.unwrap();
        assert_eq!(
            rewards,
            vec![
                LevelReward { level: 5, role_id: 51 },
                LevelReward { level: 10, role_id: 100 },
            ]
        );

        assert!(service.remove_reward(1, 5).await.unwrap());
        assert!(!service.remove_reward(1, 5).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_ids_rejected() {
        let service = make_service();
        assert!(matches!(
            service.process_message(0, 1).await,
            Err(LevelingError::InvalidId)
        ));
        assert!(matches!(
            service.get_leaderboard(0, 10).await,
            Err(LevelingError::InvalidId)
        ));
    }

    #[test]
    fn leveling_error_messages_are_descriptive() {
        let storage_error = LevelingError::StorageError("db down".into());
        assert!(storage_error.to_string().contains("db down"));

        let invalid_id = LevelingError::InvalidId;
        assert_eq!(invalid_id.to_string(), "Invalid user or guild ID");
    }
}
