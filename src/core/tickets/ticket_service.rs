// Ticket service - one open ticket per user per guild.

use super::ticket_models::{Ticket, TicketPreparation, TicketSettings, TicketStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Ticket system not set up. Please ask an admin to run `/ticket_setup`.")]
    NotConfigured,

    #[error("Please wait, your ticket is being created...")]
    CreationInProgress,

    #[error("This is not a ticket channel.")]
    NotATicket,

    #[error("This ticket is already closed.")]
    AlreadyClosed,

    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn save_settings(&self, guild_id: u64, settings: &TicketSettings) -> Result<(), TicketError>;

    async fn get_settings(&self, guild_id: u64) -> Result<Option<TicketSettings>, TicketError>;

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), TicketError>;

    async fn get_ticket(&self, channel_id: u64) -> Result<Option<Ticket>, TicketError>;

    async fn find_open_ticket(&self, guild_id: u64, owner_id: u64)
        -> Result<Option<Ticket>, TicketError>;

    async fn set_status(&self, channel_id: u64, status: TicketStatus) -> Result<(), TicketError>;
}

/// Held while a user's ticket is being created; releases the user on drop.
pub struct CreationGuard<'a> {
    in_flight: &'a DashSet<u64>,
    user_id: u64,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.user_id);
    }
}

pub struct TicketService<S: TicketStore> {
    store: S,
    in_flight: DashSet<u64>,
}

impl<S: TicketStore> TicketService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: DashSet::new(),
        }
    }

    pub async fn save_settings(
        &self,
        guild_id: u64,
        settings: TicketSettings,
    ) -> Result<(), TicketError> {
        self.store.save_settings(guild_id, &settings).await
    }

    pub async fn settings(&self, guild_id: u64) -> Result<TicketSettings, TicketError> {
        self.store
            .get_settings(guild_id)
            .await?
            .ok_or(TicketError::NotConfigured)
    }

    /// Reserve ticket creation for a user. A second press while the first is
    /// still running is refused.
    pub fn begin_creation(&self, user_id: u64) -> Result<CreationGuard<'_>, TicketError> {
        if !self.in_flight.insert(user_id) {
            return Err(TicketError::CreationInProgress);
        }
        Ok(CreationGuard {
            in_flight: &self.in_flight,
            user_id,
        })
    }

    /// Decide whether to point the user at an existing ticket or create one.
    ///
    /// An open ticket whose channel no longer exists is closed on the way.
    pub async fn prepare_ticket(
        &self,
        guild_id: u64,
        user_id: u64,
        channel_exists: impl Fn(u64) -> bool,
    ) -> Result<TicketPreparation, TicketError> {
        let settings = self.settings(guild_id).await?;

        if let Some(existing) = self.store.find_open_ticket(guild_id, user_id).await? {
            if channel_exists(existing.channel_id) {
                return Ok(TicketPreparation::Existing(existing.channel_id));
            }

            tracing::info!(
                channel_id = existing.channel_id,
                user_id,
                "Closing ticket whose channel is gone"
            );
            self.store
                .set_status(existing.channel_id, TicketStatus::Closed)
                .await?;
        }

        Ok(TicketPreparation::Create {
            category_id: settings.active_category_id,
        })
    }

    pub async fn record_ticket(
        &self,
        channel_id: u64,
        guild_id: u64,
        owner_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Ticket, TicketError> {
        let ticket = Ticket {
            channel_id,
            guild_id,
            owner_id,
            status: TicketStatus::Open,
            created_at: now,
        };
        self.store.insert_ticket(&ticket).await?;
        Ok(ticket)
    }

    /// The ticket recorded for this channel, if any.
    pub async fn ticket_for_channel(&self, channel_id: u64) -> Result<Ticket, TicketError> {
        self.store
            .get_ticket(channel_id)
            .await?
            .ok_or(TicketError::NotATicket)
    }

    /// Where a ticket should be moved when it is closed.
    pub async fn archive_category(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<u64, TicketError> {
        let ticket = self.ticket_for_channel(channel_id).await?;
        if ticket.status == TicketStatus::Closed {
            return Err(TicketError::AlreadyClosed);
        }
        Ok(self.settings(guild_id).await?.archive_category_id)
    }

    pub async fn mark_closed(&self, channel_id: u64) -> Result<(), TicketError> {
        self.store.set_status(channel_id, TicketStatus::Closed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    struct MockTicketStore {
        settings: DashMap<u64, TicketSettings>,
        tickets: DashMap<u64, Ticket>,
    }

    #[async_trait]
    impl TicketStore for MockTicketStore {
        async fn save_settings(
            &self,
            guild_id: u64,
            settings: &TicketSettings,
        ) -> Result<(), TicketError> {
            self.settings.insert(guild_id, *settings);
            Ok(())
        }

        async fn get_settings(&self, guild_id: u64) -> Result<Option<TicketSettings>, TicketError> {
            Ok(self.settings.get(&guild_id).map(|s| *s))
        }

        async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), TicketError> {
            self.tickets.insert(ticket.channel_id, ticket.clone());
            Ok(())
        }

        async fn get_ticket(&self, channel_id: u64) -> Result<Option<Ticket>, TicketError> {
            Ok(self.tickets.get(&channel_id).map(|t| t.clone()))
        }

        async fn find_open_ticket(
            &self,
            guild_id: u64,
            owner_id: u64,
        ) -> Result<Option<Ticket>, TicketError> {
            Ok(self
                .tickets
                .iter()
                .find(|t| {
                    t.guild_id == guild_id
                        && t.owner_id == owner_id
                        && t.status == TicketStatus::Open
                })
                .map(|t| t.clone()))
        }

        async fn set_status(&self, channel_id: u64, status: TicketStatus) -> Result<(), TicketError> {
            if let Some(mut ticket) = self.tickets.get_mut(&channel_id) {
                ticket.status = status;
            }
            Ok(())
        }
    }

    const SETTINGS: TicketSettings = TicketSettings {
        active_category_id: 10,
        archive_category_id: 11,
        panel_channel_id: 12,
    };

    async fn configured() -> TicketService<MockTicketStore> {
        let service = TicketService::new(MockTicketStore::default());
        service.save_settings(1, SETTINGS).await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_requires_setup() {
        let service = TicketService::new(MockTicketStore::default());
        assert!(matches!(
            service.prepare_ticket(1, 5, |_| true).await,
            Err(TicketError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_new_user_gets_a_ticket() {
        let service = configured().await;
        let prep = service.prepare_ticket(1, 5, |_| true).await.unwrap();
        assert_eq!(prep, TicketPreparation::Create { category_id: 10 });
    }

    #[tokio::test]
    async fn test_existing_open_ticket_is_reused() {
        let service = configured().await;
        service.record_ticket(100, 1, 5, Utc::now()).await.unwrap();

        let prep = service.prepare_ticket(1, 5, |_| true).await.unwrap();
        assert_eq!(prep, TicketPreparation::Existing(100));
    }

    #[tokio::test]
    async fn test_ghost_ticket_is_closed() {
        let service = configured().await;
        service.record_ticket(100, 1, 5, Utc::now()).await.unwrap();

        let prep = service.prepare_ticket(1, 5, |_| false).await.unwrap();
        assert_eq!(prep, TicketPreparation::Create { category_id: 10 });
        assert_eq!(
            service.ticket_for_channel(100).await.unwrap().status,
            TicketStatus::Closed
        );
    }

    #[tokio::test]
    async fn test_one_creation_in_flight_per_user() {
        let service = configured().await;

        let guard = service.begin_creation(5).unwrap();
        assert!(matches!(
            service.begin_creation(5),
            Err(TicketError::CreationInProgress)
        ));
        assert!(service.begin_creation(6).is_ok());

        drop(guard);
        assert!(service.begin_creation(5).is_ok());
    }

    #[tokio::test]
    async fn test_close_flow() {
        let service = configured().await;
        service.record_ticket(100, 1, 5, Utc::now()).await.unwrap();

        assert_eq!(service.archive_category(1, 100).await.unwrap(), 11);
        service.mark_closed(100).await.unwrap();

        assert!(matches!(
            service.archive_category(1, 100).await,
            Err(TicketError::AlreadyClosed)
        ));
        assert!(matches!(
            service.archive_category(1, 999).await,
            Err(TicketError::NotATicket)
        ));
    }
}
