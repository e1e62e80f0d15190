//! Startup recovery: build the stores and reload them from disk.
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let services = Services::from_config(&config).await?;
//! let state = AppState::new(services.tickets, services.outbox, services.users, None);
//! ```

use crate::config::Config;
use crate::notifications::MailTemplate;
use crate::outbox::MailOutbox;
use crate::persistence::{JsonFileMailRepository, JsonFileTicketRepository, JsonFileUserRepository};
use crate::tickets::TicketStore;
use crate::users::UserDirectory;
use anyhow::Context;
use std::sync::Arc;
use ticketdesk_core::{
    Clock, IdGenerator, MailRepository, RandomIdGenerator, Result, SystemClock, TicketRepository,
    UserRepository,
};
use tracing::info;

/// The three stores, wired together and seeded.
#[derive(Clone)]
pub struct Services {
    /// Ticket Store
    pub tickets: Arc<TicketStore>,
    /// Mail Outbox
    pub outbox: Arc<MailOutbox>,
    /// User Directory
    pub users: Arc<UserDirectory>,
}

/// Persistence Gateway implementations backing [`Services`].
pub struct Repositories {
    /// Ticket records
    pub tickets: Arc<dyn TicketRepository>,
    /// Pending mail records
    pub mails: Arc<dyn MailRepository>,
    /// The user set
    pub users: Arc<dyn UserRepository>,
}

impl Services {
    /// Create the storage directories, then recover from the JSON files named
    /// in `config` using the system clock and random ids.
    ///
    /// # Errors
    ///
    /// Returns error if a directory cannot be created or any record fails to
    /// load. Startup must not continue with a partial state.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = &config.storage;
        for dir in [&storage.tickets_dir, &storage.mails_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
        }

        let repositories = Repositories {
            tickets: Arc::new(JsonFileTicketRepository::new(&storage.tickets_dir)),
            mails: Arc::new(JsonFileMailRepository::new(&storage.mails_dir)),
            users: Arc::new(JsonFileUserRepository::new(&storage.users_file)),
        };
        let ids: Arc<dyn IdGenerator> =
            Arc::new(RandomIdGenerator::new(config.tickets.id_length));

        Self::recover(config, repositories, Arc::new(SystemClock), ids)
            .await
            .context("failed to recover state from disk")
    }

    /// Build the stores over `repositories` and seed them with what they hold.
    ///
    /// Recovered mails keep their ids and are listed in creation order.
    ///
    /// # Errors
    ///
    /// Propagates the first load failure.
    pub async fn recover(
        config: &Config,
        repositories: Repositories,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        info!("Loading users...");
        let users = Arc::new(UserDirectory::load(repositories.users).await?);

        info!("Loading pending mails...");
        let mails = repositories.mails.load_mails().await?;
        let outbox = Arc::new(MailOutbox::new(
            repositories.mails,
            clock.clone(),
            ids.clone(),
            config.mail.sender.clone(),
        ));
        outbox.restore(mails).await;

        info!("Loading tickets...");
        let tickets = repositories.tickets.load_tickets().await?;
        let store = Arc::new(TicketStore::new(
            repositories.tickets,
            outbox.clone(),
            MailTemplate::from_config(&config.mail),
            clock,
            ids,
            config.tickets.holiday_policy,
        ));
        store.restore(tickets).await;

        info!("✓ State recovered");
        Ok(Self {
            tickets: store,
            outbox,
            users,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ticketdesk_core::{Mail, MailId, Status, Ticket, TicketId, User, UserId, Utc};
    use ticketdesk_testing::{
        InMemoryMailRepository, InMemoryTicketRepository, InMemoryUserRepository,
        SequentialIdGenerator, test_clock,
    };

    #[tokio::test]
    async fn test_recover_seeds_every_store() {
        let ticket = Ticket {
            id: TicketId::new("t1"),
            subject: "Help".to_string(),
            status: Status::InProgress,
            assignee: None,
            customer: "a@b.com".to_string(),
            entries: Vec::new(),
            merged_into: None,
        };
        let mail = Mail {
            id: MailId::new("m1"),
            from: "no-reply@trivial-tickets.com".to_string(),
            to: "a@b.com".to_string(),
            subject: "s".to_string(),
            message: "b".to_string(),
            created_at: Utc::now(),
        };
        let user = User {
            id: UserId::new("u1"),
            name: "Alice".to_string(),
            username: "alice".to_string(),
            mail: "alice@trivial-tickets.com".to_string(),
            hash: String::new(),
            is_on_holiday: false,
        };

        let repositories = Repositories {
            tickets: Arc::new(InMemoryTicketRepository::with_tickets([ticket.clone()])),
            mails: Arc::new(InMemoryMailRepository::with_mails([mail.clone()])),
            users: Arc::new(InMemoryUserRepository::with_users([user.clone()])),
        };

        let services = Services::recover(
            &Config::default(),
            repositories,
            Arc::new(test_clock()),
            Arc::new(SequentialIdGenerator::new("x")),
        )
        .await
        .unwrap();

        assert_eq!(services.tickets.get_ticket(&ticket.id).await.unwrap(), ticket);
        assert_eq!(services.outbox.list_pending().await, vec![mail]);
        assert_eq!(services.users.get("alice").await.unwrap(), user);
    }
}
