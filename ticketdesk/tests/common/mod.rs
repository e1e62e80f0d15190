//! Shared setup for the integration tests.

#![allow(dead_code)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use ticketdesk::{Config, Repositories, Services};
use ticketdesk_core::{User, UserId};
use ticketdesk_testing::{
    InMemoryMailRepository, InMemoryTicketRepository, InMemoryUserRepository,
    SequentialIdGenerator, init_test_tracing, test_clock,
};

/// Seeded services plus handles on the repositories behind them.
pub struct TestDesk {
    pub services: Services,
    pub ticket_repo: InMemoryTicketRepository,
    pub mail_repo: InMemoryMailRepository,
    pub user_repo: InMemoryUserRepository,
}

pub fn editor(id: &str, username: &str, on_holiday: bool) -> User {
    User {
        id: UserId::new(id),
        name: username.to_uppercase(),
        username: username.to_string(),
        mail: format!("{username}@trivial-tickets.com"),
        hash: "$2a$12$hash".to_string(),
        is_on_holiday: on_holiday,
    }
}

pub async fn desk_with(config: &Config) -> TestDesk {
    init_test_tracing();

    let ticket_repo = InMemoryTicketRepository::new();
    let mail_repo = InMemoryMailRepository::new();
    let user_repo = InMemoryUserRepository::with_users([
        editor("u1", "alice", false),
        editor("u2", "bob", false),
        editor("u3", "carol", true),
    ]);

    let services = Services::recover(
        config,
        Repositories {
            tickets: Arc::new(ticket_repo.clone()),
            mails: Arc::new(mail_repo.clone()),
            users: Arc::new(user_repo.clone()),
        },
        Arc::new(test_clock()),
        Arc::new(SequentialIdGenerator::new("id")),
    )
    .await
    .expect("in-memory recovery should succeed");

    TestDesk {
        services,
        ticket_repo,
        mail_repo,
        user_repo,
    }
}

pub async fn desk() -> TestDesk {
    desk_with(&Config::default()).await
}
