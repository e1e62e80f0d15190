//! User Directory: the editor set and the holiday policy.
//!
//! Users are read-mostly. Tickets copy an [`Assignee`](ticketdesk_core::Assignee)
//! snapshot at assignment time, so toggling a holiday flag here never changes
//! tickets that are already assigned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use ticketdesk_core::{Result, TicketError, User, UserRepository};
use tokio::sync::RwLock;

/// Whether editors on holiday may be assigned new tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayPolicy {
    /// Ignore the holiday flag
    #[default]
    Allow,
    /// Refuse assignment with `AssigneeOnHoliday`
    RejectOnHoliday,
}

/// Unknown `HOLIDAY_POLICY` value.
#[derive(Debug, Error)]
#[error("unknown holiday policy '{0}' (expected 'allow' or 'reject')")]
pub struct ParseHolidayPolicyError(String);

impl FromStr for HolidayPolicy {
    type Err = ParseHolidayPolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" | "reject_on_holiday" => Ok(Self::RejectOnHoliday),
            other => Err(ParseHolidayPolicyError(other.to_string())),
        }
    }
}

impl HolidayPolicy {
    /// Check `user` against the policy.
    ///
    /// # Errors
    ///
    /// [`TicketError::AssigneeOnHoliday`] when the policy rejects the user.
    pub fn check(self, user: &User) -> Result<()> {
        match self {
            Self::RejectOnHoliday if user.is_on_holiday => {
                Err(TicketError::AssigneeOnHoliday(user.username.clone()))
            }
            _ => Ok(()),
        }
    }
}

/// The editor set, keyed by login name.
pub struct UserDirectory {
    repository: Arc<dyn UserRepository>,
    users: RwLock<BTreeMap<String, User>>,
}

impl UserDirectory {
    /// Create a directory seeded with `users`.
    #[must_use]
    pub fn new(repository: Arc<dyn UserRepository>, users: Vec<User>) -> Self {
        let users = users
            .into_iter()
            .map(|user| (user.username.clone(), user))
            .collect();
        Self {
            repository,
            users: RwLock::new(users),
        }
    }

    /// Load the user set from `repository`.
    ///
    /// # Errors
    ///
    /// Propagates the repository's load failure.
    pub async fn load(repository: Arc<dyn UserRepository>) -> Result<Self> {
        let users = repository.load_users().await?;
        Ok(Self::new(repository, users))
    }

    /// Look up a user by login name.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown login name.
    pub async fn get(&self, username: &str) -> Result<User> {
        self.users
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| TicketError::user_not_found(username))
    }

    /// All users, ordered by login name.
    pub async fn list(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }

    /// Set or clear a user's holiday flag and persist the user set.
    ///
    /// The in-memory set only changes once the write has succeeded.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown login name, `Persistence` if the write fails.
    pub async fn set_holiday(&self, username: &str, on_holiday: bool) -> Result<User> {
        let mut users = self.users.write().await;

        let mut updated = users
            .get(username)
            .cloned()
            .ok_or_else(|| TicketError::user_not_found(username))?;
        updated.is_on_holiday = on_holiday;

        let snapshot: Vec<User> = users
            .values()
            .map(|user| {
                if user.username == username {
                    updated.clone()
                } else {
                    user.clone()
                }
            })
            .collect();
        self.repository.save_users(&snapshot).await?;

        users.insert(username.to_string(), updated.clone());
        tracing::info!(username, on_holiday, "Holiday flag updated");
        Ok(updated)
    }
}
