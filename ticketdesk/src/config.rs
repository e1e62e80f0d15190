//! Configuration management for ticketdesk.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::users::HolidayPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use ticketdesk_core::RandomIdGenerator;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Where tickets, mails and users live on disk
    pub storage: StorageConfig,
    /// Outgoing mail configuration
    pub mail: MailConfig,
    /// Ticket lifecycle policy
    pub tickets: TicketConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// One `<id>.json` per ticket
    pub tickets_dir: PathBuf,
    /// One `<id>.json` per pending mail
    pub mails_dir: PathBuf,
    /// The user set
    pub users_file: PathBuf,
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Base of ticket permalinks (scheme, host and port)
    pub public_base_url: String,
    /// `from` address of every outgoing mail
    pub sender: String,
    /// Address customers reply to
    pub support_address: String,
    /// Bracketed subject prefix, also used as the signature brand
    pub subject_prefix: String,
}

/// Ticket lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Length of generated ticket and mail ids (at least 10)
    pub id_length: usize,
    /// Whether editors on holiday may take new tickets
    pub holiday_policy: HolidayPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8443),
                request_timeout: env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                shutdown_timeout: env::var("SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                metrics_enabled: env::var("METRICS_ENABLED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
            storage: StorageConfig {
                tickets_dir: env::var("TICKETS_DIR")
                    .unwrap_or_else(|_| "files/tickets".to_string())
                    .into(),
                mails_dir: env::var("MAILS_DIR")
                    .unwrap_or_else(|_| "files/mails".to_string())
                    .into(),
                users_file: env::var("USERS_FILE")
                    .unwrap_or_else(|_| "files/users/users.json".to_string())
                    .into(),
            },
            mail: MailConfig {
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| "https://localhost:8443".to_string()),
                sender: env::var("MAIL_SENDER")
                    .unwrap_or_else(|_| "no-reply@trivial-tickets.com".to_string()),
                support_address: env::var("SUPPORT_ADDRESS")
                    .unwrap_or_else(|_| "support@trivial-tickets.com".to_string()),
                subject_prefix: env::var("MAIL_SUBJECT_PREFIX")
                    .unwrap_or_else(|_| "trivial-tickets".to_string()),
            },
            tickets: TicketConfig {
                id_length: env::var("ID_LENGTH")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(RandomIdGenerator::MIN_LENGTH)
                    .max(RandomIdGenerator::MIN_LENGTH),
                holiday_policy: env::var("HOLIDAY_POLICY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
        }
    }

    /// Address the HTTP listener binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Per-request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout)
    }

    /// Grace period for in-flight requests on shutdown
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

impl Default for Config {
    /// The configuration `from_env` yields with no variables set.
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8443,
                request_timeout: 30,
                shutdown_timeout: 5,
                metrics_enabled: true,
            },
            storage: StorageConfig {
                tickets_dir: "files/tickets".into(),
                mails_dir: "files/mails".into(),
                users_file: "files/users/users.json".into(),
            },
            mail: MailConfig {
                public_base_url: "https://localhost:8443".to_string(),
                sender: "no-reply@trivial-tickets.com".to_string(),
                support_address: "support@trivial-tickets.com".to_string(),
                subject_prefix: "trivial-tickets".to_string(),
            },
            tickets: TicketConfig {
                id_length: RandomIdGenerator::MIN_LENGTH,
                holiday_policy: HolidayPolicy::Allow,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8443");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.mail.sender, "no-reply@trivial-tickets.com");
        assert_eq!(config.tickets.id_length, 10);
        assert_eq!(config.tickets.holiday_policy, HolidayPolicy::Allow);
    }
}
