//! JSON-file Persistence Gateway.
//!
//! Layout:
//!
//! ```text
//! <tickets_dir>/<ticket id>.json   one pretty-printed ticket per file
//! <mails_dir>/<mail id>.json       one pending mail per file
//! <users_file>                     {"<username>": User, ...}
//! ```
//!
//! Directories are created on first write. Files are written to a temporary
//! sibling and renamed into place, so a crash never leaves a truncated record.
//! Loading ignores files without a `.json` extension and treats a missing
//! directory as empty.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use ticketdesk_core::{
    Mail, MailId, MailRepository, PersistenceError, PersistenceFuture, Ticket, TicketRepository,
    User, UserRepository,
};
use tokio::fs;

type FileResult<T> = Result<T, PersistenceError>;

/// Tickets as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileTicketRepository {
    dir: PathBuf,
}

impl JsonFileTicketRepository {
    /// Store tickets under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TicketRepository for JsonFileTicketRepository {
    fn save_ticket<'a>(&'a self, ticket: &'a Ticket) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            let path = record_path(&self.dir, ticket.id.as_str())?;
            write_json(&path, ticket).await
        })
    }

    fn load_tickets(&self) -> PersistenceFuture<'_, Vec<Ticket>> {
        Box::pin(read_json_dir(&self.dir))
    }
}

/// Pending mails as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileMailRepository {
    dir: PathBuf,
}

impl JsonFileMailRepository {
    /// Store mails under `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MailRepository for JsonFileMailRepository {
    fn save_mail<'a>(&'a self, mail: &'a Mail) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            let path = record_path(&self.dir, mail.id.as_str())?;
            write_json(&path, mail).await
        })
    }

    fn remove_mail<'a>(&'a self, id: &'a MailId) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            let path = record_path(&self.dir, id.as_str())?;
            match fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(PersistenceError::io(path, e)),
            }
        })
    }

    fn load_mails(&self) -> PersistenceFuture<'_, Vec<Mail>> {
        Box::pin(read_json_dir(&self.dir))
    }
}

/// The user set as a single JSON object keyed by login name.
#[derive(Debug, Clone)]
pub struct JsonFileUserRepository {
    path: PathBuf,
}

impl JsonFileUserRepository {
    /// Read and write the user set at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UserRepository for JsonFileUserRepository {
    fn load_users(&self) -> PersistenceFuture<'_, Vec<User>> {
        Box::pin(async move {
            let bytes = match fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!(path = %self.path.display(), "User file not found, starting without users");
                    return Ok(Vec::new());
                }
                Err(e) => return Err(PersistenceError::io(&self.path, e)),
            };
            let users: BTreeMap<String, User> = serde_json::from_slice(&bytes)
                .map_err(|e| PersistenceError::serialization(&self.path, &e))?;
            Ok(users.into_values().collect())
        })
    }

    fn save_users<'a>(&'a self, users: &'a [User]) -> PersistenceFuture<'a, ()> {
        Box::pin(async move {
            let map: BTreeMap<&str, &User> = users
                .iter()
                .map(|user| (user.username.as_str(), user))
                .collect();
            write_json(&self.path, &map).await
        })
    }
}

/// `<dir>/<id>.json`, refusing ids that would escape `dir`.
fn record_path(dir: &Path, id: &str) -> FileResult<PathBuf> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(PersistenceError::Unavailable(format!(
            "'{id}' is not a valid record id"
        )));
    }
    Ok(dir.join(format!("{id}.json")))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> FileResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| PersistenceError::io(parent, e))?;
    }

    let json =
        serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::serialization(path, &e))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .await
        .map_err(|e| PersistenceError::io(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| PersistenceError::io(path, e))
}

async fn read_json_dir<T: DeserializeOwned>(dir: &Path) -> FileResult<Vec<T>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PersistenceError::io(dir, e)),
    };

    let mut records = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PersistenceError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let bytes = fs::read(&path)
            .await
            .map_err(|e| PersistenceError::io(&path, e))?;
        let record =
            serde_json::from_slice(&bytes).map_err(|e| PersistenceError::serialization(&path, &e))?;
        records.push(record);
    }
    Ok(records)
}
