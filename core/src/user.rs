//! Editor accounts.

use crate::ids::UserId;
use serde::{Deserialize, Serialize};

/// An editor who works on tickets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique id
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Login name (key of the user set)
    pub username: String,
    /// E-mail address
    pub mail: String,
    /// Password hash (never rendered into mails)
    pub hash: String,
    /// Editors on holiday may be excluded from new assignments
    #[serde(default)]
    pub is_on_holiday: bool,
}
