//! Mail Outbox: pending notifications waiting for the external mail service.
//!
//! The outbox is the single owner of queued mail. Every mutation runs under
//! one lock for the whole read-modify-write, and the Persistence Gateway is
//! written before the in-memory map changes. A mail is therefore in memory
//! only while it is also on disk, and a failed write leaves the outbox as it
//! was.
//!
//! Delivery is at-least-once: the mail service lists pending mail, sends it,
//! and acknowledges each id with [`MailOutbox::verify_and_remove`]. Repeated
//! acknowledgements are harmless and report `false`.

use crate::metrics;
use std::collections::HashMap;
use std::sync::Arc;
use ticketdesk_core::{Clock, IdGenerator, Mail, MailId, MailRepository, Result};
use tokio::sync::Mutex;

#[derive(Default)]
struct OutboxState {
    /// Insertion counter; orders `list_pending`
    next_seq: u64,
    mails: HashMap<MailId, (u64, Mail)>,
}

impl OutboxState {
    fn insert(&mut self, mail: Mail) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.mails.insert(mail.id.clone(), (seq, mail));
    }
}

/// In-memory outbox backed by a [`MailRepository`].
///
/// # Example
///
/// ```ignore
/// let outbox = MailOutbox::new(repository, clock, ids, "no-reply@trivial-tickets.com");
/// let id = outbox.enqueue("a@b.com", "[trivial-tickets] Help", "body").await?;
/// assert!(outbox.verify_and_remove(&id).await?);
/// assert!(!outbox.verify_and_remove(&id).await?);
/// ```
pub struct MailOutbox {
    repository: Arc<dyn MailRepository>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    sender: String,
    state: Mutex<OutboxState>,
}

impl MailOutbox {
    /// Create an empty outbox.
    ///
    /// `sender` becomes the `from` address of every enqueued mail.
    #[must_use]
    pub fn new(
        repository: Arc<dyn MailRepository>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        sender: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            clock,
            ids,
            sender: sender.into(),
            state: Mutex::new(OutboxState::default()),
        }
    }

    /// Seed the outbox with mails recovered from disk.
    ///
    /// Recovered mails keep their ids and are listed in `created_at` order,
    /// ahead of anything enqueued afterwards. Nothing is written back.
    pub async fn restore(&self, mut mails: Vec<Mail>) {
        mails.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut state = self.state.lock().await;
        for mail in mails {
            state.insert(mail);
        }
        metrics::set_pending_mails(state.mails.len());
        tracing::info!(pending = state.mails.len(), "Outbox restored");
    }

    /// Queue a mail for `recipient` and return its fresh id.
    ///
    /// Only touches local storage; never waits on the mail service.
    ///
    /// # Errors
    ///
    /// `Persistence` if the mail could not be written. The outbox is unchanged.
    pub async fn enqueue(
        &self,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<MailId> {
        let mut state = self.state.lock().await;

        let id = loop {
            let candidate = MailId::new(self.ids.next_id());
            if !state.mails.contains_key(&candidate) {
                break candidate;
            }
        };

        let mail = Mail {
            id: id.clone(),
            from: self.sender.clone(),
            to: recipient.into(),
            subject: subject.into(),
            message: body.into(),
            created_at: self.clock.now(),
        };

        self.repository.save_mail(&mail).await?;

        tracing::debug!(mail_id = %id, to = %mail.to, "Mail enqueued");
        state.insert(mail);
        metrics::set_pending_mails(state.mails.len());
        Ok(id)
    }

    /// Snapshot of all pending mail in insertion order (empty when none).
    pub async fn list_pending(&self) -> Vec<Mail> {
        let state = self.state.lock().await;
        let mut pending: Vec<&(u64, Mail)> = state.mails.values().collect();
        pending.sort_by_key(|(seq, _)| *seq);
        pending.into_iter().map(|(_, mail)| mail.clone()).collect()
    }

    /// Remove an acknowledged mail from memory and disk.
    ///
    /// Returns `true` if the mail was pending and is now gone, `false` if no
    /// such mail is pending (never queued, or already removed).
    ///
    /// # Errors
    ///
    /// `Persistence` if the file could not be deleted. The mail stays pending
    /// so the mail service can acknowledge it again.
    pub async fn verify_and_remove(&self, id: &MailId) -> Result<bool> {
        let mut state = self.state.lock().await;

        if !state.mails.contains_key(id) {
            tracing::debug!(mail_id = %id, "Verification for unknown mail");
            metrics::record_mail_verified(false);
            return Ok(false);
        }

        self.repository.remove_mail(id).await?;
        state.mails.remove(id);

        tracing::info!(mail_id = %id, "Mail delivered and removed from outbox");
        metrics::record_mail_verified(true);
        metrics::set_pending_mails(state.mails.len());
        Ok(true)
    }

    /// Number of pending mails
    pub async fn len(&self) -> usize {
        self.state.lock().await.mails.len()
    }

    /// Whether nothing is pending
    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.mails.is_empty()
    }
}
