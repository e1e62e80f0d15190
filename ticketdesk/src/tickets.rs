//! Ticket Store: the single writer of ticket state.
//!
//! # Concurrency
//!
//! All tickets live in one map behind one async mutex. Every mutation holds
//! the lock across its whole read-modify-write, including the file write, and
//! commits to memory only after the Persistence Gateway accepted the new
//! record. No network I/O happens under the lock.
//!
//! Notifications are enqueued after the ticket lock is released. The pair
//! (ticket write, mail enqueue) is not atomic: a crash in between loses at
//! most that one notification.
//!
//! # Lifecycle
//!
//! ```text
//!            caller-directed, any state may return to Open
//!   Open ─────────────▶ InProgress ─────────────▶ Closed
//!    ▲                                              │
//!    └──────────────────────────────────────────────┘
//!
//!   merge(target, source): source becomes a Closed tombstone
//!   (merged_into = target) and rejects every further change
//! ```

use crate::metrics;
use crate::notifications::{MailEvent, MailTemplate};
use crate::outbox::MailOutbox;
use crate::users::HolidayPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use ticketdesk_core::{
    Assignee, Clock, Entry, IdGenerator, MailId, ReplyType, Result, Status, Ticket, TicketError,
    TicketId, TicketRepository, User, UserId,
};
use tokio::sync::Mutex;

/// Parameters of [`TicketStore::append_entry`].
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Customer address or editor name
    pub author: String,
    /// Entry text; an empty body appends nothing
    pub body: String,
    /// External replies notify the customer
    pub reply_type: ReplyType,
    /// Optional caller-directed status change
    pub status: Option<Status>,
}

impl NewEntry {
    /// An external reply (customer-visible, notifies the customer)
    #[must_use]
    pub fn external(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            reply_type: ReplyType::External,
            status: None,
        }
    }

    /// An internal note (editors only, no notification)
    #[must_use]
    pub fn internal(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            reply_type: ReplyType::Internal,
            status: None,
        }
    }

    /// Also move the ticket to `status`
    #[must_use]
    pub const fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }
}

/// Authoritative in-memory ticket map with lifecycle operations.
pub struct TicketStore {
    repository: Arc<dyn TicketRepository>,
    outbox: Arc<MailOutbox>,
    template: MailTemplate,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    holiday_policy: HolidayPolicy,
    tickets: Mutex<HashMap<TicketId, Ticket>>,
}

impl TicketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(
        repository: Arc<dyn TicketRepository>,
        outbox: Arc<MailOutbox>,
        template: MailTemplate,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        holiday_policy: HolidayPolicy,
    ) -> Self {
        Self {
            repository,
            outbox,
            template,
            clock,
            ids,
            holiday_policy,
            tickets: Mutex::new(HashMap::new()),
        }
    }

    /// Seed the store with tickets recovered from disk. Nothing is written back.
    pub async fn restore(&self, tickets: Vec<Ticket>) {
        let mut map = self.tickets.lock().await;
        for ticket in tickets {
            map.insert(ticket.id.clone(), ticket);
        }
        tracing::info!(tickets = map.len(), "Ticket store restored");
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The stored record for `id`, tombstones included.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id.
    pub async fn get_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.tickets
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| TicketError::ticket_not_found(id))
    }

    /// The live ticket for `id`, following `merged_into` redirects.
    ///
    /// # Errors
    ///
    /// `NotFound` if `id` or a redirect target is unknown.
    pub async fn resolve_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let map = self.tickets.lock().await;
        let mut current = map.get(id).ok_or_else(|| TicketError::ticket_not_found(id))?;
        // Merges only ever target live tickets, so chains are acyclic.
        while let Some(target) = &current.merged_into {
            current = map
                .get(target)
                .ok_or_else(|| TicketError::ticket_not_found(target))?;
        }
        Ok(current.clone())
    }

    /// Snapshot of every ticket, ordered by id.
    pub async fn list_tickets(&self) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self.tickets.lock().await.values().cloned().collect();
        tickets.sort_by(|a, b| a.id.cmp(&b.id));
        tickets
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open a ticket for `customer` with `message` as its first entry.
    ///
    /// Notifies the customer with [`MailEvent::NewTicket`].
    ///
    /// # Errors
    ///
    /// `Persistence` if the ticket or its notification could not be written.
    pub async fn create_ticket(
        &self,
        customer: &str,
        subject: &str,
        message: &str,
    ) -> Result<Ticket> {
        let ticket = {
            let mut map = self.tickets.lock().await;

            let id = loop {
                let candidate = TicketId::new(self.ids.next_id());
                if !map.contains_key(&candidate) {
                    break candidate;
                }
            };

            let ticket = Ticket {
                id,
                subject: subject.to_string(),
                status: Status::Open,
                assignee: None,
                customer: customer.to_string(),
                entries: vec![Entry {
                    created_at: self.clock.now(),
                    author: customer.to_string(),
                    body: message.to_string(),
                    reply_type: ReplyType::External,
                }],
                merged_into: None,
            };

            self.repository.save_ticket(&ticket).await?;
            map.insert(ticket.id.clone(), ticket.clone());
            ticket
        };

        tracing::info!(ticket_id = %ticket.id, customer, "Ticket created");
        metrics::record_ticket_created();

        self.notify(MailEvent::NewTicket, &ticket).await?;
        Ok(ticket)
    }

    /// Append an entry and optionally change the status.
    ///
    /// External replies notify the customer: [`MailEvent::NewAnswer`] when an
    /// entry was appended, [`MailEvent::UpdatedTicket`] when the body was
    /// empty and only the status changed.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id, `AlreadyMerged` for a tombstone,
    /// `Persistence` on write failure.
    pub async fn append_entry(&self, id: &TicketId, entry: NewEntry) -> Result<Ticket> {
        let appends = !entry.body.trim().is_empty();
        let now = self.clock.now();
        let reply_type = entry.reply_type;

        let (_, updated) = self
            .mutate(id, |ticket| {
                if let Some(status) = entry.status {
                    ticket.status = status;
                }
                if appends {
                    ticket.entries.push(Entry {
                        created_at: now,
                        author: entry.author,
                        body: entry.body,
                        reply_type,
                    });
                }
                Ok(())
            })
            .await?;

        tracing::info!(
            ticket_id = %updated.id,
            status = %updated.status,
            entries = updated.entries.len(),
            "Ticket updated"
        );

        if appends {
            metrics::record_entry_appended(if reply_type.is_external() {
                "external"
            } else {
                "internal"
            });
        }

        if reply_type.is_external() {
            let event = if appends {
                MailEvent::NewAnswer
            } else {
                MailEvent::UpdatedTicket
            };
            self.notify(event, &updated).await?;
        }
        Ok(updated)
    }

    /// Append a customer reply, reopening the ticket if it is Closed.
    ///
    /// The status is checked under the store lock, so a ticket closed
    /// concurrently is still reopened by the reply. Notifies the customer with
    /// [`MailEvent::NewAnswer`].
    ///
    /// # Errors
    ///
    /// `NotFound`, `AlreadyMerged` or `Persistence`.
    pub async fn append_customer_reply(
        &self,
        id: &TicketId,
        author: &str,
        body: &str,
    ) -> Result<Ticket> {
        let entry = Entry {
            created_at: self.clock.now(),
            author: author.to_string(),
            body: body.to_string(),
            reply_type: ReplyType::External,
        };

        let (before, updated) = self
            .mutate(id, |ticket| {
                if ticket.status == Status::Closed {
                    ticket.status = Status::Open;
                }
                ticket.entries.push(entry);
                Ok(())
            })
            .await?;

        if before.status == Status::Closed {
            tracing::info!(ticket_id = %id, "Reopened closed ticket for new reply");
        }
        tracing::info!(ticket_id = %id, from = author, "Customer reply attached");
        metrics::record_entry_appended("external");

        self.notify(MailEvent::NewAnswer, &updated).await?;
        Ok(updated)
    }

    /// Change the status without adding an entry.
    ///
    /// # Errors
    ///
    /// `NotFound`, `AlreadyMerged` or `Persistence`.
    pub async fn update_status(
        &self,
        id: &TicketId,
        status: Status,
        notify_customer: bool,
    ) -> Result<Ticket> {
        let (before, updated) = self
            .mutate(id, |ticket| {
                ticket.status = status;
                Ok(())
            })
            .await?;

        tracing::info!(ticket_id = %id, from = %before.status, to = %status, "Status changed");

        if notify_customer {
            self.notify(MailEvent::UpdatedTicket, &updated).await?;
        }
        Ok(updated)
    }

    /// Make `user` the assignee. Does not change the status.
    ///
    /// # Errors
    ///
    /// `AlreadyAssigned` if the ticket has an assignee (unassign first),
    /// `AssigneeOnHoliday` if the holiday policy rejects `user`, plus
    /// `NotFound`, `AlreadyMerged` or `Persistence`.
    pub async fn assign_ticket(&self, id: &TicketId, user: &User) -> Result<Ticket> {
        let policy = self.holiday_policy;
        let (_, updated) = self
            .mutate(id, |ticket| {
                if let Some(current) = &ticket.assignee {
                    return Err(TicketError::AlreadyAssigned {
                        ticket: ticket.id.clone(),
                        assignee: current.username.clone(),
                    });
                }
                policy.check(user)?;
                ticket.assignee = Some(Assignee::from(user));
                Ok(())
            })
            .await?;

        tracing::info!(ticket_id = %id, assignee = %user.username, "Ticket assigned");
        metrics::record_assignment("assign");

        self.notify(MailEvent::AssignedTicket, &updated).await?;
        Ok(updated)
    }

    /// Clear the assignee.
    ///
    /// The notification is rendered from the ticket as it was before, so it
    /// names the editor who released it.
    ///
    /// # Errors
    ///
    /// `NotAssigned` if there is no assignee, plus `NotFound`,
    /// `AlreadyMerged` or `Persistence`.
    pub async fn unassign_ticket(&self, id: &TicketId) -> Result<Ticket> {
        let (before, updated) = self
            .mutate(id, |ticket| {
                if ticket.assignee.take().is_none() {
                    return Err(TicketError::NotAssigned(ticket.id.clone()));
                }
                Ok(())
            })
            .await?;

        tracing::info!(ticket_id = %id, "Ticket unassigned");
        metrics::record_assignment("unassign");

        self.notify(MailEvent::UnassignedTicket, &before).await?;
        Ok(updated)
    }

    /// Merge `source_id` into `target_id`.
    ///
    /// `requester` must be the assignee of both tickets. The source becomes an
    /// unassigned Closed tombstone redirecting to the target; neither ticket's
    /// entries change. Returns `(target, source)`.
    ///
    /// # Errors
    ///
    /// `Validation` when both ids are equal, `NotFound`, `AlreadyMerged` if
    /// either ticket is a tombstone, `PermissionDenied` on an assignee
    /// mismatch, `Persistence` on write failure.
    pub async fn merge_tickets(
        &self,
        target_id: &TicketId,
        source_id: &TicketId,
        requester: &UserId,
    ) -> Result<(Ticket, Ticket)> {
        if target_id == source_id {
            return Err(TicketError::Validation(format!(
                "cannot merge ticket '{target_id}' into itself"
            )));
        }

        let mut map = self.tickets.lock().await;

        let target = live_ticket(&map, target_id)?.clone();
        let source = live_ticket(&map, source_id)?;

        if !(target.is_assigned_to(requester) && source.is_assigned_to(requester)) {
            return Err(TicketError::PermissionDenied(format!(
                "only the assignee of both '{target_id}' and '{source_id}' may merge them"
            )));
        }

        let mut tombstone = source.clone();
        tombstone.merged_into = Some(target_id.clone());
        tombstone.status = Status::Closed;
        tombstone.assignee = None;

        self.repository.save_ticket(&target).await?;
        self.repository.save_ticket(&tombstone).await?;
        map.insert(tombstone.id.clone(), tombstone.clone());
        drop(map);

        tracing::info!(target = %target_id, source = %source_id, "Tickets merged");
        metrics::record_merge();
        Ok((target, tombstone))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Read-modify-write of one live ticket under the lock.
    ///
    /// `change` runs on a copy; the copy is persisted and only then replaces
    /// the stored ticket. Returns `(before, after)`.
    async fn mutate<F>(&self, id: &TicketId, change: F) -> Result<(Ticket, Ticket)>
    where
        F: FnOnce(&mut Ticket) -> Result<()>,
    {
        let mut map = self.tickets.lock().await;
        let before = live_ticket(&map, id)?.clone();

        let mut after = before.clone();
        change(&mut after)?;

        self.repository.save_ticket(&after).await?;
        map.insert(after.id.clone(), after.clone());
        Ok((before, after))
    }

    async fn notify(&self, event: MailEvent, ticket: &Ticket) -> Result<MailId> {
        let mail = self.template.render(event, ticket);
        let mail_id = self
            .outbox
            .enqueue(ticket.customer.clone(), mail.subject, mail.body)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    ticket_id = %ticket.id,
                    event = event.as_str(),
                    error = %e,
                    "Failed to enqueue notification"
                );
            })?;

        tracing::debug!(ticket_id = %ticket.id, %mail_id, event = event.as_str(), "Notification enqueued");
        metrics::record_mail_enqueued(event.as_str());
        Ok(mail_id)
    }
}

fn live_ticket<'a>(map: &'a HashMap<TicketId, Ticket>, id: &TicketId) -> Result<&'a Ticket> {
    let ticket = map.get(id).ok_or_else(|| TicketError::ticket_not_found(id))?;
    match &ticket.merged_into {
        Some(target) => Err(TicketError::AlreadyMerged {
            ticket: id.clone(),
            target: target.clone(),
        }),
        None => Ok(ticket),
    }
}
