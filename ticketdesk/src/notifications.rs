//! Event-to-Mail Translator.
//!
//! [`MailTemplate::render`] turns a ticket snapshot and a [`MailEvent`] into the
//! subject and body of a customer notification. It is pure and total: missing
//! entries or a missing assignee render placeholder text instead of failing.

use crate::config::MailConfig;
use std::fmt;
use ticketdesk_core::{Ticket, TicketId};

const NO_ENTRY: &str = "no entry available";
const NO_ASSIGNEE: &str = "no assignee";
const UNASSIGNED_NAME: &str = "<unassigned>";
const RULE: &str = "-----------------------------";

/// Ticket events that owe the customer a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailEvent {
    /// A ticket was opened
    NewTicket,
    /// An external reply was appended
    NewAnswer,
    /// Status or other details changed
    UpdatedTicket,
    /// An editor took the ticket
    AssignedTicket,
    /// The editor released the ticket
    UnassignedTicket,
}

impl MailEvent {
    /// Stable name for logs and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewTicket => "new_ticket",
            Self::NewAnswer => "new_answer",
            Self::UpdatedTicket => "updated_ticket",
            Self::AssignedTicket => "assigned_ticket",
            Self::UnassignedTicket => "unassigned_ticket",
        }
    }

    /// `NewAnswer` quotes the latest entry, everything else the opening one.
    const fn quotes_latest_entry(self) -> bool {
        matches!(self, Self::NewAnswer)
    }
}

impl fmt::Display for MailEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered notification, ready for the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    /// `[<prefix>] <ticket subject>`
    pub subject: String,
    /// Full text body
    pub body: String,
}

/// Settings shared by every rendered mail.
#[derive(Debug, Clone)]
pub struct MailTemplate {
    public_base_url: String,
    support_address: String,
    subject_prefix: String,
}

impl MailTemplate {
    /// Create a template.
    #[must_use]
    pub fn new(
        public_base_url: impl Into<String>,
        support_address: impl Into<String>,
        subject_prefix: impl Into<String>,
    ) -> Self {
        Self {
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            support_address: support_address.into(),
            subject_prefix: subject_prefix.into(),
        }
    }

    /// Build from the mail section of the configuration.
    #[must_use]
    pub fn from_config(config: &MailConfig) -> Self {
        Self::new(
            config.public_base_url.clone(),
            config.support_address.clone(),
            config.subject_prefix.clone(),
        )
    }

    /// Web link to a ticket.
    #[must_use]
    pub fn permalink(&self, id: &TicketId) -> String {
        format!("{}/ticket?id={id}", self.public_base_url)
    }

    /// Render the notification for `event` on `ticket`.
    #[must_use]
    pub fn render(&self, event: MailEvent, ticket: &Ticket) -> RenderedMail {
        let (message, author) = quoted_entry(event, ticket);
        let (assignee_line, assignee_name) = match &ticket.assignee {
            Some(assignee) => (
                format!("{} ({})", assignee.name, assignee.mail),
                assignee.name.as_str(),
            ),
            None => (NO_ASSIGNEE.to_string(), UNASSIGNED_NAME),
        };

        let event_line = match event {
            MailEvent::NewTicket => format!(
                "your ticket '{id}' has been created successfully.\n\
                 To add a comment to this ticket, please use the following link: \
                 mailto:{support}?subject={reply}",
                id = ticket.id,
                support = self.support_address,
                reply = urlencoding::encode(&reply_subject(ticket)),
            ),
            MailEvent::NewAnswer => {
                format!("the user '{author}' has written a new comment:")
            }
            MailEvent::UpdatedTicket => format!(
                "your ticket '{}' has been updated with the following information:",
                ticket.id
            ),
            MailEvent::AssignedTicket => {
                format!("our editor '{assignee_name}' is now working on your ticket:")
            }
            MailEvent::UnassignedTicket => {
                format!("the editor '{assignee_name}' has released your ticket:")
            }
        };

        let body = format!(
            "Dear customer,\n\n\
             {event_line}\n\
             {RULE}\n\
             Customer:   {customer}\n\
             Ticket:     {id}\n\
             URL:        {url}\n\
             Assignee:   {assignee_line}\n\
             Status:     {status}\n\
             \n\
             Subject: {subject}\n\
             \n\
             {message}\n\
             \n\
             {RULE}\n\
             \n\
             Kind regards,\n\
             Your {prefix} team\n\
             \n\
             This message was generated automatically by {prefix}.\n\
             Please do not reply to this e-mail.",
            customer = ticket.customer,
            id = ticket.id,
            url = self.permalink(&ticket.id),
            status = ticket.status,
            subject = ticket.subject,
            prefix = self.subject_prefix,
        );

        RenderedMail {
            subject: format!("[{}] {}", self.subject_prefix, ticket.subject),
            body,
        }
    }
}

/// Subject a customer reply must carry to be routed back to `ticket`.
#[must_use]
pub fn reply_subject(ticket: &Ticket) -> String {
    format!("[Ticket \"{}\"] {}", ticket.id, ticket.subject)
}

fn quoted_entry(event: MailEvent, ticket: &Ticket) -> (&str, &str) {
    let entry = if event.quotes_latest_entry() {
        ticket.latest_entry()
    } else {
        ticket.first_entry()
    };
    entry.map_or((NO_ENTRY, ""), |entry| {
        (entry.body.as_str(), entry.author.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ticketdesk_core::{Assignee, DateTime, Entry, ReplyType, Status, UserId, Utc};

    fn template() -> MailTemplate {
        MailTemplate::new(
            "https://localhost:8443/",
            "support@trivial-tickets.com",
            "trivial-tickets",
        )
    }

    fn entry(author: &str, body: &str) -> Entry {
        Entry {
            created_at: DateTime::<Utc>::default(),
            author: author.to_string(),
            body: body.to_string(),
            reply_type: ReplyType::External,
        }
    }

    fn ticket() -> Ticket {
        Ticket {
            id: TicketId::new("abc123XYZ0"),
            subject: "Printer on fire".to_string(),
            status: Status::Open,
            assignee: None,
            customer: "a@b.com".to_string(),
            entries: vec![
                entry("a@b.com", "it's broken"),
                entry("a@b.com", "still broken"),
            ],
            merged_into: None,
        }
    }

    #[test]
    fn test_subject_and_permalink() {
        let mail = template().render(MailEvent::UpdatedTicket, &ticket());
        assert_eq!(mail.subject, "[trivial-tickets] Printer on fire");
        assert!(
            mail.body
                .contains("URL:        https://localhost:8443/ticket?id=abc123XYZ0")
        );
        assert!(mail.body.contains("Status:     Open"));
    }

    #[test]
    fn test_new_ticket_has_reply_link() {
        let mail = template().render(MailEvent::NewTicket, &ticket());
        assert!(mail.body.contains(
            "mailto:support@trivial-tickets.com?subject=%5BTicket%20%22abc123XYZ0%22%5D%20Printer%20on%20fire"
        ));
        assert!(mail.body.contains("\nit's broken\n"));
    }

    #[test]
    fn test_new_answer_quotes_latest_entry() {
        let mail = template().render(MailEvent::NewAnswer, &ticket());
        assert!(mail.body.contains("the user 'a@b.com' has written a new comment:"));
        assert!(mail.body.contains("\nstill broken\n"));
        assert!(!mail.body.contains("it's broken"));
    }

    #[test]
    fn test_other_events_quote_first_entry() {
        for event in [
            MailEvent::UpdatedTicket,
            MailEvent::AssignedTicket,
            MailEvent::UnassignedTicket,
        ] {
            let mail = template().render(event, &ticket());
            assert!(mail.body.contains("\nit's broken\n"), "{event}");
        }
    }

    #[test]
    fn test_assignee_placeholders_and_snapshot() {
        let mut ticket = ticket();
        let unassigned = template().render(MailEvent::AssignedTicket, &ticket);
        assert!(unassigned.body.contains("Assignee:   no assignee"));
        assert!(unassigned.body.contains("our editor '<unassigned>'"));

        ticket.assignee = Some(Assignee {
            user_id: UserId::new("u1"),
            name: "Alice".to_string(),
            username: "alice".to_string(),
            mail: "alice@trivial-tickets.com".to_string(),
        });
        let assigned = template().render(MailEvent::AssignedTicket, &ticket);
        assert!(
            assigned
                .body
                .contains("Assignee:   Alice (alice@trivial-tickets.com)")
        );
        assert!(assigned.body.contains("our editor 'Alice' is now working"));
    }

    #[test]
    fn test_empty_ticket_renders_placeholder() {
        let mut ticket = ticket();
        ticket.entries.clear();
        let mail = template().render(MailEvent::NewAnswer, &ticket);
        assert!(mail.body.contains(NO_ENTRY));
    }

    proptest! {
        #[test]
        fn prop_render_is_total(
            subject in ".*",
            bodies in proptest::collection::vec(".*", 0..4),
            event_index in 0_usize..5,
        ) {
            let events = [
                MailEvent::NewTicket,
                MailEvent::NewAnswer,
                MailEvent::UpdatedTicket,
                MailEvent::AssignedTicket,
                MailEvent::UnassignedTicket,
            ];
            let mut ticket = ticket();
            ticket.subject = subject.clone();
            ticket.entries = bodies.iter().map(|b| entry("x@y.z", b)).collect();

            let mail = template().render(events[event_index], &ticket);
            prop_assert_eq!(mail.subject, format!("[trivial-tickets] {subject}"));
            prop_assert!(mail.body.starts_with("Dear customer,"));
        }
    }
}
