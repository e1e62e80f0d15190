//! Ticket lifecycle integration tests.
//!
//! Exercises the editor-side operations end to end: create, answer, assign,
//! unassign, close and merge, checking both the stored tickets and the mails
//! they leave in the outbox.
//!
//! Run with: `cargo test --test ticket_lifecycle_test`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

mod common;

use ticketdesk::{Config, HolidayPolicy, NewEntry};
use ticketdesk_core::{ReplyType, Status, TicketError, TicketId};

#[tokio::test]
async fn test_full_ticket_lifecycle() {
    let desk = common::desk().await;
    let tickets = &desk.services.tickets;
    let outbox = &desk.services.outbox;
    let alice = desk.services.users.get("alice").await.unwrap();

    let ticket = tickets
        .create_ticket("customer@example.com", "VPN down", "Cannot connect since Monday")
        .await
        .unwrap();
    assert_eq!(ticket.status, Status::Open);
    assert_eq!(ticket.entries.len(), 1);

    let ticket = tickets.assign_ticket(&ticket.id, &alice).await.unwrap();
    assert!(ticket.is_assigned_to(&alice.id));
    assert_eq!(ticket.status, Status::Open);

    let ticket = tickets
        .append_entry(
            &ticket.id,
            NewEntry::internal("alice", "Probably the certificate").with_status(Status::InProgress),
        )
        .await
        .unwrap();
    assert_eq!(ticket.status, Status::InProgress);
    assert_eq!(ticket.latest_entry().unwrap().reply_type, ReplyType::Internal);

    let ticket = tickets
        .append_entry(
            &ticket.id,
            NewEntry::external("alice", "Renewed, please retry").with_status(Status::Closed),
        )
        .await
        .unwrap();
    assert_eq!(ticket.status, Status::Closed);
    assert_eq!(ticket.entries.len(), 3);

    // created, assigned, answered; the internal note sends nothing
    let pending = outbox.list_pending().await;
    assert_eq!(pending.len(), 3);
    assert!(pending.iter().all(|mail| mail.to == "customer@example.com"));
    assert!(pending[0].message.contains("has been created successfully"));
    assert!(pending[1].message.contains("our editor 'ALICE' is now working on your ticket"));
    assert!(pending[2].message.contains("the user 'alice' has written a new comment"));
    assert!(pending[2].message.contains("Renewed, please retry"));

    assert_eq!(desk.ticket_repo.get(&ticket.id).unwrap(), ticket);
    assert_eq!(desk.mail_repo.len(), 3);
}

#[tokio::test]
async fn test_unassign_mail_names_released_editor() {
    let desk = common::desk().await;
    let tickets = &desk.services.tickets;
    let bob = desk.services.users.get("bob").await.unwrap();

    let ticket = tickets.create_ticket("c@example.com", "s", "m").await.unwrap();
    tickets.assign_ticket(&ticket.id, &bob).await.unwrap();
    let ticket = tickets.unassign_ticket(&ticket.id).await.unwrap();

    assert!(ticket.assignee.is_none());
    let last = desk.services.outbox.list_pending().await.pop().unwrap();
    assert!(last.message.contains("the editor 'BOB' has released your ticket"));

    let err = tickets.unassign_ticket(&ticket.id).await.unwrap_err();
    assert!(matches!(err, TicketError::NotAssigned(_)));
}

#[tokio::test]
async fn test_assign_requires_unassign_first() {
    let desk = common::desk().await;
    let tickets = &desk.services.tickets;
    let alice = desk.services.users.get("alice").await.unwrap();
    let bob = desk.services.users.get("bob").await.unwrap();

    let ticket = tickets.create_ticket("c@example.com", "s", "m").await.unwrap();
    tickets.assign_ticket(&ticket.id, &alice).await.unwrap();

    let err = tickets.assign_ticket(&ticket.id, &bob).await.unwrap_err();
    assert!(matches!(err, TicketError::AlreadyAssigned { ref assignee, .. } if assignee == "alice"));

    tickets.unassign_ticket(&ticket.id).await.unwrap();
    let ticket = tickets.assign_ticket(&ticket.id, &bob).await.unwrap();
    assert!(ticket.is_assigned_to(&bob.id));
}

#[tokio::test]
async fn test_holiday_policy() {
    let allowing = common::desk().await;
    let carol = allowing.services.users.get("carol").await.unwrap();
    let ticket = allowing
        .services
        .tickets
        .create_ticket("c@example.com", "s", "m")
        .await
        .unwrap();
    allowing
        .services
        .tickets
        .assign_ticket(&ticket.id, &carol)
        .await
        .unwrap();

    let mut config = Config::default();
    config.tickets.holiday_policy = HolidayPolicy::RejectOnHoliday;
    let rejecting = common::desk_with(&config).await;
    let ticket = rejecting
        .services
        .tickets
        .create_ticket("c@example.com", "s", "m")
        .await
        .unwrap();

    let err = rejecting
        .services
        .tickets
        .assign_ticket(&ticket.id, &carol)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::AssigneeOnHoliday(_)));
    let stored = rejecting.services.tickets.get_ticket(&ticket.id).await.unwrap();
    assert!(stored.assignee.is_none());
}

#[tokio::test]
async fn test_holiday_flag_change_is_persisted() {
    let desk = common::desk().await;

    let alice = desk.services.users.set_holiday("alice", true).await.unwrap();

    assert!(alice.is_on_holiday);
    assert!(desk.user_repo.get("alice").unwrap().is_on_holiday);
}

#[tokio::test]
async fn test_merge_requires_same_assignee() {
    let desk = common::desk().await;
    let tickets = &desk.services.tickets;
    let alice = desk.services.users.get("alice").await.unwrap();
    let bob = desk.services.users.get("bob").await.unwrap();

    let target = tickets.create_ticket("c@example.com", "one", "m1").await.unwrap();
    let source = tickets.create_ticket("c@example.com", "two", "m2").await.unwrap();
    tickets.assign_ticket(&target.id, &alice).await.unwrap();
    tickets.assign_ticket(&source.id, &bob).await.unwrap();

    let err = tickets
        .merge_tickets(&target.id, &source.id, &alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::PermissionDenied(_)));

    tickets.unassign_ticket(&source.id).await.unwrap();
    tickets.assign_ticket(&source.id, &alice).await.unwrap();
    let (merged_target, tombstone) = tickets
        .merge_tickets(&target.id, &source.id, &alice.id)
        .await
        .unwrap();

    assert_eq!(merged_target.entries, target.entries);
    assert_eq!(tombstone.merged_into.as_ref(), Some(&target.id));
    assert_eq!(tombstone.status, Status::Closed);
    assert!(tombstone.assignee.is_none());
    assert_eq!(desk.ticket_repo.get(&source.id).unwrap(), tombstone);
    assert!(tickets.get_ticket(&target.id).await.unwrap().is_assigned_to(&alice.id));

    let resolved = tickets.resolve_ticket(&source.id).await.unwrap();
    assert_eq!(resolved.id, target.id);

    let err = tickets
        .append_entry(&source.id, NewEntry::external("c@example.com", "hello?"))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::AlreadyMerged { .. }));
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let desk = common::desk().await;
    let missing = TicketId::new("missing0001");

    let err = desk
        .services
        .tickets
        .update_status(&missing, Status::Closed, true)
        .await
        .unwrap_err();

    assert!(matches!(err, TicketError::NotFound { .. }));
    assert!(desk.services.outbox.is_empty().await);
}

#[tokio::test]
async fn test_failed_ticket_write_changes_nothing() {
    let desk = common::desk().await;
    let tickets = &desk.services.tickets;
    let ticket = tickets.create_ticket("c@example.com", "s", "m").await.unwrap();
    let pending_before = desk.services.outbox.len().await;

    desk.ticket_repo.fail_writes(true);
    let err = tickets
        .append_entry(&ticket.id, NewEntry::external("c@example.com", "more"))
        .await
        .unwrap_err();

    assert!(matches!(err, TicketError::Persistence(_)));
    assert_eq!(tickets.get_ticket(&ticket.id).await.unwrap(), ticket);
    assert_eq!(desk.services.outbox.len().await, pending_before);
}
