//! Waitlist Workflow Integration Tests
//!
//! Drives the waitlist service end to end against the in-memory document
//! store: join, lottery, invitation responses, re-draws, racing writers and
//! store-backed notification inboxes.

#![allow(dead_code)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use konoha_docstore::{Document, DocumentStore, InMemoryDocumentStore};
use konoha_notifications::{DocumentNotificationService, NotificationService, NotificationType};
use konoha_waitlist::{
    InvitationDecision, RegistrationGuard, UserRole, WaitlistError, WaitlistRepositories,
    WaitlistService, WaitlistStatus, WAITLIST_COLLECTION,
};
use serde_json::json;

use crate::common::TestApp;

/// Service whose notifications land in the same document store
fn store_backed() -> (InMemoryDocumentStore, WaitlistService, Arc<dyn NotificationService>) {
    let store = InMemoryDocumentStore::new();
    let shared: Arc<dyn DocumentStore> = Arc::new(store.clone());
    let notifier: Arc<dyn NotificationService> =
        Arc::new(DocumentNotificationService::new(shared.clone()));
    let service = WaitlistService::new(
        WaitlistRepositories::new(shared),
        notifier.clone(),
        RegistrationGuard::default(),
    );
    (store, service, notifier)
}

#[test_log::test(tokio::test)]
async fn test_full_lottery_lifecycle() {
    let app = TestApp::new();
    app.create_event("festival", None, Some(10)).await.unwrap();
    let users = app.create_entrants("ninja", 6).await.unwrap();
    for user in &users {
        app.service.join("festival", &user.id).await.unwrap();
    }

    // Draw three winners
    let first = app.service.select_entrants("festival", 3).await.unwrap();
    assert!(first.is_complete());
    assert_eq!(first.drawn.len(), 3);

    // One accepts, one declines, one has not answered yet
    app.service
        .respond(&first.drawn[0].id, InvitationDecision::Accepted)
        .await
        .unwrap();
    app.service
        .respond(&first.drawn[1].id, InvitationDecision::Declined)
        .await
        .unwrap();

    // Re-running the draw only replaces the decline
    let second = app.service.select_entrants("festival", 3).await.unwrap();
    assert_eq!(second.already_selected, 2);
    assert_eq!(second.drawn.len(), 1);

    let summary = app.service.summarize("festival").await.unwrap();
    assert_eq!(summary.total, 6);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.declined, 1);
    assert_eq!(summary.selected, 2);
    assert_eq!(summary.waiting, 2);

    // Four wins, one acceptance, one decline
    let sent = app.notifier.recorded();
    let count = |t: NotificationType| sent.iter().filter(|n| n.notification_type == t).count();
    assert_eq!(count(NotificationType::LotteryWin), 4);
    assert_eq!(count(NotificationType::Accepted), 1);
    assert_eq!(count(NotificationType::Declined), 1);
}

#[tokio::test]
async fn test_lottery_never_selects_the_same_entry_twice() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();
    for user in app.create_entrants("u", 8).await.unwrap() {
        app.service.join("e", &user.id).await.unwrap();
    }

    let mut seen = HashSet::new();
    for target in [2, 4, 6, 8, 10] {
        let outcome = app.service.select_entrants("e", target).await.unwrap();
        for entry in outcome.drawn {
            assert!(seen.insert(entry.id), "entry drawn twice");
        }
    }
    assert_eq!(seen.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_by_same_user() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = app.service.clone();
        handles.push(tokio::spawn(async move { service.join("e", "u1").await }));
    }

    let mut joined = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => joined += 1,
            Err(e) => assert_eq!(e, WaitlistError::AlreadyOnWaitlist),
        }
    }
    assert_eq!(joined, 1);
    assert_eq!(app.store.count(WAITLIST_COLLECTION), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_accept_and_decline_apply_once() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();
    let entry = app.service.join("e", "u1").await.unwrap();
    app.service
        .update_status(&entry.id, WaitlistStatus::Selected)
        .await
        .unwrap();

    let accept = {
        let service = app.service.clone();
        let id = entry.id.clone();
        tokio::spawn(async move { service.respond(&id, InvitationDecision::Accepted).await })
    };
    let decline = {
        let service = app.service.clone();
        let id = entry.id.clone();
        tokio::spawn(async move { service.respond(&id, InvitationDecision::Declined).await })
    };

    let results = [accept.await.unwrap(), decline.await.unwrap()];
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(WaitlistError::IllegalTransition { .. })
    )));

    let stored = app.service.get_entry(&entry.id).await.unwrap();
    assert_eq!(stored.status, winners[0].status);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_leave_racing_a_draw_never_loses_a_selection() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();
    let entry = app.service.join("e", "u1").await.unwrap();

    let draw = {
        let service = app.service.clone();
        tokio::spawn(async move { service.select_entrants("e", 1).await })
    };
    let leave = {
        let service = app.service.clone();
        tokio::spawn(async move { service.leave("e", "u1").await })
    };

    let outcome = draw.await.unwrap().unwrap();
    let left = leave.await.unwrap();

    match left {
        // Left first: the draw found nobody or lost its write
        Ok(()) => {
            assert!(app.service.find("e", "u1").await.unwrap().is_none());
            assert!(outcome.drawn.is_empty());
        }
        // Drawn first: the entry stays selected
        Err(e) => {
            assert!(matches!(e, WaitlistError::IllegalTransition { to: None, .. }));
            assert_eq!(
                app.service.get_entry(&entry.id).await.unwrap().status,
                WaitlistStatus::Selected
            );
        }
    }
}

#[tokio::test]
async fn test_legacy_pending_entries_take_part_in_draws() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();
    let mut legacy = Document::new();
    legacy.insert("eventId".to_string(), json!("e"));
    legacy.insert("userId".to_string(), json!("old-timer"));
    legacy.insert("status".to_string(), json!("PENDING"));
    app.store.create(WAITLIST_COLLECTION, legacy).await.unwrap();

    let waiting = app
        .service
        .list_by_event_with_status("e", WaitlistStatus::Waiting)
        .await
        .unwrap();
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].user_id, "old-timer");

    let outcome = app.service.select_entrants("e", 1).await.unwrap();
    assert_eq!(outcome.drawn.len(), 1);
    assert_eq!(outcome.drawn[0].status, WaitlistStatus::Selected);
    assert_eq!(
        app.service.join("e", "old-timer").await,
        Err(WaitlistError::AlreadyOnWaitlist)
    );
}

#[test_log::test(tokio::test)]
async fn test_odd_legacy_rows_do_not_block_the_event() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();
    app.service.join("e", "u1").await.unwrap();
    app.service.join("e", "u2").await.unwrap();

    let rows = [
        json!({"eventId": "e", "userId": "no-status"}),
        json!({"eventId": "e", "userId": "gone", "status": "c"}),
        json!({"eventId": "e", "status": "WAITING"}),
    ];
    for row in rows {
        let serde_json::Value::Object(doc) = row else {
            unreachable!()
        };
        app.store.create(WAITLIST_COLLECTION, doc).await.unwrap();
    }

    app.service.join("e", "u9").await.unwrap();

    let summary = app.service.summarize("e").await.unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.waiting, 4);
    assert_eq!(summary.cancelled, 1);

    let outcome = app.service.select_entrants("e", 1).await.unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.drawn.len(), 1);
    assert_eq!(outcome.remaining_waiting, 3);

    // The shorthand row is cancelled, so reinstating it is legal
    let gone = app.service.find("e", "gone").await.unwrap().unwrap();
    assert_eq!(gone.status, WaitlistStatus::Cancelled);
    let back = app.service.reinstate(&gone.id).await.unwrap();
    assert_eq!(back.status, WaitlistStatus::Waiting);
}

#[tokio::test]
async fn test_store_outage_is_retryable_and_recovers() {
    let app = TestApp::new();
    app.create_event("e", None, None).await.unwrap();

    app.store.set_unavailable(true);
    let err = app.service.join("e", "u1").await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.user_message().contains("try again"));

    app.store.set_unavailable(false);
    assert!(app.service.join("e", "u1").await.is_ok());
}

#[tokio::test]
async fn test_store_backed_inbox_receives_status_notifications() {
    let (store, service, notifier) = store_backed();
    let app = TestApp {
        store,
        notifier: konoha_notifications::MockNotificationService::new(),
        service,
    };
    app.create_event("e", None, None).await.unwrap();
    app.create_user("u1", UserRole::Entrant).await.unwrap();

    let entry = app.service.join("e", "u1").await.unwrap();
    app.service.select_entrants("e", 1).await.unwrap();
    app.service
        .respond(&entry.id, InvitationDecision::Accepted)
        .await
        .unwrap();

    let inbox = notifier.list_for_user("u1").await.unwrap();
    let types: HashSet<_> = inbox.iter().map(|n| n.notification_type).collect();
    assert_eq!(inbox.len(), 2);
    assert!(types.contains(&NotificationType::LotteryWin));
    assert!(types.contains(&NotificationType::Accepted));
    assert!(inbox.iter().all(|n| n.message.contains("Event e")));

    notifier.delete("u1", &inbox[0].id).await.unwrap();
    assert_eq!(notifier.list_for_user("u1").await.unwrap().len(), 1);
}
