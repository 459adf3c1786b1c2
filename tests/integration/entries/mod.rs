//! Waitlist entry endpoint integration tests
//!
//! - POST/DELETE /v1/events/{event_id}/waitlist - Join and leave
//! - GET /v1/events/{event_id}/waitlist(/me|/summary) - Inspect
//! - GET /v1/me/waitlist - Caller's entries
//! - POST /v1/waitlist/{entry_id}/(respond|cancel|reinstate)

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;

use konoha_waitlist::{UserRole, WaitlistStatus};

use crate::common::{assertions::assert_error, json_body, send, TestApp, ORGANIZER};

mod test_join {
    use super::*;

    #[tokio::test]
    async fn test_join_creates_waiting_entry() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            "/v1/events/e1/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let entry = json_body(response).await;
        assert_eq!(entry["event_id"], "e1");
        assert_eq!(entry["user_id"], "naruto");
        assert_eq!(entry["status"], "WAITING");
        assert_eq!(entry["id"], konoha_waitlist::entry_id("e1", "naruto"));
    }

    #[tokio::test]
    async fn test_join_twice_conflicts() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let router = app.test_router();

        send(&router, Method::POST, "/v1/events/e1/waitlist", Some("naruto"), None).await;
        let response = send(
            &router,
            Method::POST,
            "/v1/events/e1/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::CONFLICT, "ALREADY_ON_WAITLIST").await;
    }

    #[tokio::test]
    async fn test_join_full_event() {
        let app = TestApp::new();
        app.create_event("e1", None, Some(2)).await.unwrap();
        app.create_entrants("u", 3).await.unwrap();
        let router = app.test_router();

        for user in ["u0", "u1"] {
            let response =
                send(&router, Method::POST, "/v1/events/e1/waitlist", Some(user), None).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response =
            send(&router, Method::POST, "/v1/events/e1/waitlist", Some("u2"), None).await;
        assert_error(response, StatusCode::CONFLICT, "WAITLIST_FULL").await;
    }

    #[tokio::test]
    async fn test_join_after_deadline() {
        let app = TestApp::new();
        app.create_event("e1", Some(Utc::now() - Duration::days(1)), None)
            .await
            .unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            "/v1/events/e1/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::CONFLICT, "REGISTRATION_CLOSED").await;
    }

    #[tokio::test]
    async fn test_join_unknown_event() {
        let app = TestApp::new();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            "/v1/events/nope/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
    }

    #[tokio::test]
    async fn test_join_requires_identity() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        let router = app.test_router();

        let response = send(&router, Method::POST, "/v1/events/e1/waitlist", None, None).await;
        assert_error(response, StatusCode::UNAUTHORIZED, "MISSING_IDENTITY").await;

        let response =
            send(&router, Method::POST, "/v1/events/e1/waitlist", Some("ghost"), None).await;
        assert_error(response, StatusCode::UNAUTHORIZED, "USER_NOT_FOUND").await;
    }

    #[tokio::test]
    async fn test_organizer_cannot_join() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user(ORGANIZER, UserRole::Organizer).await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            "/v1/events/e1/waitlist",
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_error(response, StatusCode::FORBIDDEN, "INSUFFICIENT_ROLE").await;
    }
}

mod test_leave {
    use super::*;

    #[tokio::test]
    async fn test_leave_removes_entry() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let router = app.test_router();

        send(&router, Method::POST, "/v1/events/e1/waitlist", Some("naruto"), None).await;
        let response = send(
            &router,
            Method::DELETE,
            "/v1/events/e1/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist/me",
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
    }

    #[tokio::test]
    async fn test_leave_without_entry() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::DELETE,
            "/v1/events/e1/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
    }

    #[tokio::test]
    async fn test_selected_entrant_cannot_leave() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let entry = app.service.join("e1", "naruto").await.unwrap();
        app.service
            .update_status(&entry.id, WaitlistStatus::Selected)
            .await
            .unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::DELETE,
            "/v1/events/e1/waitlist",
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::CONFLICT, "ILLEGAL_TRANSITION").await;
    }
}

mod test_listing {
    use super::*;

    async fn seeded() -> TestApp {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user(ORGANIZER, UserRole::Organizer).await.unwrap();
        app.create_user("other-organizer", UserRole::Organizer)
            .await
            .unwrap();
        app.create_user("hokage", UserRole::Administrator)
            .await
            .unwrap();
        for user in app.create_entrants("u", 4).await.unwrap() {
            app.service.join("e1", &user.id).await.unwrap();
        }
        let first = app.service.find("e1", "u0").await.unwrap().unwrap();
        app.service.cancel(&first.id).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_organizer_lists_entries() {
        let app = seeded().await;
        let router = app.test_router();

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist",
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let entries = json_body(response).await;
        assert_eq!(entries.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_paginates() {
        let app = seeded().await;
        let router = app.test_router();

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist?status=WAITING",
            Some(ORGANIZER),
            None,
        )
        .await;
        let waiting = json_body(response).await;
        let waiting = waiting.as_array().unwrap();
        assert_eq!(waiting.len(), 3);
        assert!(waiting.iter().all(|e| e["status"] == "WAITING"));

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist?status=WAITING&offset=1&limit=1",
            Some(ORGANIZER),
            None,
        )
        .await;
        let page = json_body(response).await;
        let page = page.as_array().unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["id"], waiting[1]["id"]);
    }

    #[tokio::test]
    async fn test_admin_can_list_any_event() {
        let app = seeded().await;
        let router = app.test_router();

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist",
            Some("hokage"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_others_cannot_list() {
        let app = seeded().await;
        let router = app.test_router();

        for caller in ["u1", "other-organizer"] {
            let response = send(
                &router,
                Method::GET,
                "/v1/events/e1/waitlist",
                Some(caller),
                None,
            )
            .await;
            assert_error(response, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR").await;
        }
    }

    #[tokio::test]
    async fn test_summary_counts_by_status() {
        let app = seeded().await;
        let router = app.test_router();

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist/summary",
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let summary = json_body(response).await;
        assert_eq!(summary["total"], 4);
        assert_eq!(summary["waiting"], 3);
        assert_eq!(summary["cancelled"], 1);
        assert_eq!(summary["selected"], 0);
    }

    #[tokio::test]
    async fn test_my_entry_and_my_waitlist() {
        let app = seeded().await;
        app.create_event("e2", None, None).await.unwrap();
        app.service.join("e2", "u1").await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::GET,
            "/v1/events/e1/waitlist/me",
            Some("u1"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["user_id"], "u1");

        let response = send(&router, Method::GET, "/v1/me/waitlist", Some("u1"), None).await;
        let mine = json_body(response).await;
        let mut events: Vec<_> = mine
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["event_id"].as_str().unwrap().to_string())
            .collect();
        events.sort();
        assert_eq!(events, vec!["e1", "e2"]);
    }
}

mod test_invitations {
    use super::*;

    async fn selected(app: &TestApp) -> String {
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        app.create_user("sasuke", UserRole::Entrant).await.unwrap();
        let entry = app.service.join("e1", "naruto").await.unwrap();
        app.service
            .update_status(&entry.id, WaitlistStatus::Selected)
            .await
            .unwrap();
        entry.id
    }

    #[tokio::test]
    async fn test_accept_then_decline_is_rejected() {
        let app = TestApp::new();
        let entry_id = selected(&app).await;
        let router = app.test_router();
        let uri = format!("/v1/waitlist/{entry_id}/respond");

        let response = send(
            &router,
            Method::POST,
            &uri,
            Some("naruto"),
            Some(json!({"decision": "ACCEPTED"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ACCEPTED");

        let response = send(
            &router,
            Method::POST,
            &uri,
            Some("naruto"),
            Some(json!({"decision": "DECLINED"})),
        )
        .await;
        assert_error(response, StatusCode::CONFLICT, "ILLEGAL_TRANSITION").await;
    }

    #[tokio::test]
    async fn test_only_invitee_can_respond() {
        let app = TestApp::new();
        let entry_id = selected(&app).await;
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            &format!("/v1/waitlist/{entry_id}/respond"),
            Some("sasuke"),
            Some(json!({"decision": "ACCEPT"})),
        )
        .await;
        assert_error(response, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR").await;
    }

    #[tokio::test]
    async fn test_unknown_decision_is_rejected() {
        let app = TestApp::new();
        let entry_id = selected(&app).await;
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            &format!("/v1/waitlist/{entry_id}/respond"),
            Some("naruto"),
            Some(json!({"decision": "MAYBE"})),
        )
        .await;
        assert!(response.status().is_client_error());
    }
}

mod test_administration {
    use super::*;

    #[tokio::test]
    async fn test_organizer_cancels_and_reinstates() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user(ORGANIZER, UserRole::Organizer).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let entry = app.service.join("e1", "naruto").await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            &format!("/v1/waitlist/{}/cancel", entry.id),
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "CANCELLED");

        let response = send(
            &router,
            Method::POST,
            &format!("/v1/waitlist/{}/reinstate", entry.id),
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "WAITING");

        let response = send(
            &router,
            Method::POST,
            &format!("/v1/waitlist/{}/reinstate", entry.id),
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_error(response, StatusCode::CONFLICT, "ILLEGAL_TRANSITION").await;
    }

    #[tokio::test]
    async fn test_entrant_cannot_cancel() {
        let app = TestApp::new();
        app.create_event("e1", None, None).await.unwrap();
        app.create_user("naruto", UserRole::Entrant).await.unwrap();
        let entry = app.service.join("e1", "naruto").await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            &format!("/v1/waitlist/{}/cancel", entry.id),
            Some("naruto"),
            None,
        )
        .await;
        assert_error(response, StatusCode::FORBIDDEN, "AUTHORIZATION_ERROR").await;
    }

    #[tokio::test]
    async fn test_cancel_unknown_entry() {
        let app = TestApp::new();
        app.create_user(ORGANIZER, UserRole::Organizer).await.unwrap();
        let router = app.test_router();

        let response = send(
            &router,
            Method::POST,
            "/v1/waitlist/missing/cancel",
            Some(ORGANIZER),
            None,
        )
        .await;
        assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND").await;
    }
}
