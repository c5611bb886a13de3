// SPDX-License-Identifier: MIT

//! Admin surface tests: role enforcement, user management, listing filters.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_admin_routes_forbidden_for_regular_users() {
    let (app, state) = common::create_test_app().await;
    let user = common::seed_user(&state, "plain", "plain@example.com", "password123", false).await;
    let token = common::auth_token(&state, user.id);

    for uri in [
        "/api/admin/users",
        "/api/admin/activities",
        "/api/admin/stats",
        "/api/admin/dashboard",
    ] {
        let response = app
            .clone()
            .oneshot(common::get_request(uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "uri: {}", uri);
    }
}

#[tokio::test]
async fn test_admin_routes_unauthorized_without_token() {
    let (app, _) = common::create_test_app().await;

    let response = app
        .oneshot(common::get_request("/api/admin/users", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_users_with_filters() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state, "boss", "boss@example.com", "password123", true).await;
    common::seed_user(&state, "alice_smith", "alice@example.com", "password123", false).await;
    let bob = common::seed_user(&state, "bob_jones", "bob@example.com", "password123", false).await;
    // Deactivate bob
    state
        .db
        .admin_update_user(bob.id, "bob_jones", "bob@example.com", None, None, None, false, false)
        .await
        .unwrap();
    let token = common::auth_token(&state, admin.id);

    // No filters: everyone
    let response = app
        .clone()
        .oneshot(common::get_request("/api/admin/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::response_json(response).await;
    assert_eq!(body["total"], 3);

    // Search by substring
    let response = app
        .clone()
        .oneshot(common::get_request(
            "/api/admin/users?search=alice",
            Some(&token),
        ))
        .await
        .unwrap();
    let body = common::response_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["username"], "alice_smith");

    // Role filter
    let response = app
        .clone()
        .oneshot(common::get_request(
            "/api/admin/users?role=admin",
            Some(&token),
        ))
        .await
        .unwrap();
    let body = common::response_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["username"], "boss");

    // Status filter
    let response = app
        .clone()
        .oneshot(common::get_request(
            "/api/admin/users?status=inactive",
            Some(&token),
        ))
        .await
        .unwrap();
    let body = common::response_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["username"], "bob_jones");

    // Pagination bounds
    let response = app
        .oneshot(common::get_request(
            "/api/admin/users?page=2&per_page=2",
            Some(&token),
        ))
        .await
        .unwrap();
    let body = common::response_json(response).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["page"], 2);
}

#[tokio::test]
async fn test_admin_edit_user_roles_and_status() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state, "boss", "boss@example.com", "password123", true).await;
    let user = common::seed_user(&state, "worker", "worker@example.com", "password123", false).await;
    let token = common::auth_token(&state, admin.id);

    let response = app
        .clone()
        .oneshot(common::json_request(
            "PUT",
            &format!("/api/admin/users/{}", user.id),
            Some(&token),
            &json!({
                "username": "worker",
                "email": "worker@example.com",
                "first_name": "Walter",
                "is_admin": true,
                "is_active": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::response_json(response).await;
    assert_eq!(body["is_admin"], true);

    let refreshed = state.db.get_user(user.id).await.unwrap().unwrap();
    assert!(refreshed.is_admin);

    // Edit is recorded against the acting admin
    let (entries, _) = state.db.list_activities_for_user(admin.id, 1, 10).await.unwrap();
    assert!(entries
        .iter()
        .any(|e| e.action == "User Edit" && e.description.as_deref() == Some("Edited user: worker")));
}

#[tokio::test]
async fn test_admin_edit_rejects_duplicate_email() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state, "boss", "boss@example.com", "password123", true).await;
    let user = common::seed_user(&state, "worker", "worker@example.com", "password123", false).await;
    let token = common::auth_token(&state, admin.id);

    let response = app
        .oneshot(common::json_request(
            "PUT",
            &format!("/api/admin/users/{}", user.id),
            Some(&token),
            &json!({
                "username": "worker",
                "email": "boss@example.com",
                "is_admin": false,
                "is_active": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_cannot_delete_own_account() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state, "boss", "boss@example.com", "password123", true).await;
    let token = common::auth_token(&state, admin.id);

    let response = app
        .oneshot(common::json_request(
            "DELETE",
            &format!("/api/admin/users/{}", admin.id),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.db.get_user(admin.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_delete_user_preserves_activity_rows() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state, "boss", "boss@example.com", "password123", true).await;
    let user = common::seed_user(&state, "worker", "worker@example.com", "password123", false).await;
    let token = common::auth_token(&state, admin.id);

    // Give the doomed user some history
    state
        .db
        .insert_activity(Some(user.id), "Login", None, None)
        .await
        .unwrap();

    let response = app
        .oneshot(common::json_request(
            "DELETE",
            &format!("/api/admin/users/{}", user.id),
            Some(&token),
            &json!({}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.db.get_user(user.id).await.unwrap().is_none());

    // The old login row survives with its user reference nulled
    let (entries, _) = state.db.list_activities(1, 50).await.unwrap();
    let orphaned = entries
        .iter()
        .find(|e| e.action == "Login")
        .expect("deleted user's rows should survive");
    assert_eq!(orphaned.user_id, None);

    // And the deletion itself is recorded
    assert!(entries
        .iter()
        .any(|e| e.action == "User Delete" && e.description.as_deref() == Some("Deleted user: worker")));
}

#[tokio::test]
async fn test_get_missing_user_is_404() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state, "boss", "boss@example.com", "password123", true).await;
    let token = common::auth_token(&state, admin.id);

    let response = app
        .oneshot(common::get_request("/api/admin/users/9999", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
