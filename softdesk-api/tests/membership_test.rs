/// Integration tests for project membership management

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_add_member_by_username_and_id() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let dave = ctx.user("dave").await;
    let website = ctx.project(&alice, "Website").await;

    let (status, body) = ctx
        .post(
            &format!("/projects/{website}/users"),
            &alice,
            json!({ "username": "bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": bob.id(), "username": "bob" }));

    // Members may add members too
    let (status, _) = ctx
        .post(
            &format!("/projects/{website}/users"),
            &bob,
            json!({ "user_id": dave.id() }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = ctx.get(&format!("/projects/{website}/users"), &dave).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": bob.id(), "username": "bob" },
            { "id": dave.id(), "username": "dave" },
        ])
    );
}

#[tokio::test]
async fn test_add_existing_member_conflicts() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let website = ctx.project(&alice, "Website").await;
    ctx.add_member(&website, &alice, &bob).await;

    let (status, body) = ctx
        .post(
            &format!("/projects/{website}/users"),
            &alice,
            json!({ "username": "bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (_, members) = ctx.get(&format!("/projects/{website}/users"), &alice).await;
    assert_eq!(members.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_unknown_user_is_404() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let website = ctx.project(&alice, "Website").await;

    let (status, _) = ctx
        .post(
            &format!("/projects/{website}/users"),
            &alice,
            json!({ "username": "ghost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .post(&format!("/projects/{website}/users"), &alice, json!({}))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "username");
}

#[tokio::test]
async fn test_outsider_cannot_manage_members() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let carol = ctx.user("carol").await;
    let website = ctx.project(&alice, "Website").await;

    let (status, _) = ctx
        .post(
            &format!("/projects/{website}/users"),
            &carol,
            json!({ "username": "carol" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.get(&format!("/projects/{website}/users"), &carol).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_remove_member_returns_user() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let bob = ctx.user("bob").await;
    let website = ctx.project(&alice, "Website").await;
    ctx.add_member(&website, &alice, &bob).await;

    let uri = format!("/projects/{website}/users/{}", bob.id());

    let (status, body) = ctx.delete(&uri, &alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": bob.id(), "username": "bob" }));

    // No longer a contributor
    let (status, _) = ctx.get(&format!("/projects/{website}"), &bob).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Removing again is an explicit error, not a no-op
    let (status, body) = ctx.delete(&uri, &alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User is not a member of this project");
}

#[tokio::test]
async fn test_remove_unknown_user_is_404() {
    let ctx = TestContext::new();
    let alice = ctx.user("alice").await;
    let website = ctx.project(&alice, "Website").await;

    let (status, body) = ctx
        .delete(
            &format!("/projects/{website}/users/{}", uuid::Uuid::new_v4()),
            &alice,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
