//! Product and user management routes over in-memory stores.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

#[tokio::test]
async fn products_require_authentication() {
    let app = app();
    let reply = send(&app, empty_request("GET", "/products", None)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "missing_token");
}

#[tokio::test]
async fn product_lifecycle() {
    let app = app();
    let (_, token) = signed_in(&app, "alice", None).await;

    let created = send(
        &app,
        json_request(
            "POST",
            "/products",
            Some(&token),
            json!({ "productName": "Widget", "productPrice": 9.5 }),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["productName"], "Widget");
    let id = created.body["productId"].as_i64().unwrap();

    let listed = send(&app, empty_request("GET", "/products", Some(&token))).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let updated = send(
        &app,
        json_request(
            "PUT",
            &format!("/products/{id}"),
            Some(&token),
            json!({ "productPrice": 12.0 }),
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["productName"], "Widget");
    assert_eq!(updated.body["productPrice"], 12.0);

    let deleted = send(&app, empty_request("DELETE", &format!("/products/{id}"), Some(&token))).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = send(&app, empty_request("GET", &format!("/products/{id}"), Some(&token))).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["error"], "product_not_found");
}

#[tokio::test]
async fn product_input_is_validated() {
    let app = app();
    let (_, token) = signed_in(&app, "alice", None).await;

    let nameless = send(
        &app,
        json_request("POST", "/products", Some(&token), json!({ "productPrice": 1.0 })),
    )
    .await;
    assert_eq!(nameless.status, StatusCode::BAD_REQUEST);
    assert_eq!(nameless.body["error"], "validation_error");

    let negative = send(
        &app,
        json_request(
            "POST",
            "/products",
            Some(&token),
            json!({ "productName": "Widget", "productPrice": -3.0 }),
        ),
    )
    .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let bad_id = send(&app, empty_request("GET", "/products/abc", Some(&token))).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.body["error"], "validation_error");
}

#[tokio::test]
async fn users_may_edit_themselves_but_not_others() {
    let app = app();
    let (alice, alice_token) = signed_in(&app, "alice", None).await;
    let (bob, _) = signed_in(&app, "bob", None).await;

    let own = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{alice}"),
            Some(&alice_token),
            json!({ "name": "Alice A.", "username": "alice", "email": "alice@new.com" }),
        ),
    )
    .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["email"], "alice@new.com");
    assert_eq!(own.body["profile"], "OPERADOR");

    let other = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{bob}"),
            Some(&alice_token),
            json!({ "name": "Bob", "username": "bob", "email": "bob@x.com" }),
        ),
    )
    .await;
    assert_eq!(other.status, StatusCode::FORBIDDEN);
    assert_eq!(other.body["error"], "forbidden");

    let escalate = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{alice}"),
            Some(&alice_token),
            json!({ "name": "Alice", "username": "alice", "email": "alice@new.com", "profile": "ADM" }),
        ),
    )
    .await;
    assert_eq!(escalate.status, StatusCode::FORBIDDEN);

    let taken = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{alice}"),
            Some(&alice_token),
            json!({ "name": "Alice", "username": "bob", "email": "alice@new.com" }),
        ),
    )
    .await;
    assert_eq!(taken.status, StatusCode::CONFLICT);
    assert_eq!(taken.body["error"], "duplicate_username");
}

#[tokio::test]
async fn admin_manages_other_users() {
    let app = app();
    let (_, admin) = signed_in(&app, "root", Some("ADM")).await;
    let (bob, _) = signed_in(&app, "bob", None).await;

    let listed = send(&app, empty_request("GET", "/users", Some(&admin))).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 2);

    let promoted = send(
        &app,
        json_request(
            "PUT",
            &format!("/users/{bob}"),
            Some(&admin),
            json!({ "name": "Bob", "username": "bob", "email": "bob@x.com", "role": "STOCK" }),
        ),
    )
    .await;
    assert_eq!(promoted.status, StatusCode::OK);
    assert_eq!(promoted.body["role"], "STOCK");

    let deleted = send(&app, empty_request("DELETE", &format!("/users/{bob}"), Some(&admin))).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = send(&app, empty_request("GET", &format!("/users/{bob}"), Some(&admin))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "user_not_found");
}
