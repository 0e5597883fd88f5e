//! Integration tests for registration, token login and account management

mod common;

use actix_web::http::StatusCode;
use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
use common::{database::*, fixtures::*};
use foodgram::orm::{auth_tokens, favorites, recipes, subscriptions, users};
use sea_orm::{entity::*, query::*};
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await;
    let app = init_service(ctx.app()).await;

    let req = TestRequest::post()
        .uri("/api/users/")
        .set_json(json!({
            "email": "Vasya@Example.com",
            "username": "vasya.pupkin",
            "first_name": "Vasya",
            "last_name": "Pupkin",
            "password": "Qwerty123!"
        }))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["email"], "vasya@example.com");
    assert_eq!(body["username"], "vasya.pupkin");
    assert!(body.get("password").is_none());

    let req = TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "vasya@example.com", "password": "Qwerty123!"}))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = read_body_json(resp).await;
    let token = body["auth_token"].as_str().unwrap().to_owned();
    assert_eq!(token.len(), 40);

    // Logging in again returns the same token.
    let req = TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "vasya@example.com", "password": "Qwerty123!"}))
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["auth_token"], token.as_str());

    let req = TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(auth_header(&token))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["username"], "vasya.pupkin");

    let req = TestRequest::post()
        .uri("/api/auth/token/logout/")
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(
        call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_register_validation() {
    let ctx = TestContext::new().await;
    create_test_user(&ctx.db, "taken").await.unwrap();
    let app = init_service(ctx.app()).await;

    let req = TestRequest::post()
        .uri("/api/users/")
        .set_json(json!({
            "email": "taken@test.com",
            "username": "taken",
            "first_name": "A",
            "last_name": "B",
            "password": "longenough"
        }))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert!(body.get("email").is_some());
    assert!(body.get("username").is_some());

    let req = TestRequest::post()
        .uri("/api/users/")
        .set_json(json!({
            "email": "not-an-email",
            "username": "has spaces",
            "first_name": "A",
            "last_name": "B",
            "password": "short"
        }))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert!(body.get("email").is_some());
    assert!(body.get("username").is_some());
    assert!(body.get("password").is_some());

    let count = users::Entity::find().count(&ctx.db).await.unwrap();
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn test_bad_credentials() {
    let ctx = TestContext::new().await;
    create_test_user(&ctx.db, "cook").await.unwrap();
    let app = init_service(ctx.app()).await;

    let attempts = [
        ("cook@test.com", "wrong-password"),
        ("nobody@test.com", TEST_PASSWORD),
    ];
    for (email, password) in attempts {
        let req = TestRequest::post()
            .uri("/api/auth/token/login/")
            .set_json(json!({"email": email, "password": password}))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        assert!(body.get("non_field_errors").is_some());
    }
}

#[actix_rt::test]
async fn test_user_list_and_profile() {
    let ctx = TestContext::new().await;
    let first = create_test_user(&ctx.db, "first").await.unwrap();
    create_test_user(&ctx.db, "second").await.unwrap();
    let app = init_service(ctx.app()).await;

    let resp = call_service(&app, TestRequest::get().uri("/api/users/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["username"], "first");
    assert_eq!(body["results"][0]["is_subscribed"], false);

    let req = TestRequest::get()
        .uri(&format!("/api/users/{}/", first.id))
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["email"], "first@test.com");

    let resp = call_service(&app, TestRequest::get().uri("/api/users/9999/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = call_service(&app, TestRequest::get().uri("/api/users/me/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_set_password() {
    let ctx = TestContext::new().await;
    let user = create_test_user(&ctx.db, "cook").await.unwrap();
    let token = create_test_token(&ctx.db, user.id).await.unwrap();
    let app = init_service(ctx.app()).await;

    let req = TestRequest::post()
        .uri("/api/users/set_password/")
        .insert_header(auth_header(&token))
        .set_json(json!({"new_password": "brand-new-pass", "current_password": "wrong"}))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert!(body.get("current_password").is_some());

    let req = TestRequest::post()
        .uri("/api/users/set_password/")
        .insert_header(auth_header(&token))
        .set_json(json!({
            "new_password": "brand-new-pass",
            "current_password": TEST_PASSWORD
        }))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::post()
        .uri("/api/auth/token/login/")
        .set_json(json!({"email": "cook@test.com", "password": "brand-new-pass"}))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_delete_account_cascades() {
    let ctx = TestContext::new().await;
    let leaving = create_test_user(&ctx.db, "leaving").await.unwrap();
    let staying = create_test_user(&ctx.db, "staying").await.unwrap();
    let token = create_test_token(&ctx.db, leaving.id).await.unwrap();
    let staying_token = create_test_token(&ctx.db, staying.id).await.unwrap();
    let salt = create_test_ingredient(&ctx.db, "salt", "g").await.unwrap();
    let recipe = create_test_recipe(&ctx.db, leaving.id, "Soup", &[(salt.id, 1)], &[])
        .await
        .unwrap();
    let app = init_service(ctx.app()).await;

    let req = TestRequest::post()
        .uri(&format!("/api/recipes/{}/favorite/", recipe.id))
        .insert_header(auth_header(&staying_token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
    let req = TestRequest::post()
        .uri(&format!("/api/users/{}/subscribe/", leaving.id))
        .insert_header(auth_header(&staying_token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = TestRequest::delete()
        .uri("/api/users/me/")
        .insert_header(auth_header(&token))
        .set_json(json!({"current_password": "wrong"}))
        .to_request();
    assert_eq!(
        call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = TestRequest::delete()
        .uri("/api/users/me/")
        .insert_header(auth_header(&token))
        .set_json(json!({"current_password": TEST_PASSWORD}))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    assert!(users::Entity::find_by_id(leaving.id)
        .one(&ctx.db)
        .await
        .unwrap()
        .is_none());
    assert_eq!(recipes::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(favorites::Entity::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(subscriptions::Entity::find().count(&ctx.db).await.unwrap(), 0);
    let tokens = auth_tokens::Entity::find()
        .filter(auth_tokens::Column::UserId.eq(leaving.id))
        .count(&ctx.db)
        .await
        .unwrap();
    assert_eq!(tokens, 0);

    // The old token no longer authenticates.
    let req = TestRequest::get()
        .uri("/api/users/me/")
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(
        call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}
