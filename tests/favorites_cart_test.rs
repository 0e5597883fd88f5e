//! Integration tests for favorites, the shopping cart and the shopping list download

mod common;

use actix_web::http::StatusCode;
use actix_web::test::{call_service, init_service, read_body, read_body_json, TestRequest};
use common::{database::*, fixtures::*};
use serde_json::Value;

#[actix_rt::test]
async fn test_favorite_twice_conflicts_and_remove_twice_is_not_found() {
    let ctx = TestContext::new().await;
    let user = create_test_user(&ctx.db, "fan").await.unwrap();
    let token = create_test_token(&ctx.db, user.id).await.unwrap();
    let salt = create_test_ingredient(&ctx.db, "salt", "g").await.unwrap();
    let recipe = create_test_recipe(&ctx.db, user.id, "Soup", &[(salt.id, 5)], &[])
        .await
        .unwrap();
    let app = init_service(ctx.app()).await;
    let uri = format!("/api/recipes/{}/favorite/", recipe.id);

    let req = TestRequest::post()
        .uri(&uri)
        .insert_header(auth_header(&token))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = read_body_json(resp).await;
    assert_eq!(body["id"], recipe.id);
    assert_eq!(body["name"], "Soup");
    assert_eq!(body["cooking_time"], 15);
    assert!(body["image"]
        .as_str()
        .unwrap()
        .starts_with("http://testserver/media/recipes/images/"));

    let req = TestRequest::post()
        .uri(&uri)
        .insert_header(auth_header(&token))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_body_json(resp).await;
    assert!(body.get("errors").is_some());

    // The recipe now shows as favorited to this user only.
    let req = TestRequest::get()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .insert_header(auth_header(&token))
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["is_favorited"], true);
    assert_eq!(body["is_in_shopping_cart"], false);

    let req = TestRequest::get()
        .uri(&format!("/api/recipes/{}/", recipe.id))
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["is_favorited"], false);

    let req = TestRequest::delete()
        .uri(&uri)
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::delete()
        .uri(&uri)
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_membership_of_missing_recipe() {
    let ctx = TestContext::new().await;
    let user = create_test_user(&ctx.db, "fan").await.unwrap();
    let token = create_test_token(&ctx.db, user.id).await.unwrap();
    let app = init_service(ctx.app()).await;

    for uri in ["/api/recipes/999/favorite/", "/api/recipes/999/shopping_cart/"] {
        let req = TestRequest::post()
            .uri(uri)
            .insert_header(auth_header(&token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    let req = TestRequest::post()
        .uri("/api/recipes/999/favorite/")
        .to_request();
    assert_eq!(
        call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_list_filters_by_membership() {
    let ctx = TestContext::new().await;
    let user = create_test_user(&ctx.db, "fan").await.unwrap();
    let token = create_test_token(&ctx.db, user.id).await.unwrap();
    let salt = create_test_ingredient(&ctx.db, "salt", "g").await.unwrap();
    let liked = create_test_recipe(&ctx.db, user.id, "Liked", &[(salt.id, 1)], &[])
        .await
        .unwrap();
    let carted = create_test_recipe(&ctx.db, user.id, "Carted", &[(salt.id, 1)], &[])
        .await
        .unwrap();
    create_test_recipe(&ctx.db, user.id, "Ignored", &[(salt.id, 1)], &[])
        .await
        .unwrap();
    let app = init_service(ctx.app()).await;

    let req = TestRequest::post()
        .uri(&format!("/api/recipes/{}/favorite/", liked.id))
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
    let req = TestRequest::post()
        .uri(&format!("/api/recipes/{}/shopping_cart/", carted.id))
        .insert_header(auth_header(&token))
        .to_request();
    assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = TestRequest::get()
        .uri("/api/recipes/?is_favorited=1")
        .insert_header(auth_header(&token))
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], liked.id);
    assert_eq!(body["results"][0]["is_favorited"], true);

    let req = TestRequest::get()
        .uri("/api/recipes/?is_in_shopping_cart=true")
        .insert_header(auth_header(&token))
        .to_request();
    let body: Value = read_body_json(call_service(&app, req).await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], carted.id);
    assert_eq!(body["results"][0]["is_in_shopping_cart"], true);
}

#[actix_rt::test]
async fn test_shopping_list_sums_shared_ingredients() {
    let ctx = TestContext::new().await;
    let user = create_test_user(&ctx.db, "cook").await.unwrap();
    let token = create_test_token(&ctx.db, user.id).await.unwrap();
    let sugar = create_test_ingredient(&ctx.db, "sugar", "g").await.unwrap();
    let flour = create_test_ingredient(&ctx.db, "flour", "g").await.unwrap();
    let milk = create_test_ingredient(&ctx.db, "milk", "ml").await.unwrap();
    let cake = create_test_recipe(
        &ctx.db,
        user.id,
        "Cake",
        &[(sugar.id, 100), (flour.id, 300)],
        &[],
    )
    .await
    .unwrap();
    let pudding = create_test_recipe(
        &ctx.db,
        user.id,
        "Pudding",
        &[(milk.id, 500), (sugar.id, 50)],
        &[],
    )
    .await
    .unwrap();
    let app = init_service(ctx.app()).await;

    for recipe_id in [cake.id, pudding.id] {
        let req = TestRequest::post()
            .uri(&format!("/api/recipes/{}/shopping_cart/", recipe_id))
            .insert_header(auth_header(&token))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .insert_header(auth_header(&token))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(
        resp.headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap(),
        "attachment; filename=\"shopping_cart.txt\""
    );

    let body = read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert_eq!(
        text,
        "sugar (g) — 150\nflour (g) — 300\nmilk (ml) — 500\n"
    );
}

#[actix_rt::test]
async fn test_empty_cart_downloads_empty_file() {
    let ctx = TestContext::new().await;
    let user = create_test_user(&ctx.db, "cook").await.unwrap();
    let token = create_test_token(&ctx.db, user.id).await.unwrap();
    let app = init_service(ctx.app()).await;

    let req = TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .insert_header(auth_header(&token))
        .to_request();
    let resp = call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(read_body(resp).await.is_empty());

    let req = TestRequest::get()
        .uri("/api/recipes/download_shopping_cart/")
        .to_request();
    assert_eq!(
        call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}
