//! Shopper flows: browsing, cart, promo codes and checkout.

#![allow(clippy::unwrap_used)]

use book_nook_integration_tests::{TestContext, get_json, post_json};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_browse_catalog() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let (status, body) = get_json(&client, &ctx.url("/books")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"].as_array().unwrap().len(), 6);

    let (status, body) = get_json(&client, &ctx.url("/books?category=fiction")).await;
    assert_eq!(status, StatusCode::OK);
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|b| b["category"] == "Fiction"));

    let (status, body) = get_json(&client, &ctx.url("/search?q=harari")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["slug"], "sapiens");
}

#[tokio::test]
async fn test_cart_is_per_session() {
    let ctx = TestContext::new().await;
    let book = ctx.book("caroline").await;

    let shopper = ctx.client();
    let (status, body) = post_json(
        &shopper,
        &ctx.url("/cart/add"),
        &json!({ "book_id": book.id, "quantity": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 2);

    let (_, home) = get_json(&shopper, &ctx.url("/")).await;
    assert_eq!(home["cart_item_count"], 2);

    let other = ctx.client();
    let (_, body) = get_json(&other, &ctx.url("/cart")).await;
    assert_eq!(body["item_count"], 0);
    assert_eq!(body["totals"]["total"], "0.00");
}

#[tokio::test]
async fn test_cart_rejects_more_than_stock() {
    let ctx = TestContext::new().await;
    let book = ctx.book("sapiens").await;
    let client = ctx.client();

    let (status, body) = post_json(
        &client,
        &ctx.url("/cart/add"),
        &json!({ "book_id": book.id, "quantity": 11 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, cart) = get_json(&client, &ctx.url("/cart")).await;
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let ctx = TestContext::new().await;
    let book = ctx.book("caroline").await;
    let client = ctx.client();

    post_json(&client, &ctx.url("/cart/add"), &json!({ "book_id": book.id })).await;
    let (status, body) = post_json(
        &client,
        &ctx.url("/cart/update"),
        &json!({ "book_id": book.id, "quantity": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["lines"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_with_promo() {
    let ctx = TestContext::new().await;
    let tollbooth = ctx.book("the-phantom-tollbooth").await;
    let wild_things = ctx.book("where-the-wild-things-are").await;
    let client = ctx.client();

    for book in [&tollbooth, &wild_things] {
        let (status, _) =
            post_json(&client, &ctx.url("/cart/add"), &json!({ "book_id": book.id })).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, cart) =
        post_json(&client, &ctx.url("/cart/promo"), &json!({ "code": " save10 " })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["promo_code"], "SAVE10");
    assert!(cart["promo_message"].is_null());
    // 16.98 - 1.70 + 8.25% tax + 4.99 shipping
    assert_eq!(cart["totals"]["discount"], "1.70");
    assert_eq!(cart["totals"]["total"], "21.53");

    let (status, preview) = get_json(&client, &ctx.url("/checkout")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["totals"]["total"], "21.53");

    let (status, order) = post_json(
        &client,
        &ctx.url("/checkout"),
        &json!({ "name": "Ada Reader", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], "21.53");
    assert_eq!(order["promo_code"], "SAVE10");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    assert_eq!(ctx.stock_of(tollbooth.id).await, 9);
    assert_eq!(ctx.stock_of(wild_things.id).await, 9);

    // Cart and promo are cleared after a successful order
    let (_, cart) = get_json(&client, &ctx.url("/cart")).await;
    assert_eq!(cart["item_count"], 0);
    assert!(cart["promo_code"].is_null());

    let number = order["order_number"].as_str().unwrap();
    let (status, receipt) = get_json(&client, &ctx.url(&format!("/receipt/{number}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["customer_email"], "ada@example.com");

    let (status, last) = get_json(&client, &ctx.url("/receipt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["order_number"], number);
}

#[tokio::test]
async fn test_promo_minimum_is_reported_not_applied() {
    let ctx = TestContext::new().await;
    let book = ctx.book("caroline").await;
    let client = ctx.client();

    post_json(&client, &ctx.url("/cart/add"), &json!({ "book_id": book.id })).await;
    let (status, cart) = post_json(
        &client,
        &ctx.url("/cart/promo"),
        &json!({ "code": "READMORE15" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["promo_code"], "READMORE15");
    assert!(cart["promo_message"].as_str().unwrap().contains("25.00"));
    assert_eq!(cart["totals"]["discount"], "0.00");

    // Checkout refuses to silently drop the code
    let (status, _) = post_json(
        &client,
        &ctx.url("/checkout"),
        &json!({ "name": "Ada Reader", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(ctx.stock_of(book.id).await, 10);

    // Clearing the code lets the order through
    post_json(&client, &ctx.url("/cart/promo"), &json!({ "code": "" })).await;
    let (status, _) = post_json(
        &client,
        &ctx.url("/checkout"),
        &json!({ "name": "Ada Reader", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_checkout_validation() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let (status, _) = post_json(
        &client,
        &ctx.url("/checkout"),
        &json!({ "name": "Ada Reader", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let book = ctx.book("sapiens").await;
    post_json(&client, &ctx.url("/cart/add"), &json!({ "book_id": book.id })).await;
    let (status, _) = post_json(
        &client,
        &ctx.url("/checkout"),
        &json!({ "name": "Ada Reader", "email": "not-an-email" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.stock_of(book.id).await, 10);
}

#[tokio::test]
async fn test_competing_shoppers_cannot_oversell() {
    let ctx = TestContext::new().await;
    let book = ctx.book("atomic-habits").await;

    let first = ctx.client();
    let second = ctx.client();
    for client in [&first, &second] {
        let (status, _) = post_json(
            client,
            &ctx.url("/cart/add"),
            &json!({ "book_id": book.id, "quantity": 6 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let customer = json!({ "name": "Ada Reader", "email": "ada@example.com" });
    let (status, _) = post_json(&first, &ctx.url("/checkout"), &customer).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(&second, &ctx.url("/checkout"), &customer).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["shortfalls"][0]["requested"], 6);
    assert_eq!(body["shortfalls"][0]["available"], 4);

    assert_eq!(ctx.stock_of(book.id).await, 4);

    // The losing cart is kept for the shopper to adjust
    let (_, cart) = get_json(&second, &ctx.url("/cart")).await;
    assert_eq!(cart["item_count"], 6);
}

#[tokio::test]
async fn test_unknown_receipt() {
    let ctx = TestContext::new().await;
    let client = ctx.client();

    let (status, _) = get_json(&client, &ctx.url("/receipt/DEADBEEF")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(&client, &ctx.url("/receipt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
