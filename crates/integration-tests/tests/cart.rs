//! Integration tests for the cart and stock reservations.
//!
//! These tests require a `PostgreSQL` database in `DATABASE_URL`; each test
//! gets its own migrated database.

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use skateparadise_integration_tests::TestServer;

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_guest_cart_reserves_and_releases_stock(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let p1 = server.create_product("Street Deck", "59.99", 5).await;

    let (status, body) = server
        .post(
            "/add_item",
            &json!({"cart_code": "XYZ999", "product_id": p1, "quantity": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["cart_code"], "XYZ999");
    assert_eq!(server.available(p1).await, 2);

    let (status, cart) = server.get("/get_cart?cart_code=XYZ999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["num_of_items"], 3);

    let (status, body) = server
        .post(
            "/add_item",
            &json!({"cart_code": "XYZ999", "product_id": p1, "quantity": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(body["requested"], 3);
    assert_eq!(body["available"], 2);
    assert_eq!(server.available(p1).await, 2);

    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    let (status, _) = server
        .post(
            "/remove_item",
            &json!({"cart_code": "XYZ999", "item_id": item_id}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server.available(p1).await, 5);

    let (_, stats) = server.get("/get_cart_stat?cart_code=XYZ999").await;
    assert_eq!(stats["num_of_items"], 0);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_repeat_add_merges_into_one_line(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("Wax", "4.50", 10).await;

    for _ in 0..2 {
        let (status, _) = server
            .post(
                "/add_item",
                &json!({"cart_code": "merge-1", "product_id": product, "quantity": 2}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, cart) = server.get("/get_cart?cart_code=merge-1").await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 4);
    assert_eq!(cart["sum_total"], "18.00");

    let (_, found) = server
        .get(&format!("/product_in_cart?cart_code=merge-1&product_id={product}"))
        .await;
    assert_eq!(found["product_in_cart"], true);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_merged_line_respects_quantity_limit(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("Sticker Pack", "1.00", 30_000).await;
    let add = json!({"cart_code": "BULK", "product_id": product, "quantity": 6000});

    let (status, body) = server.post("/add_item", &add).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(server.available(product).await, 24_000);

    let (status, body) = server.post("/add_item", &add).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "validation");
    assert_eq!(server.available(product).await, 24_000);

    let (_, cart) = server.get("/get_cart?cart_code=BULK").await;
    assert_eq!(cart["items"][0]["quantity"], 6000);

    // Topping up to the limit is still allowed
    let (status, body) = server
        .post(
            "/add_item",
            &json!({"cart_code": "BULK", "product_id": product, "quantity": 4000}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["item"]["quantity"], 10_000);
    assert_eq!(server.available(product).await, 20_000);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_user_cart_opens_on_first_add(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("Riser Pads", "6.00", 5).await;
    let token = server.user_token("opener").await;
    let add = json!({"product_id": product});

    let (status, first) = server
        .send(Method::POST, "/add_item", Some(&add), Some(&token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    let code = first["cart_code"].as_str().unwrap();
    assert!(!code.is_empty());

    let (status, second) = server
        .send(Method::POST, "/add_item", Some(&add), Some(&token))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{second}");
    assert_eq!(second["cart_code"], code);
    assert_eq!(second["item"]["quantity"], 2);

    let carts: i64 = sqlx::query_scalar("SELECT count(*) FROM shop.cart")
        .fetch_one(&server.pool)
        .await
        .unwrap();
    assert_eq!(carts, 1);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_sized_products_need_a_size(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let deck = server
        .create_sized_product("Pro Deck", "64.00", &[("8.0", 2), ("8.25", 1)])
        .await;

    let (status, body) = server
        .post("/add_item", &json!({"cart_code": "sized", "product_id": deck}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "size_required");

    let (status, body) = server
        .post(
            "/add_item",
            &json!({"cart_code": "sized", "product_id": deck, "size": "9.0"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, _) = server
        .post(
            "/add_item",
            &json!({"cart_code": "sized", "product_id": deck, "size": "8.25"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, detail) = server.get(&format!("/product/{deck}")).await;
    let sizes = detail["sizes"].as_array().unwrap();
    let sold_out = sizes.iter().find(|s| s["size"] == "8.25").unwrap();
    assert_eq!(sold_out["available"], 0);
    assert_eq!(detail["available"], true);

    let (_, other_size) = server
        .get(&format!(
            "/product_in_cart?cart_code=sized&product_id={deck}&size=8.0"
        ))
        .await;
    assert_eq!(other_size["product_in_cart"], false);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_quantity_changes_move_reservations(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("Bearings", "19.90", 6).await;

    let (_, added) = server
        .post(
            "/add_item",
            &json!({"cart_code": "qty", "product_id": product, "quantity": 2}),
        )
        .await;
    let item_id = added["item"]["id"].as_i64().unwrap();

    let (status, body) = server
        .post(
            "/update_quantity",
            &json!({"cart_code": "qty", "item_id": item_id, "quantity": 5}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(server.available(product).await, 1);

    let (status, body) = server
        .post(
            "/update_quantity",
            &json!({"cart_code": "qty", "item_id": item_id, "delta": -10}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["item"]["quantity"], 1);
    assert_eq!(server.available(product).await, 5);

    let (status, body) = server
        .post(
            "/update_quantity",
            &json!({"cart_code": "qty", "item_id": item_id, "quantity": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    // Another cart cannot touch this line
    let (status, _) = server
        .post(
            "/update_quantity",
            &json!({"cart_code": "someone-else", "item_id": item_id, "quantity": 2}),
        )
        .await;
    assert!(status == StatusCode::NOT_FOUND, "got {status}");
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_adds_cannot_oversell(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let product = server.create_product("Last Deck", "80.00", 1).await;

    let first = json!({"cart_code": "race-a", "product_id": product});
    let second = json!({"cart_code": "race-b", "product_id": product});
    let ((a, _), (b, _)) = tokio::join!(
        server.send(Method::POST, "/add_item", Some(&first), None),
        server.send(Method::POST, "/add_item", Some(&second), None),
    );

    let created = [a, b]
        .iter()
        .filter(|s| **s == StatusCode::CREATED)
        .count();
    assert_eq!(created, 1, "statuses: {a}, {b}");
    assert!(a == StatusCode::BAD_REQUEST || b == StatusCode::BAD_REQUEST);
    assert_eq!(server.available(product).await, 0);

    let (_, detail) = server.get(&format!("/product/{product}")).await;
    assert_eq!(detail["available"], false);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_missing_cart(pool: PgPool) {
    let server = TestServer::start(pool).await;

    let (status, body) = server.get("/get_cart?cart_code=nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "cart_not_found");

    let (status, body) = server.get("/get_cart").await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, stats) = server.get("/get_cart_stat?cart_code=nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["num_of_items"], 0);
}
