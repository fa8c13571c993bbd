//! Integration tests for checkout and the order lifecycle.

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

use skateparadise_integration_tests::TestServer;

async fn add(server: &TestServer, cart_code: &str, product_id: i64, quantity: i64) {
    let (status, body) = server
        .post(
            "/add_item",
            &json!({"cart_code": cart_code, "product_id": product_id, "quantity": quantity}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
}

async fn on_hand(pool: &PgPool, product_id: i64) -> i32 {
    sqlx::query_scalar("SELECT sum(on_hand)::INT FROM shop.stock_level WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn checkout(server: &TestServer, cart_code: &str) -> Value {
    let (status, order) = server
        .post(
            "/create_order",
            &json!({
                "cart_code": cart_code,
                "name": "Tony Hawk",
                "address": "900 Ramp Road",
                "payment_method": "CB",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    order
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_checkout_commits_stock_and_freezes_prices(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let deck = server.create_product("Street Deck", "59.99", 5).await;
    let wheels = server.create_product("Street Wheels", "35.00", 8).await;
    add(&server, "checkout-1", deck, 2).await;
    add(&server, "checkout-1", wheels, 1).await;

    let order = checkout(&server, "checkout-1").await;
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["total"], "154.98");
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_method"], "CB");
    assert!(order["tracking_code"].as_str().unwrap().starts_with("SP-"));

    assert_eq!(on_hand(&server.pool, deck).await, 3);
    assert_eq!(on_hand(&server.pool, wheels).await, 7);
    assert_eq!(server.available(deck).await, 3);

    // The cart is closed
    let (status, _) = server.get("/get_cart?cart_code=checkout-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    sqlx::query("UPDATE shop.product SET price = 99.00 WHERE id = $1")
        .bind(deck)
        .execute(&server.pool)
        .await
        .unwrap();

    let id = order["id"].as_i64().unwrap();
    let (status, reloaded) = server.get(&format!("/order/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reloaded["total"], "154.98");
    let deck_line = reloaded["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["product_name"] == "Street Deck")
        .unwrap();
    assert_eq!(deck_line["unit_price"], "59.99");
    assert_eq!(deck_line["total"], "119.98");
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_checkout_is_all_or_nothing(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let deck = server.create_product("Cruiser Deck", "49.00", 4).await;
    let trucks = server.create_product("Hollow Trucks", "55.00", 2).await;
    let wheels = server.create_product("Soft Wheels", "32.00", 5).await;
    add(&server, "short", deck, 2).await;
    add(&server, "short", trucks, 1).await;
    add(&server, "short", wheels, 2).await;

    // Stock correction after the reservation
    sqlx::query("UPDATE shop.stock_level SET on_hand = 0 WHERE product_id = $1")
        .bind(trucks)
        .execute(&server.pool)
        .await
        .unwrap();

    let (status, body) = server
        .post("/create_order", &json!({"cart_code": "short"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_stock");
    assert_eq!(body["product"], "Hollow Trucks");

    let (status, cart) = server.get("/get_cart?cart_code=short").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["paid"], false);
    assert_eq!(cart["num_of_items"], 5);

    // Lines before and after the short one keep their reservations
    assert_eq!(on_hand(&server.pool, deck).await, 4);
    assert_eq!(server.available(deck).await, 2);
    assert_eq!(on_hand(&server.pool, wheels).await, 5);
    assert_eq!(server.available(wheels).await, 3);

    let orders: i64 = sqlx::query_scalar("SELECT count(*) FROM shop.order")
        .fetch_one(&server.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_empty_cart_cannot_check_out(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let wax = server.create_product("Curb Wax", "4.50", 3).await;
    add(&server, "empty", wax, 1).await;

    let (_, cart) = server.get("/get_cart?cart_code=empty").await;
    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    server
        .post("/remove_item", &json!({"cart_code": "empty", "item_id": item_id}))
        .await;

    let (status, body) = server
        .post("/create_order", &json!({"cart_code": "empty"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, body) = server
        .post("/create_order", &json!({"cart_code": "never-opened"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "cart_not_found");
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_status_moves_forward_for_staff_only(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let deck = server.create_product("Pool Deck", "62.00", 2).await;
    add(&server, "status", deck, 1).await;
    let order = checkout(&server, "status").await;
    let path = format!("/order/{}/status", order["id"]);

    let staff = server.staff_token("shopkeeper").await;
    let rider = server.user_token("rider").await;

    let (status, body) = server
        .send(Method::POST, &path, Some(&json!({"status": "levitating"})), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_status");

    let (status, body) = server
        .send(Method::POST, &path, Some(&json!({"status": "shipped"})), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "shipped");

    let (status, body) = server
        .send(Method::POST, &path, Some(&json!({"status": "pending"})), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (status, _) = server
        .send(Method::POST, &path, Some(&json!({"status": "delivered"})), Some(&rider))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .post(&path, &json!({"status": "delivered"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, reloaded) = server.get(&format!("/order/{}", order["id"])).await;
    assert_eq!(reloaded["status"], "shipped");
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_tracking_lookup_and_client_info(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let beanie = server.create_product("Logo Beanie", "18.00", 10).await;
    add(&server, "tracking", beanie, 1).await;
    let order = checkout(&server, "tracking").await;

    let code = order["tracking_code"].as_str().unwrap();
    let (status, found) = server
        .get(&format!("/order/tracking/{}", code.to_lowercase()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], order["id"]);

    let (status, _) = server.get("/order/tracking/SP-0000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get("/order/tracking/not-a-code").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = server
        .post(
            &format!("/order/{}/update_client_info", order["id"]),
            &json!({"phone": "+33 5 56 00 00 00", "payment_method": "PP"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["phone"], "+33 5 56 00 00 00");
    assert_eq!(updated["payment_method"], "PP");
    // Absent fields are kept
    assert_eq!(updated["name"], "Tony Hawk");

    let (status, body) = server
        .post(
            &format!("/order/{}/update_client_info", order["id"]),
            &json!({"payment_method": "BTC"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_claiming_carts_and_orders(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let grip = server.create_product("Grip Tape", "9.00", 10).await;
    let owner = server.user_token("owner").await;
    let other = server.user_token("other").await;

    add(&server, "claim-me", grip, 1).await;
    let claim = json!({"cart_code": "claim-me"});

    let (status, body) = server
        .send(Method::POST, "/associate_cart_to_user", Some(&claim), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    // Claiming again is a no-op
    let (status, _) = server
        .send(Method::POST, "/associate_cart_to_user", Some(&claim), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = server
        .send(Method::POST, "/associate_cart_to_user", Some(&claim), Some(&other))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    let (status, _) = server
        .send(
            Method::POST,
            "/associate_cart_to_user",
            Some(&json!({"cart_code": "no-such-cart"})),
            Some(&owner),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The claimed cart is the owner's cart without a code
    let (status, cart) = server.send(Method::GET, "/get_cart", None, Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["cart_code"], "claim-me");

    let (status, order) = server
        .send(Method::POST, "/create_order", Some(&json!({})), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["user_id"], cart_owner(&server, "claim-me").await);

    let (_, mine) = server.send(Method::GET, "/user/orders", None, Some(&owner)).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = server.send(Method::GET, "/user/orders", None, Some(&other)).await;
    assert!(theirs.as_array().unwrap().is_empty());

    // Guest order, then claimed by a user
    add(&server, "guest-order", grip, 1).await;
    let guest = checkout(&server, "guest-order").await;
    assert!(guest["user_id"].is_null());
    let claim = json!({"order_id": guest["id"]});

    let (status, body) = server
        .send(Method::POST, "/associate_user_to_order", Some(&claim), Some(&other))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["user_id"].is_number());
    let (status, _) = server
        .send(Method::POST, "/associate_user_to_order", Some(&claim), Some(&owner))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = server
        .send(
            Method::POST,
            "/associate_user_to_order",
            Some(&json!({"order_id": 999_999})),
            Some(&owner),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_claimed_cart_checks_out_only_for_its_owner(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let bearings = server.create_product("Bearings", "19.90", 4).await;
    let alice = server.user_token("alice").await;
    let bob = server.user_token("bob").await;

    add(&server, "shared", bearings, 1).await;
    let (status, body) = server
        .send(
            Method::POST,
            "/associate_cart_to_user",
            Some(&json!({"cart_code": "shared"})),
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = server
        .send(
            Method::POST,
            "/create_order",
            Some(&json!({"cart_code": "shared"})),
            Some(&bob),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["code"], "conflict");

    let orders: i64 = sqlx::query_scalar("SELECT count(*) FROM shop.order")
        .fetch_one(&server.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(server.available(bearings).await, 3);

    let (status, order) = server
        .send(
            Method::POST,
            "/create_order",
            Some(&json!({"cart_code": "shared"})),
            Some(&alice),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["user_id"], cart_owner(&server, "shared").await);
    assert!(order["user_id"].is_number());

    let (_, theirs) = server.send(Method::GET, "/user/orders", None, Some(&bob)).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

async fn cart_owner(server: &TestServer, cart_code: &str) -> Value {
    let owner: Option<i64> =
        sqlx::query_scalar("SELECT user_id FROM shop.cart WHERE cart_code = $1")
            .bind(cart_code)
            .fetch_one(&server.pool)
            .await
            .unwrap();
    json!(owner)
}
