//! Integration tests for the catalog, catalog administration, favorites and
//! the contact form.

#![allow(clippy::unwrap_used)]

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

use skateparadise_integration_tests::TestServer;

fn names(products: &Value) -> Vec<&str> {
    products
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect()
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_catalog_listing_and_lookup(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let staff = server.staff_token("shopkeeper").await;

    for (name, category) in [("Street Deck", "Boards"), ("Hollow Trucks", "Trucks")] {
        let (status, body) = server
            .send(
                Method::POST,
                "/admin/products",
                Some(&json!({
                    "name": name,
                    "price": "50.00",
                    "category": category,
                    "description": "Built for the streets",
                    "stock": 3,
                })),
                Some(&staff),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    let (status, all) = server.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, boards) = server.get("/products/Boards").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&boards), ["Street Deck"]);

    let (_, filtered) = server.get("/products?category=Trucks").await;
    assert_eq!(names(&filtered), ["Hollow Trucks"]);

    let (status, body) = server.get("/products/Surfboards").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (_, found) = server.get("/products/search?search=hollow").await;
    assert_eq!(names(&found), ["Hollow Trucks"]);
    let (_, by_description) = server.get("/products/search?search=STREETS").await;
    assert_eq!(by_description.as_array().unwrap().len(), 2);

    let (status, deck) = server.get("/product/slug/street-deck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deck["name"], "Street Deck");
    assert_eq!(deck["price"], "50.00");
    assert_eq!(deck["has_sizes"], false);
    assert_eq!(deck["stock"], 3);

    let (status, body) = server.get("/product/999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
    let (status, _) = server.get("/product/not-a-number").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_catalog_administration(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let staff = server.staff_token("shopkeeper").await;
    let rider = server.user_token("rider").await;
    let product = json!({"name": "Logo Hoodie", "price": "45.00", "category": "Sweats"});

    let (status, _) = server.post("/admin/products", &product).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = server
        .send(Method::POST, "/admin/products", Some(&product), Some(&rider))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let sized = json!({
        "name": "Logo Hoodie",
        "price": "45.00",
        "category": "Sweats",
        "sizes": [{"size": "M", "on_hand": 2}],
    });
    let (status, hoodie) = server
        .send(Method::POST, "/admin/products", Some(&sized), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{hoodie}");
    assert_eq!(hoodie["slug"], "logo-hoodie");
    let id = hoodie["id"].as_i64().unwrap();

    let (status, body) = server
        .send(Method::POST, "/admin/products", Some(&sized), Some(&staff))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, body) = server
        .send(
            Method::POST,
            &format!("/admin/products/{id}/sizes"),
            Some(&json!({"size": "L", "on_hand": 1})),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["sizes"].as_array().unwrap().len(), 2);
    assert_eq!(body["stock"], 3);

    let (status, body) = server
        .send(
            Method::POST,
            &format!("/admin/products/{id}/stock"),
            Some(&json!({"size": "M", "on_hand": 10})),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["stock"], 11);

    let (status, body) = server
        .send(
            Method::POST,
            &format!("/admin/products/{id}/stock"),
            Some(&json!({"size": "M", "on_hand": -1})),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    // Disabled sizes cannot be added to carts
    let (status, body) = server
        .send(
            Method::PATCH,
            &format!("/admin/products/{id}/sizes/L"),
            Some(&json!({"enabled": false})),
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let (status, _) = server
        .post(
            "/add_item",
            &json!({"cart_code": "hoodie", "product_id": id, "size": "L"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .send(
            Method::DELETE,
            &format!("/admin/products/{id}/sizes/L"),
            None,
            Some(&staff),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["sizes"].as_array().unwrap().len(), 1);

    let (status, _) = server
        .send(Method::DELETE, &format!("/admin/products/{id}"), None, Some(&staff))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.get(&format!("/product/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_favorites(pool: PgPool) {
    let server = TestServer::start(pool).await;
    let deck = server.create_product("Street Deck", "59.99", 5).await;
    let add = json!({"session_code": "wish-1", "product_id": deck});

    let (status, body) = server.post("/favorites", &add).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let (status, body) = server.post("/favorites", &add).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Already in favorites");

    let (_, favorites) = server.get("/favorites?session_code=wish-1").await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);
    assert_eq!(favorites[0]["product"]["id"], deck);
    let (_, other) = server.get("/favorites?session_code=wish-2").await;
    assert!(other.as_array().unwrap().is_empty());

    let (status, _) = server
        .post("/favorites", &json!({"session_code": "wish-1", "product_id": 999_999}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = server.get("/favorites").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let path = format!("/favorites/{deck}?session_code=wish-1");
    let (status, _) = server.send(Method::DELETE, &path, None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = server.send(Method::DELETE, &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_contact_form(pool: PgPool) {
    let server = TestServer::start(pool).await;

    let (status, body) = server
        .post(
            "/contact",
            &json!({
                "name": "Elissa",
                "email": "elissa@skateparadise.test",
                "subject": "Wholesale",
                "message": "Do you ship decks to Lisbon?",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Message sent");

    let stored: i64 = sqlx::query_scalar("SELECT count(*) FROM shop.contact_message")
        .fetch_one(&server.pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);

    let (status, body) = server
        .post(
            "/contact",
            &json!({
                "name": "Elissa",
                "email": "elissa@skateparadise.test",
                "subject": "  ",
                "message": "Hello",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
}

#[sqlx::test(migrator = "skateparadise_storefront::db::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn test_health(pool: PgPool) {
    let server = TestServer::start(pool).await;

    let (status, _) = server.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}
