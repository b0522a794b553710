//! Catalog, customer and admin management.

use reqwest::StatusCode;
use serde_json::{Value, json};

use bazaar_integration_tests::{ROOT_EMAIL, TestApp, parts};

#[tokio::test]
async fn test_item_crud_and_search() {
    let app = TestApp::spawn().await;
    let dune = app.item("Dune", 12.5, 10).await;
    app.item("Emma", 8.0, 3).await;
    let admin = app.root_admin().await;

    let (status, body) = parts(admin.get("/admin/items").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["title"], "Dune");

    let (_, body) = parts(admin.get("/admin/items/search?name=dUN").await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], dune);

    let (_, body) = parts(admin.get("/admin/items/search?genre=ook&name=").await).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = parts(
        admin
            .put(
                &format!("/admin/items/{dune}"),
                json!({ "price": 15, "availableCount": 20 }),
            )
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 15.0);
    assert_eq!(body["availableCount"], 20);
    assert_eq!(body["title"], "Dune");

    let (status, body) = parts(admin.delete(&format!("/admin/items/{dune}")).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item deleted successfully");

    for path in [format!("/admin/items/{dune}"), "/admin/items/not-an-id".to_owned()] {
        let (status, body) = parts(admin.get(&path).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Item not found");
    }
}

#[tokio::test]
async fn test_create_item_validation() {
    let app = TestApp::spawn().await;
    let admin = app.root_admin().await;

    let (status, body) = parts(
        admin
            .post(
                "/admin/items",
                json!({
                    "title": "  ",
                    "image": "x.jpg",
                    "price": 1,
                    "description": "d",
                    "availableCount": 1,
                    "category": "c",
                }),
            )
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "item validation failed: title is required");

    let (status, _) = parts(
        admin
            .post("/admin/items", json!({ "title": "Dune", "price": -1 }))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = parts(
        admin
            .post(
                "/admin/items",
                json!({
                    "title": "Yacht",
                    "image": "yacht.jpg",
                    "price": "50000000000000000000000000000",
                    "description": "d",
                    "availableCount": 10,
                    "category": "Boats",
                }),
            )
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("item validation failed: price cannot exceed 9999999999.99"),
        "{body}"
    );
}

#[tokio::test]
async fn test_customer_search_filters() {
    let app = TestApp::spawn().await;
    app.item("Dune", 12.5, 10).await;
    app.item("Emma", 8.0, 3).await;
    let (shopper, _) = app.customer("browser@example.com").await;

    let titles = |body: &Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|item| item["title"].as_str().unwrap().to_owned())
            .collect()
    };

    let (_, body) = parts(shopper.get("/customer/items?minPrice=10").await).await;
    assert_eq!(titles(&body), ["Dune"]);

    let (_, body) = parts(shopper.get("/customer/items?maxPrice=10&title=").await).await;
    assert_eq!(titles(&body), ["Emma"]);

    let (_, body) = parts(shopper.get("/customer/items?genreOrCategory=Books").await).await;
    assert_eq!(titles(&body), ["Dune", "Emma"]);

    let (_, body) = parts(shopper.get("/customer/items?genreOrCategory=ook").await).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_customer_management() {
    let app = TestApp::spawn().await;
    let item = app.item("Dune", 12.5, 10).await;
    let (shopper, shopper_id) = app.customer("leaving@example.com").await;
    app.customer("staying@example.com").await;
    let admin = app.root_admin().await;

    shopper
        .post("/customer/cart", json!({ "itemId": item, "quantity": 4 }))
        .await;
    assert_eq!(admin.stock(item).await, 6);

    let (_, body) = parts(admin.get("/admin/customers").await).await;
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, ["leaving@example.com", "staying@example.com"]);

    let (status, body) = parts(admin.get(&format!("/admin/customers/{shopper_id}")).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "leaving@example.com");

    let (status, body) = parts(admin.get("/admin/customers/xyz").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Customer not found");

    let (status, body) = parts(admin.delete(&format!("/admin/customers/{shopper_id}")).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Customer profile deleted successfully");

    // The deleted cart's reservation went back to the item.
    assert_eq!(admin.stock(item).await, 10);

    let (status, body) = parts(admin.delete(&format!("/admin/customers/{shopper_id}")).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Customer not found or customer is admin");
}

#[tokio::test]
async fn test_admin_promotion() {
    let app = TestApp::spawn().await;
    let (helper, _) = app.customer("helper@example.com").await;
    let admin = app.root_admin().await;

    let (status, body) = parts(
        admin
            .put(
                "/admin/new-admin",
                json!({ "email": "helper@example.com", "isAdmin": true }),
            )
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isAdmin"], true);

    // The role is read on every request, so the existing session is promoted.
    let (status, _) = parts(helper.get("/admin/items").await).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = parts(admin.get("/admin/customers").await).await;
    assert_eq!(body, json!([]));

    let (status, body) = parts(
        helper
            .put("/admin/new-admin", json!({ "email": ROOT_EMAIL, "isAdmin": false }))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot change the status of the main Admin");

    let (status, body) = parts(
        admin
            .put(
                "/admin/new-admin",
                json!({ "email": "ghost@example.com", "isAdmin": true }),
            )
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    admin
        .put(
            "/admin/new-admin",
            json!({ "email": "helper@example.com", "isAdmin": false }),
        )
        .await;
    let (status, _) = parts(helper.get("/admin/items").await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_root_admin_is_protected() {
    let app = TestApp::spawn().await;
    let admin = app.root_admin().await;

    let (status, body) = parts(admin.put("/admin/profile", json!({ "name": "Renamed" })).await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot change the main Admin");

    let (status, body) = parts(admin.delete("/admin/profile").await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot delete the main Admin");

    let (status, body) = parts(admin.put("/customer/profile", json!({ "name": "Renamed" })).await).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot change the main Admin");
}

#[tokio::test]
async fn test_profile_update_and_delete() {
    let app = TestApp::spawn().await;
    let item = app.item("Dune", 12.5, 10).await;
    let (shopper, _) = app.customer("me@example.com").await;
    app.customer("other@example.com").await;

    let (status, body) = parts(
        shopper
            .put(
                "/customer/profile",
                json!({ "name": "New Name", "email": "Me2@Example.com" }),
            )
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "New Name");
    assert_eq!(body["user"]["email"], "me2@example.com");

    let (status, body) = parts(
        shopper
            .put("/customer/profile", json!({ "email": "other@example.com" }))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "other@example.com: email already exist");

    let (status, _) = parts(
        shopper
            .put("/customer/profile", json!({ "password": "short" }))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    shopper
        .post("/customer/cart", json!({ "itemId": item, "quantity": 2 }))
        .await;
    let (status, body) = parts(shopper.delete("/customer/profile").await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile deleted successfully");

    let (status, _) = parts(shopper.get("/customer/profile").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let admin = app.root_admin().await;
    assert_eq!(admin.stock(item).await, 10);
}
