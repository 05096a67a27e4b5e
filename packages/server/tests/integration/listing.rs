use std::time::{Duration, Instant};

use listing_service::entity::listing;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use crate::common::{BROKEN_ID, SLOW_ID, SLOW_LOOKUP, TestApp, listing_body, routes};

#[tokio::test]
async fn create_listing_starts_pending() {
    let app = TestApp::spawn().await;
    let token = app.user_token("u1");

    let res = app
        .post_with_token(routes::LISTINGS, &listing_body("Berlin", 100.0), &token)
        .await;

    assert_eq!(res.status, 201, "body: {}", res.text);
    assert_eq!(res.body["status"], "pending");
    assert_eq!(res.body["ownerId"], "u1");
    assert_eq!(res.body["deviceId"], "d1");
    assert_eq!(res.body["type"], "rent");
    assert_eq!(res.body["averageRating"], 0.0);
    assert!(res.body.get("photoUrl").is_none());
    assert!(!res.id().is_empty());
}

#[tokio::test]
async fn create_ignores_client_status_and_rating() {
    let app = TestApp::spawn().await;
    let token = app.user_token("u1");

    let mut body = listing_body("Berlin", 100.0);
    body["status"] = json!("approved");
    body["averageRating"] = json!(5.0);

    let res = app.post_with_token(routes::LISTINGS, &body, &token).await;
    assert_eq!(res.status, 201, "body: {}", res.text);
    assert_eq!(res.body["status"], "pending");
    assert_eq!(res.body["averageRating"], 0.0);
}

#[tokio::test]
async fn create_forwards_caller_token_to_remote_services() {
    let app = TestApp::spawn().await;
    let token = app.user_token("u1");

    let res = app
        .post_with_token(routes::LISTINGS, &listing_body("Berlin", 100.0), &token)
        .await;
    assert_eq!(res.status, 201);

    let seen = app.forwarded_auth_headers();
    assert_eq!(seen.len(), 2, "one owner and one device lookup expected");
    assert!(seen.iter().all(|h| *h == format!("Bearer {token}")));
}

#[tokio::test]
async fn create_with_unknown_owner_or_device_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.user_token("u1");

    let mut body = listing_body("Berlin", 100.0);
    body["ownerId"] = json!("ghost");
    let res = app.post_with_token(routes::LISTINGS, &body, &token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let mut body = listing_body("Berlin", 100.0);
    body["deviceId"] = json!("d404");
    let res = app.post_with_token(routes::LISTINGS, &body, &token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let mod_token = app.moderator_token();
    let pending = app.get_with_token(routes::PENDING, &mod_token).await;
    assert_eq!(pending.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_with_missing_or_invalid_fields_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.user_token("u1");

    let mut missing = listing_body("Berlin", 100.0);
    missing.as_object_mut().unwrap().remove("title");
    let res = app.post_with_token(routes::LISTINGS, &missing, &token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let mut blank = listing_body("Berlin", 100.0);
    blank["city"] = json!("   ");
    let res = app.post_with_token(routes::LISTINGS, &blank, &token).await;
    assert_eq!(res.status, 400);

    let negative = listing_body("Berlin", -1.0);
    let res = app.post_with_token(routes::LISTINGS, &negative, &token).await;
    assert_eq!(res.status, 400);

    // Local validation fails before any remote call.
    assert!(app.forwarded_auth_headers().is_empty());
}

#[tokio::test]
async fn create_requires_a_valid_token() {
    let app = TestApp::spawn().await;

    let res = app
        .post_without_token(routes::LISTINGS, &listing_body("Berlin", 100.0))
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_MISSING");

    let res = app
        .post_with_token(routes::LISTINGS, &listing_body("Berlin", 100.0), "garbage")
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_INVALID");
}

#[tokio::test]
async fn remote_failure_maps_to_service_unavailable() {
    let app = TestApp::spawn().await;
    let token = app.user_token("u1");

    let mut body = listing_body("Berlin", 100.0);
    body["ownerId"] = json!(BROKEN_ID);
    let res = app.post_with_token(routes::LISTINGS, &body, &token).await;

    assert_eq!(res.status, 503, "body: {}", res.text);
    assert_eq!(res.code(), "DEPENDENCY_UNAVAILABLE");
    assert!(res.header("retry-after").is_some());
    assert!(
        !res.text.contains("500"),
        "remote details must not leak: {}",
        res.text
    );
}

#[tokio::test]
async fn request_deadline_cancels_slow_remote_checks() {
    let app = TestApp::spawn_with(|config| {
        config.server.request_timeout_secs = 1;
        config.identity.timeout_ms = 30_000;
    })
    .await;
    let token = app.user_token("u1");

    let mut body = listing_body("Berlin", 100.0);
    body["ownerId"] = json!(SLOW_ID);

    let started = Instant::now();
    let res = app.post_with_token(routes::LISTINGS, &body, &token).await;
    let elapsed = started.elapsed();

    assert_eq!(res.status, 408, "body: {}", res.text);
    assert!(
        elapsed < SLOW_LOOKUP,
        "request outlived the deadline: {elapsed:?}"
    );
    assert!(!app.forwarded_auth_headers().is_empty());

    // Outlast the remote answer: a cancelled request must never write.
    tokio::time::sleep(SLOW_LOOKUP - elapsed + Duration::from_millis(500)).await;
    let count = listing::Entity::find().count(&app.db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn get_listing_is_public_and_reports_missing_ids() {
    let app = TestApp::spawn().await;
    let id = app.create_listing("Berlin", 100.0).await;

    let res = app.get_without_token(&routes::listing(&id)).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], id.as_str());
    assert_eq!(res.body["city"], "Berlin");

    let res = app.get_without_token(&routes::listing("missing")).await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn owner_can_update_but_others_cannot() {
    let app = TestApp::spawn().await;
    let id = app.create_listing("Berlin", 100.0).await;

    let mut body = listing_body("Hamburg", 80.0);
    body["title"] = json!("Impact drill");

    let res = app
        .put_with_token(&routes::listing(&id), &body, &app.user_token("u2"))
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.code(), "PERMISSION_DENIED");

    let res = app
        .put_with_token(&routes::listing(&id), &body, &app.user_token("u1"))
        .await;
    assert_eq!(res.status, 200, "body: {}", res.text);
    assert_eq!(res.body["title"], "Impact drill");
    assert_eq!(res.body["city"], "Hamburg");
    assert_eq!(res.body["price"], 80.0);
    assert_eq!(res.body["status"], "pending");
}

#[tokio::test]
async fn update_does_not_change_status() {
    let app = TestApp::spawn().await;
    let id = app.create_approved_listing("Berlin", 100.0).await;

    let mut body = listing_body("Berlin", 120.0);
    body["status"] = json!("rejected");
    let res = app
        .put_with_token(&routes::listing(&id), &body, &app.user_token("u1"))
        .await;
    assert_eq!(res.status, 200, "body: {}", res.text);
    assert_eq!(res.body["status"], "approved");
}

#[tokio::test]
async fn update_of_missing_listing_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app
        .put_with_token(
            &routes::listing("missing"),
            &listing_body("Berlin", 100.0),
            &app.moderator_token(),
        )
        .await;
    assert_eq!(res.status, 404);

    let mut blank = listing_body("Berlin", 100.0);
    blank["title"] = json!("");
    let res = app
        .put_with_token(&routes::listing("missing"), &blank, &app.moderator_token())
        .await;
    assert_eq!(res.status, 404);
    assert!(app.forwarded_auth_headers().is_empty());
}

#[tokio::test]
async fn moderator_can_delete_any_listing() {
    let app = TestApp::spawn().await;
    let id = app.create_listing("Berlin", 100.0).await;

    let res = app
        .delete_with_token(&routes::listing(&id), &app.user_token("u2"))
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .delete_with_token(&routes::listing(&id), &app.moderator_token())
        .await;
    assert_eq!(res.status, 204);

    let res = app.get_without_token(&routes::listing(&id)).await;
    assert_eq!(res.status, 404);

    let res = app
        .delete_with_token(&routes::listing(&id), &app.moderator_token())
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn feed_filters_approved_listings() {
    let app = TestApp::spawn().await;

    let cheap = app.create_approved_listing("Berlin", 40.0).await;
    let in_range = app.create_approved_listing("Berlin", 100.0).await;
    let newest_in_range = app.create_approved_listing("Berlin", 150.0).await;
    let other_city = app.create_approved_listing("Munich", 100.0).await;
    let _pending = app.create_listing("Berlin", 100.0).await;

    let res = app
        .get_without_token(&format!(
            "{}?city=Berlin&min_price=50&max_price=150&limit=10&offset=0",
            routes::LISTINGS
        ))
        .await;
    assert_eq!(res.status, 200, "body: {}", res.text);

    let ids: Vec<&str> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![newest_in_range.as_str(), in_range.as_str()]);
    assert!(!ids.contains(&cheap.as_str()));
    assert!(!ids.contains(&other_city.as_str()));
}

#[tokio::test]
async fn feed_paginates_and_tolerates_bad_parameters() {
    let app = TestApp::spawn().await;
    for _ in 0..3 {
        app.create_approved_listing("Berlin", 10.0).await;
    }

    let res = app
        .get_without_token(&format!("{}?limit=2&offset=0", routes::LISTINGS))
        .await;
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let res = app
        .get_without_token(&format!("{}?limit=2&offset=2", routes::LISTINGS))
        .await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app
        .get_without_token(&format!(
            "{}?limit=abc&offset=-4&minPrice=cheap",
            routes::LISTINGS
        ))
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body.as_array().unwrap().len(), 3);
}
