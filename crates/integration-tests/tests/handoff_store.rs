//! Handoff store round trips through the HTTP surface.
//!
//! All tests need `PostgreSQL`:
//! `DATABASE_URL=postgres://... cargo test -p section-forge-integration-tests -- --ignored`

use axum::http::StatusCode;
use chrono::Duration;
use section_forge_core::{DataKey, SessionId, ShopDomain};
use section_forge_integration_tests::{
    PUBLIC_URL, SHOP, full_config, get, json_body, post_json, router_with_db, send,
    test_database,
};
use section_forge_server::db::{HandoffRepository, NewHandoff};
use section_forge_server::services::HandoffService;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_store_then_retrieve_once() {
    let Some((db, _)) = test_database().await else {
        return;
    };
    let app = router_with_db(full_config(), db, None);

    let body = json!({
        "shop": SHOP,
        "liquid_code": "<section>hi</section>",
        // Stringified schemas are accepted and stored parsed.
        "schema": "{\"name\":\"Landing: Lamp\",\"settings\":[]}"
    });
    let response = send(app.clone(), post_json("/api/store_data", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = json_body(response).await;
    assert_eq!(stored["success"], true);
    assert_eq!(stored["shop"], SHOP);
    let data_key = stored["data_key"].as_str().expect("data_key").to_string();
    assert_eq!(data_key.len(), 64);
    assert_eq!(stored["session_id"].as_str().expect("session_id").len(), 32);
    assert_eq!(
        stored["redirect_url"],
        format!("{PUBLIC_URL}/api/install?shop={SHOP}&data_key={data_key}")
    );

    let uri = format!("/api/get_data?data_key={data_key}&shop={SHOP}");
    let response = send(app.clone(), get(&uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = json_body(response).await;
    assert_eq!(fetched["liquid_code"], "<section>hi</section>");
    assert_eq!(fetched["schema"]["name"], "Landing: Lamp");
    assert!(fetched["created_at"].is_string());

    // Consumed.
    let response = send(app, get(&uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["hint"].is_string());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_retrieve_requires_matching_shop() {
    let Some((db, _)) = test_database().await else {
        return;
    };
    let shop = ShopDomain::parse(SHOP).expect("shop");
    let stored = HandoffService::new(&db)
        .store(&shop, "<div>".to_string(), json!({}))
        .await
        .expect("store");

    let app = router_with_db(full_config(), db, None);
    let uri = format!(
        "/api/get_data?data_key={}&shop=other-store.myshopify.com",
        stored.data_key
    );
    let response = send(app.clone(), get(&uri)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The wrong shop did not consume it.
    let uri = format!("/api/get_data?data_key={}&shop={SHOP}", stored.data_key);
    assert_eq!(send(app, get(&uri)).await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_expired_record_is_not_found_and_purged() {
    let Some((db, _)) = test_database().await else {
        return;
    };
    let data_key = DataKey::generate();
    {
        let pool = db.acquire().await.expect("pool");
        HandoffRepository::new(pool)
            .insert(NewHandoff {
                data_key: data_key.clone(),
                session_id: SessionId::generate(),
                shop: ShopDomain::parse(SHOP).expect("shop"),
                liquid_code: "<div>".to_string(),
                schema: json!({}),
                ttl: Duration::seconds(-1),
            })
            .await
            .expect("insert");
    }

    let app = router_with_db(full_config(), db.clone(), None);
    let uri = format!("/api/get_data?data_key={data_key}&shop={SHOP}");
    assert_eq!(send(app, get(&uri)).await.status(), StatusCode::NOT_FOUND);

    let purged = HandoffService::new(&db).purge_expired().await.expect("purge");
    assert!(purged >= 1);

    let pool = db.acquire().await.expect("pool");
    assert!(
        HandoffRepository::new(pool)
            .get(&data_key)
            .await
            .expect("query")
            .is_none()
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_retrievals_release_once() {
    let Some((db, _)) = test_database().await else {
        return;
    };
    let shop = ShopDomain::parse(SHOP).expect("shop");
    let stored = HandoffService::new(&db)
        .store(&shop, "<div>".to_string(), json!({}))
        .await
        .expect("store");

    let app = router_with_db(full_config(), db, None);
    let uri = format!("/api/get_data?data_key={}&shop={SHOP}", stored.data_key);

    let (a, b) = tokio::join!(send(app.clone(), get(&uri)), send(app, get(&uri)));
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (DATABASE_URL)"]
async fn test_status_moves_forward_only() {
    let Some((db, _)) = test_database().await else {
        return;
    };
    let shop = ShopDomain::parse(SHOP).expect("shop");
    let service = HandoffService::new(&db);
    let stored = service
        .store(&shop, "<div>".to_string(), json!({}))
        .await
        .expect("store");

    assert!(service.mark_oauth_complete(&stored.data_key, &shop).await.expect("mark"));
    // oauth_complete cannot be entered twice.
    assert!(!service.mark_oauth_complete(&stored.data_key, &shop).await.expect("mark"));

    service
        .retrieve(&stored.data_key, &shop)
        .await
        .expect("oauth_complete records are retrievable");

    // Nothing leaves retrieved.
    assert!(!service.mark_oauth_complete(&stored.data_key, &shop).await.expect("mark"));
    assert!(service.retrieve(&stored.data_key, &shop).await.is_err());
}
