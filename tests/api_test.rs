use actix_web::{test, web, App};
use serde_json::Value;

use statuswatch::api::{configure_routes, ApiState};
use statuswatch::config::Provider;
use statuswatch::status::Status;
use statuswatch::store::StatusStore;

async fn seeded_state(dir: &tempfile::TempDir) -> ApiState {
    let path = dir.path().join("incidents.db");
    let store = StatusStore::open(path.to_str().expect("utf-8 temp path"))
        .await
        .expect("failed to open temp store");

    let registry = vec![
        Provider {
            name: "Acme Cloud".to_string(),
            mail_address: "status@acme.example".to_string(),
        },
        Provider {
            name: "Widget CDN".to_string(),
            mail_address: "incidents@widgetcdn.example".to_string(),
        },
    ];
    store.initialize(&registry).await.expect("initialize");
    store
        .upsert("Acme Cloud", Status::Down, "Partial Outage")
        .await
        .expect("upsert");

    ApiState {
        store,
        refresh_interval: 120,
    }
}

#[actix_web::test]
async fn status_endpoint_projects_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = seeded_state(&dir).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/status").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        body,
        serde_json::json!({
            "incidents": [
                ["Acme Cloud", "Down", "Partial Outage"],
                ["Widget CDN", "Unknown", ""],
            ]
        })
    );
}

#[actix_web::test]
async fn config_endpoint_reflects_the_refresh_interval() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = seeded_state(&dir).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/config").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, serde_json::json!({ "refresh_interval": 120 }));
}

#[actix_web::test]
async fn dashboard_serves_html() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = seeded_state(&dir).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/").to_request();
    let res = test::call_service(&app, req).await;

    assert!(res.status().is_success());
    let content_type = res
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/html"));
}
