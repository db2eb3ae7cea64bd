//! Integration tests for the customer storefront.
//!
//! Covers catalog loading (database first, bundled file second), search,
//! and the order hand-off to WhatsApp.

use std::io::Write;
use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tempfile::NamedTempFile;
use vapeshop_integration_tests::{TestApp, Upstreams, location, sample_catalog};

fn fallback_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    let catalog = json!({
        "sections": {
            "mods": {
                "name": "Fallback Mods",
                "order": 0,
                "brands": [
                    {
                        "name": "Lost Vape",
                        "logo": "",
                        "website": "",
                        "description": "",
                        "lines": []
                    }
                ]
            }
        }
    });
    write!(file, "{catalog}").expect("write fallback");
    file
}

async fn storefront(upstreams: &Upstreams, fallback: PathBuf) -> TestApp {
    TestApp::storefront(upstreams.storefront_config(fallback)).await
}

async fn register(app: &TestApp, email: &str) {
    let response = app
        .post_form(
            "/auth/register",
            &[
                ("name", "Bruno Lima"),
                ("email", email),
                ("phone", "+55 11 98888-7777"),
                ("password", "s3cret-enough"),
                ("password_confirm", "s3cret-enough"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/account", "registration failed");
}

// ============================================================================
// Catalog Source Tests
// ============================================================================

#[tokio::test]
async fn test_live_catalog_is_preferred() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    let html = app.get("/").await.text().await.expect("page body");
    assert!(html.contains("Liquids"));
    assert!(!html.contains("Fallback Mods"));
}

#[tokio::test]
async fn test_empty_database_serves_bundled_catalog() {
    let upstreams = Upstreams::start().await;
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.expect("page body");
    assert!(html.contains("Fallback Mods"));

    let html = app
        .get("/sections/mods")
        .await
        .text()
        .await
        .expect("page body");
    assert!(html.contains("Lost Vape"));
}

#[tokio::test]
async fn test_unreachable_database_serves_bundled_catalog() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    upstreams.db.set_offline(true);
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let html = app.get("/").await.text().await.expect("page body");
    assert!(html.contains("Fallback Mods"));
}

#[tokio::test]
async fn test_no_catalog_anywhere_is_not_ready() {
    let upstreams = Upstreams::start().await;
    upstreams.db.set_offline(true);
    let app = storefront(&upstreams, PathBuf::from("/nonexistent/catalog.json")).await;

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_section_is_not_found() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    let response = app.get("/sections/pods").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Search Tests
// ============================================================================

#[tokio::test]
async fn test_search_ignores_case() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    for query in ["green", "GREEN", "gReEn"] {
        let html = app
            .get(&format!("/search?q={query}"))
            .await
            .text()
            .await
            .expect("page body");
        assert!(html.contains("Green Ape"), "no hit for {query}");
    }
}

// ============================================================================
// Visit Counter Tests
// ============================================================================

#[tokio::test]
async fn test_visit_is_counted_once_per_session() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    app.get("/").await;
    app.get("/sections/liquids").await;
    app.get("/search?q=ape").await;

    assert_eq!(upstreams.db.get("stats/totalVisits"), json!(1));
    let daily = upstreams.db.get("dailyStats");
    let counts: Vec<&Value> = daily.as_object().expect("daily stats").values().collect();
    assert_eq!(counts, [&json!(1)]);
}

// ============================================================================
// Order Hand-off Tests
// ============================================================================

#[tokio::test]
async fn test_order_is_stored_then_handed_to_whatsapp() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;
    register(&app, "bruno@vapeshop.test").await;

    let response = app
        .post_form(
            "/orders",
            &[
                ("section", "liquids"),
                ("brand", "Nasty Juice"),
                ("line", "Double Fruity"),
                ("product", "Green Ape"),
                ("quantity", "2"),
                ("notes", "Pick up Friday"),
            ],
        )
        .await;
    let target = location(&response);
    assert!(target.starts_with("https://wa.me/447700900123?text="), "{target}");
    assert!(target.contains("Green%20Ape"));

    let users = upstreams.db.get("users");
    let (_, profile) = users
        .as_object()
        .and_then(|u| u.iter().next())
        .expect("stored profile");
    assert_eq!(profile["name"], json!("Bruno Lima"));

    let orders = profile["orders"].as_object().expect("orders");
    assert_eq!(orders.len(), 1);
    let order = orders.values().next().expect("order");
    assert_eq!(order["status"], json!("pending"));
    assert_eq!(order["items"][0]["product"], json!("Green Ape"));
    assert_eq!(order["items"][0]["quantity"], json!(2));
    assert_eq!(order["notes"], json!("Pick up Friday"));
}

#[tokio::test]
async fn test_order_for_unknown_product_is_rejected() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;
    register(&app, "carla@vapeshop.test").await;

    let response = app
        .post_form(
            "/orders",
            &[
                ("section", "liquids"),
                ("brand", "Nasty Juice"),
                ("line", "Double Fruity"),
                ("product", "Blue Ape"),
                ("quantity", "1"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let users = upstreams.db.get("users");
    let stored_orders = users
        .as_object()
        .into_iter()
        .flat_map(|u| u.values())
        .filter(|profile| profile.get("orders").is_some())
        .count();
    assert_eq!(stored_orders, 0);
}

#[tokio::test]
async fn test_order_requires_sign_in() {
    let upstreams = Upstreams::start().await;
    upstreams.db.put("catalog", sample_catalog());
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;

    let response = app
        .post_form(
            "/orders",
            &[
                ("section", "liquids"),
                ("brand", "Nasty Juice"),
                ("line", "Double Fruity"),
                ("product", "Green Ape"),
                ("quantity", "1"),
            ],
        )
        .await;
    assert!(location(&response).starts_with("/auth/login"));
    assert_eq!(upstreams.db.get("users"), Value::Null);
}

#[tokio::test]
async fn test_maintenance_request_is_stored_then_handed_to_whatsapp() {
    let upstreams = Upstreams::start().await;
    let fallback = fallback_file();
    let app = storefront(&upstreams, fallback.path().to_path_buf()).await;
    register(&app, "dani@vapeshop.test").await;

    let response = app
        .post_form(
            "/services",
            &[
                ("kind", "maintenance"),
                ("description", "Fires but no vapour"),
                ("device", "Aegis Legend 3"),
            ],
        )
        .await;
    assert!(location(&response).starts_with("https://wa.me/447700900123?text="));

    let users = upstreams.db.get("users");
    let (_, profile) = users
        .as_object()
        .and_then(|u| u.iter().next())
        .expect("stored profile");
    let requests = profile["services"]["maintenance-requests"]
        .as_object()
        .expect("maintenance requests");
    let request = requests.values().next().expect("request");
    assert_eq!(request["device"], json!("Aegis Legend 3"));
    assert_eq!(request["status"], json!("pending"));
}
