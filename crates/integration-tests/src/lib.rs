//! Shared helpers for Pomelo Market integration tests.
//!
//! Tests drive the real storefront router in process via
//! `tower::ServiceExt::oneshot`, with the in-memory snapshot store and a
//! seeded static catalog, so they run anywhere without external services.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use pomelo_core::{Price, ProductId};
use pomelo_storefront::cart::MemoryCartStore;
use pomelo_storefront::catalog::{CatalogProduct, StaticCatalog};
use pomelo_storefront::config::{ShippingConfig, StorefrontConfig};
use pomelo_storefront::routes;
use pomelo_storefront::state::AppState;
use tower::ServiceExt;

/// Free shipping at or above $75.00, flat $5.99 below.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        database_url: None,
        catalog_path: None,
        shipping: ShippingConfig {
            free_threshold: Price::from_cents(7500),
            flat_fee: Price::from_cents(599),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Catalog fixture used across the integration tests.
#[must_use]
pub fn test_catalog() -> StaticCatalog {
    StaticCatalog::new([
        CatalogProduct {
            id: ProductId::new("iphone-13"),
            name: "iPhone 13".to_owned(),
            category: "smartphones".to_owned(),
            unit_price: Price::from_cents(39_900),
            list_price: Some(Price::from_cents(59_900)),
            available_stock: 5,
        },
        CatalogProduct {
            id: ProductId::new("ipad-air-5"),
            name: "iPad Air 5".to_owned(),
            category: "tablets".to_owned(),
            unit_price: Price::from_cents(44_900),
            list_price: None,
            available_stock: 3,
        },
        CatalogProduct {
            id: ProductId::new("usb-c-cable"),
            name: "USB-C Cable".to_owned(),
            category: "accessories".to_owned(),
            unit_price: Price::from_cents(1999),
            list_price: None,
            available_stock: 50,
        },
        CatalogProduct {
            id: ProductId::new("galaxy-s22"),
            name: "Galaxy S22".to_owned(),
            category: "smartphones".to_owned(),
            unit_price: Price::from_cents(34_900),
            list_price: None,
            available_stock: 0,
        },
    ])
}

/// Build the storefront router over fresh in-memory state.
#[must_use]
pub fn test_app() -> Router {
    let state = AppState::new(
        test_config(),
        Arc::new(MemoryCartStore::new()),
        Arc::new(test_catalog()),
    );
    routes::routes().with_state(state)
}

/// Build a request with no body.
#[must_use]
pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

/// Build a request with a JSON body.
#[must_use]
pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Send one request through the router.
pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("infallible service")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Mint a cart and return its ID.
pub async fn create_cart(app: &Router) -> String {
    let response = send(app, request("POST", "/api/carts")).await;
    let body = body_json(response).await;
    body["id"].as_str().expect("cart id").to_owned()
}
