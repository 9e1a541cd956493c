//! Integration tests for the PideAI cart service.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process API tests
//! cargo test -p pideai-integration-tests
//!
//! # Including the PostgreSQL backend
//! PIDEAI_DATABASE_URL=postgres://localhost/pideai_test \
//!     cargo test -p pideai-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `cart_api` - Cart endpoints end to end
//! - `customization_api` - Customization dialog endpoints
//! - `postgres_storage` - `PostgreSQL` backend (ignored by default)
//!
//! The API tests drive the real router in-process with
//! [`tower::ServiceExt::oneshot`], backed by [`MemoryStorage`] and a fixture
//! catalog.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use pideai_core::{DefaultSelectionPolicy, StoreId};
use pideai_storefront::{
    cart::{CartDeps, CartRegistry},
    catalog::{Catalog, JsonCatalog},
    routes,
    state::AppState,
    storage::{CartStorage, MemoryStorage},
    testing::{RecordingAnalytics, RecordingReporter},
};
use serde_json::Value;
use tower::ServiceExt;

/// Catalog used by every API test.
///
/// `pizza` has a required single-choice size, optional toppings capped at
/// two, and an ungrouped extra. `soda` has no options.
pub const CATALOG: &str = r#"{
    "products": [
        {
            "id": "pizza",
            "name": "Margherita",
            "base_price": "10.00",
            "image_ref": "img/pizza.jpg",
            "groups": [
                {
                    "id": "size",
                    "name": "Size",
                    "selection_type": "single",
                    "required": true,
                    "min_selections": 1,
                    "display_order": 1,
                    "modifiers": [
                        { "id": "small", "name": "Small", "price": "0", "display_order": 1 },
                        { "id": "large", "name": "Large", "price": "2.50", "display_order": 2, "is_default": true }
                    ]
                },
                {
                    "id": "toppings",
                    "name": "Toppings",
                    "selection_type": "multiple",
                    "max_selections": 2,
                    "display_order": 2,
                    "modifiers": [
                        { "id": "ham", "name": "Ham", "price": "2.00", "display_order": 1 },
                        { "id": "olives", "name": "Olives", "price": "1.00", "display_order": 2 },
                        { "id": "basil", "name": "Basil", "price": "0.50", "display_order": 3 },
                        { "id": "anchovy", "name": "Anchovy", "price": "1.50", "available": false }
                    ]
                }
            ],
            "ungrouped": [
                { "id": "extra-cheese", "name": "Extra cheese", "price": "1.50" }
            ]
        },
        { "id": "soda", "name": "Soda", "base_price": "2.00" }
    ]
}"#;

/// Store id every test app serves.
pub const STORE_ID: &str = "test-store";

/// A running app and handles to its collaborators.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub storage: Arc<MemoryStorage>,
    pub analytics: Arc<RecordingAnalytics>,
    pub reporter: Arc<RecordingReporter>,
}

impl TestApp {
    /// App with the default first-available selection policy.
    pub fn new() -> Self {
        Self::with_policy(DefaultSelectionPolicy::FirstAvailable)
    }

    /// App with a specific selection policy.
    pub fn with_policy(policy: DefaultSelectionPolicy) -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new()), policy)
    }

    /// App over existing storage, as after a restart.
    pub fn with_storage(storage: Arc<MemoryStorage>, policy: DefaultSelectionPolicy) -> Self {
        let catalog: Arc<dyn Catalog> = Arc::new(JsonCatalog::from_json(CATALOG).unwrap());
        let analytics = Arc::new(RecordingAnalytics::default());
        let reporter = Arc::new(RecordingReporter::default());
        let deps = CartDeps {
            storage: Arc::clone(&storage) as Arc<dyn CartStorage>,
            catalog: Arc::clone(&catalog),
            analytics: Arc::clone(&analytics) as _,
            reporter: Arc::clone(&reporter) as _,
        };
        let carts = CartRegistry::new(
            StoreId::new(STORE_ID).unwrap(),
            deps,
            Duration::from_secs(60),
        );
        let state = AppState::new(carts, catalog, policy);

        Self {
            router: routes::app(state.clone()),
            state,
            storage,
            analytics,
            reporter,
        }
    }

    /// Send a request and decode the JSON response.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Create a cart and return its token.
    pub async fn create_cart(&self) -> String {
        let (status, body) = self.request(Method::POST, "/api/carts", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    /// Wait until every queued cart write has reached storage.
    pub async fn flush(&self) {
        self.state.carts().flush_all().await;
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
