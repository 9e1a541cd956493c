//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                     - Health check
//!
//! # Carts
//! POST   /api/carts                                  - Create a cart, returns its token
//! GET    /api/carts/{token}                          - Items and totals
//! POST   /api/carts/{token}/items                    - Confirm a configured product
//! PATCH  /api/carts/{token}/items/{cart_item_id}     - Set a line's quantity
//! DELETE /api/carts/{token}/items/{cart_item_id}     - Remove a line
//! DELETE /api/carts/{token}                          - Clear the cart
//!
//! # Product customization
//! GET    /api/products/{id}/customization            - Options and initial selection
//! POST   /api/products/{id}/customization/toggle     - Toggle one option
//! POST   /api/products/{id}/customization/validate   - Check a selection and price it
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, patch, post},
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::create))
        .route("/{token}", get(cart::show).delete(cart::clear))
        .route("/{token}/items", post(cart::add))
        .route(
            "/{token}/items/{cart_item_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create the product customization routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}/customization", get(products::customization))
        .route("/{id}/customization/toggle", post(products::toggle))
        .route("/{id}/customization/validate", post(products::validate))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/carts", cart_routes())
        .nest("/api/products", product_routes())
}

/// The complete application with tracing and request IDs.
///
/// Sentry layers are added by the binary, outside of this.
pub fn app(state: AppState) -> Router {
    routes()
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
