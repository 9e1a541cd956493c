//! Analytics sink for cart events.
//!
//! Delivery is best-effort. A failing or panicking sink is reported and
//! otherwise ignored by the cart store.

use pideai_core::CartEvent;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::add_breadcrumb;

/// Errors a sink may return.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Analytics delivery failed: {0}")]
    Delivery(String),
}

/// Receives one event per committed cart mutation.
///
/// Called synchronously after the mutation commits; implementations should
/// hand off to a queue rather than do network I/O inline.
pub trait AnalyticsSink: Send + Sync {
    /// Record an event.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError` if the event could not be accepted.
    fn track(&self, event: &CartEvent) -> Result<(), AnalyticsError>;
}

/// Records cart events as Sentry breadcrumbs.
///
/// Any later error report then shows the cart operations leading up to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BreadcrumbAnalytics;

impl AnalyticsSink for BreadcrumbAnalytics {
    fn track(&self, event: &CartEvent) -> Result<(), AnalyticsError> {
        let fields = match serde_json::to_value(event) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(AnalyticsError::Delivery(e.to_string())),
        };
        let data = fields
            .into_iter()
            .filter(|(key, value)| key != "kind" && !value.is_null());

        add_breadcrumb("cart", event.kind.as_str(), data);
        tracing::debug!(event = event.kind.as_str(), cart_value = %event.cart_value, "Cart event");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pideai_core::{CartEventKind, Price, ProductId};

    use super::*;

    #[test]
    fn test_breadcrumb_sink_accepts_events() {
        let event = CartEvent {
            kind: CartEventKind::ItemAdded,
            product_id: Some(ProductId::new("pizza").unwrap()),
            product_name: Some("Margherita".to_string()),
            product_price: Some(Price::from_cents(1000).unwrap()),
            modifier_count: 2,
            modifier_price: Price::from_cents(450).unwrap(),
            quantity: 1,
            cart_value: Price::from_cents(1450).unwrap(),
            item_count: 1,
        };
        assert!(BreadcrumbAnalytics.track(&event).is_ok());
    }
}
