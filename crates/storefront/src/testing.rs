//! Test doubles for the cart's collaborators.
//!
//! Available to unit tests and, through the `testing` feature, to the
//! integration tests crate.

#![allow(clippy::missing_panics_doc)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use pideai_core::CartEvent;
use serde_json::Value;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::analytics::{AnalyticsError, AnalyticsSink};
use crate::cart::CartDeps;
use crate::catalog::{Catalog, JsonCatalog};
use crate::report::{ErrorReport, ErrorReporter};
use crate::storage::{CartStorage, MemoryStorage, StorageError, StorageKey};

/// Collects every event it is given.
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<CartEvent>>,
}

impl RecordingAnalytics {
    #[must_use]
    pub fn events(&self) -> Vec<CartEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track(&self, event: &CartEvent) -> Result<(), AnalyticsError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

/// Rejects every event.
#[derive(Debug, Default)]
pub struct FailingAnalytics;

impl AnalyticsSink for FailingAnalytics {
    fn track(&self, _: &CartEvent) -> Result<(), AnalyticsError> {
        Err(AnalyticsError::Delivery("sink offline".to_string()))
    }
}

/// Panics on every event.
#[derive(Debug, Default)]
pub struct PanickingAnalytics;

impl AnalyticsSink for PanickingAnalytics {
    fn track(&self, _: &CartEvent) -> Result<(), AnalyticsError> {
        panic!("analytics sink exploded");
    }
}

/// Collects every report it is given.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<ErrorReport>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn reports(&self) -> Vec<ErrorReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, report: ErrorReport) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report);
    }
}

/// In-memory storage that can be told to fail or to hold reads.
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
    removes: AtomicUsize,
    load_gate: RwLock<()>,
}

impl FlakyStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of `save` calls, failed ones included.
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Number of `remove` calls.
    #[must_use]
    pub fn remove_calls(&self) -> usize {
        self.removes.load(Ordering::SeqCst)
    }

    /// Hold every `load` until the returned guard is dropped.
    pub async fn block_loads(&self) -> RwLockWriteGuard<'_, ()> {
        self.load_gate.write().await
    }
}

#[async_trait]
impl CartStorage for FlakyStorage {
    async fn load(&self, key: &StorageKey) -> Result<Option<Value>, StorageError> {
        let _gate = self.load_gate.read().await;
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("load refused".to_string()));
        }
        self.inner.load(key).await
    }

    async fn save(&self, key: &StorageKey, value: Value) -> Result<(), StorageError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("save refused".to_string()));
        }
        self.inner.save(key, value).await
    }

    async fn remove(&self, key: &StorageKey) -> Result<(), StorageError> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }
}

/// Dependencies with an empty catalog.
#[must_use]
pub fn deps_with(
    storage: Arc<dyn CartStorage>,
    analytics: Arc<dyn AnalyticsSink>,
    reporter: Arc<dyn ErrorReporter>,
) -> CartDeps {
    let catalog: Arc<dyn Catalog> = Arc::new(JsonCatalog::default());
    CartDeps {
        storage,
        catalog,
        analytics,
        reporter,
    }
}
