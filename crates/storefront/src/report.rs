//! Error capture for faults the cart recovers from.
//!
//! Storage and analytics failures never reach the customer. They are turned
//! into an [`ErrorReport`] and handed to an [`ErrorReporter`], which in
//! production forwards them to Sentry.

use std::collections::BTreeMap;

use serde_json::Value;

/// Tracing target used for report log lines.
///
/// The Sentry tracing layer ignores this target so a report is captured once.
pub const REPORT_LOG_TARGET: &str = "pideai::report";

/// Report tags, one per place a fault is swallowed.
pub mod tags {
    /// Reading the persisted cart failed or returned garbage.
    pub const CART_LOAD: &str = "cart.load";
    /// Writing the cart snapshot failed.
    pub const CART_SAVE: &str = "cart.save";
    /// Deleting the persisted cart failed.
    pub const CART_DELETE: &str = "cart.delete";
    /// The analytics sink failed or panicked.
    pub const CART_ANALYTICS: &str = "cart.analytics";
}

/// Severity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLevel {
    Warning,
    Error,
}

impl From<ReportLevel> for sentry::Level {
    fn from(level: ReportLevel) -> Self {
        match level {
            ReportLevel::Warning => Self::Warning,
            ReportLevel::Error => Self::Error,
        }
    }
}

/// A structured report of a recovered fault.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    /// Where the fault was caught, see [`tags`].
    pub tag: &'static str,
    pub message: String,
    pub level: ReportLevel,
    /// Contextual details such as the storage key.
    pub extra: BTreeMap<String, Value>,
}

impl ErrorReport {
    #[must_use]
    pub fn new(tag: &'static str, level: ReportLevel, message: impl Into<String>) -> Self {
        Self {
            tag,
            message: message.into(),
            level,
            extra: BTreeMap::new(),
        }
    }

    /// Shorthand for an error-level report.
    #[must_use]
    pub fn error(tag: &'static str, message: impl Into<String>) -> Self {
        Self::new(tag, ReportLevel::Error, message)
    }

    /// Attach a detail.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Receives reports of recovered faults.
///
/// Implementations must not block or panic; they are called from write tasks
/// and from inside cart mutations.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: ErrorReport);
}

/// Forwards reports to Sentry and the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentryReporter;

impl ErrorReporter for SentryReporter {
    fn report(&self, report: ErrorReport) {
        let event_id = sentry::with_scope(
            |scope| {
                scope.set_tag("context", report.tag);
                for (key, value) in &report.extra {
                    scope.set_extra(key, value.clone());
                }
            },
            || sentry::capture_message(&report.message, report.level.into()),
        );

        match report.level {
            ReportLevel::Error => tracing::error!(
                target: REPORT_LOG_TARGET,
                tag = report.tag,
                sentry_event_id = %event_id,
                "{}",
                report.message
            ),
            ReportLevel::Warning => tracing::warn!(
                target: REPORT_LOG_TARGET,
                tag = report.tag,
                sentry_event_id = %event_id,
                "{}",
                report.message
            ),
        }
    }
}
