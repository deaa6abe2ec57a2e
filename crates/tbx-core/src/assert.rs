//! Run-time assertion channel.
//!
//! Every precondition failure in the toolbox is reported here: a counter is
//! incremented and the installed [`AssertionHandler`] is notified with the
//! source location. Reporting is a side channel only; the failing operation
//! still returns its documented failure value.

use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Source location of a triggered assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file name.
    pub file: &'static str,
    /// Line number within `file`.
    pub line: u32,
}

impl SourceLocation {
    /// Create a location from its parts.
    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the caller.
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Receiver of contract-violation reports.
pub trait AssertionHandler: Send + Sync {
    /// Called once per violation.
    fn on_violation(&self, location: &SourceLocation);
}

/// Default handler: logs the violation and carries on.
#[derive(Debug, Default)]
pub struct LogHandler;

impl AssertionHandler for LogHandler {
    fn on_violation(&self, location: &SourceLocation) {
        tracing::error!(file = location.file, line = location.line, "assertion failed");
    }
}

/// Handler that counts violations and remembers the last location.
#[derive(Debug, Default)]
pub struct CountingHandler {
    count: AtomicU64,
    last: RwLock<Option<SourceLocation>>,
}

impl CountingHandler {
    /// Create a handler with a zeroed counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of violations seen by this handler.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Location of the most recent violation.
    #[must_use]
    pub fn last(&self) -> Option<SourceLocation> {
        *self.last.read()
    }

    /// Reset the counter and forget the last location.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        *self.last.write() = None;
    }
}

impl AssertionHandler for CountingHandler {
    fn on_violation(&self, location: &SourceLocation) {
        self.count.fetch_add(1, Ordering::Relaxed);
        *self.last.write() = Some(*location);
    }
}

/// The assertion channel: one swappable handler plus a violation counter.
pub struct Assertions {
    handler: RwLock<Arc<dyn AssertionHandler>>,
    violations: AtomicU64,
}

impl Assertions {
    /// Create a channel that logs violations through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_handler(Arc::new(LogHandler))
    }

    /// Create a channel with a specific handler installed.
    #[must_use]
    pub fn with_handler(handler: Arc<dyn AssertionHandler>) -> Self {
        Self {
            handler: RwLock::new(handler),
            violations: AtomicU64::new(0),
        }
    }

    /// Install a new handler.
    ///
    /// Passing `None` is itself a violation: it is reported through the
    /// handler that is currently installed, which stays in place.
    #[track_caller]
    pub fn set_handler(&self, handler: Option<Arc<dyn AssertionHandler>>) {
        match handler {
            Some(handler) => *self.handler.write() = handler,
            None => self.trigger(SourceLocation::caller()),
        }
    }

    /// Report a violation at `location`.
    pub fn trigger(&self, location: SourceLocation) {
        self.violations.fetch_add(1, Ordering::Relaxed);
        // Clone out of the lock so a handler may swap itself.
        let handler = Arc::clone(&*self.handler.read());
        handler.on_violation(&location);
    }

    /// Report a violation at the caller's location unless `condition` holds.
    ///
    /// Returns `condition` so call sites can branch on it.
    #[track_caller]
    pub fn check(&self, condition: bool) -> bool {
        if !condition {
            self.trigger(SourceLocation::caller());
        }
        condition
    }

    /// Total number of violations reported on this channel.
    #[must_use]
    pub fn violations(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }

    /// Reset the violation counter.
    pub fn reset(&self) {
        self.violations.store(0, Ordering::Relaxed);
    }
}

impl Default for Assertions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Assertions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assertions")
            .field("violations", &self.violations())
            .finish_non_exhaustive()
    }
}
