//! Critical sections.
//!
//! A critical section masks interrupts through an [`InterruptPort`] and
//! restores the previous interrupt state on exit. Sections do not nest: a
//! nested `enter` or an `exit` without a matching `enter` is reported on the
//! assertion channel and otherwise ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::assert::Assertions;

/// Target hook for globally disabling and restoring interrupts.
pub trait InterruptPort: Send + Sync {
    /// Disable interrupts. Returns whether they were enabled before the call.
    fn disable(&self) -> bool;

    /// Restore the interrupt state returned by [`disable`](Self::disable).
    fn restore(&self, was_enabled: bool);
}

/// Host-side port simulating the global interrupt-enable flag of a single core.
#[derive(Debug)]
pub struct HostInterruptPort {
    enabled: AtomicBool,
}

impl HostInterruptPort {
    /// Create a port with interrupts enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    /// Whether interrupts are currently enabled.
    #[must_use]
    pub fn interrupts_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}

impl Default for HostInterruptPort {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptPort for HostInterruptPort {
    fn disable(&self) -> bool {
        self.enabled.swap(false, Ordering::AcqRel)
    }

    fn restore(&self, was_enabled: bool) {
        self.enabled.store(was_enabled, Ordering::Release);
    }
}

/// Non-reentrant critical section on top of an [`InterruptPort`].
pub struct CriticalSection {
    port: Arc<dyn InterruptPort>,
    // Interrupt state saved by `enter`, `None` while outside the section.
    saved: Mutex<Option<bool>>,
    asserts: Arc<Assertions>,
}

impl CriticalSection {
    /// Create a critical section driving `port`.
    #[must_use]
    pub fn new(port: Arc<dyn InterruptPort>, asserts: Arc<Assertions>) -> Self {
        Self {
            port,
            saved: Mutex::new(None),
            asserts,
        }
    }

    /// Enter the critical section. Returns whether this call entered it.
    pub fn enter(&self) -> bool {
        let mut saved = self.saved.lock();
        if !self.asserts.check(saved.is_none()) {
            return false;
        }
        *saved = Some(self.port.disable());
        true
    }

    // Enters only when outside the section; an active section is left to its owner.
    fn enter_if_inactive(&self) -> bool {
        let mut saved = self.saved.lock();
        if saved.is_some() {
            return false;
        }
        *saved = Some(self.port.disable());
        true
    }

    /// Leave the critical section, restoring the saved interrupt state.
    pub fn exit(&self) {
        let mut saved = self.saved.lock();
        match saved.take() {
            Some(was_enabled) => self.port.restore(was_enabled),
            None => {
                self.asserts.check(false);
            }
        }
    }

    /// Whether the section is currently entered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.saved.lock().is_some()
    }

    /// Enter the section and leave it when the returned guard drops.
    ///
    /// A nested call is reported; its guard then leaves the section alone.
    #[must_use = "the section is left as soon as the guard is dropped"]
    pub fn guard(&self) -> CriticalSectionGuard<'_> {
        let entered = self.enter();
        CriticalSectionGuard {
            section: self,
            entered,
        }
    }

    /// Run `f` inside the critical section.
    ///
    /// When the caller already holds the section, `f` runs in it as is and
    /// the section stays active afterwards.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = CriticalSectionGuard {
            section: self,
            entered: self.enter_if_inactive(),
        };
        f()
    }
}

/// RAII guard returned by [`CriticalSection::guard`].
pub struct CriticalSectionGuard<'a> {
    section: &'a CriticalSection,
    entered: bool,
}

impl Drop for CriticalSectionGuard<'_> {
    fn drop(&mut self) {
        if self.entered {
            self.section.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::CountingHandler;

    fn setup() -> (CriticalSection, Arc<HostInterruptPort>, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::new());
        let asserts = Arc::new(Assertions::with_handler(handler.clone()));
        let port = Arc::new(HostInterruptPort::new());
        (CriticalSection::new(port.clone(), asserts), port, handler)
    }

    #[test]
    fn exit_without_enter_reports() {
        let (section, port, handler) = setup();
        section.exit();
        assert_eq!(handler.count(), 1);
        assert!(port.interrupts_enabled());
    }

    #[test]
    fn enter_exit_pair_is_silent() {
        let (section, port, handler) = setup();
        section.enter();
        assert!(section.is_active());
        assert!(!port.interrupts_enabled());
        section.exit();
        assert!(!section.is_active());
        assert!(port.interrupts_enabled());
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn nested_enter_reports_and_is_ignored() {
        let (section, port, handler) = setup();
        section.enter();
        section.enter();
        assert_eq!(handler.count(), 1);
        section.exit();
        assert!(port.interrupts_enabled());
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn restores_previously_disabled_state() {
        let (section, port, _handler) = setup();
        port.disable();
        section.enter();
        section.exit();
        assert!(!port.interrupts_enabled());
    }

    #[test]
    fn with_inside_caller_section_keeps_it_active() {
        let (section, port, handler) = setup();
        assert!(section.enter());
        assert_eq!(section.with(|| 3), 3);
        assert!(section.is_active());
        assert!(!port.interrupts_enabled());
        section.exit();
        assert!(port.interrupts_enabled());
        assert_eq!(handler.count(), 0);
    }

    #[test]
    fn nested_guard_does_not_end_outer_section() {
        let (section, port, handler) = setup();
        let outer = section.guard();
        {
            let _inner = section.guard();
            assert_eq!(handler.count(), 1);
        }
        assert!(section.is_active());
        assert!(!port.interrupts_enabled());
        drop(outer);
        assert!(port.interrupts_enabled());
        assert_eq!(handler.count(), 1);
    }

    #[test]
    fn guard_and_with_leave_the_section() {
        let (section, port, handler) = setup();
        {
            let _guard = section.guard();
            assert!(!port.interrupts_enabled());
        }
        assert!(port.interrupts_enabled());
        let value = section.with(|| 7);
        assert_eq!(value, 7);
        assert!(!section.is_active());
        assert_eq!(handler.count(), 0);
    }
}
