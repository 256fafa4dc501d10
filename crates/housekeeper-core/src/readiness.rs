//! Process readiness gate.
//!
//! Cleanup tasks may be triggered before startup has finished (stores not
//! migrated, registries not yet populated). Until the gate is opened every
//! task returns without doing anything.

use std::sync::atomic::{AtomicBool, Ordering};

/// A process-wide "initialization complete" flag.
///
/// Shared through an `Arc`; opening it is one-way for the life of the
/// process unless [`ReadinessGate::mark_not_ready`] is called during
/// shutdown.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
}

impl ReadinessGate {
    /// Create a closed gate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }

    /// Create a gate that is already open.
    #[must_use]
    pub const fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
        }
    }

    /// Whether startup has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Open the gate.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Close the gate again, e.g. while shutting down.
    pub fn mark_not_ready(&self) {
        self.ready.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_starts_closed() {
        assert!(!ReadinessGate::new().is_ready());
        assert!(!ReadinessGate::default().is_ready());
        assert!(ReadinessGate::ready().is_ready());
    }

    #[test]
    fn gate_toggles() {
        let gate = ReadinessGate::new();
        gate.mark_ready();
        assert!(gate.is_ready());
        gate.mark_not_ready();
        assert!(!gate.is_ready());
    }
}
