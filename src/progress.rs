//! Progress/cancellation gate
//!
//! The gate is consulted before an operation starts (delta 0) and after every
//! buffer-sized unit of work (delta = bytes just processed). A `false` answer
//! means the host wants the operation stopped. A gate with no callback cannot
//! be consulted at all, which is treated as fatal by every caller.

use crate::error::{ArchiveError, Result};
use std::fmt;

/// Host progress callback: (display name, delta) -> keep going?
pub type ProgressFn = dyn FnMut(&str, i64) -> bool + Send;

#[derive(Default)]
pub struct ProgressGate {
    callback: Option<Box<ProgressFn>>,
}

impl ProgressGate {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&str, i64) -> bool + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// A gate with nothing registered
    pub fn unavailable() -> Self {
        Self { callback: None }
    }

    /// A gate that never cancels
    pub fn always_continue() -> Self {
        Self::new(|_, _| true)
    }

    pub fn is_available(&self) -> bool {
        self.callback.is_some()
    }

    pub fn set(&mut self, callback: Option<Box<ProgressFn>>) {
        self.callback = callback;
    }

    /// Consult the host. `Err(Cancelled)` on a stop request, `Err(GateUnavailable)`
    /// when no callback is registered.
    pub fn check(&mut self, name: &str, delta: i64) -> Result<()> {
        let callback = self.callback.as_mut().ok_or(ArchiveError::GateUnavailable)?;
        if callback(name, delta) {
            Ok(())
        } else {
            tracing::debug!(name, delta, "operation cancelled by host");
            Err(ArchiveError::Cancelled)
        }
    }
}

impl fmt::Debug for ProgressGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressGate")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_unavailable_gate_is_fatal() {
        let mut gate = ProgressGate::unavailable();
        assert!(matches!(gate.check("x", 0), Err(ArchiveError::GateUnavailable)));
    }

    #[test]
    fn test_gate_reports_name_and_delta() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut gate = ProgressGate::new(move |name, delta| {
            sink.lock().unwrap().push((name.to_string(), delta));
            delta < 100
        });

        gate.check("entry", 0).unwrap();
        gate.check("entry", 42).unwrap();
        assert!(matches!(gate.check("entry", 100), Err(ArchiveError::Cancelled)));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1], ("entry".to_string(), 42));
    }
}
