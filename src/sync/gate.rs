//! Mutual exclusion of pull and push through one engine.

use crate::error::SyncError;
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Pull,
    Push,
}

/// At most one pull or push holds the gate at a time.
#[derive(Debug, Default)]
pub struct SyncGate {
    active: Mutex<Option<SyncKind>>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, kind: SyncKind) -> Result<SyncGuard<'_>, SyncError> {
        let mut active = self.active.lock();
        if active.is_some() {
            return Err(SyncError::Busy);
        }
        *active = Some(kind);
        Ok(SyncGuard { gate: self })
    }

    pub fn current(&self) -> Option<SyncKind> {
        *self.active.lock()
    }

    pub fn is_busy(&self) -> bool {
        self.current().is_some()
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct SyncGuard<'a> {
    gate: &'a SyncGate,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        *self.gate.active.lock() = None;
    }
}
