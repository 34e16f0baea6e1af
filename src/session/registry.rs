//! Duel identifiers and the registry mapping them to engine handles.
//!
//! Callers never see raw engine handles. Each `create_duel` produces a
//! `DuelId` from a per-host counter; the registry translates it back on
//! every call.
//!
//! ## ID Layout
//!
//! - `0`: Reserved, never issued ("no duel")
//! - `1..`: Issued in order, never reused for the lifetime of the registry
//!
//! ```
//! use ocg_host::session::{DuelId, SessionRegistry};
//!
//! let mut registry = SessionRegistry::new();
//! let first = registry.acquire(0x1000);
//! let second = registry.acquire(0x2000);
//!
//! assert_eq!(first, DuelId::new(1));
//! assert_eq!(registry.lookup(second), Ok(0x2000));
//!
//! registry.release(first);
//! assert!(registry.lookup(first).is_err());
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::abi::DuelPtr;
use crate::error::UsageError;

/// Host-issued identifier standing in for an engine duel handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DuelId(pub u32);

impl DuelId {
    /// The reserved "no duel" identifier.
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for DuelId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DuelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Duel({})", self.0)
    }
}

/// Map from live `DuelId`s to engine handles.
///
/// An identifier is valid exactly while it is present here. The registry
/// does not own the handles: the engine's `end_duel` must be called before
/// `release`.
#[derive(Clone, Debug, Default)]
pub struct SessionRegistry {
    handles: FxHashMap<DuelId, DuelPtr>,
    last_id: u32,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next identifier for `handle`.
    pub fn acquire(&mut self, handle: DuelPtr) -> DuelId {
        self.last_id += 1;
        let id = DuelId(self.last_id);
        self.handles.insert(id, handle);
        id
    }

    /// Translate an identifier into its engine handle.
    pub fn lookup(&self, id: DuelId) -> Result<DuelPtr, UsageError> {
        self.handles
            .get(&id)
            .copied()
            .ok_or(UsageError::UnknownDuel(id))
    }

    /// Forget an identifier. Returns the handle it mapped to, if any.
    pub fn release(&mut self, id: DuelId) -> Option<DuelPtr> {
        self.handles.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: DuelId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Number of live duels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Live identifiers, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<DuelId> {
        let mut ids: Vec<DuelId> = self.handles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Remove every entry, returning them in identifier order.
    ///
    /// The counter is not reset; drained identifiers stay retired.
    pub fn drain(&mut self) -> Vec<(DuelId, DuelPtr)> {
        let mut entries: Vec<(DuelId, DuelPtr)> = self.handles.drain().collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }
}
