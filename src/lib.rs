//! # ocg-host
//!
//! Host for a dynamically loaded duel engine.
//!
//! The engine is a native module exporting a flat C interface. It owns all
//! game rules; this crate owns everything around it: loading the module,
//! feeding it card and script data on demand, and keeping many duels apart.
//!
//! ## Design Principles
//!
//! 1. **All or Nothing Loading**: A module either resolves every entry point
//!    or is not produced. Missing symbols are reported together.
//!
//! 2. **Opaque Handles**: Engine handles never leave the host. Callers work
//!    with `DuelId`s, which are never reused and fail cleanly once ended.
//!
//! 3. **Routed Callbacks**: The engine's data callbacks carry no context, so
//!    one process-wide slot names the session they serve. The slot is set
//!    before every engine call inside a single critical section.
//!
//! 4. **Fixed Buffers**: Output buffers have engine-defined capacities and
//!    are trimmed to the length the engine reports. Inputs of the wrong size
//!    are rejected before the engine sees them.
//!
//! ## Modules
//!
//! - `abi`: Entry point table, shared-library loading, boundary constants
//! - `data`: Card records, data and script sources, in-memory stores
//! - `session`: Duel ids, the active-session router, buffer decoding
//! - `host`: The `DuelHost` facade, configuration, seed streams
//! - `error`: Load, usage and host errors

pub mod abi;
pub mod data;
pub mod error;
pub mod host;
pub mod session;

// Re-export commonly used types
pub use crate::abi::{EngineApi, EngineModule, SymbolSource};

pub use crate::data::{CardRecord, CardStore, DataSource, ScriptSource, ScriptStore};

pub use crate::error::{HostError, LoadError, UsageError};

pub use crate::host::{
    CardQuery, DeckList, DuelHost, DuelOptions, FieldQuery, HostConfig, NewCard, PlayerInfo,
    SeedStream,
};

pub use crate::session::{exclusive, DuelId, ProcessFlags, ProcessOutput, ResponseBuffer};
