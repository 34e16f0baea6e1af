//! Duel sessions: identifiers, context routing, and the buffer protocol.
//!
//! ## Key Types
//!
//! - `DuelId`: Host-issued identifier exposed to callers instead of handles
//! - `SessionRegistry`: `DuelId` → engine handle map, owner of the id space
//! - `router`: The active-session slot and the engine callback trampolines
//! - `ProcessOutput`, `ProcessFlags`, `ResponseBuffer`: Decoded boundary values

pub mod buffer;
pub mod registry;
pub mod router;

pub use buffer::{PackedProcess, ProcessFlags, ProcessOutput, ResponseBuffer};
pub use registry::{DuelId, SessionRegistry};
pub use router::{active_owner, exclusive, SessionOwner};
