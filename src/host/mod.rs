//! The caller-facing host: one engine module, its data sources and its duels.
//!
//! ## Key Types
//!
//! - `DuelHost`: Facade over every engine operation, keyed by `DuelId`
//! - `HostConfig`, `DuelOptions`, `DeckList`: Serializable configuration
//! - `SeedStream`: Reproducible duel seeds
//! - `PlayerInfo`, `NewCard`, `CardQuery`, `FieldQuery`: Call arguments

pub mod config;
pub mod engine;
pub mod request;
pub mod seed;

pub use config::{DeckList, DuelOptions, HostConfig};
pub use engine::DuelHost;
pub use request::{CardQuery, FieldQuery, NewCard, PlayerInfo};
pub use seed::SeedStream;
