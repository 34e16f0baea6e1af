//! Card and script data the engine pulls through its callbacks.
//!
//! ## Key Types
//!
//! - `CardRecord`: Fixed-layout card data copied into the engine
//! - `DataSource` / `ScriptSource`: Read interfaces the host routes callbacks to
//! - `CardStore` / `ScriptStore`: Default in-memory implementations
//!
//! Sources are immutable once bound to a host; the engine may hold pointers
//! into script content for the duration of a call.

pub mod card;
pub mod card_store;
pub mod script_store;
pub mod source;

pub use card::{CardRecord, CdbRow, TYPE_LINK};
pub use card_store::CardStore;
pub use script_store::ScriptStore;
pub use source::{find_script, resolve_script, DataSource, ScriptSource};
