//! Error types for the engine host.
//!
//! Three families, matching how failures surface:
//!
//! | Type | When | Effect |
//! |------|------|--------|
//! | [`LoadError`] | Module cannot be opened or is incomplete | No module |
//! | [`UsageError`] | Host can reject the call up front | Engine never called |
//! | [`HostError`] | Building a host from a config | Wraps all of these |
//!
//! Engine-side lookup misses (a card or script the engine asks for and the
//! host does not have) are not errors at this level. They are reported back to
//! the engine through the callback's return value and logged.

use std::path::PathBuf;

use smallvec::SmallVec;
use thiserror::Error;

use crate::session::DuelId;

/// Failure to produce an engine module.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The shared library itself could not be opened.
    #[error("failed to open engine module {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// One or more required entry points are not exported.
    ///
    /// Every missing name is listed, not only the first one found.
    #[error(
        "engine module is missing {} required symbol(s): {}",
        missing.len(),
        missing.join(", ")
    )]
    MissingSymbols { missing: SmallVec<[&'static str; 4]> },
}

/// A call the host refuses before touching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// The duel identifier was never issued, or the duel has ended.
    #[error("unknown duel identifier {0}")]
    UnknownDuel(DuelId),

    /// Responses are a fixed 64-byte block.
    #[error("response buffer must be exactly 64 bytes, got {len}")]
    ResponseSize { len: usize },

    /// The engine module was released; its entry points are gone.
    #[error("engine module has been released")]
    ModuleReleased,

    /// A duel was requested before a data or script source was bound.
    #[error("no {0} source bound to this host")]
    SourcesNotBound(&'static str),

    /// Sources cannot be swapped while duels are still open.
    #[error("cannot rebind sources while {open} duel(s) are open")]
    DuelsOpen { open: usize },

    /// Player indices cross the boundary as single bytes.
    #[error("duel setup lists {players} players; at most 256 are addressable")]
    TooManyPlayers { players: usize },

    /// Script names cross the boundary as C strings.
    #[error("script name contains an interior NUL byte: {0:?}")]
    InvalidScriptName(String),
}

/// Errors from assembling a host out of configuration.
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed card database: {0}")]
    CardDatabase(#[from] serde_json::Error),

    #[error("malformed card snapshot: {0}")]
    Snapshot(#[from] bincode::Error),
}

impl HostError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
