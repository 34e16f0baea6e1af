//! The engine module's C ABI: entry-point signatures, the resolved symbol
//! table, and the loaded-module handle.
//!
//! ## Key Types
//!
//! - `DuelPtr`: The engine's opaque duel handle. Never dereferenced here.
//! - `EngineApi`: Fully resolved table of the 18 required entry points
//! - `SymbolSource`: Anything that can hand out symbol addresses by name
//! - `EngineModule`: Owns the shared library and its `EngineApi`
//!
//! ## Buffer Capacities
//!
//! Output buffers are allocated by the host at a fixed size per operation;
//! the engine reports how much of each it used.

pub mod module;
pub mod symbols;

use std::ffi::{c_char, c_int, c_long, c_void};

pub use module::EngineModule;
pub use symbols::{EngineApi, SymbolSource, REQUIRED_SYMBOLS};

/// Opaque duel handle produced by `create_duel`.
pub type DuelPtr = c_long;

/// Capacity of the buffer filled by `get_message` after `process`.
pub const MESSAGE_CAPACITY: usize = 0x1000;

/// Capacity of card and field query buffers.
pub const QUERY_CAPACITY: usize = 0x4000;

/// Capacity of the engine's log string buffer, NUL terminator included.
pub const LOG_CAPACITY: usize = 256;

/// Exact size of a byte response.
pub const RESPONSE_SIZE: usize = 64;

/// Card status reported to the engine on a successful lookup.
pub const CARD_FOUND: u32 = 0;

/// Card status reported to the engine when the code is unknown.
pub const CARD_NOT_FOUND: u32 = 1;

/// Card locations understood by the engine.
pub mod location {
    pub const DECK: u8 = 0x01;
    pub const HAND: u8 = 0x02;
    pub const MZONE: u8 = 0x04;
    pub const SZONE: u8 = 0x08;
    pub const GRAVE: u8 = 0x10;
    pub const REMOVED: u8 = 0x20;
    pub const EXTRA: u8 = 0x40;
    pub const OVERLAY: u8 = 0x80;
}

/// Card positions understood by the engine.
pub mod position {
    pub const FACEUP_ATTACK: u8 = 0x1;
    pub const FACEDOWN_ATTACK: u8 = 0x2;
    pub const FACEUP_DEFENSE: u8 = 0x4;
    pub const FACEDOWN_DEFENSE: u8 = 0x8;
    pub const FACEDOWN: u8 = FACEDOWN_ATTACK | FACEDOWN_DEFENSE;
}

// Callback signatures the engine pulls data through.

/// `(name, out_length) -> content`.
pub type ScriptReaderFn = unsafe extern "C" fn(*const c_char, *mut c_int) -> *mut u8;
/// `(code, out_record) -> status`.
pub type CardReaderFn = unsafe extern "C" fn(u32, *mut c_void) -> u32;

// Entry points exported by the engine module.

pub type CreateDuelFn = unsafe extern "C" fn(u32) -> DuelPtr;
pub type StartDuelFn = unsafe extern "C" fn(DuelPtr, i32);
pub type EndDuelFn = unsafe extern "C" fn(DuelPtr);
pub type SetPlayerInfoFn = unsafe extern "C" fn(DuelPtr, i32, i32, i32, i32);
pub type GetLogMessageFn = unsafe extern "C" fn(DuelPtr, *mut u8);
pub type GetMessageFn = unsafe extern "C" fn(DuelPtr, *mut u8) -> i32;
pub type ProcessFn = unsafe extern "C" fn(DuelPtr) -> i32;
pub type NewCardFn = unsafe extern "C" fn(DuelPtr, u32, u8, u8, u8, u8, u8);
pub type NewTagCardFn = unsafe extern "C" fn(DuelPtr, u32, u8, u8);
pub type QueryCardFn = unsafe extern "C" fn(DuelPtr, u8, u8, u8, i32, *mut u8, i32) -> i32;
pub type QueryFieldCountFn = unsafe extern "C" fn(DuelPtr, u8, u8) -> i32;
pub type QueryFieldCardFn = unsafe extern "C" fn(DuelPtr, u8, u8, i32, *mut u8, i32) -> i32;
pub type QueryFieldInfoFn = unsafe extern "C" fn(DuelPtr, *mut u8) -> i32;
pub type SetResponseIntFn = unsafe extern "C" fn(DuelPtr, i32);
pub type SetResponseBytesFn = unsafe extern "C" fn(DuelPtr, *mut u8);
pub type PreloadScriptFn = unsafe extern "C" fn(DuelPtr, *const c_char, i32) -> i32;
pub type SetScriptReaderFn = unsafe extern "C" fn(ScriptReaderFn);
pub type SetCardReaderFn = unsafe extern "C" fn(CardReaderFn);
