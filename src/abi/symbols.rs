//! Symbol table resolution.
//!
//! `EngineApi::resolve` is all-or-nothing: it either returns a table with
//! every entry point populated, or a single `LoadError::MissingSymbols`
//! naming everything that was absent. There are no optional slots.

use std::ffi::c_void;

use smallvec::SmallVec;

use super::*;
use crate::error::LoadError;

/// A place symbol addresses can be looked up by exact name.
///
/// Implemented for `libloading::Library` and for any
/// `Fn(&str) -> Option<*const c_void>`, which lets statically linked or
/// in-process engines provide their own table.
pub trait SymbolSource {
    /// Address of the exported symbol `name`, or `None` if it is not exported.
    fn address(&self, name: &str) -> Option<*const c_void>;
}

impl SymbolSource for libloading::Library {
    fn address(&self, name: &str) -> Option<*const c_void> {
        // SAFETY: the symbol is only read as an untyped address here.
        let symbol = unsafe { self.get::<*const c_void>(name.as_bytes()) }.ok()?;
        let address = *symbol;
        (!address.is_null()).then_some(address)
    }
}

impl<F> SymbolSource for F
where
    F: Fn(&str) -> Option<*const c_void>,
{
    fn address(&self, name: &str) -> Option<*const c_void> {
        self(name).filter(|address| !address.is_null())
    }
}

macro_rules! engine_api {
    ($( $(#[$doc:meta])* $name:ident: $ty:ty, )*) => {
        /// Resolved entry points of a loaded engine module.
        ///
        /// Every field is a valid function pointer for as long as the module
        /// that produced it stays loaded.
        #[derive(Clone, Copy, Debug)]
        pub struct EngineApi {
            $( $(#[$doc])* pub $name: $ty, )*
        }

        /// Names of every symbol an engine module must export.
        pub const REQUIRED_SYMBOLS: &[&str] = &[$( stringify!($name), )*];

        impl EngineApi {
            /// Resolve the full table from `source`.
            ///
            /// # Safety
            ///
            /// Every address `source` returns must point at a function with
            /// the signature declared for that name in [`crate::abi`].
            pub unsafe fn resolve<S>(source: &S) -> Result<Self, LoadError>
            where
                S: SymbolSource + ?Sized,
            {
                let mut missing: SmallVec<[&'static str; 4]> = SmallVec::new();
                $(
                    let $name = match source.address(stringify!($name)) {
                        Some(address) => Some(std::mem::transmute::<*const c_void, $ty>(address)),
                        None => {
                            missing.push(stringify!($name));
                            None
                        }
                    };
                )*

                let ($( Some($name), )*) = ($( $name, )*) else {
                    return Err(LoadError::MissingSymbols { missing });
                };

                Ok(Self { $( $name, )* })
            }
        }
    };
}

engine_api! {
    create_duel: CreateDuelFn,
    start_duel: StartDuelFn,
    end_duel: EndDuelFn,
    set_player_info: SetPlayerInfoFn,
    /// Copies the engine's last log line (NUL-terminated, 256 bytes max).
    get_log_message: GetLogMessageFn,
    /// Copies the messages produced by the last `process` call.
    get_message: GetMessageFn,
    /// Runs the engine until it has output; returns `length | flags << 16`.
    process: ProcessFn,
    new_card: NewCardFn,
    new_tag_card: NewTagCardFn,
    query_card: QueryCardFn,
    query_field_count: QueryFieldCountFn,
    query_field_card: QueryFieldCardFn,
    query_field_info: QueryFieldInfoFn,
    set_responsei: SetResponseIntFn,
    set_responseb: SetResponseBytesFn,
    preload_script: PreloadScriptFn,
    set_script_reader: SetScriptReaderFn,
    set_card_reader: SetCardReaderFn,
}
