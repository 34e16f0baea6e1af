//! Read interfaces the engine callbacks pull from.

use super::card::CardRecord;

/// Backing storage for the zero-length placeholder script. The engine gets
/// a non-null pointer with a length of zero.
pub(crate) static EMPTY_SCRIPT: [u8; 1] = [0];

/// Card data keyed by card code.
pub trait DataSource: Send + Sync {
    /// Look up a card record by code.
    fn card(&self, code: u32) -> Option<CardRecord>;
}

/// Script text keyed by exact path.
///
/// Returned slices are handed to the engine without copying, so an
/// implementation must not move or drop content while it is shared.
pub trait ScriptSource: Send + Sync {
    /// Look up a script by its exact name.
    fn script(&self, name: &str) -> Option<&[u8]>;
}

/// Resolve `name` against `source`, stripping leading path segments on a miss.
///
/// The exact name is tried first. After that, every `/` in `name` (left to
/// right) is treated as a cut point and the remainder is looked up. If
/// nothing matches, an empty script is returned.
///
/// ```
/// use ocg_host::data::{resolve_script, ScriptStore};
///
/// let mut scripts = ScriptStore::new();
/// scripts.add("script/c1.lua", "-- one");
///
/// assert_eq!(resolve_script(&scripts, "./script/c1.lua"), b"-- one");
/// assert_eq!(resolve_script(&scripts, "expansions/script/c1.lua"), b"-- one");
/// assert!(resolve_script(&scripts, "c2.lua").is_empty());
/// ```
pub fn resolve_script<'a, S>(source: &'a S, name: &str) -> &'a [u8]
where
    S: ScriptSource + ?Sized,
{
    find_script(source, name).unwrap_or(&EMPTY_SCRIPT[..0])
}

/// Like [`resolve_script`], but `None` when no candidate name is stored.
///
/// A stored script that happens to be empty is `Some(&[])`.
pub fn find_script<'a, S>(source: &'a S, name: &str) -> Option<&'a [u8]>
where
    S: ScriptSource + ?Sized,
{
    source.script(name).or_else(|| {
        name.match_indices('/')
            .find_map(|(at, _)| source.script(&name[at + 1..]))
    })
}
