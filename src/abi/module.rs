//! Loaded engine modules.
//!
//! `EngineModule` pairs a shared library with the `EngineApi` resolved from
//! it. The table is only handed out while the library is still open, so no
//! caller can reach a function pointer into an unloaded module through it.

use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::debug;

use super::symbols::EngineApi;
use crate::error::LoadError;
use crate::session::router;

/// A loaded duel engine.
///
/// ## Example
///
/// ```no_run
/// use ocg_host::abi::EngineModule;
///
/// let mut module = EngineModule::load("./libocgcore.so")?;
/// assert!(module.api().is_some());
///
/// module.release();
/// module.release(); // second release is a no-op
/// assert!(module.api().is_none());
/// # Ok::<(), ocg_host::LoadError>(())
/// ```
#[derive(Debug)]
pub struct EngineModule {
    api: EngineApi,
    library: Option<Library>,
    origin: Option<PathBuf>,
    released: bool,
}

impl EngineModule {
    /// Open the shared library at `path` and resolve every entry point.
    ///
    /// Either every required symbol resolves or nothing is returned; a
    /// library that was opened is closed again before the error comes back.
    /// On success the host's card and script readers are already installed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();

        // SAFETY: opening a library runs its initializers; the engine module
        // is trusted code supplied by the embedding application.
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: the engine module exports the documented ABI. On failure
        // `library` is dropped here, which closes it.
        let api = unsafe { EngineApi::resolve(&library) }?;

        debug!(path = %path.display(), "engine module loaded");

        // SAFETY: `api` was just resolved from `library`, which we now own.
        let mut module = unsafe { Self::assemble(api, Some(library)) };
        module.origin = Some(path.to_path_buf());
        Ok(module)
    }

    /// Wrap an engine whose entry points come from somewhere other than a
    /// shared library, such as a statically linked build.
    ///
    /// # Safety
    ///
    /// Every function in `api` must implement the engine ABI and stay
    /// callable for the lifetime of the returned module.
    pub unsafe fn from_api(api: EngineApi) -> Self {
        Self::assemble(api, None)
    }

    unsafe fn assemble(api: EngineApi, library: Option<Library>) -> Self {
        router::install_readers(&api);
        Self {
            api,
            library,
            origin: None,
            released: false,
        }
    }

    /// The resolved entry points, or `None` once the module is released.
    #[must_use]
    pub fn api(&self) -> Option<&EngineApi> {
        if self.released {
            None
        } else {
            Some(&self.api)
        }
    }

    /// Path the module was loaded from, if it came from a shared library.
    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Has `release` been called?
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close the library. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(library) = self.library.take() {
            drop(library);
            debug!(origin = ?self.origin, "engine module released");
        }
    }
}

impl Drop for EngineModule {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_library() {
        let result = EngineModule::load("/nonexistent/definitely/not/here/libocgcore.so");
        match result {
            Err(LoadError::Open { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/definitely/not/here/libocgcore.so"));
            }
            other => panic!("expected LoadError::Open, got {other:?}"),
        }
    }
}
