//! Active-session router and the engine's callback trampolines.
//!
//! The engine pulls card and script data through two plain function
//! pointers that carry no context argument. The host therefore keeps one
//! process-wide slot naming the session whose sources those callbacks
//! should read, and sets it immediately before every call into the engine.
//!
//! ## Concurrency Contract
//!
//! - All engine calls, from every host and every thread, run inside one
//!   global critical section (`ENGINE`).
//! - The critical section is reentrant so the trampolines, which run on the
//!   calling thread in the middle of an engine call, can read the slot.
//! - The slot keeps pointing at the last-used session between calls. It is
//!   cleared only when that session's owner goes away.
//! - Callbacks arriving on any other thread block until the current engine
//!   call finishes.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{const_reentrant_mutex, ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, warn};

use crate::abi::{EngineApi, CARD_FOUND, CARD_NOT_FOUND};
use crate::data::source::EMPTY_SCRIPT;
use crate::data::{find_script, CardRecord, DataSource, ScriptSource};

static ENGINE: ReentrantMutex<RefCell<Router>> =
    const_reentrant_mutex(RefCell::new(Router::empty()));

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity of a session that can be routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionOwner(u64);

impl SessionOwner {
    pub(crate) fn next() -> Self {
        Self(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The sources one session exposes to the engine's callbacks.
#[derive(Clone)]
pub(crate) struct SessionSources {
    owner: SessionOwner,
    data: Option<Arc<dyn DataSource>>,
    scripts: Option<Arc<dyn ScriptSource>>,
}

impl SessionSources {
    pub(crate) fn new(owner: SessionOwner) -> Self {
        Self {
            owner,
            data: None,
            scripts: None,
        }
    }

    pub(crate) fn with_data(&self, data: Arc<dyn DataSource>) -> Self {
        Self {
            data: Some(data),
            ..self.clone()
        }
    }

    pub(crate) fn with_scripts(&self, scripts: Arc<dyn ScriptSource>) -> Self {
        Self {
            scripts: Some(scripts),
            ..self.clone()
        }
    }

    pub(crate) fn owner(&self) -> SessionOwner {
        self.owner
    }

    pub(crate) fn has_data(&self) -> bool {
        self.data.is_some()
    }

    pub(crate) fn has_scripts(&self) -> bool {
        self.scripts.is_some()
    }
}

/// The single active-session slot.
struct Router {
    active: Option<Arc<SessionSources>>,
}

impl Router {
    const fn empty() -> Self {
        Self { active: None }
    }
}

/// Proof that the caller is inside the engine critical section with its
/// session routed. Engine calls must only happen while one is alive.
pub(crate) struct EngineCall {
    _guard: ReentrantMutexGuard<'static, RefCell<Router>>,
}

/// Enter the critical section and make `sources` the active session.
pub(crate) fn enter(sources: &Arc<SessionSources>) -> EngineCall {
    let guard = ENGINE.lock();
    match guard.try_borrow_mut() {
        Ok(mut router) => router.active = Some(Arc::clone(sources)),
        Err(_) => warn!("active session slot busy; routing left unchanged"),
    }
    EngineCall { _guard: guard }
}

/// Run `f` with the engine critical section held.
///
/// Host calls made inside `f` on this thread proceed normally; host calls
/// from other threads wait until `f` returns. Use this to make a sequence
/// such as `process` followed by `get_log_message` atomic.
pub fn exclusive<R>(f: impl FnOnce() -> R) -> R {
    let _guard = ENGINE.lock();
    f()
}

/// Owner of the session currently (or most recently) routed to.
#[must_use]
pub fn active_owner() -> Option<SessionOwner> {
    let guard = ENGINE.lock();
    let owner = guard
        .try_borrow()
        .ok()
        .and_then(|router| router.active.as_ref().map(|sources| sources.owner));
    owner
}

/// Clear the slot if it still points at `owner`. Returns whether it did.
pub(crate) fn release_owner(owner: SessionOwner) -> bool {
    let guard = ENGINE.lock();
    let Ok(mut router) = guard.try_borrow_mut() else {
        return false;
    };
    if router.active.as_ref().map(|sources| sources.owner) == Some(owner) {
        router.active = None;
        debug!(owner = owner.0, "active session cleared");
        true
    } else {
        false
    }
}

/// Install both trampolines into a freshly resolved engine.
///
/// # Safety
///
/// `api` must hold valid entry points of a loaded engine.
pub(crate) unsafe fn install_readers(api: &EngineApi) {
    let _guard = ENGINE.lock();
    (api.set_script_reader)(read_script);
    (api.set_card_reader)(read_card);
}

fn active_sources() -> Option<Arc<SessionSources>> {
    let guard = ENGINE.lock();
    let active = guard.try_borrow().ok().and_then(|router| router.active.clone());
    active
}

/// Card reader handed to the engine.
///
/// Copies the active session's record for `code` into `out` and returns
/// `CARD_FOUND`, or returns `CARD_NOT_FOUND` without touching `out`.
///
/// # Safety
///
/// `out` must be null or point at writable memory the size of `CardRecord`.
pub unsafe extern "C" fn read_card(code: u32, out: *mut c_void) -> u32 {
    if out.is_null() {
        return CARD_NOT_FOUND;
    }

    let lookup = catch_unwind(AssertUnwindSafe(|| {
        let Some(sources) = active_sources() else {
            warn!(code, "card requested with no active session");
            return None;
        };
        let record = sources.data.as_ref().and_then(|data| data.card(code));
        if record.is_none() {
            warn!(code, "card not found");
        }
        record
    }));

    match lookup {
        Ok(Some(record)) => {
            out.cast::<CardRecord>().write_unaligned(record);
            CARD_FOUND
        }
        Ok(None) => CARD_NOT_FOUND,
        Err(_) => {
            warn!(code, "data source panicked during card lookup");
            CARD_NOT_FOUND
        }
    }
}

/// Script reader handed to the engine.
///
/// Returns a pointer into the active session's stored script and writes its
/// length to `out_len`. Unresolvable names get a zero-length placeholder.
/// Returns null only when no session is active or the arguments are null.
///
/// # Safety
///
/// `name` must be null or a valid NUL-terminated string; `out_len` must be
/// null or writable.
pub unsafe extern "C" fn read_script(name: *const c_char, out_len: *mut c_int) -> *mut u8 {
    if name.is_null() || out_len.is_null() {
        return ptr::null_mut();
    }
    let name = CStr::from_ptr(name).to_string_lossy();

    let lookup = catch_unwind(AssertUnwindSafe(|| {
        let Some(sources) = active_sources() else {
            warn!(name = %name, "script requested with no active session");
            return None;
        };
        // The router keeps `sources` alive after this function returns, so the
        // content stays valid for the rest of the engine call.
        let found = sources
            .scripts
            .as_ref()
            .and_then(|scripts| find_script(scripts.as_ref(), &name));
        Some(found.map(|content| (content.as_ptr(), content.len())))
    }));

    match lookup {
        Ok(Some(Some((_, 0)))) => {
            *out_len = 0;
            EMPTY_SCRIPT.as_ptr().cast_mut()
        }
        Ok(Some(Some((content, len)))) => {
            *out_len = c_int::try_from(len).unwrap_or(c_int::MAX);
            content.cast_mut()
        }
        Ok(Some(None)) => {
            warn!(name = %name, "script not found, serving empty placeholder");
            *out_len = 0;
            EMPTY_SCRIPT.as_ptr().cast_mut()
        }
        Ok(None) => ptr::null_mut(),
        Err(_) => {
            warn!(name = %name, "script source panicked during lookup");
            ptr::null_mut()
        }
    }
}
