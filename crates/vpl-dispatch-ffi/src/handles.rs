//! Handle bookkeeping for the C surface.
//!
//! Every pointer handed to a C caller is recorded in one process-wide
//! registry, so a destroyed or foreign handle is detected instead of
//! dereferenced. Loaders are shared as `Arc`s: a call that already looked up
//! its loader keeps it alive even if another thread unloads it meanwhile.

use crate::description::DescriptionArena;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use vpl_dispatch_kernel::{DispatchError, ImplDescription};
use vpl_dispatch_runtime::abi::RawImplDescription;
use vpl_dispatch_runtime::{ConfigId, Loader, Session};

/// Opaque loader handle.
pub struct LoaderHandle {
    state: Mutex<LoaderState>,
}

pub(crate) struct LoaderState {
    pub loader: Loader,
    descriptions: HashMap<usize, DescriptionEntry>,
}

struct DescriptionEntry {
    arena: DescriptionArena,
    refs: usize,
}

impl LoaderHandle {
    fn new(loader: Loader) -> Self {
        Self {
            state: Mutex::new(LoaderState {
                loader,
                descriptions: HashMap::new(),
            }),
        }
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, LoaderState> {
        self.state.lock()
    }
}

impl LoaderState {
    /// Raw view of the description for discovery slot `key`, built on first
    /// use. Each call takes one reference.
    pub fn acquire_description(
        &mut self,
        key: usize,
        desc: &ImplDescription,
    ) -> Result<*const RawImplDescription, DispatchError> {
        let entry = match self.descriptions.entry(key) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => e.insert(DescriptionEntry {
                arena: DescriptionArena::build(desc)?,
                refs: 0,
            }),
        };
        entry.refs += 1;
        Ok(entry.arena.as_ptr())
    }

    /// Drop one reference to `ptr`. Releasing an already released
    /// description is a no-op; memory is reclaimed with the loader.
    pub fn release_description(&mut self, ptr: *const RawImplDescription) -> bool {
        match self
            .descriptions
            .values_mut()
            .find(|entry| std::ptr::eq(entry.arena.as_ptr(), ptr))
        {
            Some(entry) => {
                entry.refs = entry.refs.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    pub fn description_refs(&self, ptr: *const RawImplDescription) -> Option<usize> {
        self.descriptions
            .values()
            .find(|entry| std::ptr::eq(entry.arena.as_ptr(), ptr))
            .map(|entry| entry.refs)
    }
}

/// Opaque config handle.
pub struct ConfigHandle {
    id: ConfigId,
}

/// Opaque session handle.
pub struct SessionHandle {
    session: Session,
}

impl SessionHandle {
    pub fn session(&self) -> &Session {
        &self.session
    }
}

struct ConfigEntry {
    handle: Box<ConfigHandle>,
    loader: Arc<LoaderHandle>,
}

#[derive(Default)]
struct Registry {
    loaders: HashMap<usize, Arc<LoaderHandle>>,
    configs: HashMap<usize, ConfigEntry>,
    descriptions: HashMap<usize, Arc<LoaderHandle>>,
    sessions: HashMap<usize, Box<SessionHandle>>,
}

fn registry() -> &'static Mutex<Registry> {
    static REGISTRY: OnceLock<Mutex<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(Registry::default()))
}

fn key<T>(ptr: *const T) -> usize {
    ptr as usize
}

pub fn register_loader(loader: Loader) -> *mut LoaderHandle {
    let handle = Arc::new(LoaderHandle::new(loader));
    let ptr = Arc::as_ptr(&handle).cast_mut();
    registry().lock().loaders.insert(key(ptr), handle);
    ptr
}

pub fn lookup_loader(ptr: *const LoaderHandle) -> Option<Arc<LoaderHandle>> {
    registry().lock().loaders.get(&key(ptr)).cloned()
}

/// Forget a loader and everything issued from it. Returns the loader so the
/// caller can drop it outside the registry lock.
pub fn unregister_loader(ptr: *const LoaderHandle) -> Option<Arc<LoaderHandle>> {
    let mut registry = registry().lock();
    let loader = registry.loaders.remove(&key(ptr))?;
    registry
        .configs
        .retain(|_, entry| !Arc::ptr_eq(&entry.loader, &loader));
    registry
        .descriptions
        .retain(|_, owner| !Arc::ptr_eq(owner, &loader));
    Some(loader)
}

pub fn register_config(loader: Arc<LoaderHandle>, id: ConfigId) -> *mut ConfigHandle {
    let mut handle = Box::new(ConfigHandle { id });
    let ptr: *mut ConfigHandle = &mut *handle;
    registry()
        .lock()
        .configs
        .insert(key(ptr), ConfigEntry { handle, loader });
    ptr
}

pub fn lookup_config(ptr: *const ConfigHandle) -> Option<(Arc<LoaderHandle>, ConfigId)> {
    registry()
        .lock()
        .configs
        .get(&key(ptr))
        .map(|entry| (Arc::clone(&entry.loader), entry.handle.id))
}

pub fn register_description(ptr: *const RawImplDescription, loader: Arc<LoaderHandle>) {
    registry().lock().descriptions.insert(key(ptr), loader);
}

pub fn lookup_description(ptr: *const RawImplDescription) -> Option<Arc<LoaderHandle>> {
    registry().lock().descriptions.get(&key(ptr)).cloned()
}

pub fn register_session(session: Session) -> *mut SessionHandle {
    let mut handle = Box::new(SessionHandle { session });
    let ptr: *mut SessionHandle = &mut *handle;
    registry().lock().sessions.insert(key(ptr), handle);
    ptr
}

pub fn is_live_session(ptr: *const SessionHandle) -> bool {
    registry().lock().sessions.contains_key(&key(ptr))
}

pub fn unregister_session(ptr: *const SessionHandle) -> Option<Session> {
    let handle = registry().lock().sessions.remove(&key(ptr))?;
    Some(handle.session)
}

/// Run `f` on the state of a live loader.
pub(crate) fn with_loader<R>(
    ptr: *const LoaderHandle,
    f: impl FnOnce(&Arc<LoaderHandle>, &mut LoaderState) -> Result<R, DispatchError>,
) -> Result<R, DispatchError> {
    let loader = lookup_loader(ptr).ok_or(DispatchError::InvalidHandle)?;
    let mut state = loader.lock();
    f(&loader, &mut state)
}
