//! Exported C functions.
//!
//! Every export runs inside [`guarded`], which turns a panic into
//! [`Status::Unknown`] instead of unwinding into C. Pointer arguments are
//! checked for null before any handle is looked up.

use crate::handles::{
    ConfigHandle, LoaderHandle, SessionHandle, lookup_config, lookup_description,
    register_config, register_description, register_loader, register_session, unregister_loader,
    unregister_session, with_loader,
};
use std::ffi::{CStr, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::sync::Once;
use tracing::{debug, error};
use vpl_dispatch_kernel::property::{self, ValueKind};
use vpl_dispatch_kernel::{DispatchError, PropertyValue, Range32U, Rankable, Status, VariantType};
use vpl_dispatch_runtime::abi::{RawImplDescription, RawVariant};
use vpl_dispatch_runtime::{Loader, logging};

/// Status code as returned across the C boundary.
pub type RawStatus = i32;

fn guarded<T>(on_panic: T, f: impl FnOnce() -> T) -> T {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!("panic caught at the C boundary");
            on_panic
        }
    }
}

fn status_of(result: Result<(), DispatchError>) -> RawStatus {
    match result {
        Ok(()) => Status::Ok.code(),
        Err(err) => {
            debug!("{}", err);
            err.code()
        }
    }
}

fn init_logging_once() {
    static LOGGING: Once = Once::new();
    LOGGING.call_once(|| {
        logging::init_logging();
    });
}

/// Wrap an existing loader in a C handle.
pub fn loader_into_handle(loader: Loader) -> *mut LoaderHandle {
    register_loader(loader)
}

/// Create a loader using settings from the environment.
#[unsafe(no_mangle)]
pub extern "C" fn MFXLoad() -> *mut LoaderHandle {
    guarded(ptr::null_mut(), || {
        init_logging_once();
        register_loader(Loader::from_env())
    })
}

/// Destroy a loader, its configs and its descriptions. Sessions created from
/// it stay open.
#[unsafe(no_mangle)]
pub extern "C" fn MFXUnload(loader: *mut LoaderHandle) {
    guarded((), || {
        if loader.is_null() {
            return;
        }
        match unregister_loader(loader) {
            Some(handle) => drop(handle),
            None => debug!("MFXUnload on an unknown loader handle"),
        }
    })
}

/// Add a config to `loader`. Returns null if the loader is not live.
#[unsafe(no_mangle)]
pub extern "C" fn MFXCreateConfig(loader: *mut LoaderHandle) -> *mut ConfigHandle {
    guarded(ptr::null_mut(), || {
        if loader.is_null() {
            return ptr::null_mut();
        }
        with_loader(loader, |handle, state| {
            let id = state.loader.create_config();
            Ok(register_config(handle.clone(), id))
        })
        .unwrap_or(ptr::null_mut())
    })
}

/// Decode a raw variant whose tag `tag` is already accepted by `kind`.
///
/// # Safety
/// Pointer payloads must point to a NUL-terminated string or a range record
/// as `kind` says.
unsafe fn decode_value(
    kind: ValueKind,
    tag: VariantType,
    value: &RawVariant,
) -> Result<PropertyValue, DispatchError> {
    let data = &value.data;
    Ok(match kind {
        ValueKind::HexId if tag == VariantType::U16 => PropertyValue::U16(unsafe { data.u16 }),
        ValueKind::String | ValueKind::HexId => unsafe { decode_string(value)? },
        ValueKind::Scalar(tag) => unsafe {
            match tag {
                VariantType::U8 => PropertyValue::U8(data.u8),
                VariantType::I8 => PropertyValue::I8(data.i8),
                VariantType::U16 => PropertyValue::U16(data.u16),
                VariantType::I16 => PropertyValue::I16(data.i16),
                VariantType::U32 => PropertyValue::U32(data.u32),
                VariantType::I32 => PropertyValue::I32(data.i32),
                VariantType::U64 => PropertyValue::U64(data.u64),
                VariantType::I64 => PropertyValue::I64(data.i64),
                VariantType::F32 => PropertyValue::F32(data.f32),
                VariantType::F64 => PropertyValue::F64(data.f64),
                VariantType::Unset | VariantType::Ptr => {
                    return Err(DispatchError::Internal(format!("no scalar payload for {tag}")));
                }
            }
        },
        ValueKind::Range => {
            let range = unsafe { data.ptr }.cast::<Range32U>();
            match unsafe { range.as_ref() } {
                Some(range) => PropertyValue::Range(*range),
                None => return Err(DispatchError::NullArgument("value.data.ptr")),
            }
        }
    })
}

/// # Safety
/// A non-null pointer payload must point to a NUL-terminated string.
unsafe fn decode_string(value: &RawVariant) -> Result<PropertyValue, DispatchError> {
    let text = unsafe { value.data.ptr }.cast::<c_char>();
    if text.is_null() {
        return Err(DispatchError::NullArgument("value.data.ptr"));
    }
    Ok(PropertyValue::String(
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned(),
    ))
}

/// Constrain `config` to `name == value`.
///
/// # Safety
/// `name` must be null or a NUL-terminated string. Pointer payloads in
/// `value` must be valid for the property `name` resolves to.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn MFXSetConfigFilterProperty(
    config: *mut ConfigHandle,
    name: *const u8,
    value: RawVariant,
) -> RawStatus {
    guarded(Status::Unknown.code(), || {
        if config.is_null() {
            return Status::NullArgument.code();
        }
        if name.is_null() {
            return Status::NullArgument.code();
        }
        let Some((loader, id)) = lookup_config(config) else {
            return Status::InvalidHandle.code();
        };

        let raw_name = unsafe { CStr::from_ptr(name.cast::<c_char>()) };
        let Some(property) = raw_name.to_str().ok().and_then(property::resolve) else {
            return DispatchError::UnknownProperty(raw_name.to_string_lossy().into_owned()).code();
        };

        let mut state = loader.lock();
        let Some(filter) = state.loader.config_mut(id) else {
            return Status::InvalidHandle.code();
        };

        let tag = VariantType::from_raw(value.type_tag).unwrap_or(VariantType::Unset);
        if !property.accepts_type(tag) {
            return filter.reject(property, tag).code();
        }

        let decoded = match unsafe { decode_value(property.kind, tag, &value) } {
            Ok(decoded) => decoded,
            Err(err) => return err.code(),
        };
        status_of(filter.set_property(property.path, decoded))
    })
}

/// Describe the `index`-th matching implementation.
///
/// The description stays valid until the loader is unloaded.
///
/// # Safety
/// `out` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn MFXEnumImplementations(
    loader: *mut LoaderHandle,
    index: u32,
    out: *mut *const RawImplDescription,
) -> RawStatus {
    guarded(Status::Unknown.code(), || {
        if out.is_null() || loader.is_null() {
            return Status::NullArgument.code();
        }
        let result = with_loader(loader, |handle, state| {
            let candidate = state
                .loader
                .candidate_at(index)
                .map_err(|report| report.current_context().clone())?;
            let key = candidate.discovery_index();
            let desc = candidate.shared_description();
            let raw = state.acquire_description(key, &desc)?;
            register_description(raw, handle.clone());
            Ok(raw)
        });
        match result {
            Ok(raw) => {
                unsafe { *out = raw };
                Status::Ok.code()
            }
            Err(err) => {
                debug!("MFXEnumImplementations({index}): {}", err);
                err.code()
            }
        }
    })
}

/// Release a description obtained from [`MFXEnumImplementations`].
///
/// Releasing twice is harmless.
#[unsafe(no_mangle)]
pub extern "C" fn MFXReleaseImplDescription(handle: *const RawImplDescription) -> RawStatus {
    guarded(Status::Unknown.code(), || {
        if handle.is_null() {
            return Status::NullArgument.code();
        }
        let Some(loader) = lookup_description(handle) else {
            return Status::InvalidHandle.code();
        };
        if loader.lock().release_description(handle) {
            Status::Ok.code()
        } else {
            Status::InvalidHandle.code()
        }
    })
}

/// Load the `index`-th matching implementation and start a session on it.
///
/// # Safety
/// `out` must be null or writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn MFXCreateSession(
    loader: *mut LoaderHandle,
    index: u32,
    out: *mut *mut SessionHandle,
) -> RawStatus {
    guarded(Status::Unknown.code(), || {
        if out.is_null() || loader.is_null() {
            return Status::NullArgument.code();
        }
        let result = with_loader(loader, |_, state| {
            state
                .loader
                .create_session(index)
                .map_err(|report| {
                    debug!("MFXCreateSession({index}): {:?}", report);
                    report.current_context().clone()
                })
        });
        match result {
            Ok(session) => {
                unsafe { *out = register_session(session) };
                Status::Ok.code()
            }
            Err(err) => err.code(),
        }
    })
}

/// Close a session created by [`MFXCreateSession`].
#[unsafe(no_mangle)]
pub extern "C" fn MFXClose(session: *mut SessionHandle) -> RawStatus {
    guarded(Status::Unknown.code(), || {
        if session.is_null() {
            return Status::NullArgument.code();
        }
        let Some(session) = unregister_session(session) else {
            return Status::InvalidHandle.code();
        };
        match session.close() {
            Ok(()) => Status::Ok.code(),
            Err(report) => report.current_context().code(),
        }
    })
}
