//! Access to implementation binaries.
//!
//! A [`LibraryOpener`] turns a file path into an opened [`Implementation`].
//! The real opener ([`DynamicLibraryOpener`]) loads shared libraries with
//! `libloading`; tests substitute an in-memory opener. Everything above this
//! module (discovery, loader, session) only sees the traits.

mod dynamic;

pub use dynamic::{DynamicImplementation, DynamicLibraryOpener};

use error_stack::Report;
use std::ffi::c_void;
use std::path::Path;
use vpl_dispatch_kernel::{ApiVersion, ImplDescription, ImplType};

/// Per-candidate failure. Discovery absorbs these; session creation reports
/// them as an unavailable implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CandidateError {
    #[error("Failed to load library: {0}")]
    LibraryLoad(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    #[error("API version {found} is older than required {required}")]
    VersionTooLow {
        found: ApiVersion,
        required: ApiVersion,
    },

    #[error("Initialization returned status {0}")]
    InitFailed(i32),
}

pub type CandidateResult<T> = Result<T, Report<CandidateError>>;

/// Entry points every session needs.
pub const REQUIRED_SESSION_FUNCTIONS: &[&str] = &["MFXInitEx", "MFXClose"];

/// Session-level entry points resolved when present.
pub const OPTIONAL_SESSION_FUNCTIONS: &[&str] = &[
    "MFXQueryIMPL",
    "MFXQueryVersion",
    "MFXJoinSession",
    "MFXDisjoinSession",
    "MFXCloneSession",
    "MFXSetPriority",
    "MFXGetPriority",
    "MFXVideoCORE_SetFrameAllocator",
    "MFXVideoCORE_SetHandle",
    "MFXVideoCORE_GetHandle",
    "MFXVideoCORE_SyncOperation",
    "MFXVideoENCODE_Query",
    "MFXVideoENCODE_QueryIOSurf",
    "MFXVideoENCODE_Init",
    "MFXVideoENCODE_Reset",
    "MFXVideoENCODE_Close",
    "MFXVideoENCODE_GetVideoParam",
    "MFXVideoENCODE_GetEncodeStat",
    "MFXVideoENCODE_EncodeFrameAsync",
    "MFXVideoDECODE_Query",
    "MFXVideoDECODE_DecodeHeader",
    "MFXVideoDECODE_QueryIOSurf",
    "MFXVideoDECODE_Init",
    "MFXVideoDECODE_Reset",
    "MFXVideoDECODE_Close",
    "MFXVideoDECODE_GetVideoParam",
    "MFXVideoDECODE_GetDecodeStat",
    "MFXVideoDECODE_SetSkipMode",
    "MFXVideoDECODE_GetPayload",
    "MFXVideoDECODE_DecodeFrameAsync",
    "MFXVideoVPP_Query",
    "MFXVideoVPP_QueryIOSurf",
    "MFXVideoVPP_Init",
    "MFXVideoVPP_Reset",
    "MFXVideoVPP_Close",
    "MFXVideoVPP_GetVideoParam",
    "MFXVideoVPP_GetVPPStat",
    "MFXVideoVPP_RunFrameVPPAsync",
    "MFXMemory_GetSurfaceForVPP",
    "MFXMemory_GetSurfaceForEncode",
    "MFXMemory_GetSurfaceForDecode",
];

/// Untyped exported entry point.
pub type RawFunction = unsafe extern "C" fn();

/// Entry points resolved from one implementation, by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: Vec<(&'static str, RawFunction)>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, function: RawFunction) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = function,
            None => self.entries.push((name, function)),
        }
    }

    pub fn get(&self, name: &str) -> Option<RawFunction> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(n, _)| *n)
    }
}

/// Effective parameters for initializing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitParams {
    pub implementation: ImplType,
    pub version: ApiVersion,
}

impl InitParams {
    pub fn for_description(desc: &ImplDescription) -> Self {
        Self {
            implementation: desc.impl_type,
            version: desc.api_version,
        }
    }
}

/// Session handle returned by an implementation's initialize entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuntimeSession(pub *mut c_void);

// The handle is an opaque token owned by the implementation.
unsafe impl Send for RuntimeSession {}
unsafe impl Sync for RuntimeSession {}

/// One opened implementation binary.
///
/// Dropping it unloads the binary.
pub trait Implementation: Send + Sync {
    fn path(&self) -> &Path;

    /// Ask the implementation to describe itself and copy the answer.
    fn query_description(&self) -> CandidateResult<ImplDescription>;

    /// Resolve the session-level function table.
    fn resolve_functions(&self) -> CandidateResult<FunctionTable>;

    /// Create a runtime session.
    fn initialize(&self, params: &InitParams) -> CandidateResult<RuntimeSession>;

    /// Close a runtime session, returning the runtime's status code.
    fn close(&self, session: RuntimeSession) -> i32;
}

/// Opens implementation binaries.
pub trait LibraryOpener: Send + Sync {
    fn open(&self, path: &Path) -> CandidateResult<Box<dyn Implementation>>;
}
