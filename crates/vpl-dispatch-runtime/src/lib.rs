//! vpl-dispatch runtime
//!
//! Finds implementation libraries on disk, validates them, and creates
//! sessions on the one the caller selects. The model (filters, descriptors,
//! ranking) lives in `vpl-dispatch-kernel`; this crate adds the file system,
//! the platform loader, settings and logging.
//!
//! ```rust,ignore
//! use vpl_dispatch_runtime::Loader;
//! use vpl_dispatch_kernel::codes::codec;
//!
//! let mut loader = Loader::from_env();
//! let config = loader.create_config();
//! loader.set_filter_property(
//!     config,
//!     "mfxImplDescription.mfxDecoderDescription.decoder.CodecID",
//!     codec::HEVC.into(),
//! )?;
//! let session = loader.create_session(0)?;
//! ```

pub mod abi;
pub mod backend;
pub mod candidate;
pub mod discovery;
pub mod loader;
pub mod lock;
pub mod logging;
pub mod session;
pub mod settings;

pub use backend::{
    CandidateError, DynamicLibraryOpener, FunctionTable, Implementation, InitParams, LibraryOpener,
    RuntimeSession,
};
pub use candidate::Candidate;
pub use discovery::SearchLocation;
pub use loader::{ConfigId, Loader};
pub use session::Session;
pub use settings::DispatcherSettings;

pub use vpl_dispatch_kernel as kernel;
