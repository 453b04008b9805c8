//! vpl-dispatch FFI
//!
//! The C surface of the dispatcher: `MFXLoad`, `MFXUnload`,
//! `MFXCreateConfig`, `MFXSetConfigFilterProperty`, `MFXEnumImplementations`,
//! `MFXReleaseImplDescription`, `MFXCreateSession` and `MFXClose`.
//!
//! Handles are opaque pointers tracked in a process-wide registry. Passing a
//! destroyed or foreign handle yields `InvalidHandle` (-6); passing null where
//! a pointer is required yields `NullArgument` (-2).

pub mod description;
pub mod exports;
pub mod handles;

pub use exports::*;
pub use handles::{ConfigHandle, LoaderHandle, SessionHandle};
