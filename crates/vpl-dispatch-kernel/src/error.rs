//! Error and status types for the dispatcher.
//!
//! [`DispatchError`] is the typed failure every layer reports. It carries
//! enough detail for logs, and [`DispatchError::status`] collapses it into the
//! numeric [`Status`] taxonomy exposed at the C boundary.
//!
//! Use [`DispatchResult`] when context should travel with the error:
//!
//! ```rust,ignore
//! use error_stack::{Report, ResultExt};
//! use vpl_dispatch_kernel::error::{DispatchError, DispatchResult};
//!
//! fn pick(index: u32, available: usize) -> DispatchResult<()> {
//!     if index as usize >= available {
//!         return Err(Report::new(DispatchError::IndexOutOfRange { index, available }))
//!             .attach("selecting implementation");
//!     }
//!     Ok(())
//! }
//! ```

use crate::variant::VariantType;
use thiserror::Error;

/// Numeric status codes shared with implementation runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    Ok = 0,
    Unknown = -1,
    NullArgument = -2,
    Unsupported = -3,
    MemoryAllocation = -4,
    InvalidHandle = -6,
    NotFound = -9,
}

impl Status {
    /// The raw `i32` written across the C boundary.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map a raw runtime code onto a known status, if it is one.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Status::Ok,
            -1 => Status::Unknown,
            -2 => Status::NullArgument,
            -3 => Status::Unsupported,
            -4 => Status::MemoryAllocation,
            -6 => Status::InvalidHandle,
            -9 => Status::NotFound,
            _ => return None,
        })
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

/// Dispatcher failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// A required argument was absent.
    #[error("required argument `{0}` is null")]
    NullArgument(&'static str),

    /// The property path does not name a filterable leaf.
    #[error("unknown property path `{0}`")]
    UnknownProperty(String),

    /// The value's type tag differs from the property's expected type.
    #[error("property `{path}` expects {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: VariantType,
        actual: VariantType,
    },

    /// The requested position is past the end of the filtered list.
    #[error("implementation index {index} out of range ({available} available)")]
    IndexOutOfRange { index: u32, available: usize },

    /// No discovered implementation satisfies every filter.
    #[error("no implementation satisfies the configured filters")]
    NoMatchingImplementation,

    /// The chosen implementation could no longer be loaded or resolved.
    #[error("implementation `{0}` is unavailable")]
    ImplementationUnavailable(String),

    /// The implementation's initialize entry point returned a failure code.
    #[error("session initialization failed with status {0}")]
    SessionInit(i32),

    /// The implementation's close entry point returned a failure code.
    #[error("session close failed with status {0}")]
    SessionClose(i32),

    /// A handle was destroyed or never issued by this dispatcher.
    #[error("invalid handle")]
    InvalidHandle,

    /// An allocation could not be satisfied.
    #[error("memory allocation failed: {0}")]
    MemoryAllocation(String),

    /// A description list is longer than the 16-bit count of the C layout.
    #[error("{len} entries exceed the C layout limit of {max}")]
    ListTooLong { len: usize, max: usize },

    /// A panic or other unexpected condition.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Status reported at the C boundary for this error.
    pub fn status(&self) -> Status {
        match self {
            DispatchError::NullArgument(_) => Status::NullArgument,
            DispatchError::UnknownProperty(_)
            | DispatchError::IndexOutOfRange { .. }
            | DispatchError::NoMatchingImplementation
            | DispatchError::ImplementationUnavailable(_) => Status::NotFound,
            DispatchError::TypeMismatch { .. } | DispatchError::ListTooLong { .. } => {
                Status::Unsupported
            }
            DispatchError::InvalidHandle => Status::InvalidHandle,
            DispatchError::MemoryAllocation(_) => Status::MemoryAllocation,
            DispatchError::SessionInit(_)
            | DispatchError::SessionClose(_)
            | DispatchError::Internal(_) => Status::Unknown,
        }
    }

    /// Raw code for the C boundary. Runtime initialization codes pass through.
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::SessionInit(code) | DispatchError::SessionClose(code) => *code,
            other => other.status().code(),
        }
    }
}

/// Result alias carrying an [`error_stack::Report`].
pub type DispatchResult<T> = Result<T, error_stack::Report<DispatchError>>;
