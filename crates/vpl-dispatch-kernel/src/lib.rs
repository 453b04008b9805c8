//! vpl-dispatch kernel
//!
//! The pure model of the dispatcher: typed filter values, the property-path
//! namespace, filter configurations, capability descriptors, and the
//! matching and ranking rules that pick an implementation. Nothing here
//! touches the file system or loads code.

// error module
pub mod error;
pub use error::{DispatchError, DispatchResult, Status};

// typed values
pub mod variant;
pub use variant::{PropertyValue, Range32U, VariantType};

pub mod version;
pub use version::ApiVersion;

pub mod codes;

// capability descriptors
pub mod descriptor;
pub use descriptor::{ImplDescription, ImplType};

// property namespace
pub mod property;

// filtering and ranking
pub mod filter;
pub use filter::{FilterConfig, FilterState};

pub mod matcher;

pub mod selection;
pub use selection::{LibPriority, Rankable};
