use serde::{Deserialize, Serialize};
use std::fmt;

/// Media API version reported by an implementation.
///
/// Field order gives the derived ordering: major first, then minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Decode the packed `major << 16 | minor` form used by filter values.
    pub const fn from_u32(version: u32) -> Self {
        Self {
            major: (version >> 16) as u16,
            minor: (version & 0xFFFF) as u16,
        }
    }

    pub const fn as_u32(self) -> u32 {
        ((self.major as u32) << 16) | self.minor as u32
    }

    /// Whether an implementation at this version serves a caller asking for
    /// `requested`: same major, at least the requested minor.
    pub fn satisfies(self, requested: ApiVersion) -> bool {
        self.major == requested.major && self.minor >= requested.minor
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::new(2, 0)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
