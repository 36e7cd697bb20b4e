use serde::{Serialize, Serializer};
use std::fmt;
use ulid::Ulid;

/// Correlation id carried by every [`super::Request`] and attached to every
/// log event emitted for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Ulid);

impl RequestId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Adopt a caller-supplied id. Anything that is not a ULID is ignored.
    #[must_use]
    pub fn adopt(value: &str) -> Option<Self> {
        Ulid::from_string(value.trim()).ok().map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
