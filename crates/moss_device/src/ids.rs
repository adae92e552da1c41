//! Opaque ID newtype for device sites.

use serde::{Deserialize, Serialize};

/// Opaque, copyable ID for a site in a device catalog.
///
/// A thin `u32` wrapper used as an arena index into
/// [`Device::sites`](crate::Device). Graph payloads and configuration
/// records refer to sites through this id, never through references, so
/// the catalog can outlive the graphs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SiteId(u32);

impl SiteId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let id = SiteId::from_raw(17);
        assert_eq!(id.as_raw(), 17);
    }

    #[test]
    fn equality_and_display() {
        assert_eq!(SiteId::from_raw(3), SiteId::from_raw(3));
        assert_ne!(SiteId::from_raw(3), SiteId::from_raw(4));
        assert_eq!(format!("{}", SiteId::from_raw(8)), "8");
    }

    #[test]
    fn serde_roundtrip() {
        let id = SiteId::from_raw(5);
        let json = serde_json::to_string(&id).unwrap();
        let back: SiteId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
