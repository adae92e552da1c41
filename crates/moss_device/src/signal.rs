//! Signal sources: a site output identified by site id and port name.

use crate::ids::SiteId;
use moss_common::Ident;
use serde::{Deserialize, Serialize};

/// One output of one site.
///
/// Configuration records (input muxes, power-down selectors) store the
/// signal driving them as a `SignalSource`. Two sources are the same
/// signal iff they compare equal; the DRC's sharing rules rely on this.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct SignalSource {
    /// The driving site.
    pub site: SiteId,
    /// The output port on the driving site (interned).
    pub port: Ident,
}

impl SignalSource {
    /// Creates a signal source.
    pub fn new(site: SiteId, port: Ident) -> Self {
        Self { site, port }
    }
}
