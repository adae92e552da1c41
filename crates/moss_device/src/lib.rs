//! Device catalogs for moss target parts.
//!
//! A [`Device`] is the in-memory model of one physical part: every
//! configurable site, its capabilities, and its mutable configuration
//! state. The catalog is built once per solve, handed to the PAR core,
//! and mutated only by the commit stage; the bitstream emitter renders
//! the committed state.

#![warn(missing_docs)]

pub mod catalog;
pub mod ids;
pub mod part;
pub mod signal;
pub mod site;

pub use catalog::Device;
pub use ids::SiteId;
pub use part::Part;
pub use signal::SignalSource;
pub use site::{
    AcmpConfig, CounterConfig, DffConfig, IbufType, IobConfig, IobMode, LutConfig, OscConfig,
    PgaConfig, Site, SiteConfig, SiteKind, VrefConfig,
};
