//! Place-and-route core for the moss toolchain.
//!
//! Takes a synthesised netlist module and a device catalog, and produces
//! a legal mapping of every netlist entity onto a concrete site, a legal
//! routing of every net, and the committed device configuration the
//! bitstream emitter renders.
//!
//! # Pipeline
//!
//! 1. **Build** — translate the netlist and the catalog into two parallel
//!    labelled graphs with a shared label namespace
//! 2. **Place** — greedy initial assignment + annealing refinement over
//!    the unroutable-edge cost
//! 3. **Commit** — imprint the mate relation onto the catalog's mutable
//!    configuration state
//! 4. **DRC** — device-specific legality rules the graph search cannot
//!    express
//!
//! # Usage
//!
//! ```ignore
//! use moss_par::{place_and_route, EngineConfig};
//!
//! let outcome = place_and_route(&module, &mut device, &EngineConfig::default(), &interner, &sink)?;
//! assert!(outcome.success);
//! ```

#![warn(missing_docs)]

pub mod build;
pub mod commit;
pub mod drc;
pub mod engine;
pub mod graph;
pub mod report;

pub use build::{build_graphs, entity_name, BuiltGraphs, NetEntity, PlacementGraphs};
pub use commit::RouteUsage;
pub use engine::{EngineConfig, PlaceEngine};
pub use graph::{GraphPair, Label, NodeId, ParEdge, ParGraph, ParNode};

use moss_common::{Interner, MossResult};
use moss_device::Device;
use moss_diagnostics::DiagnosticSink;
use moss_netlist::Module;

/// The result of one solve.
#[derive(Clone, Debug)]
pub struct ParOutcome {
    /// Whether a legal placement was found and passed the DRC.
    pub success: bool,
    /// Per-matrix route usage (zero when the solve failed before commit).
    pub routes: RouteUsage,
    /// The utilisation report (counts by site class).
    pub utilization_report: String,
    /// The placement report (entity to site mapping); on failure this
    /// shows the partial placement for debugging.
    pub placement_report: String,
}

impl ParOutcome {
    fn failed() -> Self {
        Self {
            success: false,
            routes: RouteUsage::default(),
            utilization_report: String::new(),
            placement_report: String::new(),
        }
    }
}

/// Performs the complete place-and-route flow on one module.
///
/// User-facing problems (unplaceable cells, DRC violations) are reported
/// through the sink and reflected in [`ParOutcome::success`]; `Err` is
/// reserved for internal invariant violations.
pub fn place_and_route(
    module: &Module,
    device: &mut Device,
    config: &EngineConfig,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> MossResult<ParOutcome> {
    // 1. Netlist and device graphs.
    let Some(mut built) = build::build_graphs(module, device, interner, sink)? else {
        return Ok(ParOutcome::failed());
    };

    // 2. Placement search.
    let placed = {
        let mut engine = PlaceEngine::new(&mut built.graphs, module, interner, config);
        engine.place(sink)?
    };
    let placement_report = report::placement_report(&built, module, device);
    if !placed {
        return Ok(ParOutcome {
            placement_report,
            ..ParOutcome::failed()
        });
    }
    built.graphs.verify_mates()?;

    // 3. Commit the mate relation into the catalog.
    let routes = commit::commit(&built, module, device, interner)?;

    // 4. Device-specific legality rules.
    drc::run_drc(&built, module, device, interner, sink);

    Ok(ParOutcome {
        success: !sink.has_errors(),
        routes,
        utilization_report: report::utilization_report(device, &routes),
        placement_report,
    })
}
