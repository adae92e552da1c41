//! Utilisation and placement reporting.
//!
//! The report *content* is contractual (counts by site class, entity to
//! site mapping); the exact formatting is not.

use crate::build::{entity_name, BuiltGraphs};
use crate::commit::RouteUsage;
use moss_device::Device;
use moss_netlist::Module;
use std::fmt::Write;

/// Renders the device utilisation report: used/total counts per site
/// class plus the per-matrix route tally.
pub fn utilization_report(device: &Device, routes: &RouteUsage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Device utilization for {}:", device.part());
    for (class, used, total) in device.class_counts() {
        let percent = if total == 0 { 0 } else { used * 100 / total };
        let _ = writeln!(out, "    {class:<8} {used:>2}/{total:<2} ({percent}%)");
    }
    for (matrix, used) in routes.matrix.iter().enumerate() {
        if matrix < device.part().matrix_count() as usize {
            let _ = writeln!(out, "    routes (matrix {matrix}): {used}");
        }
    }
    out
}

/// Renders the placement report: one line per netlist entity showing the
/// site it was mapped to, or `(unplaced)` for a failed partial placement.
pub fn placement_report(built: &BuiltGraphs, module: &Module, device: &Device) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Placement report:");
    for (_, node) in built.graphs.netlist.nodes() {
        let name = entity_name(module, *node.payload());
        match node.mate() {
            Some(mate) => {
                let site = *built.graphs.device.node(mate).payload();
                let _ = writeln!(out, "    {name:<24} => {}", device.site(site).name);
            }
            None => {
                let _ = writeln!(out, "    {name:<24} => (unplaced)");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_graphs;
    use crate::commit::commit;
    use crate::engine::{EngineConfig, PlaceEngine};
    use moss_common::Interner;
    use moss_device::Part;
    use moss_diagnostics::DiagnosticSink;
    use moss_netlist::{Cell, CellType};

    #[test]
    fn reports_show_placement_and_usage() {
        let mut device = Device::new(Part::Slg46620);
        let mut m = Module::new("top");
        let n = m.add_net(Some("x"));
        m.add_cell(
            Cell::new("ib", CellType::Ibuf)
                .with_loc("P2")
                .output("OUT", n),
        );
        m.add_cell(Cell::new("ob", CellType::Obuf).with_loc("P3").input("IN", n));

        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut built = build_graphs(&m, &device, &interner, &sink)
            .unwrap()
            .unwrap();
        let ok = {
            let mut engine =
                PlaceEngine::new(&mut built.graphs, &m, &interner, &EngineConfig::default());
            engine.place(&sink).unwrap()
        };
        assert!(ok);
        let routes = commit(&built, &m, &mut device, &interner).unwrap();

        let utilization = utilization_report(&device, &routes);
        assert!(utilization.contains("SLG46620"));
        assert!(utilization.contains("IOB"));
        assert!(utilization.contains("2/18"));
        assert!(utilization.contains("routes (matrix 0): 1"));

        let placement = placement_report(&built, &m, &device);
        assert!(placement.contains("ib"));
        assert!(placement.contains("P2"));
        assert!(placement.contains("ob"));
        assert!(placement.contains("P3"));
        assert!(!placement.contains("(unplaced)"));
    }

    #[test]
    fn failed_placement_is_reported_as_unplaced() {
        let device = Device::new(Part::Slg46140);
        let mut m = Module::new("top");
        for i in 0..4 {
            m.add_cell(Cell::new(format!("cnt{i}"), CellType::Count8));
        }
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut built = build_graphs(&m, &device, &interner, &sink)
            .unwrap()
            .unwrap();
        let ok = {
            let mut engine =
                PlaceEngine::new(&mut built.graphs, &m, &interner, &EngineConfig::default());
            engine.place(&sink).unwrap()
        };
        assert!(!ok);
        let placement = placement_report(&built, &m, &device);
        assert!(placement.contains("(unplaced)"));
    }
}
