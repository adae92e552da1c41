//! Builders translating the netlist and the device catalog into the two
//! parallel graphs.
//!
//! This module is the single place where the label scheme and the port
//! naming convention are defined. Netlist-side labels say "what the cell
//! needs"; device-side labels enumerate everything a site can host (a
//! LUT4 site also carries the LUT3 and LUT2 labels, a DFFSR site the DFF
//! label, a 14-bit counter the 8-bit label). A `LOC` constraint pins a
//! cell to one named site through a dedicated per-site label.

use crate::graph::{GraphPair, Label, NodeId};
use moss_common::{Interner, MossResult};
use moss_device::{Device, SiteId, SiteKind};
use moss_diagnostics::{Category, DiagnosticCode, DiagnosticSink};
use moss_netlist::{CellId, CellType, Module, NetRef, PortDirection};
use std::collections::HashMap;

/// Payload of a netlist-graph node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NetEntity {
    /// A netlist cell.
    Cell(CellId),
    /// The constant-1 pseudo-entity.
    Vdd,
    /// The constant-0 pseudo-entity.
    Gnd,
}

/// The pair of graphs a solve operates on: the netlist graph `N` with
/// [`NetEntity`] payloads and the device graph `D` with [`SiteId`]
/// payloads.
pub type PlacementGraphs = GraphPair<NetEntity, SiteId>;

/// The graphs plus the node lookup tables later stages need.
pub struct BuiltGraphs {
    /// The netlist/device graph pair.
    pub graphs: PlacementGraphs,
    /// Netlist node of each cell, indexed by raw [`CellId`].
    pub cell_nodes: Vec<NodeId>,
    /// The VDD pseudo-node in `N`.
    pub vdd_node: NodeId,
    /// The GND pseudo-node in `N`.
    pub gnd_node: NodeId,
    /// Device node of each site, indexed by raw [`SiteId`].
    pub site_nodes: Vec<NodeId>,
}

/// Returns the diagnostic name of a netlist entity.
pub fn entity_name(module: &Module, entity: NetEntity) -> String {
    match entity {
        NetEntity::Cell(id) => module.cell(id).name.clone(),
        NetEntity::Vdd => "VDD".to_owned(),
        NetEntity::Gnd => "GND".to_owned(),
    }
}

/// Site classes that can host a cell of the given type, preferred first.
fn host_classes(ty: CellType) -> &'static [&'static str] {
    match ty {
        CellType::Ibuf | CellType::Obuf | CellType::Iobuf => &["IOB"],
        CellType::Lut2 => &["LUT2", "LUT3", "LUT4"],
        CellType::Lut3 => &["LUT3", "LUT4"],
        CellType::Lut4 => &["LUT4"],
        CellType::Dff => &["DFF", "DFFSR"],
        CellType::Dffsr => &["DFFSR"],
        CellType::Acmp => &["ACMP"],
        CellType::LfOsc => &["LFOSC"],
        CellType::RingOsc => &["RINGOSC"],
        CellType::RcOsc => &["RCOSC"],
        CellType::Count8 => &["COUNT8", "COUNT14"],
        CellType::Count14 => &["COUNT14"],
        CellType::Vref => &["VREF"],
        CellType::Pga => &["PGA"],
    }
}

/// Classes a device site satisfies: its own class plus everything smaller
/// it can also implement.
fn site_classes(kind: SiteKind) -> Vec<&'static str> {
    let mut classes = vec![kind.class_name()];
    match kind {
        SiteKind::Lut { inputs: 3 } => classes.push("LUT2"),
        SiteKind::Lut { inputs: 4 } => {
            classes.push("LUT3");
            classes.push("LUT2");
        }
        SiteKind::Dff {
            has_set_reset: true,
        } => classes.push("DFF"),
        SiteKind::Counter { bits: 14 } => classes.push("COUNT8"),
        _ => {}
    }
    classes
}

/// All class labels, allocated in this fixed order.
const CLASSES: &[&str] = &[
    "IOB", "LUT2", "LUT3", "LUT4", "DFF", "DFFSR", "ACMP", "LFOSC", "RINGOSC", "RCOSC", "COUNT8",
    "COUNT14", "VREF", "PGA", "VDD", "GND", "POR",
];

/// Builds the netlist and device graphs.
///
/// Returns `Ok(None)` when the netlist itself is unusable (a `LOC`
/// constraint naming an unknown or incompatible site); the problem has
/// already been reported through the sink. Internal errors (label skew,
/// bad graph indices) surface as `Err`.
pub fn build_graphs(
    module: &Module,
    device: &Device,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> MossResult<Option<BuiltGraphs>> {
    let mut graphs = PlacementGraphs::new();

    // Class labels first, in fixed order.
    let mut class_labels: HashMap<&'static str, Label> = HashMap::new();
    for &class in CLASSES {
        class_labels.insert(class, graphs.allocate_label(class)?);
    }

    // One extra label per LOC-constrained site, allocated in cell order.
    let mut loc_labels: HashMap<SiteId, Label> = HashMap::new();
    let mut cell_loc_labels: HashMap<CellId, Label> = HashMap::new();
    let mut loc_errors = false;
    for cell in &module.cells {
        let Some(loc) = &cell.loc else { continue };
        let Some(site_id) = device.site_by_name(loc) else {
            sink.error(
                DiagnosticCode::new(Category::Netlist, 1),
                format!(
                    "cell \"{}\" has LOC constraint \"{loc}\" but {} has no such site",
                    cell.name,
                    device.part()
                ),
            );
            loc_errors = true;
            continue;
        };
        let site_class = device.site(site_id).kind.class_name();
        if !site_classes(device.site(site_id).kind)
            .iter()
            .any(|c| host_classes(cell.ty).contains(c))
        {
            sink.error(
                DiagnosticCode::new(Category::Netlist, 2),
                format!(
                    "cell \"{}\" ({}) has LOC constraint \"{loc}\" naming an incompatible {} site",
                    cell.name,
                    cell.ty,
                    site_class
                ),
            );
            loc_errors = true;
            continue;
        }
        let label = match loc_labels.get(&site_id) {
            Some(&label) => label,
            None => {
                let label = graphs.allocate_label(loc)?;
                loc_labels.insert(site_id, label);
                label
            }
        };
        cell_loc_labels.insert(cell.id, label);
    }
    if loc_errors {
        return Ok(None);
    }

    // Device nodes, one per site in catalog order.
    let mut site_nodes = Vec::with_capacity(device.site_count());
    for site in device.sites() {
        let mut labels: Vec<Label> = site_classes(site.kind)
            .iter()
            .map(|c| class_labels[c])
            .collect();
        if let Some(&loc) = loc_labels.get(&site.id) {
            labels.push(loc);
        }
        site_nodes.push(graphs.device.add_node(site.id, labels));
    }

    // Netlist nodes: one per cell, then the power pseudo-entities.
    let mut cell_nodes = Vec::with_capacity(module.cell_count());
    for cell in &module.cells {
        let labels = match cell_loc_labels.get(&cell.id) {
            Some(&label) => vec![label],
            None => vec![class_labels[host_classes(cell.ty)[0]]],
        };
        cell_nodes.push(graphs.netlist.add_node(NetEntity::Cell(cell.id), labels));
    }
    let vdd_node = graphs
        .netlist
        .add_node(NetEntity::Vdd, vec![class_labels["VDD"]]);
    let gnd_node = graphs
        .netlist
        .add_node(NetEntity::Gnd, vec![class_labels["GND"]]);

    // Required edges: one per net-driven port-to-port connection.
    let out_port = interner.get_or_intern("OUT");
    for net in &module.nets {
        let Some((driver_cell, driver_port)) = module.driver_of(net.id) else {
            continue;
        };
        let src_port = interner.get_or_intern(driver_port);
        let from = cell_nodes[driver_cell.as_raw() as usize];
        for (sink_cell, sink_port) in module.sinks_of(net.id) {
            let to = cell_nodes[sink_cell.as_raw() as usize];
            let dst_port = interner.get_or_intern(sink_port);
            graphs.netlist.add_edge(from, to, src_port, dst_port)?;
        }
    }

    // Constant-driven inputs hang off the power pseudo-nodes.
    for cell in &module.cells {
        for conn in &cell.connections {
            if conn.direction != PortDirection::Input {
                continue;
            }
            if let NetRef::Const(value) = conn.net {
                let from = if value { vdd_node } else { gnd_node };
                let to = cell_nodes[cell.id.as_raw() as usize];
                let dst_port = interner.get_or_intern(&conn.port);
                graphs.netlist.add_edge(from, to, out_port, dst_port)?;
            }
        }
    }

    // Available edges: the fabric is fully crossbarred within legal reach,
    // so reachability is a single-step relation over site pairs.
    for src in device.sites() {
        for dst in device.sites() {
            for &src_port in src.kind.output_ports() {
                for &dst_port in dst.kind.input_ports() {
                    if !reachable(src.kind, src.matrix, dst.kind, dst.matrix, dst_port) {
                        continue;
                    }
                    let from = site_nodes[src.id.as_raw() as usize];
                    let to = site_nodes[dst.id.as_raw() as usize];
                    graphs.device.add_edge(
                        from,
                        to,
                        interner.get_or_intern(src_port),
                        interner.get_or_intern(dst_port),
                    )?;
                }
            }
        }
    }

    Ok(Some(BuiltGraphs {
        graphs,
        cell_nodes,
        vdd_node,
        gnd_node,
        site_nodes,
    }))
}

/// Whether a destination input port is part of the analog mux network.
fn input_is_analog(kind: SiteKind, port: &str) -> bool {
    match kind {
        SiteKind::Acmp => port == "VIN" || port == "VREF",
        SiteKind::Pga => port == "VIN",
        _ => false,
    }
}

/// Single-step reachability through the routing fabric.
///
/// Digital signals cross between matrices freely (the cross-connections
/// are modelled as part of the crossbar and tallied at commit). Analog
/// signals stay within their matrix and only reach analog-capable inputs:
/// the comparator and PGA muxes, plus the IOB pad driver (whose legality
/// as an analog output is a DRC concern, not a routing one). The rails
/// are global.
fn reachable(
    src_kind: SiteKind,
    src_matrix: u8,
    dst_kind: SiteKind,
    dst_matrix: u8,
    dst_port: &str,
) -> bool {
    if src_kind.is_analog_source() {
        let dst_analog_capable = input_is_analog(dst_kind, dst_port)
            || (matches!(dst_kind, SiteKind::Iob { .. }) && dst_port == "IN");
        return dst_analog_capable && src_matrix == dst_matrix;
    }
    if input_is_analog(dst_kind, dst_port) {
        // The analog muxes additionally accept pins and the rails.
        if src_kind.is_power_rail() {
            return true;
        }
        return matches!(src_kind, SiteKind::Iob { .. }) && src_matrix == dst_matrix;
    }
    true
}
