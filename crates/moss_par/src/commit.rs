//! The commit stage: imprints a legal placement onto the device catalog.
//!
//! Walks every mated pair and writes the netlist's intent into the mated
//! site's configuration record: operating mode and parameters from the
//! cell, input-mux selections from the required edges (constant-driven
//! inputs resolve to the VDD/GND rails), and a per-matrix tally of the
//! routing resources consumed. Committing the same placement twice yields
//! the same device state.

use crate::build::{BuiltGraphs, NetEntity};
use moss_common::{InternalError, Interner, MossResult};
use moss_device::{Device, IbufType, IobMode, SignalSource, SiteConfig, SiteId};
use moss_netlist::{Cell, CellType, Module};

/// Routing resources consumed by a committed placement, tallied per
/// matrix of the consuming input mux.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RouteUsage {
    /// Routes used per matrix.
    pub matrix: [u32; 2],
}

impl RouteUsage {
    /// Total routes used across all matrices.
    pub fn total(&self) -> u32 {
        self.matrix.iter().sum()
    }
}

/// Commits the placement held in `built` into the device configuration.
///
/// Must only be called on a legal (cost-zero) placement; an unmated
/// netlist node here is an internal error, not a user error.
pub fn commit(
    built: &BuiltGraphs,
    module: &Module,
    device: &mut Device,
    interner: &Interner,
) -> MossResult<RouteUsage> {
    // First pass: mark sites used and imprint per-cell configuration.
    for (_, node) in built.graphs.netlist.nodes() {
        let mate = node.mate().ok_or_else(|| {
            InternalError::new(format!(
                "commit on incomplete placement: \"{}\" has no mate",
                crate::build::entity_name(module, *node.payload())
            ))
        })?;
        let site_id = *built.graphs.device.node(mate).payload();
        match node.payload() {
            NetEntity::Vdd | NetEntity::Gnd => {
                device.site_mut(site_id).used = true;
            }
            NetEntity::Cell(cell_id) => {
                imprint_cell(device, site_id, module.cell(*cell_id))?;
            }
        }
    }

    // Second pass: realise every required edge as an input-mux selection
    // on the destination site.
    let mut usage = RouteUsage::default();
    for (_, node) in built.graphs.netlist.nodes() {
        for e in node.edges() {
            let src_site = mated_site(built, e.from)?;
            let dst_site = mated_site(built, e.to)?;
            let src = SignalSource::new(src_site, e.src_port);
            wire_input(device, dst_site, interner.resolve(e.dst_port), src)?;
            let matrix = device.site(dst_site).matrix as usize;
            usage.matrix[matrix] += 1;
        }
    }

    Ok(usage)
}

fn mated_site(built: &BuiltGraphs, n: crate::graph::NodeId) -> MossResult<SiteId> {
    let mate = built
        .graphs
        .netlist
        .node(n)
        .mate()
        .ok_or_else(|| InternalError::new("commit on incomplete placement"))?;
    Ok(*built.graphs.device.node(mate).payload())
}

/// Sets a site's mode and static configuration from the cell occupying it.
fn imprint_cell(device: &mut Device, site_id: SiteId, cell: &Cell) -> MossResult<()> {
    let site = device.site_mut(site_id);
    site.used = true;
    match (&mut site.config, cell.ty) {
        (SiteConfig::Iob(cfg), CellType::Ibuf) => {
            cfg.mode = IobMode::Input;
            cfg.ibuf_type = ibuf_type_param(cell);
        }
        (SiteConfig::Iob(cfg), CellType::Obuf) => {
            cfg.mode = IobMode::Output;
            cfg.ibuf_type = ibuf_type_param(cell);
        }
        (SiteConfig::Iob(cfg), CellType::Iobuf) => {
            cfg.mode = IobMode::Bidirectional;
            cfg.ibuf_type = ibuf_type_param(cell);
        }
        (SiteConfig::Lut(cfg), ty) if ty.lut_inputs().is_some() => {
            cfg.init = parse_init(cell.param("INIT"));
        }
        (SiteConfig::Dff(cfg), CellType::Dff | CellType::Dffsr) => {
            cfg.init_value = cell.param_is_set("INIT");
        }
        (SiteConfig::Acmp(_), CellType::Acmp) => {}
        (SiteConfig::Osc(cfg), ty) if ty.is_oscillator() => {
            cfg.power_down_en = cell.param_is_set("PWRDN_EN");
            cfg.auto_power_down = cell.param_is_set("AUTO_PWRDN");
        }
        (SiteConfig::Counter(cfg), CellType::Count8 | CellType::Count14) => {
            cfg.count_to = parse_u16(cell.param("COUNT_TO"));
        }
        (SiteConfig::Vref(cfg), CellType::Vref) => {
            cfg.target_mv = parse_u16(cell.param("VREF_MV"));
        }
        (SiteConfig::Pga(cfg), CellType::Pga) => {
            cfg.gain_x100 = cell
                .param("GAIN_X100")
                .and_then(|v| v.parse().ok())
                .unwrap_or(100);
        }
        _ => {
            return Err(InternalError::new(format!(
                "cell \"{}\" ({}) committed to incompatible site \"{}\"",
                cell.name, cell.ty, site.name
            )))
        }
    }
    Ok(())
}

/// Selects the destination input mux for one realised edge.
fn wire_input(
    device: &mut Device,
    site_id: SiteId,
    port: &str,
    src: SignalSource,
) -> MossResult<()> {
    let site = device.site_mut(site_id);
    let wired = match (&mut site.config, port) {
        (SiteConfig::Iob(cfg), "IN") => {
            cfg.output_src = Some(src);
            true
        }
        (SiteConfig::Lut(cfg), "IN0") => {
            cfg.input_src[0] = Some(src);
            true
        }
        (SiteConfig::Lut(cfg), "IN1") => {
            cfg.input_src[1] = Some(src);
            true
        }
        (SiteConfig::Lut(cfg), "IN2") => {
            cfg.input_src[2] = Some(src);
            true
        }
        (SiteConfig::Lut(cfg), "IN3") => {
            cfg.input_src[3] = Some(src);
            true
        }
        (SiteConfig::Dff(cfg), "D") => {
            cfg.data_src = Some(src);
            true
        }
        (SiteConfig::Dff(cfg), "CLK") => {
            cfg.clock_src = Some(src);
            true
        }
        (SiteConfig::Dff(cfg), "nSR") => {
            cfg.set_reset_src = Some(src);
            true
        }
        (SiteConfig::Acmp(cfg), "VIN") => {
            cfg.input_src = Some(src);
            true
        }
        (SiteConfig::Acmp(cfg), "VREF") => {
            cfg.vref_src = Some(src);
            true
        }
        (SiteConfig::Acmp(cfg), "PWREN") => {
            cfg.power_en = Some(src);
            true
        }
        (SiteConfig::Osc(cfg), "PWRDN") => {
            cfg.power_down = Some(src);
            true
        }
        (SiteConfig::Counter(cfg), "CLK") => {
            cfg.clock_src = Some(src);
            true
        }
        (SiteConfig::Counter(cfg), "RST") => {
            cfg.reset_src = Some(src);
            true
        }
        (SiteConfig::Pga(cfg), "VIN") => {
            cfg.input_src = Some(src);
            true
        }
        _ => false,
    };
    if wired {
        Ok(())
    } else {
        Err(InternalError::new(format!(
            "no input mux for port \"{port}\" on site \"{}\"",
            site.name
        )))
    }
}

fn ibuf_type_param(cell: &Cell) -> IbufType {
    if cell.param("IBUF_TYPE") == Some("ANALOG") {
        IbufType::Analog
    } else {
        IbufType::Digital
    }
}

/// Parses a LUT INIT parameter: a bit string (`"0110"`) or a decimal
/// value. Unparseable or absent values read as zero.
fn parse_init(value: Option<&str>) -> u16 {
    let Some(value) = value else { return 0 };
    if value.len() > 1 && value.bytes().all(|b| b == b'0' || b == b'1') {
        u16::from_str_radix(value, 2).unwrap_or(0)
    } else {
        value.parse().unwrap_or(0)
    }
}

fn parse_u16(value: Option<&str>) -> u16 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}
