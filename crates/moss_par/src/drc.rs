//! Post-PAR design-rule checks.
//!
//! A fixed catalog of device-specific legality rules that the graph
//! search cannot express as label or edge constraints. Every firing rule
//! emits a named diagnostic; error-severity rules fail the solve (the CLI
//! turns that into a non-zero exit), warnings never alter control flow.
//!
//! Rule catalog:
//! - `D001` (error): netlist node with no mate.
//! - `D002` (warning): node drives no load (power rails, sites without
//!   outputs, and pad-driving IOBs are exempt).
//! - `D003` (error): IOB driven by an analog entity without
//!   `IBUF_TYPE = ANALOG`.
//! - `D004` (error): comparators disagree about the shared ACMP0 input
//!   mux (SLG46620-class parts).
//! - `D005` (info): ACMP0 owner configuration synthesised because the
//!   shared mux is used but ACMP0 is not instantiated.
//! - `D006` (error): multiple oscillators power down from different
//!   non-constant signals.

use crate::build::{entity_name, BuiltGraphs, NetEntity};
use moss_common::Interner;
use moss_device::{Device, SignalSource};
use moss_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use moss_netlist::Module;

fn code(number: u16) -> DiagnosticCode {
    DiagnosticCode::new(Category::Drc, number)
}

/// Runs the whole DRC catalog over a committed placement.
///
/// Takes the device mutably because the shared-mux rule may synthesise
/// the ACMP0 owner configuration.
pub fn run_drc(
    built: &BuiltGraphs,
    module: &Module,
    device: &mut Device,
    interner: &Interner,
    sink: &DiagnosticSink,
) {
    check_mates_and_loads(built, module, device, sink);
    check_analog_ibufs(device, interner, sink);
    check_shared_acmp_mux(built, module, device, interner, sink);
    check_oscillator_power_down(device, interner, sink);
}

/// Unmated nodes are fatal; mated nodes that drive nothing warn unless
/// the silence is structural (power rails, output-less sites, IOBs that
/// drive the pad).
fn check_mates_and_loads(
    built: &BuiltGraphs,
    module: &Module,
    device: &Device,
    sink: &DiagnosticSink,
) {
    for (_, node) in built.graphs.netlist.nodes() {
        let name = entity_name(module, *node.payload());
        let Some(mate) = node.mate() else {
            sink.error(
                code(1),
                format!("node \"{name}\" is not mapped to any site in the device"),
            );
            continue;
        };
        let site = device.site(*built.graphs.device.node(mate).payload());

        if site.kind.is_power_rail() {
            continue;
        }
        if site.kind.output_ports().is_empty() {
            continue;
        }
        if let NetEntity::Cell(cell_id) = node.payload() {
            if module.cell(*cell_id).ty.is_pad_driving_iob() {
                continue;
            }
        }
        if node.edges().is_empty() {
            sink.warning(code(2), format!("node \"{name}\" has no load"));
        }
    }
}

/// An analog entity driving a pad requires the IOB to be an analog
/// input buffer.
fn check_analog_ibufs(device: &Device, interner: &Interner, sink: &DiagnosticSink) {
    for &(pin, iob_id) in device.iobs() {
        let Some(cfg) = device.site(iob_id).iob() else {
            continue;
        };
        let Some(src) = cfg.output_src else { continue };
        if device.site(src.site).kind.is_analog_source()
            && cfg.ibuf_type != moss_device::IbufType::Analog
        {
            sink.error(
                code(3),
                format!(
                    "pin {pin} is driven by an analog source ({}) but does not have \
                     IBUF_TYPE = ANALOG",
                    device.describe_source(src, interner)
                ),
            );
        }
    }
}

/// On parts where the comparators share ACMP0's input mux, every
/// comparator using the mux must request the same signal; if none of
/// them is ACMP0 itself, the owner configuration is synthesised.
fn check_shared_acmp_mux(
    built: &BuiltGraphs,
    module: &Module,
    device: &mut Device,
    interner: &Interner,
    sink: &DiagnosticSink,
) {
    if !device.part().has_shared_acmp_mux() {
        return;
    }
    let Some(pin6_iob) = device.iob_by_pin(6) else {
        return;
    };
    let pin6 = SignalSource::new(pin6_iob, interner.get_or_intern("OUT"));
    let vdd = device.power_source(interner);

    // Collect each instantiated comparator that routes through the shared
    // mux, with the instance name for diagnostics.
    let mut users: Vec<(String, SignalSource)> = Vec::new();
    for ordinal in 0..device.acmp_count() {
        let acmp_id = device.acmp(ordinal);
        let Some(cfg) = device.site(acmp_id).acmp() else {
            continue;
        };
        let Some(input) = cfg.input_src else { continue };
        if input != pin6 && input != vdd {
            continue;
        }
        let dev_node = built.site_nodes[acmp_id.as_raw() as usize];
        let Some(mate) = built.graphs.device.node(dev_node).mate() else {
            continue;
        };
        let name = entity_name(module, *built.graphs.netlist.node(mate).payload());
        users.push((name, input));
    }

    // All users must agree on the mux setting.
    let mut shared: Option<SignalSource> = None;
    for (_, input) in &users {
        match shared {
            None => shared = Some(*input),
            Some(s) if s == *input => {}
            Some(_) => {
                let mut diag = Diagnostic::error(
                    code(4),
                    "multiple comparators tried to simultaneously use different outputs \
                     from the ACMP0 input mux",
                );
                for (name, input) in &users {
                    diag = diag.with_note(format!(
                        "comparator {name} requested {}",
                        device.describe_source(*input, interner)
                    ));
                }
                sink.emit(diag);
                return;
            }
        }
    }

    // The mux is owned by ACMP0. If nothing instantiated ACMP0 but the
    // mux output is in use, synthesise the owner configuration, powered
    // once the part is out of reset.
    let acmp0 = device.acmp(0);
    let acmp0_unconfigured = device
        .site(acmp0)
        .acmp()
        .map(|cfg| cfg.input_src.is_none())
        .unwrap_or(false);
    if let (true, Some(shared)) = (acmp0_unconfigured, shared) {
        let power = device.por_done_source(interner);
        if let Some(cfg) = device.site_mut(acmp0).acmp_mut() {
            cfg.input_src = Some(shared);
            cfg.power_en = Some(power);
        }
        sink.info(
            code(5),
            "enabling ACMP0 and configuring its input mux: the mux output is used \
             but ACMP0 is not instantiated",
        );
    }
}

/// Oscillators with power-down enabled from non-constant sources must
/// all share the same power-down signal.
fn check_oscillator_power_down(device: &Device, interner: &Interner, sink: &DiagnosticSink) {
    let mut powerdowns: Vec<(String, SignalSource)> = Vec::new();
    for osc_id in device.oscillators() {
        let site = device.site(osc_id);
        let Some(cfg) = site.osc() else { continue };
        if !site.is_used() || !cfg.power_down_en {
            continue;
        }
        // An unconfigured or rail-tied power-down is constant and exempt.
        let Some(pd) = cfg.power_down else { continue };
        if device.source_is_power_rail(pd) {
            continue;
        }
        powerdowns.push((site.name.clone(), pd));
    }

    // Scan for a shared source, treating a rail (or nothing) as "unset".
    let mut src: Option<SignalSource> = None;
    let mut ok = true;
    for (_, pd) in &powerdowns {
        if src.map_or(true, |s| device.source_is_power_rail(s)) {
            src = Some(*pd);
        }
        if src != Some(*pd) {
            ok = false;
        }
    }
    if !ok {
        let mut diag = Diagnostic::error(
            code(6),
            "multiple oscillators have power-down enabled, but do not share the same \
             power-down signal",
        );
        for (name, pd) in &powerdowns {
            diag = diag.with_note(format!(
                "oscillator {name} power-down is {}",
                device.describe_source(*pd, interner)
            ));
        }
        sink.emit(diag);
    }
}
