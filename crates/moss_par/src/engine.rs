//! The placement search engine.
//!
//! Starting from a greedy initial placement (rarest compatibility class
//! first), the engine repeatedly mutates the mate relation — swapping two
//! placed cells or moving a cell to a free site — and accepts or rejects
//! each move with an annealing acceptance rule. The cost function is the
//! number of required netlist edges with no matching available edge
//! between the mates; a cost of zero is a legal placement and terminates
//! the search.
//!
//! The engine is deterministic: the random source is a [`StdRng`] seeded
//! from [`EngineConfig::seed`], and no hash-map iteration order reaches
//! any decision.

use crate::build::{entity_name, PlacementGraphs};
use crate::graph::{NodeId, ParEdge};
use moss_common::{Interner, MossResult};
use moss_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use moss_netlist::Module;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// How many random candidates a single mutation proposal may try before
/// giving up for this iteration.
const MAX_MOVE_ATTEMPTS: u32 = 16;

/// Search configuration.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Seed for the search's random source. Fixed by default so repeated
    /// runs on the same netlist produce the same placement.
    pub seed: u64,
    /// Iteration budget; exceeding it without reaching cost zero fails
    /// the solve.
    pub max_iterations: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iterations: 10_000,
        }
    }
}

/// A single reversible change to the mate relation.
#[derive(Clone, Copy, Debug)]
enum Mutation {
    /// Move netlist node `n` from device node `from` to the free device
    /// node `to`.
    Move {
        n: NodeId,
        from: NodeId,
        to: NodeId,
    },
    /// Exchange the sites of netlist nodes `a` (on `a_site`) and `b` (on
    /// `b_site`).
    Swap {
        a: NodeId,
        b: NodeId,
        a_site: NodeId,
        b_site: NodeId,
    },
}

/// The placement search engine. Owns the random source and the
/// per-node candidate pools for the duration of one solve.
pub struct PlaceEngine<'a> {
    graphs: &'a mut PlacementGraphs,
    module: &'a Module,
    interner: &'a Interner,
    rng: StdRng,
    max_iterations: u32,
    /// Compatible device nodes per netlist node, in device-node order.
    candidates: Vec<Vec<NodeId>>,
}

impl<'a> PlaceEngine<'a> {
    /// Creates an engine over freshly built graphs.
    pub fn new(
        graphs: &'a mut PlacementGraphs,
        module: &'a Module,
        interner: &'a Interner,
        config: &EngineConfig,
    ) -> Self {
        let mut candidates = Vec::with_capacity(graphs.netlist.node_count());
        for n in graphs.netlist.node_ids() {
            let pool: Vec<NodeId> = graphs
                .device
                .node_ids()
                .filter(|&d| graphs.compatible(n, d))
                .collect();
            candidates.push(pool);
        }
        Self {
            graphs,
            module,
            interner,
            rng: StdRng::seed_from_u64(config.seed),
            max_iterations: config.max_iterations,
            candidates,
        }
    }

    /// Runs the search. Returns `Ok(true)` on a legal placement; on
    /// failure the partial placement is left in the graphs for reporting.
    pub fn place(&mut self, sink: &DiagnosticSink) -> MossResult<bool> {
        if !self.initial_placement(sink) {
            return Ok(false);
        }
        Ok(self.optimize(sink))
    }

    /// Greedy initial placement, rarest class first.
    ///
    /// Rarity is the size of a node's candidate pool, so `LOC`-constrained
    /// cells (pool of one) always claim their site before anything else
    /// can take it.
    fn initial_placement(&mut self, sink: &DiagnosticSink) -> bool {
        let mut order: Vec<NodeId> = self.graphs.netlist.node_ids().collect();
        order.sort_by_key(|n| (self.candidates[n.as_raw() as usize].len(), n.as_raw()));

        let mut unplaced = Vec::new();
        for n in order {
            let free = self.candidates[n.as_raw() as usize]
                .iter()
                .copied()
                .find(|&d| self.graphs.device.node(d).mate().is_none());
            match free {
                Some(d) => self.graphs.set_mate(n, d),
                None => unplaced.push(n),
            }
        }
        if unplaced.is_empty() {
            return true;
        }

        unplaced.sort_by_key(|n| n.as_raw());
        let mut diag = Diagnostic::error(
            DiagnosticCode::new(Category::Placement, 1),
            format!(
                "cannot place design: no free compatible site for {} netlist entit{} \
                 (device too small or wrong part?)",
                unplaced.len(),
                if unplaced.len() == 1 { "y" } else { "ies" }
            ),
        );
        for &n in &unplaced {
            let node = self.graphs.netlist.node(n);
            let name = entity_name(self.module, *node.payload());
            let wants = node
                .labels()
                .first()
                .map(|&l| self.graphs.label_desc(l).to_owned())
                .unwrap_or_else(|| "unknown".to_owned());
            diag = diag.with_note(format!("cell \"{name}\" has no free {wants} site"));
        }
        sink.emit(diag);
        false
    }

    /// The annealing loop over the unroutable-edge cost.
    fn optimize(&mut self, sink: &DiagnosticSink) -> bool {
        let mut current = self.unroutable_edges();
        if current.is_empty() {
            return true;
        }

        let total = self.max_iterations.max(1);
        for iteration in 0..total {
            // Linear cooling; only the terminal behaviour is contractual.
            let temperature = 1.0 - iteration as f64 / total as f64;

            let movable = self.movable_endpoints(&current);
            if movable.is_empty() {
                break;
            }
            let n = movable[self.rng.gen_range(0..movable.len())];
            let Some(mutation) = self.propose(n) else {
                continue;
            };

            self.apply(mutation);
            let next = self.unroutable_edges();
            let delta = next.len() as i64 - current.len() as i64;
            if self.accept(delta, temperature) {
                current = next;
                if current.is_empty() {
                    return true;
                }
            } else {
                self.revert(mutation);
            }
        }

        let mut diag = Diagnostic::error(
            DiagnosticCode::new(Category::Routing, 1),
            format!(
                "placement search failed: {} unroutable connection(s) remain \
                 after {} iteration(s)",
                current.len(),
                total
            ),
        );
        for e in &current {
            diag = diag.with_note(self.describe_edge(e));
        }
        sink.emit(diag);
        false
    }

    /// Collects every required edge with no matching available edge
    /// between the current mates, in netlist order.
    fn unroutable_edges(&self) -> Vec<ParEdge> {
        let mut out = Vec::new();
        for (_, node) in self.graphs.netlist.nodes() {
            for &e in node.edges() {
                let from_mate = self.graphs.netlist.node(e.from).mate();
                let to_mate = self.graphs.netlist.node(e.to).mate();
                let (Some(df), Some(dt)) = (from_mate, to_mate) else {
                    out.push(e);
                    continue;
                };
                if !self.graphs.device.has_edge(df, dt, e.src_port, e.dst_port) {
                    out.push(e);
                }
            }
        }
        out
    }

    /// Endpoints of unroutable edges that have more than one candidate
    /// site, deduplicated in first-seen order.
    fn movable_endpoints(&self, edges: &[ParEdge]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for e in edges {
            for n in [e.from, e.to] {
                if self.candidates[n.as_raw() as usize].len() > 1 && seen.insert(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    /// Proposes a move or swap for netlist node `n`, chosen uniformly from
    /// its label-compatible pool.
    fn propose(&mut self, n: NodeId) -> Option<Mutation> {
        let d_old = self.graphs.netlist.node(n).mate()?;
        let pool = &self.candidates[n.as_raw() as usize];
        if pool.len() < 2 {
            return None;
        }
        for _ in 0..MAX_MOVE_ATTEMPTS {
            let d_new = pool[self.rng.gen_range(0..pool.len())];
            if d_new == d_old {
                continue;
            }
            match self.graphs.device.node(d_new).mate() {
                None => {
                    return Some(Mutation::Move {
                        n,
                        from: d_old,
                        to: d_new,
                    })
                }
                Some(o) => {
                    // A swap is only legal if the displaced node can live
                    // on our current site.
                    if self.graphs.compatible(o, d_old) {
                        return Some(Mutation::Swap {
                            a: n,
                            b: o,
                            a_site: d_old,
                            b_site: d_new,
                        });
                    }
                }
            }
        }
        None
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Move { n, to, .. } => self.graphs.set_mate(n, to),
            Mutation::Swap {
                a, b, a_site, b_site,
            } => {
                self.graphs.set_mate(a, b_site);
                self.graphs.set_mate(b, a_site);
            }
        }
    }

    fn revert(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Move { n, from, .. } => self.graphs.set_mate(n, from),
            Mutation::Swap {
                a, b, a_site, b_site,
            } => {
                self.graphs.set_mate(a, a_site);
                self.graphs.set_mate(b, b_site);
            }
        }
    }

    /// Acceptance rule: strictly improving moves always pass; ties pass
    /// with the cooling probability (exploration early, exploitation
    /// late); worsening moves pass with the Metropolis probability.
    fn accept(&mut self, delta: i64, temperature: f64) -> bool {
        if delta < 0 {
            return true;
        }
        if temperature <= f64::EPSILON {
            return false;
        }
        if delta == 0 {
            return self.rng.gen::<f64>() < temperature;
        }
        self.rng.gen::<f64>() < (-(delta as f64) / temperature).exp()
    }

    fn describe_edge(&self, e: &ParEdge) -> String {
        let from = entity_name(self.module, *self.graphs.netlist.node(e.from).payload());
        let to = entity_name(self.module, *self.graphs.netlist.node(e.to).payload());
        format!(
            "{from}.{} -> {to}.{}",
            self.interner.resolve(e.src_port),
            self.interner.resolve(e.dst_port)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_graphs, NetEntity};
    use moss_device::{Device, Part};
    use moss_netlist::{Cell, CellType};

    fn run(
        module: &Module,
        device: &Device,
        config: &EngineConfig,
    ) -> (crate::build::BuiltGraphs, bool, DiagnosticSink) {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut built = build_graphs(module, device, &interner, &sink)
            .unwrap()
            .expect("graphs should build");
        let ok = {
            let mut engine = PlaceEngine::new(&mut built.graphs, module, &interner, config);
            engine.place(&sink).unwrap()
        };
        (built, ok, sink)
    }

    fn passthrough() -> Module {
        let mut m = Module::new("top");
        let n = m.add_net(Some("x"));
        m.add_cell(
            Cell::new("ib", CellType::Ibuf)
                .with_loc("P2")
                .output("OUT", n),
        );
        m.add_cell(Cell::new("ob", CellType::Obuf).with_loc("P3").input("IN", n));
        m
    }

    fn mated_site_name(
        built: &crate::build::BuiltGraphs,
        device: &Device,
        cell_index: usize,
    ) -> String {
        let node = built.cell_nodes[cell_index];
        let mate = built.graphs.netlist.node(node).mate().unwrap();
        let site = *built.graphs.device.node(mate).payload();
        device.site(site).name.clone()
    }

    #[test]
    fn passthrough_places_on_requested_pins() {
        let device = Device::new(Part::Slg46620);
        let m = passthrough();
        let (built, ok, sink) = run(&m, &device, &EngineConfig::default());
        assert!(ok);
        assert!(!sink.has_errors());
        assert_eq!(mated_site_name(&built, &device, 0), "P2");
        assert_eq!(mated_site_name(&built, &device, 1), "P3");
        built.graphs.verify_mates().unwrap();
    }

    #[test]
    fn power_pseudo_nodes_are_mated_to_rails() {
        let device = Device::new(Part::Slg46620);
        let m = passthrough();
        let (built, ok, _) = run(&m, &device, &EngineConfig::default());
        assert!(ok);
        let vdd_mate = built.graphs.netlist.node(built.vdd_node).mate().unwrap();
        let gnd_mate = built.graphs.netlist.node(built.gnd_node).mate().unwrap();
        assert_eq!(*built.graphs.device.node(vdd_mate).payload(), device.vdd());
        assert_eq!(*built.graphs.device.node(gnd_mate).payload(), device.gnd());
    }

    #[test]
    fn deterministic_under_fixed_seed() {
        let device = Device::new(Part::Slg46620);
        let mut m = Module::new("top");
        // Unconstrained cells so the engine actually has freedom.
        let clk = m.add_net(Some("clk"));
        let d = m.add_net(Some("d"));
        let q = m.add_net(Some("q"));
        m.add_cell(Cell::new("ib_clk", CellType::Ibuf).output("OUT", clk));
        m.add_cell(Cell::new("ib_d", CellType::Ibuf).output("OUT", d));
        m.add_cell(
            Cell::new("ff", CellType::Dff)
                .input("CLK", clk)
                .input("D", d)
                .output("Q", q),
        );
        m.add_cell(Cell::new("ob_q", CellType::Obuf).input("IN", q));

        let config = EngineConfig {
            seed: 7,
            max_iterations: 5_000,
        };
        let (built_a, ok_a, _) = run(&m, &device, &config);
        let (built_b, ok_b, _) = run(&m, &device, &config);
        assert!(ok_a && ok_b);
        for i in 0..m.cell_count() {
            assert_eq!(
                mated_site_name(&built_a, &device, i),
                mated_site_name(&built_b, &device, i)
            );
        }
    }

    #[test]
    fn infeasible_design_reports_unplaceable_cells() {
        let device = Device::new(Part::Slg46140);
        let mut m = Module::new("top");
        for i in 0..4 {
            m.add_cell(Cell::new(format!("cnt{i}"), CellType::Count8));
        }
        let (_, ok, sink) = run(&m, &device, &EngineConfig::default());
        assert!(!ok);
        assert!(sink.has_errors());

        let diags = sink.diagnostics();
        let diag = &diags[0];
        assert!(diag.message.contains("cannot place design"));
        // Two counter sites exist, so exactly two cells are unplaceable.
        assert_eq!(diag.notes.len(), 2);
        assert!(diag.notes.iter().all(|n| n.contains("COUNT8")));
    }

    #[test]
    fn conflicting_loc_constraints_are_unplaceable() {
        let device = Device::new(Part::Slg46620);
        let mut m = Module::new("top");
        let a = m.add_net(None);
        let b = m.add_net(None);
        m.add_cell(
            Cell::new("ib_a", CellType::Ibuf)
                .with_loc("P2")
                .output("OUT", a),
        );
        m.add_cell(
            Cell::new("ib_b", CellType::Ibuf)
                .with_loc("P2")
                .output("OUT", b),
        );
        let (_, ok, sink) = run(&m, &device, &EngineConfig::default());
        assert!(!ok);
        let diags = sink.diagnostics();
        assert_eq!(diags[0].notes.len(), 1);
        assert!(diags[0].notes[0].contains("ib_b"));
    }

    #[test]
    fn rare_nodes_place_first() {
        let device = Device::new(Part::Slg46620);
        let mut m = Module::new("top");
        let n0 = m.add_net(None);
        let n1 = m.add_net(None);
        // The unconstrained cell comes first in the netlist but must not
        // steal pin 3 from the constrained one.
        m.add_cell(Cell::new("ib_any", CellType::Ibuf).output("OUT", n0));
        m.add_cell(
            Cell::new("ib_p3", CellType::Ibuf)
                .with_loc("P3")
                .output("OUT", n1),
        );
        let (built, ok, _) = run(&m, &device, &EngineConfig::default());
        assert!(ok);
        assert_eq!(mated_site_name(&built, &device, 1), "P3");
        assert_ne!(mated_site_name(&built, &device, 0), "P3");
    }

    #[test]
    fn optimizer_recovers_routability_by_swapping() {
        let device = Device::new(Part::Slg46620);
        let mut m = Module::new("top");
        // Nine constant-driven buffers soak up every matrix-0 pin, so the
        // greedy pass strands the reference-driven buffer on a matrix-1
        // pin its analog source cannot reach. Only a swap fixes that.
        for i in 0..9 {
            m.add_cell(Cell::new(format!("pad{i}"), CellType::Obuf).input_const("IN", true));
        }
        let v = m.add_net(Some("v"));
        m.add_cell(Cell::new("vr", CellType::Vref).output("VOUT", v));
        m.add_cell(
            Cell::new("ob_v", CellType::Obuf)
                .with_param("IBUF_TYPE", "ANALOG")
                .input("IN", v),
        );

        let (built, ok, sink) = run(&m, &device, &EngineConfig::default());
        assert!(ok, "{:?}", sink.diagnostics());

        // The reference-driven buffer ended up on a matrix-0 pin.
        let ob_v = built.cell_nodes[10];
        let mate = built.graphs.netlist.node(ob_v).mate().unwrap();
        let site = *built.graphs.device.node(mate).payload();
        assert!(matches!(
            device.site(site).kind,
            moss_device::SiteKind::Iob { .. }
        ));
        assert_eq!(device.site(site).matrix, 0);
        built.graphs.verify_mates().unwrap();
    }

    #[test]
    fn placement_is_complete_and_bijective() {
        let device = Device::new(Part::Slg46620);
        let mut m = Module::new("top");
        let nets: Vec<_> = (0..4).map(|_| m.add_net(None)).collect();
        for (i, &net) in nets.iter().enumerate() {
            m.add_cell(Cell::new(format!("ib{i}"), CellType::Ibuf).output("OUT", net));
            m.add_cell(Cell::new(format!("ob{i}"), CellType::Obuf).input("IN", net));
        }
        let (built, ok, _) = run(&m, &device, &EngineConfig::default());
        assert!(ok);
        built.graphs.verify_mates().unwrap();
        let mut seen = std::collections::HashSet::new();
        for (_, node) in built.graphs.netlist.nodes() {
            let mate = node.mate().expect("every netlist node is mated");
            assert!(seen.insert(mate), "no device node is mated twice");
            if let NetEntity::Cell(_) = node.payload() {
                // All cells here are IOBs; their mates must be IOB sites.
                let site = *built.graphs.device.node(mate).payload();
                assert!(matches!(
                    device.site(site).kind,
                    moss_device::SiteKind::Iob { .. }
                ));
            }
        }
    }
}
