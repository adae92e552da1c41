//! The labelled bipartite graph model the PAR engine searches over.
//!
//! Two parallel multi-graphs are built per solve: the netlist graph `N`
//! (required edges, one node per netlist entity) and the device graph `D`
//! (available edges, one node per site). Compatibility between the two
//! sides is expressed through a shared label namespace allocated in
//! lockstep on both graphs; the placement itself is the *mate* relation,
//! a symmetric, bijective node-to-node binding maintained exclusively by
//! [`GraphPair::set_mate`] and [`GraphPair::clear_mate`].

use moss_common::{Ident, InternalError, MossResult};
use std::collections::HashSet;

/// A compatibility-class label shared between the two graphs.
///
/// The same integer denotes the same class in `N` and `D`; allocation out
/// of lockstep is a programmer error detected by
/// [`GraphPair::allocate_label`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Label(u32);

impl Label {
    /// Returns the raw label index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Index of a node within one graph's node table.
///
/// A mate reference stores the `NodeId` of a node in the *other* graph;
/// ids are arena indices, never pointers, so the graphs can be dropped
/// independently of the payloads they reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node id from a raw index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// A directed edge with source and destination port identifiers.
///
/// Ports are interned at build time; equality of `Ident`s is equality of
/// the port names they intern.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ParEdge {
    /// Source node (owner of the edge list).
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
    /// Port name on the source node.
    pub src_port: Ident,
    /// Port name on the destination node.
    pub dst_port: Ident,
}

/// A node in one of the two graphs.
#[derive(Clone, Debug)]
pub struct ParNode<P> {
    payload: P,
    labels: Vec<Label>,
    mate: Option<NodeId>,
    edges: Vec<ParEdge>,
}

impl<P> ParNode<P> {
    /// Returns the opaque payload of this node.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Returns the labels this node satisfies.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Returns the current mate, a node id in the other graph.
    pub fn mate(&self) -> Option<NodeId> {
        self.mate
    }

    /// Returns the outgoing edges of this node.
    pub fn edges(&self) -> &[ParEdge] {
        &self.edges
    }

    /// Returns whether this node carries the given label.
    pub fn has_label(&self, label: Label) -> bool {
        self.labels.contains(&label)
    }
}

/// One of the two parallel graphs.
pub struct ParGraph<P> {
    nodes: Vec<ParNode<P>>,
    label_count: u32,
    edge_set: HashSet<(NodeId, NodeId, Ident, Ident)>,
}

impl<P> ParGraph<P> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            label_count: 0,
            edge_set: HashSet::new(),
        }
    }

    /// Allocates the next label id in this graph.
    ///
    /// Callers must go through [`GraphPair::allocate_label`] so the two
    /// graphs stay in lockstep; this method is exposed for the pair and
    /// for tests.
    pub fn allocate_label(&mut self) -> Label {
        let label = Label(self.label_count);
        self.label_count += 1;
        label
    }

    /// Returns the number of labels allocated so far.
    pub fn label_count(&self) -> u32 {
        self.label_count
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, payload: P, labels: Vec<Label>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ParNode {
            payload,
            labels,
            mate: None,
            edges: Vec::new(),
        });
        id
    }

    /// Returns the node with the given id.
    ///
    /// Panics on an out-of-range id; ids are only minted by this graph, so
    /// that is a programmer error.
    pub fn node(&self, id: NodeId) -> &ParNode<P> {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut ParNode<P> {
        &mut self.nodes[id.0 as usize]
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns an iterator over node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Returns an iterator over `(id, node)` pairs in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &ParNode<P>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Adds a directed edge. Multi-edges (same node pair, different port
    /// pair) are allowed; exact duplicates collapse in the lookup set but
    /// are still recorded on the source node.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        src_port: Ident,
        dst_port: Ident,
    ) -> MossResult<()> {
        let count = self.nodes.len() as u32;
        if from.0 >= count || to.0 >= count {
            return Err(InternalError::new(format!(
                "edge endpoint out of range: {} -> {} with {count} nodes",
                from.0, to.0
            )));
        }
        let edge = ParEdge {
            from,
            to,
            src_port,
            dst_port,
        };
        self.node_mut(from).edges.push(edge);
        self.edge_set.insert((from, to, src_port, dst_port));
        Ok(())
    }

    /// Returns the outgoing edges of a node.
    pub fn edges_from(&self, id: NodeId) -> &[ParEdge] {
        &self.node(id).edges
    }

    /// Returns whether an edge with the given endpoints and port pair
    /// exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId, src_port: Ident, dst_port: Ident) -> bool {
        self.edge_set.contains(&(from, to, src_port, dst_port))
    }

    /// Returns the labels of a node.
    pub fn labels_of(&self, id: NodeId) -> &[Label] {
        self.node(id).labels()
    }

    /// Returns every node carrying the given label, in insertion order.
    pub fn nodes_with_label(&self, label: Label) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, n)| n.has_label(label))
            .map(|(id, _)| id)
            .collect()
    }
}

impl<P> Default for ParGraph<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// The two parallel graphs plus the shared label descriptions.
///
/// All mate manipulation goes through this type so the symmetry and
/// bijectivity invariants hold by construction.
pub struct GraphPair<NP, DP> {
    /// The netlist graph `N` (required edges).
    pub netlist: ParGraph<NP>,
    /// The device graph `D` (available edges).
    pub device: ParGraph<DP>,
    label_descs: Vec<String>,
}

impl<NP, DP> GraphPair<NP, DP> {
    /// Creates a pair of empty graphs.
    pub fn new() -> Self {
        Self {
            netlist: ParGraph::new(),
            device: ParGraph::new(),
            label_descs: Vec::new(),
        }
    }

    /// Allocates the next label on both graphs atomically.
    ///
    /// # Errors
    ///
    /// Returns an [`InternalError`] if the two graphs hand out different
    /// ids, which means some code allocated on one graph directly.
    pub fn allocate_label(&mut self, desc: &str) -> MossResult<Label> {
        let n = self.netlist.allocate_label();
        let d = self.device.allocate_label();
        if n != d {
            return Err(InternalError::new(format!(
                "labels were allocated at the same time but don't match up ({} vs {})",
                n.as_raw(),
                d.as_raw()
            )));
        }
        self.label_descs.push(desc.to_owned());
        Ok(n)
    }

    /// Returns the description of a label.
    pub fn label_desc(&self, label: Label) -> &str {
        &self.label_descs[label.as_raw() as usize]
    }

    /// Returns the number of labels allocated.
    pub fn label_count(&self) -> u32 {
        self.netlist.label_count()
    }

    /// Mates netlist node `n` with device node `d`, unlinking any previous
    /// mate of either so the relation stays bijective.
    pub fn set_mate(&mut self, n: NodeId, d: NodeId) {
        if let Some(old_d) = self.netlist.node(n).mate {
            self.device.node_mut(old_d).mate = None;
        }
        if let Some(old_n) = self.device.node(d).mate {
            self.netlist.node_mut(old_n).mate = None;
        }
        self.netlist.node_mut(n).mate = Some(d);
        self.device.node_mut(d).mate = Some(n);
    }

    /// Clears the mate of netlist node `n`, updating both endpoints.
    pub fn clear_mate(&mut self, n: NodeId) {
        if let Some(d) = self.netlist.node(n).mate {
            self.device.node_mut(d).mate = None;
        }
        self.netlist.node_mut(n).mate = None;
    }

    /// Returns whether a netlist node and a device node share a label.
    pub fn compatible(&self, n: NodeId, d: NodeId) -> bool {
        let n_labels = self.netlist.node(n).labels();
        let d_node = self.device.node(d);
        n_labels.iter().any(|&l| d_node.has_label(l))
    }

    /// Checks mate symmetry and bijectivity on both graphs.
    ///
    /// # Errors
    ///
    /// Returns an [`InternalError`] describing the first violation found.
    pub fn verify_mates(&self) -> MossResult<()> {
        let mut seen = HashSet::new();
        for (n, node) in self.netlist.nodes() {
            if let Some(d) = node.mate {
                if self.device.node(d).mate != Some(n) {
                    return Err(InternalError::new(format!(
                        "mate asymmetry: netlist node {} -> device node {} -> {:?}",
                        n.as_raw(),
                        d.as_raw(),
                        self.device.node(d).mate.map(NodeId::as_raw)
                    )));
                }
                if !seen.insert(d) {
                    return Err(InternalError::new(format!(
                        "device node {} is mated twice",
                        d.as_raw()
                    )));
                }
            }
        }
        for (d, node) in self.device.nodes() {
            if let Some(n) = node.mate {
                if self.netlist.node(n).mate != Some(d) {
                    return Err(InternalError::new(format!(
                        "mate asymmetry: device node {} -> netlist node {} -> {:?}",
                        d.as_raw(),
                        n.as_raw(),
                        self.netlist.node(n).mate.map(NodeId::as_raw)
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<NP, DP> Default for GraphPair<NP, DP> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moss_common::Interner;

    fn pair() -> GraphPair<&'static str, &'static str> {
        GraphPair::new()
    }

    #[test]
    fn label_lockstep() {
        let mut p = pair();
        let a = p.allocate_label("IOB").unwrap();
        let b = p.allocate_label("LUT2").unwrap();
        assert_ne!(a, b);
        assert_eq!(p.label_desc(a), "IOB");
        assert_eq!(p.label_desc(b), "LUT2");
        assert_eq!(p.label_count(), 2);
    }

    #[test]
    fn label_skew_detected() {
        let mut p = pair();
        // Allocating directly on one graph puts the pair out of lockstep.
        p.netlist.allocate_label();
        assert!(p.allocate_label("skewed").is_err());
    }

    #[test]
    fn add_nodes_and_labels() {
        let mut p = pair();
        let l = p.allocate_label("DFF").unwrap();
        let n = p.netlist.add_node("ff1", vec![l]);
        assert_eq!(p.netlist.node_count(), 1);
        assert_eq!(p.netlist.labels_of(n), &[l]);
        assert_eq!(*p.netlist.node(n).payload(), "ff1");
        assert_eq!(p.netlist.nodes_with_label(l), vec![n]);
    }

    #[test]
    fn mate_symmetry() {
        let mut p = pair();
        let l = p.allocate_label("DFF").unwrap();
        let n = p.netlist.add_node("ff1", vec![l]);
        let d = p.device.add_node("DFF0", vec![l]);

        p.set_mate(n, d);
        assert_eq!(p.netlist.node(n).mate(), Some(d));
        assert_eq!(p.device.node(d).mate(), Some(n));
        p.verify_mates().unwrap();

        p.clear_mate(n);
        assert_eq!(p.netlist.node(n).mate(), None);
        assert_eq!(p.device.node(d).mate(), None);
        p.verify_mates().unwrap();
    }

    #[test]
    fn remate_unlinks_previous() {
        let mut p = pair();
        let l = p.allocate_label("DFF").unwrap();
        let n1 = p.netlist.add_node("ff1", vec![l]);
        let n2 = p.netlist.add_node("ff2", vec![l]);
        let d1 = p.device.add_node("DFF0", vec![l]);
        let d2 = p.device.add_node("DFF1", vec![l]);

        p.set_mate(n1, d1);
        // Stealing d1 for n2 must unlink n1.
        p.set_mate(n2, d1);
        assert_eq!(p.netlist.node(n1).mate(), None);
        assert_eq!(p.device.node(d1).mate(), Some(n2));
        p.verify_mates().unwrap();

        // And moving n2 away frees d1 entirely.
        p.set_mate(n2, d2);
        assert_eq!(p.device.node(d1).mate(), None);
        p.verify_mates().unwrap();
    }

    #[test]
    fn edges_and_lookup() {
        let interner = Interner::new();
        let out = interner.get_or_intern("OUT");
        let in0 = interner.get_or_intern("IN0");
        let in1 = interner.get_or_intern("IN1");

        let mut g: ParGraph<&str> = ParGraph::new();
        let a = g.add_node("a", vec![]);
        let b = g.add_node("b", vec![]);

        g.add_edge(a, b, out, in0).unwrap();
        g.add_edge(a, b, out, in1).unwrap();

        assert_eq!(g.edges_from(a).len(), 2);
        assert!(g.has_edge(a, b, out, in0));
        assert!(g.has_edge(a, b, out, in1));
        assert!(!g.has_edge(b, a, out, in0));
        assert!(g.edges_from(b).is_empty());
    }

    #[test]
    fn edge_endpoint_bounds_checked() {
        let interner = Interner::new();
        let out = interner.get_or_intern("OUT");
        let mut g: ParGraph<&str> = ParGraph::new();
        let a = g.add_node("a", vec![]);
        let bogus = NodeId::from_raw(99);
        assert!(g.add_edge(a, bogus, out, out).is_err());
        assert!(g.add_edge(bogus, a, out, out).is_err());
    }

    #[test]
    fn compatibility_is_label_intersection() {
        let mut p = pair();
        let lut2 = p.allocate_label("LUT2").unwrap();
        let lut3 = p.allocate_label("LUT3").unwrap();
        let dff = p.allocate_label("DFF").unwrap();

        let n = p.netlist.add_node("lut", vec![lut2]);
        let d_lut3 = p.device.add_node("LUT3_0", vec![lut3, lut2]);
        let d_dff = p.device.add_node("DFF0", vec![dff]);

        assert!(p.compatible(n, d_lut3));
        assert!(!p.compatible(n, d_dff));
    }
}
