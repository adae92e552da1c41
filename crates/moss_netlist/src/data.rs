//! Core netlist data structures.
//!
//! A [`Netlist`] holds one or more [`Module`]s; PAR runs on the top module.
//! Cells connect to nets through [`CellConn`] records carrying the cell-side
//! port name and direction; an input may instead be tied to a constant,
//! which PAR wires to the VDD/GND pseudo-entities.

use crate::cell_type::CellType;
use crate::ids::{CellId, NetId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Direction of a port or cell connection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// Driven from outside the cell (a cell input / top-level input port).
    Input,
    /// Driven by the cell (a cell output / top-level output port).
    Output,
    /// Bidirectional.
    Inout,
}

/// A top-level module port.
///
/// By the time PAR runs, every port is realised by an explicit IOB cell
/// carrying a `LOC` constraint; ports are retained for reporting only and
/// do not become graph nodes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    /// Port name.
    pub name: String,
    /// Port direction, seen from outside the module.
    pub direction: PortDirection,
    /// The net this port connects to.
    pub net: NetId,
}

/// A net: an integer id with an optional symbolic name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Symbolic name, if the synthesiser kept one.
    pub name: Option<String>,
}

/// What a cell connection is attached to: a net, or a constant.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum NetRef {
    /// An ordinary net.
    Net(NetId),
    /// A constant driver; `true` is logic 1 (VDD), `false` is logic 0 (GND).
    Const(bool),
}

/// A single port-to-net connection on a cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellConn {
    /// Cell-side port name (e.g. `"D"`, `"IN0"`, `"Q"`).
    pub port: String,
    /// Direction of the port relative to the cell.
    pub direction: PortDirection,
    /// The net or constant attached to the port.
    pub net: NetRef,
}

/// A typed cell instance with parameters and connections.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cell {
    /// The unique ID of this cell.
    pub id: CellId,
    /// Stable diagnostic name (instance name from synthesis).
    pub name: String,
    /// The primitive type of this cell.
    pub ty: CellType,
    /// Parameters (e.g. `INIT`, `COUNT_TO`, `IBUF_TYPE`), keyed by name.
    pub params: BTreeMap<String, String>,
    /// Optional placement constraint naming a device site (e.g. `"P2"`,
    /// `"ACMP1"`).
    pub loc: Option<String>,
    /// Port connections.
    pub connections: Vec<CellConn>,
}

impl Cell {
    /// Creates an unconnected cell with the given name and type.
    ///
    /// The id is assigned when the cell is added to a module.
    pub fn new(name: impl Into<String>, ty: CellType) -> Self {
        Self {
            id: CellId::from_raw(0),
            name: name.into(),
            ty,
            params: BTreeMap::new(),
            loc: None,
            connections: Vec::new(),
        }
    }

    /// Sets a parameter, builder-style.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Sets the `LOC` placement constraint, builder-style.
    pub fn with_loc(mut self, loc: impl Into<String>) -> Self {
        self.loc = Some(loc.into());
        self
    }

    /// Connects an input port to a net, builder-style.
    pub fn input(mut self, port: impl Into<String>, net: NetId) -> Self {
        self.connections.push(CellConn {
            port: port.into(),
            direction: PortDirection::Input,
            net: NetRef::Net(net),
        });
        self
    }

    /// Ties an input port to a constant, builder-style.
    pub fn input_const(mut self, port: impl Into<String>, value: bool) -> Self {
        self.connections.push(CellConn {
            port: port.into(),
            direction: PortDirection::Input,
            net: NetRef::Const(value),
        });
        self
    }

    /// Connects an output port to a net, builder-style.
    pub fn output(mut self, port: impl Into<String>, net: NetId) -> Self {
        self.connections.push(CellConn {
            port: port.into(),
            direction: PortDirection::Output,
            net: NetRef::Net(net),
        });
        self
    }

    /// Looks up a parameter value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns whether a parameter equals `"1"` (the synthesiser's boolean
    /// encoding).
    pub fn param_is_set(&self, key: &str) -> bool {
        self.param(key) == Some("1")
    }
}

/// A netlist module: ports, cells, and nets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Top-level ports.
    pub ports: Vec<Port>,
    /// All cells, indexed by [`CellId`].
    pub cells: Vec<Cell>,
    /// All nets, indexed by [`NetId`].
    pub nets: Vec<Net>,
    /// Auxiliary index: cell name to ID (rebuilt on deserialization).
    #[serde(skip)]
    cell_by_name: HashMap<String, CellId>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ports: Vec::new(),
            cells: Vec::new(),
            nets: Vec::new(),
            cell_by_name: HashMap::new(),
        }
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, name: Option<&str>) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        self.nets.push(Net {
            id,
            name: name.map(str::to_owned),
        });
        id
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(&mut self, mut cell: Cell) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        cell.id = id;
        self.cell_by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        id
    }

    /// Adds a top-level port.
    pub fn add_port(&mut self, name: impl Into<String>, direction: PortDirection, net: NetId) {
        self.ports.push(Port {
            name: name.into(),
            direction,
            net,
        });
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.as_raw() as usize]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.as_raw() as usize]
    }

    /// Looks up a cell by name.
    pub fn cell_by_name(&self, name: &str) -> Option<CellId> {
        self.cell_by_name.get(name).copied()
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns a display name for a net: its symbolic name if present,
    /// otherwise `n<id>`.
    pub fn net_display_name(&self, id: NetId) -> String {
        match &self.net(id).name {
            Some(name) => name.clone(),
            None => format!("n{id}"),
        }
    }

    /// Rebuilds auxiliary indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name.clear();
        for (i, cell) in self.cells.iter().enumerate() {
            self.cell_by_name
                .insert(cell.name.clone(), CellId::from_raw(i as u32));
        }
    }

    /// Returns the cell connection driving a net, if any.
    ///
    /// Cells are scanned in id order, so the result is deterministic even
    /// for (illegal) multiply-driven nets.
    pub fn driver_of(&self, net: NetId) -> Option<(CellId, &str)> {
        for cell in &self.cells {
            for conn in &cell.connections {
                if conn.direction == PortDirection::Output && conn.net == NetRef::Net(net) {
                    return Some((cell.id, conn.port.as_str()));
                }
            }
        }
        None
    }

    /// Returns every cell input connected to a net, in cell-id order.
    pub fn sinks_of(&self, net: NetId) -> Vec<(CellId, &str)> {
        let mut sinks = Vec::new();
        for cell in &self.cells {
            for conn in &cell.connections {
                if conn.direction == PortDirection::Input && conn.net == NetRef::Net(net) {
                    sinks.push((cell.id, conn.port.as_str()));
                }
            }
        }
        sinks
    }
}

/// A complete netlist: one or more modules and the name of the top.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Netlist {
    /// All modules.
    pub modules: Vec<Module>,
    /// Name of the top module.
    pub top: String,
}

impl Netlist {
    /// Creates a netlist containing a single top module.
    pub fn single(module: Module) -> Self {
        let top = module.name.clone();
        Self {
            modules: vec![module],
            top,
        }
    }

    /// Returns the top module, if present.
    pub fn top_module(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == self.top)
    }

    /// Rebuilds auxiliary indices in every module after deserialization.
    pub fn rebuild_indices(&mut self) {
        for module in &mut self.modules {
            module.rebuild_indices();
        }
    }
}
