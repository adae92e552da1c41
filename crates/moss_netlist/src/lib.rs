//! Netlist object model for the moss PAR toolchain.
//!
//! The netlist is the output of an external synthesis flow, presented fully
//! in memory: modules with named top-level ports, typed cells with parameter
//! maps and per-port net connections, and nets with integer ids and optional
//! symbolic names. moss never synthesises; it only consumes this model
//! (deserialised from the synthesiser's JSON output by the CLI, or built
//! directly in tests).

#![warn(missing_docs)]

pub mod cell_type;
pub mod data;
pub mod ids;

pub use cell_type::CellType;
pub use data::{Cell, CellConn, Module, Net, NetRef, Netlist, Port, PortDirection};
pub use ids::{CellId, NetId};
