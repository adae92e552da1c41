//! Netlist cell types for GreenPAK-class primitives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of a netlist cell, matching the primitive library the synthesis
/// flow targets (`GP_*` cells).
///
/// Serialises as the primitive name (e.g. `"GP_IBUF"`), which is also how
/// the synthesiser's JSON output spells cell types.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum CellType {
    /// Input buffer from a package pin.
    #[serde(rename = "GP_IBUF")]
    Ibuf,
    /// Output buffer to a package pin.
    #[serde(rename = "GP_OBUF")]
    Obuf,
    /// Bidirectional pin buffer.
    #[serde(rename = "GP_IOBUF")]
    Iobuf,
    /// 2-input look-up table.
    #[serde(rename = "GP_2LUT")]
    Lut2,
    /// 3-input look-up table.
    #[serde(rename = "GP_3LUT")]
    Lut3,
    /// 4-input look-up table.
    #[serde(rename = "GP_4LUT")]
    Lut4,
    /// D flip-flop.
    #[serde(rename = "GP_DFF")]
    Dff,
    /// D flip-flop with asynchronous set/reset.
    #[serde(rename = "GP_DFFSR")]
    Dffsr,
    /// Analog comparator.
    #[serde(rename = "GP_ACMP")]
    Acmp,
    /// Low-frequency oscillator.
    #[serde(rename = "GP_LFOSC")]
    LfOsc,
    /// Ring oscillator.
    #[serde(rename = "GP_RINGOSC")]
    RingOsc,
    /// RC oscillator.
    #[serde(rename = "GP_RCOSC")]
    RcOsc,
    /// 8-bit counter/delay block.
    #[serde(rename = "GP_COUNT8")]
    Count8,
    /// 14-bit counter/delay block.
    #[serde(rename = "GP_COUNT14")]
    Count14,
    /// Voltage reference.
    #[serde(rename = "GP_VREF")]
    Vref,
    /// Programmable-gain amplifier.
    #[serde(rename = "GP_PGA")]
    Pga,
}

impl CellType {
    /// All cell types, in a fixed order (used for deterministic iteration).
    pub const ALL: &'static [CellType] = &[
        CellType::Ibuf,
        CellType::Obuf,
        CellType::Iobuf,
        CellType::Lut2,
        CellType::Lut3,
        CellType::Lut4,
        CellType::Dff,
        CellType::Dffsr,
        CellType::Acmp,
        CellType::LfOsc,
        CellType::RingOsc,
        CellType::RcOsc,
        CellType::Count8,
        CellType::Count14,
        CellType::Vref,
        CellType::Pga,
    ];

    /// Returns the primitive name of this cell type (e.g. `"GP_DFF"`).
    pub fn type_name(self) -> &'static str {
        match self {
            CellType::Ibuf => "GP_IBUF",
            CellType::Obuf => "GP_OBUF",
            CellType::Iobuf => "GP_IOBUF",
            CellType::Lut2 => "GP_2LUT",
            CellType::Lut3 => "GP_3LUT",
            CellType::Lut4 => "GP_4LUT",
            CellType::Dff => "GP_DFF",
            CellType::Dffsr => "GP_DFFSR",
            CellType::Acmp => "GP_ACMP",
            CellType::LfOsc => "GP_LFOSC",
            CellType::RingOsc => "GP_RINGOSC",
            CellType::RcOsc => "GP_RCOSC",
            CellType::Count8 => "GP_COUNT8",
            CellType::Count14 => "GP_COUNT14",
            CellType::Vref => "GP_VREF",
            CellType::Pga => "GP_PGA",
        }
    }

    /// Parses a primitive name back into a cell type.
    pub fn from_type_name(name: &str) -> Option<Self> {
        CellType::ALL.iter().copied().find(|t| t.type_name() == name)
    }

    /// Returns the number of LUT inputs for LUT types, `None` otherwise.
    pub fn lut_inputs(self) -> Option<u8> {
        match self {
            CellType::Lut2 => Some(2),
            CellType::Lut3 => Some(3),
            CellType::Lut4 => Some(4),
            _ => None,
        }
    }

    /// Returns whether this cell occupies an IOB site.
    pub fn is_iob(self) -> bool {
        matches!(self, CellType::Ibuf | CellType::Obuf | CellType::Iobuf)
    }

    /// Returns whether this cell is an IOB whose fabric-side output is
    /// legitimately unloaded (the signal leaves the device through the pad).
    pub fn is_pad_driving_iob(self) -> bool {
        matches!(self, CellType::Obuf | CellType::Iobuf)
    }

    /// Returns whether this cell is an oscillator.
    pub fn is_oscillator(self) -> bool {
        matches!(self, CellType::LfOsc | CellType::RingOsc | CellType::RcOsc)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_roundtrip() {
        for &ty in CellType::ALL {
            assert_eq!(CellType::from_type_name(ty.type_name()), Some(ty));
        }
    }

    #[test]
    fn unknown_type_name() {
        assert_eq!(CellType::from_type_name("GP_BOGUS"), None);
    }

    #[test]
    fn lut_inputs() {
        assert_eq!(CellType::Lut2.lut_inputs(), Some(2));
        assert_eq!(CellType::Lut4.lut_inputs(), Some(4));
        assert_eq!(CellType::Dff.lut_inputs(), None);
    }

    #[test]
    fn iob_classification() {
        assert!(CellType::Ibuf.is_iob());
        assert!(CellType::Iobuf.is_iob());
        assert!(!CellType::Ibuf.is_pad_driving_iob());
        assert!(CellType::Obuf.is_pad_driving_iob());
        assert!(CellType::Iobuf.is_pad_driving_iob());
        assert!(!CellType::Acmp.is_iob());
    }

    #[test]
    fn oscillator_classification() {
        assert!(CellType::LfOsc.is_oscillator());
        assert!(CellType::RingOsc.is_oscillator());
        assert!(CellType::RcOsc.is_oscillator());
        assert!(!CellType::Count8.is_oscillator());
    }

    #[test]
    fn serde_uses_primitive_names() {
        let json = serde_json::to_string(&CellType::Ibuf).unwrap();
        assert_eq!(json, "\"GP_IBUF\"");
        let back: CellType = serde_json::from_str("\"GP_COUNT14\"").unwrap();
        assert_eq!(back, CellType::Count14);
    }

    #[test]
    fn display_matches_type_name() {
        assert_eq!(format!("{}", CellType::Dffsr), "GP_DFFSR");
    }
}
