//! Supported target parts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported GreenPAK-class part.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Part {
    /// SLG46620: two routing matrices, full analog complement (three
    /// comparators behind a shared input mux, PGA, dual VREF, three
    /// oscillators).
    Slg46620,
    /// SLG46140: single matrix, reduced complement (two counters, two
    /// comparators, no PGA, no ring oscillator).
    Slg46140,
}

impl Part {
    /// Returns the part number as printed on the package.
    pub fn name(self) -> &'static str {
        match self {
            Part::Slg46620 => "SLG46620",
            Part::Slg46140 => "SLG46140",
        }
    }

    /// Parses a part number (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SLG46620" => Some(Part::Slg46620),
            "SLG46140" => Some(Part::Slg46140),
            _ => None,
        }
    }

    /// Returns the number of routing matrices in this part.
    pub fn matrix_count(self) -> u8 {
        match self {
            Part::Slg46620 => 2,
            Part::Slg46140 => 1,
        }
    }

    /// Returns whether this part's analog comparators share ACMP0's input
    /// mux (the SLG46620-class sharing rule checked by the post-PAR DRC).
    pub fn has_shared_acmp_mux(self) -> bool {
        matches!(self, Part::Slg46620)
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
