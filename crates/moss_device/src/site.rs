//! Site kinds, port tables, and mutable configuration records.
//!
//! A site's *kind* is immutable catalog data: what the site is and which
//! ports it exposes. Its *config* is the mutable record the commit stage
//! writes and the bitstream emitter reads. Kind-specific behaviour is
//! expressed as matches on the variant tag.

use crate::ids::SiteId;
use crate::signal::SignalSource;
use serde::{Deserialize, Serialize};

/// The kind of a device site.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SiteKind {
    /// An I/O buffer bonded to a package pin.
    Iob {
        /// Package pin number.
        pin: u32,
    },
    /// A look-up table with the given number of inputs (2, 3, or 4).
    Lut {
        /// Number of LUT inputs.
        inputs: u8,
    },
    /// A D flip-flop, optionally with asynchronous set/reset.
    Dff {
        /// Whether the site has a set/reset input.
        has_set_reset: bool,
    },
    /// An analog comparator.
    Acmp,
    /// The low-frequency oscillator.
    LfOsc,
    /// The ring oscillator.
    RingOsc,
    /// The RC oscillator.
    RcOsc,
    /// A counter/delay block of the given width (8 or 14 bits).
    Counter {
        /// Counter width in bits.
        bits: u8,
    },
    /// A voltage reference.
    Vref,
    /// A programmable-gain amplifier.
    Pga,
    /// A constant power rail (`high` selects VDD vs GND).
    PowerRail {
        /// `true` for VDD, `false` for GND.
        high: bool,
    },
    /// The power-on-reset block.
    Por,
}

impl SiteKind {
    /// Returns the utilisation-report class name of this kind.
    pub fn class_name(self) -> &'static str {
        match self {
            SiteKind::Iob { .. } => "IOB",
            SiteKind::Lut { inputs: 2 } => "LUT2",
            SiteKind::Lut { inputs: 3 } => "LUT3",
            SiteKind::Lut { .. } => "LUT4",
            SiteKind::Dff {
                has_set_reset: false,
            } => "DFF",
            SiteKind::Dff { .. } => "DFFSR",
            SiteKind::Acmp => "ACMP",
            SiteKind::LfOsc => "LFOSC",
            SiteKind::RingOsc => "RINGOSC",
            SiteKind::RcOsc => "RCOSC",
            SiteKind::Counter { bits: 8 } => "COUNT8",
            SiteKind::Counter { .. } => "COUNT14",
            SiteKind::Vref => "VREF",
            SiteKind::Pga => "PGA",
            SiteKind::PowerRail { high: true } => "VDD",
            SiteKind::PowerRail { .. } => "GND",
            SiteKind::Por => "POR",
        }
    }

    /// Returns the input port names of this kind.
    ///
    /// Together with [`output_ports`](Self::output_ports) this table is the
    /// single source of the port naming convention shared by the netlist
    /// and device graph builders.
    pub fn input_ports(self) -> &'static [&'static str] {
        match self {
            SiteKind::Iob { .. } => &["IN"],
            SiteKind::Lut { inputs: 2 } => &["IN0", "IN1"],
            SiteKind::Lut { inputs: 3 } => &["IN0", "IN1", "IN2"],
            SiteKind::Lut { .. } => &["IN0", "IN1", "IN2", "IN3"],
            SiteKind::Dff {
                has_set_reset: false,
            } => &["D", "CLK"],
            SiteKind::Dff { .. } => &["D", "CLK", "nSR"],
            SiteKind::Acmp => &["VIN", "VREF", "PWREN"],
            SiteKind::LfOsc | SiteKind::RingOsc | SiteKind::RcOsc => &["PWRDN"],
            SiteKind::Counter { .. } => &["CLK", "RST"],
            SiteKind::Vref => &[],
            SiteKind::Pga => &["VIN"],
            SiteKind::PowerRail { .. } => &[],
            SiteKind::Por => &[],
        }
    }

    /// Returns the output port names of this kind.
    pub fn output_ports(self) -> &'static [&'static str] {
        match self {
            SiteKind::Iob { .. } => &["OUT"],
            SiteKind::Lut { .. } => &["OUT"],
            SiteKind::Dff { .. } => &["Q"],
            SiteKind::Acmp => &["OUT"],
            SiteKind::LfOsc | SiteKind::RingOsc | SiteKind::RcOsc => &["CLKOUT"],
            SiteKind::Counter { .. } => &["OUT"],
            SiteKind::Vref => &["VOUT"],
            SiteKind::Pga => &["VOUT"],
            SiteKind::PowerRail { .. } => &["OUT"],
            SiteKind::Por => &["RST_DONE"],
        }
    }

    /// Returns whether this kind produces an analog signal (the IOB
    /// analog-input-buffer DRC keys off this).
    pub fn is_analog_source(self) -> bool {
        matches!(self, SiteKind::Vref | SiteKind::Pga)
    }

    /// Returns whether this kind is a constant power rail.
    pub fn is_power_rail(self) -> bool {
        matches!(self, SiteKind::PowerRail { .. })
    }

    /// Returns whether this kind is an oscillator.
    pub fn is_oscillator(self) -> bool {
        matches!(self, SiteKind::LfOsc | SiteKind::RingOsc | SiteKind::RcOsc)
    }
}

/// IOB operating mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum IobMode {
    /// Pad unused.
    #[default]
    Disabled,
    /// Input buffer only.
    Input,
    /// Output driver only.
    Output,
    /// Bidirectional.
    Bidirectional,
}

/// IOB input-buffer type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum IbufType {
    /// Digital input buffer.
    #[default]
    Digital,
    /// Analog pass-through (required when an analog entity drives the pad).
    Analog,
}

/// Mutable configuration of an IOB site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct IobConfig {
    /// Operating mode.
    pub mode: IobMode,
    /// Input buffer type.
    pub ibuf_type: IbufType,
    /// The fabric signal driving the pad, if the IOB drives out.
    pub output_src: Option<SignalSource>,
}

/// Mutable configuration of a LUT site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct LutConfig {
    /// Truth table, one bit per input combination (low bit = all-zero row).
    pub init: u16,
    /// Input mux selections, indexed by LUT input.
    pub input_src: [Option<SignalSource>; 4],
}

/// Mutable configuration of a flip-flop site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct DffConfig {
    /// Data input mux.
    pub data_src: Option<SignalSource>,
    /// Clock input mux.
    pub clock_src: Option<SignalSource>,
    /// Set/reset input mux (only on sites with set/reset).
    pub set_reset_src: Option<SignalSource>,
    /// Power-up output value.
    pub init_value: bool,
}

/// Mutable configuration of an analog comparator site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct AcmpConfig {
    /// Positive input mux. `None` means unconfigured (reads as ground).
    pub input_src: Option<SignalSource>,
    /// Reference input mux.
    pub vref_src: Option<SignalSource>,
    /// Power-enable signal. `None` means the comparator stays off.
    pub power_en: Option<SignalSource>,
}

/// Mutable configuration of an oscillator site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct OscConfig {
    /// Power-down input mux. `None` means unconfigured.
    pub power_down: Option<SignalSource>,
    /// Whether the power-down input is enabled.
    pub power_down_en: bool,
    /// Whether the oscillator powers down automatically in sleep.
    pub auto_power_down: bool,
}

/// Mutable configuration of a counter site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Clock input mux.
    pub clock_src: Option<SignalSource>,
    /// Reset input mux.
    pub reset_src: Option<SignalSource>,
    /// Terminal count value.
    pub count_to: u16,
}

/// Mutable configuration of a voltage-reference site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct VrefConfig {
    /// Selected reference voltage in millivolts.
    pub target_mv: u16,
}

/// Mutable configuration of a PGA site.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct PgaConfig {
    /// Analog input mux.
    pub input_src: Option<SignalSource>,
    /// Gain numerator over a fixed denominator of 100 (e.g. 200 = 2x).
    pub gain_x100: u16,
}

/// The configuration record of a site, tagged to match its kind.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum SiteConfig {
    /// IOB configuration.
    Iob(IobConfig),
    /// LUT configuration.
    Lut(LutConfig),
    /// Flip-flop configuration.
    Dff(DffConfig),
    /// Comparator configuration.
    Acmp(AcmpConfig),
    /// Oscillator configuration.
    Osc(OscConfig),
    /// Counter configuration.
    Counter(CounterConfig),
    /// Voltage-reference configuration.
    Vref(VrefConfig),
    /// PGA configuration.
    Pga(PgaConfig),
    /// No configuration (power rails, POR).
    Fixed,
}

impl SiteConfig {
    /// Returns the default configuration record for a site kind.
    pub fn default_for(kind: SiteKind) -> Self {
        match kind {
            SiteKind::Iob { .. } => SiteConfig::Iob(IobConfig::default()),
            SiteKind::Lut { .. } => SiteConfig::Lut(LutConfig::default()),
            SiteKind::Dff { .. } => SiteConfig::Dff(DffConfig::default()),
            SiteKind::Acmp => SiteConfig::Acmp(AcmpConfig::default()),
            SiteKind::LfOsc | SiteKind::RingOsc | SiteKind::RcOsc => {
                SiteConfig::Osc(OscConfig::default())
            }
            SiteKind::Counter { .. } => SiteConfig::Counter(CounterConfig::default()),
            SiteKind::Vref => SiteConfig::Vref(VrefConfig::default()),
            SiteKind::Pga => SiteConfig::Pga(PgaConfig::default()),
            SiteKind::PowerRail { .. } | SiteKind::Por => SiteConfig::Fixed,
        }
    }
}

/// One configurable site in a device catalog.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Site {
    /// The unique ID of this site.
    pub id: SiteId,
    /// Site name as used in reports and `LOC` constraints (e.g. `"P6"`,
    /// `"ACMP0"`, `"COUNT8_1"`).
    pub name: String,
    /// Which routing matrix the site lives in.
    pub matrix: u8,
    /// The immutable kind of this site.
    pub kind: SiteKind,
    /// Whether the committed placement uses this site.
    pub used: bool,
    /// The mutable configuration record.
    pub config: SiteConfig,
}

impl Site {
    /// Creates an unused site with default configuration.
    pub fn new(id: SiteId, name: impl Into<String>, matrix: u8, kind: SiteKind) -> Self {
        Self {
            id,
            name: name.into(),
            matrix,
            kind,
            used: false,
            config: SiteConfig::default_for(kind),
        }
    }

    /// Returns whether the committed placement uses this site.
    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Returns the IOB configuration, if this is an IOB site.
    pub fn iob(&self) -> Option<&IobConfig> {
        match &self.config {
            SiteConfig::Iob(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Returns the comparator configuration, if this is an ACMP site.
    pub fn acmp(&self) -> Option<&AcmpConfig> {
        match &self.config {
            SiteConfig::Acmp(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Returns the mutable comparator configuration, if this is an ACMP site.
    pub fn acmp_mut(&mut self) -> Option<&mut AcmpConfig> {
        match &mut self.config {
            SiteConfig::Acmp(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Returns the oscillator configuration, if this is an oscillator site.
    pub fn osc(&self) -> Option<&OscConfig> {
        match &self.config {
            SiteConfig::Osc(cfg) => Some(cfg),
            _ => None,
        }
    }
}
