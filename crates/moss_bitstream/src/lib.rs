//! Bitstream emission for moss.
//!
//! Renders committed device state into the part's 2048-bit configuration
//! image. Field packing is deterministic: sites are emitted in catalog
//! order, each at a fixed offset derived from the widths of the sites
//! before it.
//!
//! The pattern-id and read-protect bits live at fixed positions near the
//! end of the image and belong to downstream tools, which OR their values
//! in rather than overwriting; the emitter must therefore never set them,
//! not even speculatively.

#![warn(missing_docs)]

use moss_common::{InternalError, MossResult};
use moss_device::{Device, IbufType, IobMode, SignalSource, SiteConfig};

/// Total size of the configuration image in bits.
pub const NVM_BITS: usize = 2048;

/// First bit of the 8-bit pattern id. Owned by the programmer tool;
/// always zero in emitted images.
pub const PATTERN_ID_BIT: usize = 2031;

/// The read-protect bit. Owned by the programmer tool; always zero in
/// emitted images.
pub const READ_PROTECT_BIT: usize = 2039;

/// A packed configuration image.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ConfigImage {
    bits: Vec<u8>,
}

impl ConfigImage {
    /// Creates an all-zero image.
    pub fn new() -> Self {
        Self {
            bits: vec![0u8; NVM_BITS / 8],
        }
    }

    /// Sets or clears a single bit.
    pub fn set_bit(&mut self, index: usize, value: bool) {
        let byte = index / 8;
        let bit = index % 8;
        if value {
            self.bits[byte] |= 1 << bit;
        } else {
            self.bits[byte] &= !(1 << bit);
        }
    }

    /// Reads a single bit.
    pub fn get_bit(&self, index: usize) -> bool {
        (self.bits[index / 8] >> (index % 8)) & 1 != 0
    }

    /// Writes `width` bits of `value` starting at `offset`, LSB first.
    pub fn set_field(&mut self, offset: usize, width: usize, value: u64) {
        for i in 0..width {
            self.set_bit(offset + i, (value >> i) & 1 != 0);
        }
    }

    /// Returns the raw image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Renders the image as hex, 32 bytes per line.
    pub fn to_hex(&self) -> String {
        let mut out = String::new();
        for chunk in self.bits.chunks(32) {
            for byte in chunk {
                out.push_str(&format!("{byte:02x}"));
            }
            out.push('\n');
        }
        out
    }
}

impl Default for ConfigImage {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit width of one signal-source field: a presence flag plus the source
/// site id.
const SRC_BITS: usize = 8;

/// Emits the configuration image for a committed device.
///
/// # Errors
///
/// Returns an [`InternalError`] if the catalog's packed fields would
/// collide with the reserved pattern-id/read-protect region; catalogs are
/// sized so this cannot happen.
pub fn emit(device: &Device) -> MossResult<ConfigImage> {
    let mut image = ConfigImage::new();
    let mut offset = 0usize;

    for site in device.sites() {
        let width = site_width(&site.config);
        if offset + width > PATTERN_ID_BIT {
            return Err(InternalError::new(format!(
                "configuration image overflow at site \"{}\" (bit {})",
                site.name,
                offset + width
            )));
        }
        image.set_bit(offset, site.used);
        let mut cursor = offset + 1;
        match &site.config {
            SiteConfig::Iob(cfg) => {
                let mode = match cfg.mode {
                    IobMode::Disabled => 0u64,
                    IobMode::Input => 1,
                    IobMode::Output => 2,
                    IobMode::Bidirectional => 3,
                };
                image.set_field(cursor, 2, mode);
                cursor += 2;
                image.set_bit(cursor, cfg.ibuf_type == IbufType::Analog);
                cursor += 1;
                put_src(&mut image, &mut cursor, cfg.output_src);
            }
            SiteConfig::Lut(cfg) => {
                image.set_field(cursor, 16, cfg.init as u64);
                cursor += 16;
                for src in cfg.input_src {
                    put_src(&mut image, &mut cursor, src);
                }
            }
            SiteConfig::Dff(cfg) => {
                image.set_bit(cursor, cfg.init_value);
                cursor += 1;
                put_src(&mut image, &mut cursor, cfg.data_src);
                put_src(&mut image, &mut cursor, cfg.clock_src);
                put_src(&mut image, &mut cursor, cfg.set_reset_src);
            }
            SiteConfig::Acmp(cfg) => {
                put_src(&mut image, &mut cursor, cfg.input_src);
                put_src(&mut image, &mut cursor, cfg.vref_src);
                put_src(&mut image, &mut cursor, cfg.power_en);
            }
            SiteConfig::Osc(cfg) => {
                image.set_bit(cursor, cfg.power_down_en);
                cursor += 1;
                image.set_bit(cursor, cfg.auto_power_down);
                cursor += 1;
                put_src(&mut image, &mut cursor, cfg.power_down);
            }
            SiteConfig::Counter(cfg) => {
                image.set_field(cursor, 16, cfg.count_to as u64);
                cursor += 16;
                put_src(&mut image, &mut cursor, cfg.clock_src);
                put_src(&mut image, &mut cursor, cfg.reset_src);
            }
            SiteConfig::Vref(cfg) => {
                image.set_field(cursor, 12, (cfg.target_mv & 0x0fff) as u64);
            }
            SiteConfig::Pga(cfg) => {
                put_src(&mut image, &mut cursor, cfg.input_src);
                image.set_field(cursor, 16, cfg.gain_x100 as u64);
            }
            SiteConfig::Fixed => {}
        }
        offset += width;
    }

    Ok(image)
}

/// Packed width of a site's fields, including the leading used bit.
fn site_width(config: &SiteConfig) -> usize {
    1 + match config {
        SiteConfig::Iob(_) => 2 + 1 + SRC_BITS,
        SiteConfig::Lut(_) => 16 + 4 * SRC_BITS,
        SiteConfig::Dff(_) => 1 + 3 * SRC_BITS,
        SiteConfig::Acmp(_) => 3 * SRC_BITS,
        SiteConfig::Osc(_) => 2 + SRC_BITS,
        SiteConfig::Counter(_) => 16 + 2 * SRC_BITS,
        SiteConfig::Vref(_) => 12,
        SiteConfig::Pga(_) => SRC_BITS + 16,
        SiteConfig::Fixed => 0,
    }
}

fn put_src(image: &mut ConfigImage, cursor: &mut usize, src: Option<SignalSource>) {
    if let Some(src) = src {
        image.set_bit(*cursor, true);
        image.set_field(*cursor + 1, SRC_BITS - 1, src.site.as_raw() as u64);
    }
    *cursor += SRC_BITS;
}
