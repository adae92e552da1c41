//! Device catalogs: all sites of a part, indexed for the PAR core.
//!
//! The catalog is constructed in a fixed order so that site ids, and
//! therefore every downstream iteration, are deterministic for a given
//! part.

use crate::ids::SiteId;
use crate::part::Part;
use crate::signal::SignalSource;
use crate::site::{Site, SiteKind};
use moss_common::Interner;
use std::collections::HashMap;

/// The in-memory model of one physical part.
pub struct Device {
    part: Part,
    sites: Vec<Site>,
    iobs: Vec<(u32, SiteId)>,
    vdd: SiteId,
    gnd: SiteId,
    por: SiteId,
    acmps: Vec<SiteId>,
    lfosc: Option<SiteId>,
    ringosc: Option<SiteId>,
    rcosc: Option<SiteId>,
    site_by_name: HashMap<String, SiteId>,
}

impl Device {
    /// Builds the catalog for the given part.
    pub fn new(part: Part) -> Self {
        let mut builder = CatalogBuilder::new();

        // Distinguished sites first so their ids are stable across parts.
        let vdd = builder.add("VDD", 0, SiteKind::PowerRail { high: true });
        let gnd = builder.add("GND", 0, SiteKind::PowerRail { high: false });
        let por = builder.add("POR", 0, SiteKind::Por);

        match part {
            Part::Slg46620 => builder.build_slg46620(),
            Part::Slg46140 => builder.build_slg46140(),
        }

        Self {
            part,
            vdd,
            gnd,
            por,
            iobs: builder.iobs,
            acmps: builder.acmps,
            lfosc: builder.lfosc,
            ringosc: builder.ringosc,
            rcosc: builder.rcosc,
            site_by_name: builder.by_name,
            sites: builder.sites,
        }
    }

    /// Returns the part this catalog models.
    pub fn part(&self) -> Part {
        self.part
    }

    /// Returns the site with the given ID.
    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the site with the given ID.
    pub fn site_mut(&mut self, id: SiteId) -> &mut Site {
        &mut self.sites[id.as_raw() as usize]
    }

    /// Returns an iterator over all sites in id order.
    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Returns the number of sites.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Returns all IOBs as `(pin, site)` pairs in ascending pin order.
    pub fn iobs(&self) -> &[(u32, SiteId)] {
        &self.iobs
    }

    /// Returns the IOB bonded to the given package pin, if any.
    pub fn iob_by_pin(&self, pin: u32) -> Option<SiteId> {
        self.iobs
            .iter()
            .find(|(p, _)| *p == pin)
            .map(|(_, site)| *site)
    }

    /// Returns the VDD power rail.
    pub fn vdd(&self) -> SiteId {
        self.vdd
    }

    /// Returns the GND power rail.
    pub fn gnd(&self) -> SiteId {
        self.gnd
    }

    /// Returns the power-on-reset block.
    pub fn por(&self) -> SiteId {
        self.por
    }

    /// Returns the number of analog comparators.
    pub fn acmp_count(&self) -> usize {
        self.acmps.len()
    }

    /// Returns the comparator with the given ordinal (ACMP0 is ordinal 0).
    pub fn acmp(&self, ordinal: usize) -> SiteId {
        self.acmps[ordinal]
    }

    /// Returns the oscillator sites present on this part, in LF/ring/RC
    /// order.
    pub fn oscillators(&self) -> Vec<SiteId> {
        [self.lfosc, self.ringosc, self.rcosc]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Looks up a site by its catalog name (as used in `LOC` constraints).
    pub fn site_by_name(&self, name: &str) -> Option<SiteId> {
        self.site_by_name.get(name).copied()
    }

    /// Returns the constant-1 signal source.
    pub fn power_source(&self, interner: &Interner) -> SignalSource {
        SignalSource::new(self.vdd, interner.get_or_intern("OUT"))
    }

    /// Returns the constant-0 signal source.
    pub fn ground_source(&self, interner: &Interner) -> SignalSource {
        SignalSource::new(self.gnd, interner.get_or_intern("OUT"))
    }

    /// Returns the POR `RST_DONE` signal source.
    pub fn por_done_source(&self, interner: &Interner) -> SignalSource {
        SignalSource::new(self.por, interner.get_or_intern("RST_DONE"))
    }

    /// Returns whether a signal source is a constant power rail.
    pub fn source_is_power_rail(&self, src: SignalSource) -> bool {
        self.site(src.site).kind.is_power_rail()
    }

    /// Returns a human-readable name for a signal source.
    ///
    /// Sites with a single output are named by the site alone (`"P6"`,
    /// `"VDD"`); multi-output sites include the port.
    pub fn describe_source(&self, src: SignalSource, interner: &Interner) -> String {
        let site = self.site(src.site);
        if site.kind.output_ports().len() == 1 {
            site.name.clone()
        } else {
            format!("{}.{}", site.name, interner.resolve(src.port))
        }
    }

    /// Returns `(class, used, total)` counts in a fixed class order,
    /// omitting classes the part does not have. Power rails and the POR
    /// block are not user resources and are excluded.
    pub fn class_counts(&self) -> Vec<(&'static str, u32, u32)> {
        const CLASSES: &[&str] = &[
            "IOB", "LUT2", "LUT3", "LUT4", "DFF", "DFFSR", "COUNT8", "COUNT14", "ACMP", "LFOSC",
            "RINGOSC", "RCOSC", "VREF", "PGA",
        ];
        let mut counts = Vec::new();
        for &class in CLASSES {
            let mut total = 0;
            let mut used = 0;
            for site in &self.sites {
                if site.kind.class_name() == class {
                    total += 1;
                    if site.used {
                        used += 1;
                    }
                }
            }
            if total > 0 {
                counts.push((class, used, total));
            }
        }
        counts
    }
}

/// Incremental catalog construction state.
struct CatalogBuilder {
    sites: Vec<Site>,
    iobs: Vec<(u32, SiteId)>,
    acmps: Vec<SiteId>,
    lfosc: Option<SiteId>,
    ringosc: Option<SiteId>,
    rcosc: Option<SiteId>,
    by_name: HashMap<String, SiteId>,
}

impl CatalogBuilder {
    fn new() -> Self {
        Self {
            sites: Vec::new(),
            iobs: Vec::new(),
            acmps: Vec::new(),
            lfosc: None,
            ringosc: None,
            rcosc: None,
            by_name: HashMap::new(),
        }
    }

    fn add(&mut self, name: &str, matrix: u8, kind: SiteKind) -> SiteId {
        let id = SiteId::from_raw(self.sites.len() as u32);
        self.sites.push(Site::new(id, name, matrix, kind));
        self.by_name.insert(name.to_owned(), id);
        match kind {
            SiteKind::Iob { pin } => self.iobs.push((pin, id)),
            SiteKind::Acmp => self.acmps.push(id),
            SiteKind::LfOsc => self.lfosc = Some(id),
            SiteKind::RingOsc => self.ringosc = Some(id),
            SiteKind::RcOsc => self.rcosc = Some(id),
            _ => {}
        }
        id
    }

    fn add_iobs(&mut self, pins: impl Iterator<Item = u32>, matrix: u8) {
        for pin in pins {
            self.add(&format!("P{pin}"), matrix, SiteKind::Iob { pin });
        }
    }

    fn add_logic(&mut self, matrix: u8, luts2: u32, luts3: u32, luts4: u32) {
        // Ordinals continue across matrices so names stay unique.
        let base2 = self.count_class("LUT2");
        for i in 0..luts2 {
            self.add(
                &format!("LUT2_{}", base2 + i),
                matrix,
                SiteKind::Lut { inputs: 2 },
            );
        }
        let base3 = self.count_class("LUT3");
        for i in 0..luts3 {
            self.add(
                &format!("LUT3_{}", base3 + i),
                matrix,
                SiteKind::Lut { inputs: 3 },
            );
        }
        let base4 = self.count_class("LUT4");
        for i in 0..luts4 {
            self.add(
                &format!("LUT4_{}", base4 + i),
                matrix,
                SiteKind::Lut { inputs: 4 },
            );
        }
    }

    fn add_dffs(&mut self, matrix: u8, plain: u32, with_sr: u32) {
        let base = self.count_class("DFF") + self.count_class("DFFSR");
        for i in 0..plain {
            self.add(
                &format!("DFF{}", base + i),
                matrix,
                SiteKind::Dff {
                    has_set_reset: false,
                },
            );
        }
        for i in 0..with_sr {
            self.add(
                &format!("DFF{}", base + plain + i),
                matrix,
                SiteKind::Dff {
                    has_set_reset: true,
                },
            );
        }
    }

    fn add_counters(&mut self, matrix: u8, count8: u32, count14: u32) {
        let base8 = self.count_class("COUNT8");
        for i in 0..count8 {
            self.add(
                &format!("COUNT8_{}", base8 + i),
                matrix,
                SiteKind::Counter { bits: 8 },
            );
        }
        let base14 = self.count_class("COUNT14");
        for i in 0..count14 {
            self.add(
                &format!("COUNT14_{}", base14 + i),
                matrix,
                SiteKind::Counter { bits: 14 },
            );
        }
    }

    fn count_class(&self, class: &str) -> u32 {
        self.sites
            .iter()
            .filter(|s| s.kind.class_name() == class)
            .count() as u32
    }

    fn build_slg46620(&mut self) {
        // Matrix 0 serves the left-side pins and the analog blocks;
        // matrix 1 serves the right-side pins and the oscillators.
        self.add_iobs(2..=10, 0);
        self.add_iobs(12..=20, 1);

        self.add_logic(0, 2, 2, 1);
        self.add_dffs(0, 2, 1);
        self.add_counters(0, 1, 1);

        self.add_logic(1, 2, 2, 1);
        self.add_dffs(1, 2, 1);
        self.add_counters(1, 1, 1);

        for i in 0..3 {
            self.add(&format!("ACMP{i}"), 0, SiteKind::Acmp);
        }
        self.add("LFOSC", 1, SiteKind::LfOsc);
        self.add("RINGOSC", 1, SiteKind::RingOsc);
        self.add("RCOSC", 1, SiteKind::RcOsc);
        for i in 0..2 {
            self.add(&format!("VREF{i}"), 0, SiteKind::Vref);
        }
        self.add("PGA0", 0, SiteKind::Pga);
    }

    fn build_slg46140(&mut self) {
        // Single-matrix part; pin 1 is VDD, pin 7 is GND.
        self.add_iobs(2..=6, 0);
        self.add_iobs(8..=13, 0);

        self.add_logic(0, 2, 1, 1);
        self.add_dffs(0, 1, 1);
        self.add_counters(0, 2, 0);

        for i in 0..2 {
            self.add(&format!("ACMP{i}"), 0, SiteKind::Acmp);
        }
        self.add("LFOSC", 0, SiteKind::LfOsc);
        self.add("RCOSC", 0, SiteKind::RcOsc);
        self.add("VREF0", 0, SiteKind::Vref);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slg46620_shape() {
        let dev = Device::new(Part::Slg46620);
        assert_eq!(dev.part(), Part::Slg46620);
        assert_eq!(dev.iobs().len(), 18);
        assert_eq!(dev.acmp_count(), 3);
        assert_eq!(dev.oscillators().len(), 3);
        assert!(dev.iob_by_pin(6).is_some());
        assert!(dev.iob_by_pin(11).is_none());
        assert!(dev.iob_by_pin(1).is_none());
    }

    #[test]
    fn slg46140_shape() {
        let dev = Device::new(Part::Slg46140);
        assert_eq!(dev.iobs().len(), 11);
        assert_eq!(dev.acmp_count(), 2);
        // No ring oscillator on the small part.
        assert_eq!(dev.oscillators().len(), 2);
        assert!(dev.site_by_name("RINGOSC").is_none());
        assert!(dev.site_by_name("PGA0").is_none());
    }

    #[test]
    fn counter_inventory() {
        let dev = Device::new(Part::Slg46140);
        let counters: Vec<_> = dev
            .sites()
            .filter(|s| matches!(s.kind, SiteKind::Counter { .. }))
            .collect();
        assert_eq!(counters.len(), 2);

        let dev = Device::new(Part::Slg46620);
        let counters: Vec<_> = dev
            .sites()
            .filter(|s| matches!(s.kind, SiteKind::Counter { .. }))
            .collect();
        assert_eq!(counters.len(), 4);
    }

    #[test]
    fn distinguished_sites() {
        let dev = Device::new(Part::Slg46620);
        assert!(matches!(
            dev.site(dev.vdd()).kind,
            SiteKind::PowerRail { high: true }
        ));
        assert!(matches!(
            dev.site(dev.gnd()).kind,
            SiteKind::PowerRail { high: false }
        ));
        assert!(matches!(dev.site(dev.por()).kind, SiteKind::Por));
    }

    #[test]
    fn site_names_resolve() {
        let dev = Device::new(Part::Slg46620);
        let p6 = dev.site_by_name("P6").unwrap();
        assert_eq!(dev.site(p6).kind, SiteKind::Iob { pin: 6 });
        assert_eq!(dev.iob_by_pin(6), Some(p6));

        let acmp0 = dev.site_by_name("ACMP0").unwrap();
        assert_eq!(dev.acmp(0), acmp0);
    }

    #[test]
    fn iob_matrix_split() {
        let dev = Device::new(Part::Slg46620);
        let p2 = dev.iob_by_pin(2).unwrap();
        let p20 = dev.iob_by_pin(20).unwrap();
        assert_eq!(dev.site(p2).matrix, 0);
        assert_eq!(dev.site(p20).matrix, 1);
    }

    #[test]
    fn signal_source_helpers() {
        let interner = Interner::new();
        let dev = Device::new(Part::Slg46620);

        let vdd = dev.power_source(&interner);
        assert!(dev.source_is_power_rail(vdd));
        assert_eq!(dev.describe_source(vdd, &interner), "VDD");

        let gnd = dev.ground_source(&interner);
        assert!(dev.source_is_power_rail(gnd));
        assert_eq!(dev.describe_source(gnd, &interner), "GND");

        let por = dev.por_done_source(&interner);
        assert!(!dev.source_is_power_rail(por));
        assert_eq!(dev.describe_source(por, &interner), "POR");

        let p6 = dev.iob_by_pin(6).unwrap();
        let pin6 = SignalSource::new(p6, interner.get_or_intern("OUT"));
        assert_eq!(dev.describe_source(pin6, &interner), "P6");
    }

    #[test]
    fn class_counts_start_unused() {
        let dev = Device::new(Part::Slg46620);
        let counts = dev.class_counts();
        assert!(counts.iter().any(|&(c, _, t)| c == "IOB" && t == 18));
        assert!(counts.iter().all(|&(_, used, _)| used == 0));
        // Rails and POR are not reported.
        assert!(!counts.iter().any(|&(c, _, _)| c == "VDD" || c == "POR"));
    }

    #[test]
    fn marking_used_shows_in_counts() {
        let mut dev = Device::new(Part::Slg46620);
        let p2 = dev.iob_by_pin(2).unwrap();
        dev.site_mut(p2).used = true;
        let counts = dev.class_counts();
        let iob = counts.iter().find(|&&(c, _, _)| c == "IOB").unwrap();
        assert_eq!(iob.1, 1);
    }

    #[test]
    fn deterministic_construction() {
        let a = Device::new(Part::Slg46620);
        let b = Device::new(Part::Slg46620);
        assert_eq!(a.site_count(), b.site_count());
        for (sa, sb) in a.sites().zip(b.sites()) {
            assert_eq!(sa, sb);
        }
    }
}
