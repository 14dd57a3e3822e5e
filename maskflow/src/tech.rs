//!
//! # Technology Database
//!
//! Per-layer design rules, via definitions, and antenna rules, keyed by
//! [LayerId] and via-definition name. Absence of a rule means the
//! corresponding check is skipped for that layer, never an error.
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use log::info;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::data::LayerId;
use crate::geom::{Coord, Dir, Size};
use crate::utils::SerdeFile;

/// # Layer Definition
///
/// Display and mapping data for one layer: GDS layer/datatype numbers and
/// the preferred routing direction, plus a display color for editors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LayerDef {
    pub layer: LayerId,
    /// GDS layer number
    pub gds_layer: i16,
    /// GDS datatype number
    pub gds_datatype: i16,
    /// Display color, e.g. "#39bae6"
    pub color: Option<String>,
    /// Preferred routing direction, if the layer is routable
    pub routing_dir: Option<Dir>,
}

/// # Per-Layer Rule Set
///
/// All entries optional; a missing entry skips the corresponding check.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    pub min_width: Option<Coord>,
    pub min_spacing: Option<Coord>,
    pub min_area: Option<Coord>,
    pub min_density: Option<f64>,
    pub max_density: Option<f64>,
}

/// # Via Definition
///
/// Cut geometry and enclosure requirements connecting a bottom and top layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ViaDef {
    pub name: String,
    pub bottom: LayerId,
    pub cut: LayerId,
    pub top: LayerId,
    /// Cut size (width, height)
    pub cut_size: Size,
    /// Minimum cut-to-cut spacing
    pub spacing: Coord,
    /// Required enclosure of the cut by the bottom layer
    pub enclosure_bottom: Coord,
    /// Required enclosure of the cut by the top layer
    pub enclosure_top: Coord,
}

/// # Antenna Rule
///
/// Bounds the ratio of same-layer conductive area to gate area on a net.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AntennaRule {
    pub layer: LayerId,
    pub max_ratio: f64,
}

/// # Technology Database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnologyDatabase {
    pub name: String,
    /// Design-units per micrometer
    pub units: f64,
    /// Minimum manufacturing grid, in design units
    pub grid: Coord,
    pub layers: Vec<LayerDef>,
    /// Via definitions, by name
    pub vias: BTreeMap<String, ViaDef>,
    /// Rule sets, by layer
    #[serde(with = "rules_serde")]
    pub rules: BTreeMap<LayerId, RuleSet>,
    pub antenna_rules: Vec<AntennaRule>,
}
impl Default for TechnologyDatabase {
    fn default() -> Self {
        Self::example()
    }
}

/// The rules table as a sequence of (layer, rules) pairs on the wire.
/// [LayerId] is a struct, which JSON cannot use as a map key.
mod rules_serde {
    use super::{LayerId, RuleSet};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<LayerId, RuleSet>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        map.iter().collect::<Vec<_>>().serialize(serializer)
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<LayerId, RuleSet>, D::Error> {
        let pairs = Vec::<(LayerId, RuleSet)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
impl SerdeFile for TechnologyDatabase {}
impl TechnologyDatabase {
    /// Create a new and empty technology named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: 1000.0,
            grid: 0.005,
            layers: Vec::new(),
            vias: BTreeMap::new(),
            rules: BTreeMap::new(),
            antenna_rules: Vec::new(),
        }
    }
    /// Get the [LayerDef] for `layer`, if defined
    pub fn layer(&self, layer: &LayerId) -> Option<&LayerDef> {
        self.layers.iter().find(|l| &l.layer == layer)
    }
    /// Get the [RuleSet] for `layer`, if defined
    pub fn rules(&self, layer: &LayerId) -> Option<&RuleSet> {
        self.rules.get(layer)
    }
    /// Get the [ViaDef] named `name`, if defined
    pub fn viadef(&self, name: &str) -> Option<&ViaDef> {
        self.vias.get(name)
    }
    /// Find a via definition connecting layers `a` and `b`, in either order
    pub fn viadef_between(&self, a: &LayerId, b: &LayerId) -> Option<&ViaDef> {
        self.vias.values().find(|v| {
            (&v.bottom == a && &v.top == b) || (&v.bottom == b && &v.top == a)
        })
    }
    /// Antenna rules applying to `layer`
    pub fn antenna_rules_for(&self, layer: &LayerId) -> Vec<&AntennaRule> {
        self.antenna_rules
            .iter()
            .filter(|r| &r.layer == layer)
            .collect()
    }
    /// The first routable layer preferring direction `dir`
    pub fn routing_layer(&self, dir: Dir) -> Option<&LayerDef> {
        self.layers.iter().find(|l| l.routing_dir == Some(dir))
    }
    /// Snap `v` to the manufacturing grid
    pub fn snap(&self, v: Coord) -> Coord {
        if self.grid <= 0.0 {
            return v;
        }
        (v / self.grid).round() * self.grid
    }

    /// Synthesize missing `CONT_ACTIVE` / `CONT_POLY` contact definitions,
    /// for imports from formats that omit them.
    ///
    /// Cut size and spacing come from any existing contact-layer rule set
    /// (falling back to 0.22 / 0.25 um), enclosures from any existing
    /// enclosure data between the relevant layer pairs (falling back to
    /// 0.06 / 0.08 um). Existing definitions are never overwritten.
    pub fn synthesize_contacts(&mut self) {
        let cont = LayerId::drawing("CONT");
        let cut_size = self
            .rules(&cont)
            .and_then(|r| r.min_width)
            .unwrap_or(0.22);
        let cut_spacing = self
            .rules(&cont)
            .and_then(|r| r.min_spacing)
            .unwrap_or(0.25);
        for (name, bottom) in [
            ("CONT_ACTIVE", LayerId::drawing("ACTIVE")),
            ("CONT_POLY", LayerId::drawing("POLY")),
        ] {
            if self.vias.contains_key(name) {
                continue;
            }
            // Borrow enclosures from any existing via touching the same bottom layer
            let (enc_bottom, enc_top) = self
                .vias
                .values()
                .find(|v| v.bottom == bottom)
                .map(|v| (v.enclosure_bottom, v.enclosure_top))
                .unwrap_or((0.06, 0.08));
            info!("synthesizing contact definition {}", name);
            self.vias.insert(
                name.to_string(),
                ViaDef {
                    name: name.to_string(),
                    bottom,
                    cut: cont.clone(),
                    top: LayerId::drawing("MET1"),
                    cut_size: Size::new(cut_size, cut_size),
                    spacing: cut_spacing,
                    enclosure_bottom: enc_bottom,
                    enclosure_top: enc_top,
                },
            );
        }
    }

    /// An example generic technology, sufficient for tests and demos:
    /// active/poly front-end layers, two routing metals, and one via stack.
    pub fn example() -> Self {
        let mut tech = Self::new("generic180");
        let defs = [
            ("ACTIVE", 1i16, None),
            ("POLY", 2, None),
            ("CONT", 3, None),
            ("MET1", 4, Some(Dir::Horiz)),
            ("VIA1", 5, None),
            ("MET2", 6, Some(Dir::Vert)),
        ];
        for (name, num, dir) in defs {
            tech.layers.push(LayerDef {
                layer: LayerId::drawing(name),
                gds_layer: num,
                gds_datatype: 0,
                color: None,
                routing_dir: dir,
            });
        }
        let rule = |w: Coord, s: Coord, a: Option<Coord>| RuleSet {
            min_width: Some(w),
            min_spacing: Some(s),
            min_area: a,
            min_density: None,
            max_density: None,
        };
        tech.rules.insert(LayerId::drawing("ACTIVE"), rule(0.15, 0.2, Some(0.02)));
        tech.rules.insert(LayerId::drawing("POLY"), rule(0.15, 0.2, Some(0.02)));
        tech.rules.insert(LayerId::drawing("CONT"), rule(0.22, 0.25, None));
        tech.rules.insert(LayerId::drawing("MET1"), rule(0.1, 0.1, None));
        tech.rules.insert(LayerId::drawing("VIA1"), rule(0.26, 0.26, None));
        tech.rules.insert(LayerId::drawing("MET2"), rule(0.1, 0.1, None));
        tech.vias.insert(
            "VIA1".to_string(),
            ViaDef {
                name: "VIA1".to_string(),
                bottom: LayerId::drawing("MET1"),
                cut: LayerId::drawing("VIA1"),
                top: LayerId::drawing("MET2"),
                cut_size: Size::new(0.26, 0.26),
                spacing: 0.26,
                enclosure_bottom: 0.05,
                enclosure_top: 0.05,
            },
        );
        tech.synthesize_contacts();
        tech.antenna_rules.push(AntennaRule {
            layer: LayerId::drawing("MET1"),
            max_ratio: 400.0,
        });
        tech.antenna_rules.push(AntennaRule {
            layer: LayerId::drawing("MET2"),
            max_ratio: 400.0,
        });
        tech
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SerializationFormat;

    #[test]
    fn lookups() {
        let tech = TechnologyDatabase::example();
        assert!(tech.rules(&LayerId::drawing("MET1")).is_some());
        assert!(tech.rules(&LayerId::drawing("MET9")).is_none());
        assert!(tech.viadef("VIA1").is_some());
        let v = tech
            .viadef_between(&LayerId::drawing("MET1"), &LayerId::drawing("MET2"))
            .unwrap();
        assert_eq!(v.name, "VIA1");
        assert_eq!(
            tech.routing_layer(Dir::Vert).unwrap().layer,
            LayerId::drawing("MET2")
        );
    }
    #[test]
    fn contact_synthesis_fills_absent_only() {
        let mut tech = TechnologyDatabase::new("t");
        tech.synthesize_contacts();
        // Fallback cut size applies with no CONT rules present
        let cd = tech.viadef("CONT_ACTIVE").unwrap();
        assert_eq!(cd.cut_size, Size::new(0.22, 0.22));
        assert_eq!(cd.spacing, 0.25);
        assert_eq!((cd.enclosure_bottom, cd.enclosure_top), (0.06, 0.08));

        // Existing definitions are never overwritten
        let mut tech = TechnologyDatabase::example();
        let before = tech.viadef("CONT_POLY").unwrap().clone();
        tech.synthesize_contacts();
        assert_eq!(tech.viadef("CONT_POLY").unwrap(), &before);
    }
    #[test]
    fn grid_snap() {
        let tech = TechnologyDatabase::example();
        assert!((tech.snap(0.1234) - 0.125).abs() < 1e-12);
    }
    #[test]
    fn serde_roundtrip() {
        let tech = TechnologyDatabase::example();
        let dir = tempfile::TempDir::new().unwrap();
        for (fmt, name) in [
            (SerializationFormat::Json, "t.json"),
            (SerializationFormat::Yaml, "t.yaml"),
        ] {
            let path = dir.path().join(name);
            tech.save(fmt, &path).unwrap();
            let back = TechnologyDatabase::open(&path, fmt).unwrap();
            assert_eq!(back, tech);
        }
    }
}
