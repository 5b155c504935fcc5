//! Record types for the hardware configuration tables.
//!
//! Every table maps a string id to a record and keeps insertion order. Records refer to each
//! other only by id; membership (which tube holds a wafer, which crate holds a card) is stored
//! once on the parent and derived in the other direction by [`crate::ancestry::AncestryIndex`].

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping from record id to record.
pub type Table<T> = IndexMap<String, T>;

/// A frequency band and the parameters of its noise model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Band center frequency in GHz
    pub center: f64,
    /// Lower band edge in GHz
    pub low: f64,
    /// Upper band edge in GHz
    pub high: f64,
    /// Bandpass label, empty for a top-hat band
    pub bandpass: String,
    /// Noise equivalent temperature
    #[serde(rename = "NET")]
    pub net: f64,
    /// Noise knee frequency in Hz
    pub fknee: f64,
    /// Minimum noise frequency in Hz
    pub fmin: f64,
    /// Noise spectral index
    pub alpha: f64,
    /// Elevation noise scaling coefficient A
    #[serde(rename = "A")]
    pub elevation_a: f64,
    /// Elevation noise scaling coefficient C
    #[serde(rename = "C")]
    pub elevation_c: f64,
}

/// A detector-bearing wafer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wafer {
    #[serde(rename = "type")]
    pub kind: String,
    /// Pixel packing style
    pub packing: String,
    /// Gap between rhombi in mm
    pub rhombusgap: f64,
    pub npixel: u32,
    /// Pixel size in mm
    pub pixsize: f64,
    /// Bands observed by this wafer
    pub bands: Vec<String>,
    /// Readout card serving this wafer
    pub card: String,
}

/// An optics tube holding wafers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tube {
    #[serde(rename = "type")]
    pub kind: String,
    /// Spacing between wafers in mm
    pub waferspace: f64,
    pub wafers: Vec<String>,
    /// Degrees per mm on the focal plane of this tube
    pub platescale: f64,
    /// Position index of the tube within its telescope
    pub location: u32,
}

/// A telescope grouping tubes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telescope {
    pub tubes: Vec<String>,
    pub platescale: f64,
    /// Spacing between tubes in mm
    pub tubespace: f64,
    /// Beam FWHM in arcminutes, keyed by band id
    pub fwhm: IndexMap<String, f64>,
}

/// A readout card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub nbias: u32,
    pub ncoax: u32,
    pub nchannel: u32,
}

/// A readout crate holding cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crate {
    pub cards: Vec<String>,
    pub telescope: String,
}

/// A single detector.
///
/// Keys in the persisted record beyond the known fields are kept in `extra`, in order, so they
/// survive a load/dump cycle and can be used as selection attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detector {
    pub wafer: String,
    #[serde(rename = "ID")]
    pub index: u32,
    pub pixel: String,
    pub band: String,
    /// Beam FWHM in arcminutes
    pub fwhm: f64,
    /// Polarization tag
    pub pol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handed: Option<String>,
    pub card: String,
    pub channel: u32,
    pub coax: u32,
    pub bias: u32,
    /// Orientation quaternion (x, y, z, w)
    pub quat: [f64; 4],
    #[serde(flatten)]
    pub extra: IndexMap<String, toml::Value>,
}

impl Detector {
    /// Composite key identifying this detector within a store.
    pub fn composite_key(&self) -> String {
        format!("{}_{}_{}_{}", self.wafer, self.pixel, self.band, self.pol)
    }

    /// Value of a named attribute as used for selection.
    ///
    /// Returns `None` when the detector does not carry the attribute, including an unset
    /// `handed`, the non-scalar `quat`, and non-scalar extra values.
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "wafer" => Cow::Borrowed(self.wafer.as_str()),
            "ID" => Cow::Owned(self.index.to_string()),
            "pixel" => Cow::Borrowed(self.pixel.as_str()),
            "band" => Cow::Borrowed(self.band.as_str()),
            "fwhm" => Cow::Owned(toml::Value::Float(self.fwhm).to_string()),
            "pol" => Cow::Borrowed(self.pol.as_str()),
            "handed" => Cow::Borrowed(self.handed.as_deref()?),
            "card" => Cow::Borrowed(self.card.as_str()),
            "channel" => Cow::Owned(self.channel.to_string()),
            "coax" => Cow::Owned(self.coax.to_string()),
            "bias" => Cow::Owned(self.bias.to_string()),
            "quat" => return None,
            other => match self.extra.get(other)? {
                toml::Value::String(s) => Cow::Borrowed(s.as_str()),
                toml::Value::Array(_) | toml::Value::Table(_) => return None,
                scalar => Cow::Owned(scalar.to_string()),
            },
        };
        Some(value)
    }
}

/// The complete table set of a hardware configuration, in persisted key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub bands: Table<Band>,
    pub wafers: Table<Wafer>,
    pub tubes: Table<Tube>,
    pub telescopes: Table<Telescope>,
    pub cards: Table<Card>,
    pub crates: Table<Crate>,
    pub detectors: Table<Detector>,
}

impl Tables {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            bands: self.bands.len(),
            wafers: self.wafers.len(),
            tubes: self.tubes.len(),
            telescopes: self.telescopes.len(),
            cards: self.cards.len(),
            crates: self.crates.len(),
            detectors: self.detectors.len(),
        }
    }
}

/// Number of records held in each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub bands: usize,
    pub wafers: usize,
    pub tubes: usize,
    pub telescopes: usize,
    pub cards: usize,
    pub crates: usize,
    pub detectors: usize,
}

impl fmt::Display for TableCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} telescopes, {} tubes, {} wafers, {} detectors, {} bands, {} cards, {} crates",
            self.telescopes,
            self.tubes,
            self.wafers,
            self.detectors,
            self.bands,
            self.cards,
            self.crates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::sample_tables;

    #[test]
    fn test_composite_key() {
        let tables = sample_tables();
        for (key, det) in &tables.detectors {
            assert_eq!(key, &det.composite_key());
        }
    }

    #[test]
    fn test_attribute_known_fields() {
        let tables = sample_tables();
        let det = &tables.detectors["00_020_LF1_A"];
        assert_eq!(det.attribute("wafer").as_deref(), Some("00"));
        assert_eq!(det.attribute("pixel").as_deref(), Some("020"));
        assert_eq!(det.attribute("band").as_deref(), Some("LF1"));
        assert_eq!(det.attribute("pol").as_deref(), Some("A"));
        assert_eq!(det.attribute("fwhm").as_deref(), Some("7.4"));
        assert_eq!(det.attribute("ID").as_deref(), Some(&*det.index.to_string()));
    }

    #[test]
    fn test_attribute_absent_values() {
        let tables = sample_tables();
        let det = &tables.detectors["00_020_LF1_A"];
        assert_eq!(det.handed, None);
        assert!(det.attribute("handed").is_none());
        assert!(det.attribute("quat").is_none());
        assert!(det.attribute("not_a_field").is_none());
    }

    #[test]
    fn test_attribute_extra_values() {
        let mut tables = sample_tables();
        let det = tables.detectors.get_mut("00_020_LF1_A").unwrap();
        det.extra
            .insert("tag".to_string(), toml::Value::String("dark".to_string()));
        det.extra.insert("gain".to_string(), toml::Value::Integer(3));
        det.extra.insert(
            "offsets".to_string(),
            toml::Value::Array(vec![toml::Value::Float(0.5)]),
        );

        assert_eq!(det.attribute("tag").as_deref(), Some("dark"));
        assert_eq!(det.attribute("gain").as_deref(), Some("3"));
        assert!(det.attribute("offsets").is_none());
    }

    #[test]
    fn test_counts() {
        let counts = sample_tables().counts();
        assert_eq!(counts.telescopes, 2);
        assert_eq!(counts.tubes, 3);
        assert_eq!(counts.wafers, 5);
        assert_eq!(counts.crates, 2);
        assert!(counts.to_string().starts_with("2 telescopes, 3 tubes"));
    }
}
