//! Sample configuration used by tests.
//!
//! Two telescopes sharing one band catalog:
//!
//! ```text
//! LAT  crate "0"  LT0 -> wafers 00, 01 (LF1, LF2)
//!                 LT1 -> wafer  02     (MF1, MF2)
//! SAT  crate "1"  ST0 -> wafers 03, 04 (MF1, MF2)
//! ```
//!
//! Every wafer carries one detector per (pixel, band) for pixels
//! `000 020 025 029 0201 102`, polarization `A` on the first band and `B` on the second.
//! Detectors on wafer 03 are left-handed, on wafer 04 right-handed, elsewhere unset.

use indexmap::IndexMap;

use crate::model::{Band, Card, Crate, Detector, Tables, Telescope, Tube, Wafer};
use crate::store::ConfigStore;

pub const SAMPLE_PIXELS: [&str; 6] = ["000", "020", "025", "029", "0201", "102"];

fn band(center: f64, net: f64) -> Band {
    Band {
        center,
        low: center * 0.85,
        high: center * 1.15,
        bandpass: String::new(),
        net,
        fknee: 50.0,
        fmin: 0.01,
        alpha: 3.5,
        elevation_a: 0.14,
        elevation_c: 0.8,
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Build the sample table set.
pub fn sample_tables() -> Tables {
    let mut tables = Tables::default();

    tables.bands.insert("LF1".into(), band(27.0, 429.0));
    tables.bands.insert("LF2".into(), band(39.0, 261.0));
    tables.bands.insert("MF1".into(), band(93.0, 305.0));
    tables.bands.insert("MF2".into(), band(145.0, 280.0));

    for (wafer, kind, bands) in [
        ("00", "LFL", ["LF1", "LF2"]),
        ("01", "LFL", ["LF1", "LF2"]),
        ("02", "MFL", ["MF1", "MF2"]),
        ("03", "MFS", ["MF1", "MF2"]),
        ("04", "MFS", ["MF1", "MF2"]),
    ] {
        tables.wafers.insert(
            wafer.into(),
            Wafer {
                kind: kind.into(),
                packing: "F".into(),
                rhombusgap: 0.5,
                npixel: 37,
                pixsize: 18.0,
                bands: ids(&bands),
                card: wafer.into(),
            },
        );
        tables.cards.insert(
            wafer.into(),
            Card {
                nbias: 12,
                ncoax: 2,
                nchannel: 2000,
            },
        );
    }

    for (tube, kind, wafers, location) in [
        ("LT0", "LFL", vec!["00", "01"], 0),
        ("LT1", "MFL", vec!["02"], 1),
        ("ST0", "MFS", vec!["03", "04"], 0),
    ] {
        tables.tubes.insert(
            tube.into(),
            Tube {
                kind: kind.into(),
                waferspace: 127.89,
                wafers: ids(&wafers),
                platescale: 0.0047619,
                location,
            },
        );
    }

    let lat_fwhm: IndexMap<String, f64> = [("LF1", 7.4), ("LF2", 5.1), ("MF1", 2.2), ("MF2", 1.4)]
        .into_iter()
        .map(|(b, w)| (b.to_string(), w))
        .collect();
    let sat_fwhm: IndexMap<String, f64> = [("MF1", 25.0), ("MF2", 17.0)]
        .into_iter()
        .map(|(b, w)| (b.to_string(), w))
        .collect();
    tables.telescopes.insert(
        "LAT".into(),
        Telescope {
            tubes: ids(&["LT0", "LT1"]),
            platescale: 0.00495,
            tubespace: 180.0,
            fwhm: lat_fwhm,
        },
    );
    tables.telescopes.insert(
        "SAT".into(),
        Telescope {
            tubes: ids(&["ST0"]),
            platescale: 0.056689,
            tubespace: 700.0,
            fwhm: sat_fwhm,
        },
    );

    tables.crates.insert(
        "0".into(),
        Crate {
            cards: ids(&["00", "01", "02"]),
            telescope: "LAT".into(),
        },
    );
    tables.crates.insert(
        "1".into(),
        Crate {
            cards: ids(&["03", "04"]),
            telescope: "SAT".into(),
        },
    );

    let mut index = 0;
    for (wafer_id, wafer) in &tables.wafers {
        let telescope = if wafer_id.as_str() < "03" {
            &tables.telescopes["LAT"]
        } else {
            &tables.telescopes["SAT"]
        };
        let handed = match wafer_id.as_str() {
            "03" => Some("L".to_string()),
            "04" => Some("R".to_string()),
            _ => None,
        };
        let mut channel = 0;
        for pixel in SAMPLE_PIXELS {
            for (band_index, band_id) in wafer.bands.iter().enumerate() {
                let det = Detector {
                    wafer: wafer_id.clone(),
                    index,
                    pixel: pixel.to_string(),
                    band: band_id.clone(),
                    fwhm: telescope.fwhm[band_id],
                    pol: if band_index == 0 { "A" } else { "B" }.to_string(),
                    handed: handed.clone(),
                    card: wafer.card.clone(),
                    channel,
                    coax: 0,
                    bias: channel / 4,
                    quat: [0.0, 0.0, 0.0, 1.0],
                    extra: IndexMap::new(),
                };
                tables.detectors.insert(det.composite_key(), det);
                index += 1;
                channel += 1;
            }
        }
    }

    tables
}

/// Build the sample configuration as a store.
pub fn sample_store() -> ConfigStore {
    ConfigStore::from_tables(sample_tables())
}
