//! Shared checks for hwconfig integration tests

use std::collections::HashSet;

use hwconfig::{ConfigStore, Criterion, Selection};

/// A spread of selections exercising every criterion kind.
pub fn selections() -> Vec<Selection> {
    vec![
        Selection::new().telescopes(["LAT"]),
        Selection::new().tubes(["ST0"]),
        Selection::new().tubes(["LT0", "ST0"]),
        Selection::new().matching("pixel", Criterion::pattern("02.")),
        Selection::new().matching("band", Criterion::values(["MF2"])),
        Selection::new()
            .telescopes(["SAT"])
            .matching("wafer", Criterion::values(["01"])),
        Selection::new()
            .tubes(["LT1"])
            .matching("pol", Criterion::values(["A"]))
            .matching("handed", Criterion::values(["R"])),
        Selection::new().matching("handed", Criterion::values(["L"])),
        Selection::new().matching("band", Criterion::values(["none"])),
    ]
}

/// Ids of the auxiliary records reachable from the detectors of a store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reachable {
    pub wafers: HashSet<String>,
    pub bands: HashSet<String>,
    pub cards: HashSet<String>,
    pub crates: HashSet<String>,
    pub tubes: HashSet<String>,
    pub telescopes: HashSet<String>,
}

/// Walk from each detector of `store` through `source` to find every record it reaches.
pub fn reachable_from_detectors(store: &ConfigStore, source: &ConfigStore) -> Reachable {
    let mut r = Reachable::default();
    for det in store.detectors().values() {
        r.wafers.insert(det.wafer.clone());
        r.bands.insert(det.band.clone());
        r.cards.insert(det.card.clone());
    }
    for wafer_id in &r.wafers {
        let wafer = &source.wafers()[wafer_id];
        r.bands.extend(wafer.bands.iter().cloned());
        r.cards.insert(wafer.card.clone());
    }
    for (tube_id, tube) in source.tubes() {
        if tube.wafers.iter().any(|w| r.wafers.contains(w)) {
            r.tubes.insert(tube_id.clone());
        }
    }
    for (crate_id, crt) in source.crates() {
        if crt.cards.iter().any(|c| r.cards.contains(c)) {
            r.crates.insert(crate_id.clone());
            r.telescopes.insert(crt.telescope.clone());
        }
    }
    for (tele_id, tele) in source.telescopes() {
        if tele.tubes.iter().any(|t| r.tubes.contains(t)) {
            r.telescopes.insert(tele_id.clone());
        }
    }
    r
}

pub fn keys<T>(table: &hwconfig::Table<T>) -> HashSet<String> {
    table.keys().cloned().collect()
}
