//! Properties of detector selection against the sample configuration

mod common;

use common::{keys, reachable_from_detectors, selections};
use hwconfig::test_util::{sample_store, SAMPLE_PIXELS};
use hwconfig::{Criterion, HwConfigError, Selection, TableKind};

#[test]
fn test_selection_results_are_closed() {
    let store = sample_store();
    for selection in selections() {
        let selected = store.select(&selection).unwrap();
        if let Err(e) = selected.verify() {
            panic!("{:?} produced a dangling reference: {}", selection, e);
        }
    }
}

#[test]
fn test_selection_results_are_minimal() {
    let store = sample_store();
    for selection in selections() {
        let selected = store.select(&selection).unwrap();
        let reachable = reachable_from_detectors(&selected, &store);

        assert_eq!(keys(selected.wafers()), reachable.wafers, "{:?}", selection);
        assert_eq!(keys(selected.bands()), reachable.bands, "{:?}", selection);
        assert_eq!(keys(selected.cards()), reachable.cards, "{:?}", selection);
        assert_eq!(keys(selected.crates()), reachable.crates, "{:?}", selection);
        assert_eq!(keys(selected.tubes()), reachable.tubes, "{:?}", selection);
        assert_eq!(
            keys(selected.telescopes()),
            reachable.telescopes,
            "{:?}",
            selection
        );
    }
}

#[test]
fn test_selection_preserves_table_order() {
    let store = sample_store();
    for selection in selections() {
        let selected = store.select(&selection).unwrap();
        let source_order: Vec<&String> = store
            .detectors()
            .keys()
            .filter(|k| selected.detectors().contains_key(*k))
            .collect();
        assert_eq!(
            selected.detectors().keys().collect::<Vec<_>>(),
            source_order
        );

        for (tele_id, tele) in selected.telescopes() {
            let expected: Vec<&String> = store.telescopes()[tele_id]
                .tubes
                .iter()
                .filter(|t| selected.tubes().contains_key(*t))
                .collect();
            assert_eq!(tele.tubes.iter().collect::<Vec<_>>(), expected);
        }
    }
}

#[test]
fn test_noop_selection_is_independent_copy() {
    let store = sample_store();
    let mut copy = store.select(&Selection::new()).unwrap();
    assert_eq!(copy, store);

    let mut tables = copy.tables().clone();
    tables.detectors.clear();
    tables.bands["LF1"].center = 0.0;
    copy.replace_tables(tables);

    assert_eq!(store, sample_store());
    assert_ne!(copy, store);
}

#[test]
fn test_telescope_union_with_wafer() {
    let store = sample_store();
    // Wafer 01 is on LAT, not on SAT
    let selection = Selection::new()
        .telescopes(["SAT"])
        .matching("wafer", Criterion::values(["01"]));
    let selected = store.select(&selection).unwrap();

    let wafers: Vec<&str> = selected
        .detectors()
        .values()
        .map(|d| d.wafer.as_str())
        .collect();
    assert!(wafers.iter().all(|w| ["01", "03", "04"].contains(w)));
    for wafer in ["01", "03", "04"] {
        assert!(wafers.contains(&wafer), "missing wafer {}", wafer);
    }
    assert_eq!(selected.detectors().len(), 3 * SAMPLE_PIXELS.len() * 2);
}

#[test]
fn test_pixel_pattern_is_full_match() {
    let store = sample_store();
    let selected = store
        .select(&Selection::new().matching("pixel", Criterion::pattern("02.")))
        .unwrap();

    let pixels: std::collections::HashSet<&str> = selected
        .detectors()
        .values()
        .map(|d| d.pixel.as_str())
        .collect();
    assert_eq!(pixels, ["020", "025", "029"].into_iter().collect());
}

#[test]
fn test_unknown_tube_fails_and_leaves_store() {
    let store = sample_store();
    let err = store
        .select(&Selection::new().tubes(["doesnotexist"]))
        .unwrap_err();
    assert!(matches!(
        err,
        HwConfigError::Lookup {
            table: TableKind::Tubes,
            ref id,
        } if id == "doesnotexist"
    ));
    assert_eq!(store, sample_store());
}

#[test]
fn test_malformed_pattern_fails() {
    let store = sample_store();
    let err = store
        .select(&Selection::new().matching("band", Criterion::pattern("[MF")))
        .unwrap_err();
    assert!(matches!(err, HwConfigError::MalformedCriterion { .. }));
}

#[test]
fn test_downstream_band_resolution() {
    let store = sample_store();
    let selected = store
        .select(&Selection::new().tubes(["LT0"]))
        .unwrap();
    for det in selected.detectors().values() {
        let band = selected.band_of(det).unwrap();
        assert_eq!(band, &store.bands()[&det.band]);
    }
}
