//! Detector selection and sub-configuration closure.
//!
//! Selecting keeps the detectors that pass a [`DetectorFilter`] and then copies exactly the
//! auxiliary records those detectors reach: their wafers, and through the wafers the bands,
//! cards, crates, tubes and telescopes. Membership lists on the copied records are cut down to
//! the copied ids so that the result never refers to a record it does not hold.

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use crate::ancestry::AncestryIndex;
use crate::error::{HwConfigError, Result, TableKind};
use crate::matcher::{Criterion, DetectorFilter, WAFER_ATTRIBUTE};
use crate::model::{Table, Tables};

/// Selection criteria for [`select`].
///
/// Telescope and tube ids narrow the wafers; match criteria test detector attributes by name.
/// A selection with nothing set keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    telescopes: Option<Vec<String>>,
    tubes: Option<Vec<String>>,
    criteria: IndexMap<String, Criterion>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep detectors on wafers of these telescopes.
    pub fn telescopes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.telescopes
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Keep detectors on wafers of these tubes.
    pub fn tubes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tubes
            .get_or_insert_with(Vec::new)
            .extend(ids.into_iter().map(Into::into));
        self
    }

    /// Match a detector attribute. A later criterion on the same attribute replaces an earlier
    /// one.
    pub fn matching(mut self, field: impl Into<String>, criterion: Criterion) -> Self {
        self.criteria.insert(field.into(), criterion);
        self
    }

    pub fn criteria(&self) -> &IndexMap<String, Criterion> {
        &self.criteria
    }

    /// True when no telescope, tube or attribute criteria are set
    pub fn is_unrestricted(&self) -> bool {
        self.telescopes.is_none() && self.tubes.is_none() && self.criteria.is_empty()
    }
}

/// Expand telescope and tube ids into the wafer ids they hold, in order and without repeats.
///
/// Returns `None` when the selection names neither telescopes nor tubes.
fn resolve_wafer_allow(tables: &Tables, selection: &Selection) -> Result<Option<Vec<String>>> {
    if selection.telescopes.is_none() && selection.tubes.is_none() {
        return Ok(None);
    }

    let mut tube_ids: Vec<&str> = Vec::new();
    for tele_id in selection.telescopes.iter().flatten() {
        let telescope = tables
            .telescopes
            .get(tele_id)
            .ok_or_else(|| HwConfigError::lookup(TableKind::Telescopes, tele_id.as_str()))?;
        tube_ids.extend(telescope.tubes.iter().map(String::as_str));
    }
    tube_ids.extend(selection.tubes.iter().flatten().map(String::as_str));

    let mut wafers: IndexSet<&str> = IndexSet::new();
    for tube_id in tube_ids {
        let tube = tables
            .tubes
            .get(tube_id)
            .ok_or_else(|| HwConfigError::lookup(TableKind::Tubes, tube_id))?;
        wafers.extend(tube.wafers.iter().map(String::as_str));
    }

    debug!("Telescope/tube selection expands to {} wafers", wafers.len());
    Ok(Some(wafers.into_iter().map(str::to_string).collect()))
}

/// Literal wafer ids in an explicit criterion must exist.
fn check_wafer_criterion(tables: &Tables, selection: &Selection) -> Result<()> {
    if let Some(Criterion::Values(ids)) = selection.criteria.get(WAFER_ATTRIBUTE) {
        if let Some(missing) = ids.iter().find(|id| !tables.wafers.contains_key(id.as_str())) {
            return Err(HwConfigError::lookup(TableKind::Wafers, missing.as_str()));
        }
    }
    Ok(())
}

/// Copy the records of `table` whose ids are in `keep`, in table order.
///
/// Every id in `keep` must exist in the table.
fn restrict<T: Clone>(
    table: &Table<T>,
    keep: &HashSet<&str>,
    kind: TableKind,
) -> Result<Table<T>> {
    if let Some(missing) = keep.iter().find(|id| !table.contains_key(**id)) {
        return Err(HwConfigError::lookup(kind, *missing));
    }
    Ok(table
        .iter()
        .filter(|(id, _)| keep.contains(id.as_str()))
        .map(|(id, record)| (id.clone(), record.clone()))
        .collect())
}

fn retain_known(list: &mut Vec<String>, keep: &HashSet<&str>) {
    list.retain(|id| keep.contains(id.as_str()));
}

/// Build a new, self-contained table set holding the detectors that match `selection` and
/// every record they reach.
///
/// The source tables are never modified. An unrestricted selection returns a full copy.
/// Fails on unknown telescope, tube or literal wafer ids, on malformed patterns, and on any
/// reference from a kept record that does not resolve.
pub fn select(tables: &Tables, selection: &Selection) -> Result<Tables> {
    if selection.is_unrestricted() {
        debug!("Unrestricted selection, copying all tables");
        return Ok(tables.clone());
    }

    let wafer_allow = resolve_wafer_allow(tables, selection)?;
    check_wafer_criterion(tables, selection)?;
    let filter = DetectorFilter::compile(&selection.criteria, wafer_allow.as_deref())?;

    let mut detectors = Table::new();
    let mut wafer_ids: HashSet<&str> = HashSet::new();
    let mut band_ids: HashSet<&str> = HashSet::new();
    let mut detector_cards: IndexSet<&str> = IndexSet::new();
    for (key, det) in &tables.detectors {
        if filter.accepts(det) {
            wafer_ids.insert(det.wafer.as_str());
            band_ids.insert(det.band.as_str());
            detector_cards.insert(det.card.as_str());
            detectors.insert(key.clone(), det.clone());
        }
    }

    let index = AncestryIndex::new(tables);
    let mut card_ids: HashSet<&str> = HashSet::new();
    let mut crate_ids: HashSet<&str> = HashSet::new();
    let mut tube_ids: HashSet<&str> = HashSet::new();
    let mut telescope_ids: HashSet<&str> = HashSet::new();

    for wafer_id in &wafer_ids {
        let lineage = index.wafer(wafer_id)?;
        band_ids.extend(lineage.bands.iter().map(String::as_str));
        card_ids.insert(lineage.card);
        crate_ids.insert(lineage.crate_id);
        tube_ids.insert(lineage.tube);
        telescope_ids.insert(lineage.telescope);
    }

    // Detectors name a card directly as well as through their wafer
    for card_id in detector_cards {
        if card_ids.insert(card_id) {
            crate_ids.insert(index.crate_of(card_id)?);
        }
    }
    for crate_id in &crate_ids {
        if let Some(crt) = tables.crates.get(*crate_id) {
            telescope_ids.insert(crt.telescope.as_str());
        }
    }

    let wafers = restrict(&tables.wafers, &wafer_ids, TableKind::Wafers)?;
    let bands = restrict(&tables.bands, &band_ids, TableKind::Bands)?;
    let cards = restrict(&tables.cards, &card_ids, TableKind::Cards)?;
    let mut crates = restrict(&tables.crates, &crate_ids, TableKind::Crates)?;
    let mut tubes = restrict(&tables.tubes, &tube_ids, TableKind::Tubes)?;
    let mut telescopes = restrict(&tables.telescopes, &telescope_ids, TableKind::Telescopes)?;

    for tele in telescopes.values_mut() {
        retain_known(&mut tele.tubes, &tube_ids);
        tele.fwhm.retain(|band, _| band_ids.contains(band.as_str()));
    }
    for tube in tubes.values_mut() {
        retain_known(&mut tube.wafers, &wafer_ids);
    }
    for crt in crates.values_mut() {
        retain_known(&mut crt.cards, &card_ids);
    }

    let result = Tables {
        bands,
        wafers,
        tubes,
        telescopes,
        cards,
        crates,
        detectors,
    };
    info!(
        "Selected {} of {} detectors: {}",
        result.detectors.len(),
        tables.detectors.len(),
        result.counts()
    );
    Ok(result)
}
