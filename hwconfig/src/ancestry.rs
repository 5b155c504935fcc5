//! Derived wafer ancestry.
//!
//! Tables only store membership top-down (telescope -> tubes, tube -> wafers, crate -> cards).
//! [`AncestryIndex`] inverts those lists for one snapshot of the tables so that, for any wafer,
//! the tube, telescope, card, crate and bands above it can be looked up. The index borrows the
//! tables and is rebuilt for every query.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{HwConfigError, Result, TableKind};
use crate::model::Tables;

/// Everything a wafer hangs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaferAncestry<'a> {
    pub card: &'a str,
    pub crate_id: &'a str,
    pub bands: &'a [String],
    pub tube: &'a str,
    pub telescope: &'a str,
}

/// Child-to-parent lookups derived from one table snapshot.
#[derive(Debug)]
pub struct AncestryIndex<'a> {
    tables: &'a Tables,
    tube_of_wafer: HashMap<&'a str, &'a str>,
    telescope_of_tube: HashMap<&'a str, &'a str>,
    crate_of_card: HashMap<&'a str, &'a str>,
}

/// Invert a parent -> children membership table. The first parent listing a child wins.
fn invert<'a, I>(kind: TableKind, memberships: I) -> HashMap<&'a str, &'a str>
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let mut parents = HashMap::new();
    for (parent, children) in memberships {
        for child in children {
            if let Some(first) = parents.get(child.as_str()) {
                if *first != parent {
                    warn!(
                        "'{}' is listed by both {} '{}' and '{}', keeping '{}'",
                        child, kind, first, parent, first
                    );
                }
                continue;
            }
            parents.insert(child.as_str(), parent);
        }
    }
    parents
}

impl<'a> AncestryIndex<'a> {
    /// Build the inverse membership maps for a table snapshot.
    pub fn new(tables: &'a Tables) -> Self {
        let telescope_of_tube = invert(
            TableKind::Telescopes,
            tables
                .telescopes
                .iter()
                .map(|(id, tele)| (id.as_str(), tele.tubes.as_slice())),
        );
        let tube_of_wafer = invert(
            TableKind::Tubes,
            tables
                .tubes
                .iter()
                .map(|(id, tube)| (id.as_str(), tube.wafers.as_slice())),
        );
        let crate_of_card = invert(
            TableKind::Crates,
            tables
                .crates
                .iter()
                .map(|(id, crt)| (id.as_str(), crt.cards.as_slice())),
        );

        Self {
            tables,
            tube_of_wafer,
            telescope_of_tube,
            crate_of_card,
        }
    }

    /// Tube holding a wafer. A failed lookup names the orphaned wafer.
    pub fn tube_of(&self, wafer: &str) -> Result<&'a str> {
        self.tube_of_wafer
            .get(wafer)
            .copied()
            .ok_or_else(|| HwConfigError::lookup(TableKind::Tubes, wafer))
    }

    /// Telescope holding a tube
    pub fn telescope_of(&self, tube: &str) -> Result<&'a str> {
        self.telescope_of_tube
            .get(tube)
            .copied()
            .ok_or_else(|| HwConfigError::lookup(TableKind::Telescopes, tube))
    }

    /// Crate holding a card
    pub fn crate_of(&self, card: &str) -> Result<&'a str> {
        self.crate_of_card
            .get(card)
            .copied()
            .ok_or_else(|| HwConfigError::lookup(TableKind::Crates, card))
    }

    /// Resolve the full ancestry of one wafer.
    ///
    /// Fails if the wafer or its card has no record, or if no tube, telescope or crate holds
    /// it. Parents always have records since the inverse maps are built from the parent tables.
    pub fn wafer(&self, wafer_id: &str) -> Result<WaferAncestry<'a>> {
        let wafer = self
            .tables
            .wafers
            .get(wafer_id)
            .ok_or_else(|| HwConfigError::lookup(TableKind::Wafers, wafer_id))?;
        if !self.tables.cards.contains_key(&wafer.card) {
            return Err(HwConfigError::lookup(TableKind::Cards, wafer.card.as_str()));
        }

        let tube = self.tube_of(wafer_id)?;
        let telescope = self.telescope_of(tube)?;
        let crate_id = self.crate_of(&wafer.card)?;

        Ok(WaferAncestry {
            card: wafer.card.as_str(),
            crate_id,
            bands: wafer.bands.as_slice(),
            tube,
            telescope,
        })
    }

    /// Resolve the ancestry of every wafer in table order.
    pub fn all_wafers(&self) -> Result<Vec<(&'a str, WaferAncestry<'a>)>> {
        self.tables
            .wafers
            .keys()
            .map(|id| Ok((id.as_str(), self.wafer(id)?)))
            .collect()
    }
}
