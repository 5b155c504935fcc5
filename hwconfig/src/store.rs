//! Hardware configuration store.
//!
//! [`ConfigStore`] owns the table set of one configuration and is the entry point for loading,
//! dumping and selecting. Loading does no validation beyond parsing; broken references are
//! reported when a selection walks them, or on demand by [`ConfigStore::verify`].

use std::path::Path;

use tracing::info;

use crate::error::{HwConfigError, Result, TableKind};
use crate::model::{
    Band, Card, Crate, Detector, Table, TableCounts, Tables, Telescope, Tube, Wafer,
};
use crate::selector::{self, Selection};
use crate::serializer;

/// Options for [`ConfigStore::dump`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// Replace an existing file instead of failing
    pub overwrite: bool,
    /// Gzip the TOML text
    pub compress: bool,
}

/// In-memory hardware configuration.
///
/// Cloning produces an independent deep copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    tables: Tables,
}

fn require<T>(table: &Table<T>, kind: TableKind, id: &str) -> Result<()> {
    if table.contains_key(id) {
        Ok(())
    } else {
        Err(HwConfigError::lookup(kind, id))
    }
}

impl ConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already built table set without validating it.
    pub fn from_tables(tables: Tables) -> Self {
        Self { tables }
    }

    /// Load a store from a plain or gzipped TOML file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self::new();
        store.load(path)?;
        Ok(store)
    }

    /// Replace the contents of this store with the configuration in `path`.
    ///
    /// On failure the current contents are kept.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tables = serializer::read_tables(path)?;
        info!("Loaded {} from {}", tables.counts(), path.display());
        self.tables = tables;
        Ok(())
    }

    /// Write all tables to `path`.
    ///
    /// Fails with [`HwConfigError::AlreadyExists`] if the file exists and `overwrite` is not
    /// set; the existing file is not modified in that case.
    pub fn dump(&self, path: impl AsRef<Path>, options: DumpOptions) -> Result<()> {
        let path = path.as_ref();
        serializer::write_tables(path, &self.tables, options.overwrite, options.compress)?;
        info!(
            "Dumped {} to {} (compressed: {})",
            self.counts(),
            path.display(),
            options.compress
        );
        Ok(())
    }

    /// Build a new store holding the detectors matching `selection` and the records they
    /// reference. This store is left untouched.
    pub fn select(&self, selection: &Selection) -> Result<ConfigStore> {
        selector::select(&self.tables, selection).map(Self::from_tables)
    }

    /// Replace all tables, returning the previous ones. No validation is done.
    pub fn replace_tables(&mut self, tables: Tables) -> Tables {
        std::mem::replace(&mut self.tables, tables)
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn into_tables(self) -> Tables {
        self.tables
    }

    pub fn bands(&self) -> &Table<Band> {
        &self.tables.bands
    }

    pub fn wafers(&self) -> &Table<Wafer> {
        &self.tables.wafers
    }

    pub fn tubes(&self) -> &Table<Tube> {
        &self.tables.tubes
    }

    pub fn telescopes(&self) -> &Table<Telescope> {
        &self.tables.telescopes
    }

    pub fn cards(&self) -> &Table<Card> {
        &self.tables.cards
    }

    pub fn crates(&self) -> &Table<Crate> {
        &self.tables.crates
    }

    pub fn detectors(&self) -> &Table<Detector> {
        &self.tables.detectors
    }

    /// Band record of a detector
    pub fn band_of(&self, detector: &Detector) -> Result<&Band> {
        self.tables
            .bands
            .get(&detector.band)
            .ok_or_else(|| HwConfigError::lookup(TableKind::Bands, detector.band.as_str()))
    }

    pub fn counts(&self) -> TableCounts {
        self.tables.counts()
    }

    /// Check that every id stored in a record resolves to a record of this store, and that
    /// detectors are keyed by their composite key.
    ///
    /// Returns the first broken reference found, walking tables in persisted order.
    pub fn verify(&self) -> Result<()> {
        let t = &self.tables;

        for wafer in t.wafers.values() {
            for band in &wafer.bands {
                require(&t.bands, TableKind::Bands, band)?;
            }
            require(&t.cards, TableKind::Cards, &wafer.card)?;
        }
        for tube in t.tubes.values() {
            for wafer in &tube.wafers {
                require(&t.wafers, TableKind::Wafers, wafer)?;
            }
        }
        for tele in t.telescopes.values() {
            for tube in &tele.tubes {
                require(&t.tubes, TableKind::Tubes, tube)?;
            }
            for band in tele.fwhm.keys() {
                require(&t.bands, TableKind::Bands, band)?;
            }
        }
        for crt in t.crates.values() {
            for card in &crt.cards {
                require(&t.cards, TableKind::Cards, card)?;
            }
            require(&t.telescopes, TableKind::Telescopes, &crt.telescope)?;
        }
        for (key, det) in &t.detectors {
            require(&t.wafers, TableKind::Wafers, &det.wafer)?;
            require(&t.bands, TableKind::Bands, &det.band)?;
            require(&t.cards, TableKind::Cards, &det.card)?;
            if *key != det.composite_key() {
                return Err(HwConfigError::lookup(TableKind::Detectors, det.composite_key()));
            }
        }
        Ok(())
    }
}
