//! Hardware configuration for a telescope array.
//!
//! A configuration is a set of id-keyed tables: telescopes hold tubes, tubes hold wafers,
//! wafers carry detectors, and cards and crates describe the readout electronics serving the
//! wafers. Bands are shared by wafers, telescopes and detectors.
//!
//! The [`ConfigStore`] loads and dumps configurations as (optionally gzipped) TOML and builds
//! self-consistent sub-configurations from a [`Selection`]:
//!
//! ```no_run
//! use hwconfig::{ConfigStore, Criterion, DumpOptions, Selection};
//!
//! # fn main() -> hwconfig::Result<()> {
//! let store = ConfigStore::open("hardware.toml.gz")?;
//! let selection = Selection::new()
//!     .telescopes(["LAT"])
//!     .matching("band", Criterion::pattern("MF."))
//!     .matching("pol", Criterion::values(["A"]));
//! let subset = store.select(&selection)?;
//! subset.dump("lat_mf_a.toml", DumpOptions::default())?;
//! # Ok(())
//! # }
//! ```

pub mod ancestry;
pub mod error;
pub mod matcher;
pub mod model;
pub mod selector;
pub mod serializer;
pub mod store;
pub mod test_util;

pub use ancestry::{AncestryIndex, WaferAncestry};
pub use error::{HwConfigError, Result, TableKind};
pub use matcher::{Criterion, DetectorFilter, Predicate};
pub use model::{Band, Card, Crate, Detector, Table, TableCounts, Tables, Telescope, Tube, Wafer};
pub use selector::{select, Selection};
pub use store::{ConfigStore, DumpOptions};
