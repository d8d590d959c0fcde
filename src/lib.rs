#![doc = "Geographic and socio-economic enrichment of DVF real-estate transactions"]
mod common;
pub mod config;
pub mod coords;
pub mod districts;
pub mod enrich;
pub mod evaluation;
pub mod housing;
pub mod io;
pub mod preprocess;
pub mod proximity;
pub mod stations;
pub mod zones;

#[doc(inline)]
pub use common::ensure_dir_exists;

#[doc(inline)]
pub use config::{ProximityConfig, RunConfig, SplitConfig};

#[doc(inline)]
pub use coords::{Coordinate, FormatError, format_geopoint, parse_geopoint};

#[doc(inline)]
pub use districts::DistrictCenters;

#[doc(inline)]
pub use enrich::{add_income_data, add_station_counts, enrich};

#[doc(inline)]
pub use housing::HousingUnit;

#[doc(inline)]
pub use proximity::{NearbyCounts, ProximityIndex, StationTree};

#[doc(inline)]
pub use stations::{LineCounts, RawStop, Station, aggregate_stops};

#[doc(inline)]
pub use zones::{IncomeTable, ZoneSubstitutionMap, apply_income_data, build_substitution_map, classify_zones};
