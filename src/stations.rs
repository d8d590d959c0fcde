use std::ops::AddAssign;

use ahash::AHashMap;
use anyhow::{Context, Result};
use polars::frame::DataFrame;

use crate::{common::{count_values, require_columns, str_values}, coords::{Coordinate, parse_geopoint}};

/// Column names of the Ile-de-France stops export.
pub const STATION_NAME_COL: &str = "nom_long";
pub const GEO_POINT_COL: &str = "Geo Point";
pub const FERRY_COL: &str = "fer";
pub const TRAIN_COL: &str = "train";
pub const RER_COL: &str = "rer";
pub const METRO_COL: &str = "metro";

/// Number of lines of each kind serving a stop or station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub ferry: u32,
    pub train: u32,
    pub rer: u32,
    pub metro: u32,
}

impl LineCounts {
    pub fn new(ferry: u32, train: u32, rer: u32, metro: u32) -> Self {
        Self { ferry, train, rer, metro }
    }
}

impl AddAssign for LineCounts {
    fn add_assign(&mut self, other: Self) {
        self.ferry += other.ferry;
        self.train += other.train;
        self.rer += other.rer;
        self.metro += other.metro;
    }
}

/// One row of the raw stops table; a station may appear on several rows (one per platform/line).
#[derive(Debug, Clone, PartialEq)]
pub struct RawStop {
    pub name: String,
    pub geo_point: String,
    pub lines: LineCounts,
}

/// A station after aggregation: unique name, first observed position, summed line counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    pub coordinate: Coordinate,
    pub lines: LineCounts,
}

/// Collapse raw stops into one station per name, in first-seen order.
pub fn aggregate_stops(stops: &[RawStop]) -> Result<Vec<Station>> {
    let mut index: AHashMap<&str, usize> = AHashMap::with_capacity(stops.len());
    let mut groups: Vec<(&RawStop, LineCounts)> = Vec::new();

    for stop in stops {
        match index.get(stop.name.as_str()) {
            Some(&i) => groups[i].1 += stop.lines,
            None => {
                index.insert(&stop.name, groups.len());
                groups.push((stop, stop.lines));
            }
        }
    }

    groups.into_iter()
        .map(|(first, lines)| {
            let coordinate = parse_geopoint(&first.geo_point)
                .with_context(|| format!("[stations] station {:?}", first.name))?;
            Ok(Station { name: first.name.clone(), coordinate, lines })
        })
        .collect()
}

/// Extract raw stops from the stops table.
///
/// Rows without a station name are skipped; a missing geopoint is a format error.
pub fn stops_from_frame(df: &DataFrame) -> Result<Vec<RawStop>> {
    require_columns(df, &[STATION_NAME_COL, GEO_POINT_COL, FERRY_COL, TRAIN_COL, RER_COL, METRO_COL], "stations")?;

    let names = str_values(df, STATION_NAME_COL)?;
    let points = str_values(df, GEO_POINT_COL)?;
    let ferry = count_values(df, FERRY_COL)?;
    let train = count_values(df, TRAIN_COL)?;
    let rer = count_values(df, RER_COL)?;
    let metro = count_values(df, METRO_COL)?;

    Ok((0..df.height())
        .filter_map(|i| {
            let name = names[i].clone()?;
            Some(RawStop {
                name,
                geo_point: points[i].clone().unwrap_or_default(),
                lines: LineCounts::new(ferry[i], train[i], rer[i], metro[i]),
            })
        })
        .collect())
}

/// Read and aggregate the stops table in one step.
pub fn stations_from_frame(df: &DataFrame) -> Result<Vec<Station>> {
    aggregate_stops(&stops_from_frame(df)?)
}
