use anyhow::{Context, Result};
use polars::frame::DataFrame;

use crate::{common::{code_values, f64_values, require_columns, str_values}, coords::{Coordinate, format_geopoint, parse_geopoint}};

pub const LAT_COL: &str = "lat";
pub const LON_COL: &str = "lon";
pub const DISTRICT_COL: &str = "district";
pub const ZONE_COL: &str = "code_iris";

/// The columns of a transaction row the enrichment reads. Raw features stay in the frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HousingUnit {
    pub coordinate: Coordinate,
    pub district: Option<String>,
    pub zone: Option<String>,
}

impl HousingUnit {
    pub fn new(coordinate: Coordinate, district: Option<&str>, zone: Option<&str>) -> Self {
        Self {
            coordinate,
            district: district.map(str::to_string),
            zone: zone.map(str::to_string),
        }
    }
}

/// Resolve each row's `lat`/`lon` pair into a coordinate.
///
/// The pair goes through the textual geopoint form so numeric and text columns
/// are handled alike; a missing or non-numeric value aborts with a format error.
pub fn coordinates_from_frame(df: &DataFrame) -> Result<Vec<Coordinate>> {
    require_columns(df, &[LAT_COL, LON_COL], "housing")?;

    let lats = f64_values(df, LAT_COL)?;
    let lons = f64_values(df, LON_COL)?;
    let raw_lats = str_values(df, LAT_COL)?;
    let raw_lons = str_values(df, LON_COL)?;

    lats.iter().zip(&lons)
        .enumerate()
        .map(|(row, (lat, lon))| {
            let text = match (lat, lon) {
                (Some(lat), Some(lon)) => format_geopoint(*lat, *lon),
                _ => format!("{},{}",
                    raw_lats[row].as_deref().unwrap_or_default(),
                    raw_lons[row].as_deref().unwrap_or_default()),
            };
            parse_geopoint(&text).with_context(|| format!("[housing] row {row}"))
        })
        .collect()
}

/// Extract the units of a transaction table, in row order.
///
/// `district` is optional in the schema (zone-only enrichment does not need
/// it); `code_iris` likewise.
pub fn units_from_frame(df: &DataFrame) -> Result<Vec<HousingUnit>> {
    let coordinates = coordinates_from_frame(df)?;
    let districts = optional_column(df, DISTRICT_COL, str_values)?;
    let zones = optional_column(df, ZONE_COL, code_values)?;

    Ok(coordinates.into_iter()
        .zip(districts)
        .zip(zones)
        .map(|((coordinate, district), zone)| HousingUnit { coordinate, district, zone })
        .collect())
}

fn optional_column(
    df: &DataFrame,
    name: &str,
    read: fn(&DataFrame, &str) -> Result<Vec<Option<String>>>,
) -> Result<Vec<Option<String>>> {
    if df.get_column_names().iter().any(|c| c.as_str() == name) {
        read(df, name)
    } else {
        Ok(vec![None; df.height()])
    }
}
