use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use anyhow::Result;
use polars::frame::DataFrame;
use tracing::debug;

use crate::{common::{code_values, f64_values, require_columns}, coords::Coordinate, housing::HousingUnit};

pub const INCOME_ZONE_COL: &str = "IRIS";
pub const INCOME_VALUE_COL: &str = "DISP_MED18";
pub const INCOME_OUTPUT_COL: &str = "med_revenue_iris_2018";

/// Zone code -> nearest zone code present in the income table.
/// Only codes absent from the table have an entry.
pub type ZoneSubstitutionMap = BTreeMap<String, String>;

/// Median disposable income by zone code. A zone may be present with a null value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeTable {
    values: AHashMap<String, Option<f64>>,
}

impl IncomeTable {
    /// Read the income reference table. Non-numeric values (`ns`, `nd`) become null.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        require_columns(df, &[INCOME_ZONE_COL, INCOME_VALUE_COL], "zones")?;
        let codes = code_values(df, INCOME_ZONE_COL)?;
        let values = f64_values(df, INCOME_VALUE_COL)?;

        Ok(codes.into_iter()
            .zip(values)
            .filter_map(|(code, value)| Some((code?, value)))
            .collect())
    }

    #[inline] pub fn len(&self) -> usize { self.values.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.values.is_empty() }

    #[inline] pub fn contains(&self, code: &str) -> bool { self.values.contains_key(code) }

    /// Income of a zone, or `None` if the zone is unknown or its value is missing.
    #[inline] pub fn get(&self, code: &str) -> Option<f64> { self.values.get(code).copied().flatten() }

    pub fn codes(&self) -> BTreeSet<String> { self.values.keys().cloned().collect() }
}

impl FromIterator<(String, Option<f64>)> for IncomeTable {
    fn from_iter<I: IntoIterator<Item = (String, Option<f64>)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Partition `codes` into those present in `reference` and those absent.
pub fn classify_zones(codes: &BTreeSet<String>, reference: &BTreeSet<String>) -> (BTreeSet<String>, BTreeSet<String>) {
    codes.iter().cloned().partition(|code| reference.contains(code))
}

/// Mean coordinate of the units carrying each zone code. Units without a code are skipped.
pub fn zone_centers<'a>(units: impl IntoIterator<Item = &'a HousingUnit>) -> BTreeMap<String, Coordinate> {
    let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for unit in units {
        let Some(zone) = unit.zone.as_deref() else { continue };
        let entry = sums.entry(zone).or_insert((0.0, 0.0, 0));
        entry.0 += unit.coordinate.lat;
        entry.1 += unit.coordinate.lon;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(zone, (lat, lon, n))| (zone.to_string(), Coordinate::new(lat / n as f64, lon / n as f64)))
        .collect()
}

/// Map every zone code of `units` missing from `reference` to the mapped code
/// whose mean position is geodesically nearest.
///
/// `units` should hold train and test units together. Ties go to the smallest
/// code. With no mapped code at all the map is empty.
pub fn build_substitution_map<'a>(
    units: impl IntoIterator<Item = &'a HousingUnit>,
    reference: &BTreeSet<String>,
) -> ZoneSubstitutionMap {
    let centers = zone_centers(units);
    let codes = centers.keys().cloned().collect::<BTreeSet<_>>();
    let (mapped, unmapped) = classify_zones(&codes, reference);
    debug!("[zones] {} zone codes: {} in reference, {} to substitute", codes.len(), mapped.len(), unmapped.len());

    let candidates = mapped.iter()
        .map(|code| (code, &centers[code]))
        .collect::<Vec<_>>();

    unmapped.into_iter()
        .filter_map(|code| {
            let center = &centers[&code];
            let mut nearest: Option<(&String, f64)> = None;
            for &(candidate, position) in &candidates {
                let distance = center.geodesic_km(position);
                if nearest.is_none_or(|(_, best)| distance < best) {
                    nearest = Some((candidate, distance));
                }
            }
            nearest.map(|(candidate, _)| (code, candidate.clone()))
        })
        .collect()
}

/// Attach the income of each unit's zone, after substitution. Unknown zones get `None`.
pub fn apply_income_data(units: &[HousingUnit], substitutions: &ZoneSubstitutionMap, table: &IncomeTable) -> Vec<Option<f64>> {
    units.iter()
        .map(|unit| {
            let zone = unit.zone.as_deref()?;
            let zone = substitutions.get(zone).map(String::as_str).unwrap_or(zone);
            table.get(zone)
        })
        .collect()
}
