//! Enrichment of the train and test transaction tables.
//!
//! Both tables go through the same steps with the same derived structures:
//! district centers and station buckets come from the training table only,
//! and zone substitutions are computed over both tables together.

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{info, warn};

use crate::{
    config::ProximityConfig,
    districts::DistrictCenters,
    housing::{HousingUnit, ZONE_COL, units_from_frame},
    proximity::{NearbyCounts, ProximityIndex, count_column_names},
    stations::stations_from_frame,
    zones::{INCOME_OUTPUT_COL, IncomeTable, apply_income_data, build_substitution_map},
};

/// Add the metro and train line counts within the fine radius to both tables.
pub fn add_station_counts(
    train: &mut DataFrame,
    test: &mut DataFrame,
    stops: &DataFrame,
    config: &ProximityConfig,
) -> Result<()> {
    config.validate()?;

    let stations = stations_from_frame(stops).context("[enrich] Failed to read stations")?;
    let train_units = units_from_frame(train).context("[enrich] Failed to read train units")?;
    let test_units = units_from_frame(test).context("[enrich] Failed to read test units")?;
    info!("[enrich] {} stations, {} train units, {} test units", stations.len(), train_units.len(), test_units.len());

    let centers = DistrictCenters::compute(&train_units)?;
    audit_radii(&centers, &train_units, &test_units, config);

    let index = ProximityIndex::build_buckets(&centers, stations, config.coarse_radius_km);

    info!("[enrich] counting stations near train units");
    append_counts(train, &index.annotate(&train_units, config.fine_radius_km), config.fine_radius_km)?;
    info!("[enrich] counting stations near test units");
    append_counts(test, &index.annotate(&test_units, config.fine_radius_km), config.fine_radius_km)?;
    Ok(())
}

/// Add the median income of each unit's zone to both tables, then drop the zone column.
pub fn add_income_data(train: &mut DataFrame, test: &mut DataFrame, income: &DataFrame) -> Result<()> {
    let table = IncomeTable::from_frame(income).context("[enrich] Failed to read income table")?;
    let train_units = units_from_frame(train)?;
    let test_units = units_from_frame(test)?;

    let substitutions = build_substitution_map(train_units.iter().chain(&test_units), &table.codes());
    info!("[enrich] substituting {} zone codes missing from the income table", substitutions.len());

    for (df, units) in [(train, &train_units), (test, &test_units)] {
        let incomes = apply_income_data(units, &substitutions, &table);
        let missing = incomes.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            warn!("[enrich] {missing} of {} units have no income value", units.len());
        }
        df.with_column(Series::new(INCOME_OUTPUT_COL.into(), incomes))?;
        if df.get_column_names().iter().any(|c| c.as_str() == ZONE_COL) {
            df.drop_in_place(ZONE_COL)?;
        }
    }
    Ok(())
}

/// Run the full enrichment: station counts, then income.
pub fn enrich(
    mut train: DataFrame,
    mut test: DataFrame,
    stops: &DataFrame,
    income: &DataFrame,
    config: &ProximityConfig,
) -> Result<(DataFrame, DataFrame)> {
    add_station_counts(&mut train, &mut test, stops, config)?;
    add_income_data(&mut train, &mut test, income)?;
    Ok((train, test))
}

fn append_counts(df: &mut DataFrame, counts: &[NearbyCounts], fine_radius_km: f64) -> Result<()> {
    let (metros_col, trains_col) = count_column_names(fine_radius_km);
    df.with_column(Series::new(metros_col.into(), counts.iter().map(|c| c.metros).collect::<Vec<_>>()))?;
    df.with_column(Series::new(trains_col.into(), counts.iter().map(|c| c.trains).collect::<Vec<_>>()))?;
    Ok(())
}

/// Warn when a unit lies far enough from its district center for the bucket filter to drop qualifying stations.
fn audit_radii(centers: &DistrictCenters, train: &[HousingUnit], test: &[HousingUnit], config: &ProximityConfig) {
    let spread = centers.max_spread_km(train).max(centers.max_spread_km(test));
    if config.coarse_radius_km < config.fine_radius_km + spread {
        warn!(
            "[enrich] coarse radius {} km < fine radius {} km + max district spread {:.3} km; some nearby stations may be missed",
            config.coarse_radius_km, config.fine_radius_km, spread
        );
    }
}
