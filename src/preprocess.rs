use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

use crate::{common::{f64_values, require_columns, str_values}, housing::DISTRICT_COL};

/// Raw DVF columns kept for modelling, with their snake-case names.
const COLUMN_NAMES: [(&str, &str); 14] = [
    ("Date mutation", "date_mutation"),
    ("Nature mutation", "nature_mutation"),
    ("Type de voie", "type_voie"),
    ("Commune", "commune"),
    ("Surface Carrez du 1er lot", "surface_carrez_1er_lot"),
    ("Surface Carrez du 2eme lot", "surface_carrez_2e_lot"),
    ("Nombre de lots", "nb_lots"),
    ("Type local", "type_local"),
    ("Surface reelle bati", "surface_reelle_bati"),
    ("Nombre pieces principales", "nb_pieces"),
    ("lon", "lon"),
    ("lat", "lat"),
    ("code_district_custom", "district"),
    ("code_IRIS", "code_iris"),
];

/// Sale price, only present in the training set.
const TARGET_COLUMN: (&str, &str) = ("Valeur fonciere", "valeur");

pub const SALE_NATURE: &str = "Vente";

/// Keep the modelling columns of a raw DVF table and rename them.
pub fn prepare_housing_data(df: &DataFrame, is_train: bool) -> Result<DataFrame> {
    let mut columns = COLUMN_NAMES.to_vec();
    if is_train {
        columns.push(TARGET_COLUMN);
    }

    let raw_names = columns.iter().map(|(raw, _)| *raw).collect::<Vec<_>>();
    require_columns(df, &raw_names, "preprocess")?;

    let mut out = df.select(raw_names.iter().copied())
        .context("[preprocess] Failed to select DVF columns")?;
    for (raw, name) in columns {
        if raw != name {
            out.rename(raw, name.into())?;
        }
    }
    Ok(out)
}

/// Clean a prepared DVF table.
///
/// Keeps sales with a district, fills the first Carrez surface from the built
/// surface, parses French decimals (`"12,5"`) with 0 for missing values, and
/// clips the number of rooms to at least one.
pub fn preprocess_housing_data(df: &DataFrame, is_train: bool) -> Result<DataFrame> {
    require_columns(df, &["nature_mutation", DISTRICT_COL, "surface_carrez_1er_lot",
        "surface_carrez_2e_lot", "surface_reelle_bati", "nb_pieces"], "preprocess")?;

    let natures = str_values(df, "nature_mutation")?;
    let districts = str_values(df, DISTRICT_COL)?;
    let keep = natures.iter().zip(&districts)
        .map(|(nature, district)| nature.as_deref() == Some(SALE_NATURE) && district.is_some())
        .collect::<Vec<_>>();
    let mut out = df.filter(&BooleanChunked::from_slice("keep".into(), &keep))?;
    info!("[preprocess] kept {} of {} rows (sales with a district)", out.height(), df.height());

    let carrez = str_values(&out, "surface_carrez_1er_lot")?;
    let built = str_values(&out, "surface_reelle_bati")?;
    let filled = carrez.into_iter().zip(built)
        .map(|(carrez, built)| carrez.or(built))
        .collect::<Vec<_>>();
    out.with_column(Series::new("surface_carrez_1er_lot".into(), filled))?;

    let mut decimal_columns = vec!["surface_carrez_1er_lot", "surface_carrez_2e_lot"];
    if is_train {
        decimal_columns.push(TARGET_COLUMN.1);
    }
    for name in decimal_columns {
        let values = str_values(&out, name)?
            .into_iter()
            .map(|value| value.as_deref().and_then(parse_french_decimal).unwrap_or(0.0))
            .collect::<Vec<_>>();
        out.with_column(Series::new(name.into(), values))?;
    }

    let dtype = out.column("nb_pieces")?.dtype().clone();
    let rooms = f64_values(&out, "nb_pieces")?
        .into_iter()
        .map(|value| value.map(|v| v.max(1.0)))
        .collect::<Vec<_>>();
    out.with_column(Series::new("nb_pieces".into(), rooms).cast(&dtype)?)?;

    Ok(out)
}

/// Parse a decimal written with a comma separator. Returns `None` on empty or garbage input.
pub fn parse_french_decimal(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}
