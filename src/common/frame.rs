use anyhow::{Context, Result, ensure};
use polars::prelude::*;

/// Error unless every name in `columns` is present in `df`.
pub(crate) fn require_columns(df: &DataFrame, columns: &[&str], table: &str) -> Result<()> {
    let present = df.get_column_names();
    let missing = columns.iter()
        .filter(|name| !present.iter().any(|p| p.as_str() == **name))
        .collect::<Vec<_>>();
    ensure!(missing.is_empty(), "[{table}] missing columns: {missing:?}");
    Ok(())
}

/// Read a column as nullable floats. Text that does not parse becomes null.
pub(crate) fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df.column(name)
        .with_context(|| format!("[frame] column {name:?} not found"))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)
        .with_context(|| format!("[frame] column {name:?} cannot be read as Float64"))?;
    Ok(series.f64()?.into_iter().collect())
}

/// Read a column as nullable non-negative counts; nulls count as zero.
pub(crate) fn count_values(df: &DataFrame, name: &str) -> Result<Vec<u32>> {
    f64_values(df, name)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.unwrap_or(0.0);
            ensure!(value >= 0.0 && value.fract() == 0.0,
                "[frame] column {name:?} row {row}: expected a non-negative integer count, got {value}");
            Ok(value as u32)
        })
        .collect()
}

/// Read a column as nullable text. Non-string columns are cast first.
pub(crate) fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)
        .with_context(|| format!("[frame] column {name:?} not found"))?;
    let series = column.as_materialized_series().cast(&DataType::String)
        .with_context(|| format!("[frame] column {name:?} cannot be read as String"))?;
    Ok(series.str()?.into_iter().map(|value| value.map(str::to_string)).collect())
}

/// Read a statistical code column as integer text.
///
/// Codes are often loaded as floats (`751010101.0`) when the column has nulls,
/// so numeric columns are truncated to integers and text columns lose a
/// trailing `.0`.
pub(crate) fn code_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)
        .with_context(|| format!("[frame] column {name:?} not found"))?;

    match column.dtype() {
        DataType::String => Ok(str_values(df, name)?
            .into_iter()
            .map(|value| value.and_then(|code| normalize_code(&code)))
            .collect()),
        _ => Ok(f64_values(df, name)?
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()).map(|v| format!("{}", v.trunc() as i64)))
            .collect()),
    }
}

fn normalize_code(code: &str) -> Option<String> {
    let code = code.trim();
    let code = code.strip_suffix(".0").unwrap_or(code);
    (!code.is_empty()).then(|| code.to_string())
}

/// Format a radius for column names: `0.5`, `1.0`, `1.2`.
pub(crate) fn radius_label(radius_km: f64) -> String {
    if radius_km.fract() == 0.0 { format!("{radius_km:.1}") } else { format!("{radius_km}") }
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    #[test]
    fn codes_from_float_column_lose_decimal_part() {
        let df = df!("code_iris" => [Some(751010101.0), None, Some(930010102.0)]).unwrap();
        assert_eq!(code_values(&df, "code_iris").unwrap(), vec![
            Some("751010101".to_string()),
            None,
            Some("930010102".to_string()),
        ]);
    }

    #[test]
    fn codes_from_text_column_are_trimmed() {
        let df = df!("IRIS" => ["751010101", " 751010102.0 ", ""]).unwrap();
        assert_eq!(code_values(&df, "IRIS").unwrap(), vec![
            Some("751010101".to_string()),
            Some("751010102".to_string()),
            None,
        ]);
    }

    #[test]
    fn counts_treat_null_as_zero() {
        let df = df!("metro" => [Some(1i64), None, Some(3)]).unwrap();
        assert_eq!(count_values(&df, "metro").unwrap(), vec![1, 0, 3]);
    }

    #[test]
    fn negative_counts_are_rejected() {
        let df = df!("metro" => [1i64, -2]).unwrap();
        assert!(count_values(&df, "metro").is_err());
    }

    #[test]
    fn missing_columns_are_listed() {
        let df = df!("a" => [1i32]).unwrap();
        let err = require_columns(&df, &["a", "b", "c"], "test").unwrap_err();
        assert!(err.to_string().contains("\"b\""));
        assert!(err.to_string().contains("\"c\""));
    }

    #[test]
    fn radius_labels() {
        assert_eq!(radius_label(0.5), "0.5");
        assert_eq!(radius_label(1.0), "1.0");
        assert_eq!(radius_label(1.2), "1.2");
    }
}
