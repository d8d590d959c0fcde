use std::path::Path;

use anyhow::Result;
use polars::frame::DataFrame;
use dvf_enrich::{RunConfig, ensure_dir_exists, io::{read_csv, write_csv}};
use tracing::info;

use crate::cli::separator;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::EnrichArgs) -> Result<()> {
    let out_dir = args.out_dir.clone().unwrap_or(".".into());
    ensure_dir_exists(&out_dir)?;

    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(km) = args.coarse_radius_km { config.proximity.coarse_radius_km = km; }
    if let Some(km) = args.fine_radius_km { config.proximity.fine_radius_km = km; }
    config.proximity.validate()?;
    info!("[enrich] coarse radius {} km, fine radius {} km", config.proximity.coarse_radius_km, config.proximity.fine_radius_km);

    let sep = separator(args.sep)?;
    let train = read_csv(&args.train, sep)?;
    let test = read_csv(&args.test, sep)?;
    let stops = read_csv(&args.stations, separator(args.stations_sep)?)?;
    let income = read_csv(&args.income, separator(args.income_sep)?)?;

    let (mut train, mut test) = dvf_enrich::enrich(train, test, &stops, &income, &config.proximity)?;

    write_output(&mut train, &out_dir.join("train_enriched.csv"))?;
    write_output(&mut test, &out_dir.join("test_enriched.csv"))?;

    #[cfg(feature = "parquet")]
    if args.parquet {
        dvf_enrich::io::write_parquet(&mut train, &out_dir.join("train_enriched.parquet"))?;
        dvf_enrich::io::write_parquet(&mut test, &out_dir.join("test_enriched.parquet"))?;
    }

    Ok(())
}

fn write_output(df: &mut DataFrame, path: &Path) -> Result<()> {
    info!("[enrich] writing {} rows to {}", df.height(), path.display());
    write_csv(df, path)
}
