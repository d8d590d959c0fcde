use anyhow::Result;
use dvf_enrich::{io::{read_csv, write_csv}, preprocess::{prepare_housing_data, preprocess_housing_data}};
use tracing::info;

use crate::cli::separator;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::PrepareArgs) -> Result<()> {
    let is_train = !args.test;

    info!("[prepare] reading {}", args.input.display());
    let raw = read_csv(&args.input, separator(args.sep)?)?;

    let prepared = prepare_housing_data(&raw, is_train)?;
    let mut cleaned = preprocess_housing_data(&prepared, is_train)?;

    info!("[prepare] writing {} rows to {}", cleaned.height(), args.output.display());
    write_csv(&mut cleaned, &args.output)
}
