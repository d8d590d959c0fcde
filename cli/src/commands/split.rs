use anyhow::Result;
use dvf_enrich::{RunConfig, ensure_dir_exists, evaluation::split_train_test, io::{read_csv, write_csv}};
use polars::prelude::*;
use tracing::info;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::SplitArgs) -> Result<()> {
    let out_dir = args.out_dir.clone().unwrap_or(".".into());
    ensure_dir_exists(&out_dir)?;

    let config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    let df = read_csv(&args.input, b',')?;
    let split = split_train_test(&df, &args.target, config.split.train_size, config.split.seed)?;

    let mut x_train = split.x_train;
    let mut x_test = split.x_test;
    let mut y_train = DataFrame::new(vec![Series::new(args.target.as_str().into(), split.y_train).into()])?;
    let mut y_test = DataFrame::new(vec![Series::new(args.target.as_str().into(), split.y_test).into()])?;

    info!("[split] writing train/test parts to {}", out_dir.display());
    write_csv(&mut x_train, &out_dir.join("x_train.csv"))?;
    write_csv(&mut x_test, &out_dir.join("x_test.csv"))?;
    write_csv(&mut y_train, &out_dir.join("y_train.csv"))?;
    write_csv(&mut y_test, &out_dir.join("y_test.csv"))?;
    Ok(())
}
