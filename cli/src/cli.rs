use std::path::PathBuf;

/// DVF enrichment CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "dvf-enrich", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Select, rename and clean a raw DVF extract
    Prepare(PrepareArgs),

    /// Add station counts and zone income to train and test tables
    Enrich(EnrichArgs),

    /// Split a labelled table into train and test parts
    Split(SplitArgs),
}

#[derive(clap::Args, Debug)]
pub struct PrepareArgs {
    /// Raw DVF CSV file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output CSV file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,

    /// Input is the test extract (no sale price column)
    #[arg(long)]
    pub test: bool,

    /// Field separator of the input
    #[arg(long, default_value_t = ',')]
    pub sep: char,
}

#[derive(clap::Args, Debug)]
pub struct EnrichArgs {
    /// Prepared train table
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub train: PathBuf,

    /// Prepared test table
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub test: PathBuf,

    /// Transit stops table (nom_long, Geo Point, fer, train, rer, metro)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub stations: PathBuf,

    /// Income reference table (IRIS, DISP_MED18)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub income: PathBuf,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// JSON run configuration
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override the district-center radius (km)
    #[arg(long)]
    pub coarse_radius_km: Option<f64>,

    /// Override the unit radius (km)
    #[arg(long)]
    pub fine_radius_km: Option<f64>,

    /// Field separator of the train and test tables
    #[arg(long, default_value_t = ',')]
    pub sep: char,

    /// Field separator of the stops table
    #[arg(long, default_value_t = ';')]
    pub stations_sep: char,

    /// Field separator of the income table
    #[arg(long, default_value_t = ';')]
    pub income_sep: char,

    /// Also write Parquet copies of the outputs
    #[cfg(feature = "parquet")]
    #[arg(long)]
    pub parquet: bool,
}

#[derive(clap::Args, Debug)]
pub struct SplitArgs {
    /// Labelled table
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Target column
    #[arg(long, default_value = "valeur")]
    pub target: String,

    /// Output directory, defaults to "."
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// JSON run configuration (split section)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

/// Field separators are single ASCII characters.
pub fn separator(c: char) -> anyhow::Result<u8> {
    anyhow::ensure!(c.is_ascii(), "separator must be an ASCII character, got {c:?}");
    Ok(c as u8)
}
