use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::evaluation::FeatureSpec;

/// Radii of the two-tier station filter. Buckets must be rebuilt if either changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Stations farther than this from a district center are dropped from its bucket.
    pub coarse_radius_km: f64,
    /// Stations within this distance of a unit are counted.
    pub fine_radius_km: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self { coarse_radius_km: 1.2, fine_radius_km: 0.5 }
    }
}

impl ProximityConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.fine_radius_km.is_finite() && self.fine_radius_km > 0.0,
            "[config] fine radius must be a positive number of km, got {}", self.fine_radius_km);
        ensure!(self.coarse_radius_km.is_finite() && self.coarse_radius_km > 0.0,
            "[config] coarse radius must be a positive number of km, got {}", self.coarse_radius_km);
        ensure!(self.coarse_radius_km >= self.fine_radius_km,
            "[config] coarse radius ({} km) must not be smaller than fine radius ({} km)",
            self.coarse_radius_km, self.fine_radius_km);
        Ok(())
    }
}

/// Train/validation split of the labelled data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_size: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self { train_size: 0.75, seed: 40 }
    }
}

/// Settings of one enrichment/evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub proximity: ProximityConfig,
    pub split: SplitConfig,
    pub features: FeatureSpec,
}

impl RunConfig {
    /// Load a JSON config; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[config] Failed to open config file: {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[config] Failed to parse config file: {}", path.display()))?;
        config.proximity.validate()?;
        Ok(config)
    }
}
