//! Station proximity features.
//!
//! Counting stations near every unit by exhaustive geodesic scan costs
//! O(units x stations). [`ProximityIndex`] bounds this with a two-tier filter:
//! stations are first bucketed by district center (coarse radius), then each
//! unit is measured only against its district's bucket (fine radius).
//! [`StationTree`] answers the same query exactly with an R-tree and is used
//! to audit the approximation.

mod index;
mod tree;

pub use index::ProximityIndex;
pub use tree::StationTree;

use std::ops::AddAssign;

use crate::stations::Station;

/// Lines reachable from the stations near a unit.
///
/// `trains` sums the train and RER line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearbyCounts {
    pub metros: u32,
    pub trains: u32,
}

impl NearbyCounts {
    pub fn new(metros: u32, trains: u32) -> Self { Self { metros, trains } }

    pub(crate) fn of(station: &Station) -> Self {
        Self::new(station.lines.metro, station.lines.train + station.lines.rer)
    }
}

impl AddAssign for NearbyCounts {
    fn add_assign(&mut self, other: Self) {
        self.metros += other.metros;
        self.trains += other.trains;
    }
}

/// Column names for the counts at a given fine radius, e.g. `n_metros_within_0.5km`.
pub fn count_column_names(fine_radius_km: f64) -> (String, String) {
    let label = crate::common::radius_label(fine_radius_km);
    (format!("n_metros_within_{label}km"), format!("n_trains_within_{label}km"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_follow_radius() {
        assert_eq!(count_column_names(0.5), ("n_metros_within_0.5km".into(), "n_trains_within_0.5km".into()));
        assert_eq!(count_column_names(2.0).0, "n_metros_within_2.0km");
    }
}
