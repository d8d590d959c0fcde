use ahash::AHashMap;
use tracing::{debug, warn};

use crate::{districts::DistrictCenters, housing::HousingUnit, stations::Station};
use super::NearbyCounts;

/// Stations bucketed by district: each bucket holds the stations within the
/// coarse radius of that district's center.
///
/// A station outside a district's bucket is never counted for a unit of that
/// district. This is only exact when the coarse radius exceeds the fine radius
/// plus the distance from any unit to its district center.
#[derive(Debug, Clone)]
pub struct ProximityIndex {
    stations: Vec<Station>,
    buckets: AHashMap<String, Vec<usize>>, // Indices into `stations`
    coarse_radius_km: f64,
}

impl ProximityIndex {
    /// Measure every district center against every station and keep those within `coarse_radius_km`.
    pub fn build_buckets(centers: &DistrictCenters, stations: Vec<Station>, coarse_radius_km: f64) -> Self {
        let buckets = centers.iter()
            .map(|(district, center)| {
                let nearby = stations.iter()
                    .enumerate()
                    .filter(|(_, station)| station.coordinate.geodesic_km(center) <= coarse_radius_km)
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>();
                (district.to_string(), nearby)
            })
            .collect::<AHashMap<_, _>>();

        debug!(
            "[proximity] bucketed {} stations over {} districts ({} memberships)",
            stations.len(), buckets.len(), buckets.values().map(Vec::len).sum::<usize>()
        );

        Self { stations, buckets, coarse_radius_km }
    }

    #[inline] pub fn coarse_radius_km(&self) -> f64 { self.coarse_radius_km }

    #[inline] pub fn stations(&self) -> &[Station] { &self.stations }

    /// Whether a bucket was built for `district` (it may still be empty).
    #[inline] pub fn has_district(&self, district: &str) -> bool { self.buckets.contains_key(district) }

    /// Stations in the bucket of `district`; empty for districts without a center.
    pub fn bucket(&self, district: &str) -> impl Iterator<Item = &Station> {
        self.buckets.get(district)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&i| &self.stations[i])
    }

    /// Sum the lines of the bucketed stations within `fine_radius_km` of the unit.
    ///
    /// Units without a district, or whose district has an empty or missing
    /// bucket, get zero counts.
    pub fn count_nearby(&self, unit: &HousingUnit, fine_radius_km: f64) -> NearbyCounts {
        let Some(district) = unit.district.as_deref() else { return NearbyCounts::default() };

        self.bucket(district)
            .filter(|station| station.coordinate.geodesic_km(&unit.coordinate) <= fine_radius_km)
            .fold(NearbyCounts::default(), |mut acc, station| {
                acc += NearbyCounts::of(station);
                acc
            })
    }

    /// Apply [`Self::count_nearby`] to every unit, preserving order.
    pub fn annotate(&self, units: &[HousingUnit], fine_radius_km: f64) -> Vec<NearbyCounts> {
        let mut unknown = 0usize;

        let counts = units.iter()
            .enumerate()
            .map(|(row, unit)| {
                if (row + 1) % 1000 == 0 {
                    debug!("[proximity] processed {} units", row + 1);
                }
                if unit.district.as_deref().is_none_or(|d| !self.has_district(d)) {
                    unknown += 1;
                }
                self.count_nearby(unit, fine_radius_km)
            })
            .collect();

        if unknown > 0 {
            warn!("[proximity] {unknown} of {} units have no district center; their counts are zero", units.len());
        }
        counts
    }
}
