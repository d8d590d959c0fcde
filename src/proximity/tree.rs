use rstar::{AABB, RTree, RTreeObject};

use crate::{coords::Coordinate, stations::Station};
use super::NearbyCounts;

/// Shortest length of one degree of latitude on WGS84 (at the equator), in km.
const MIN_KM_PER_DEG_LAT: f64 = 110.574;
/// Length of one degree of longitude at the equator on WGS84, in km.
const KM_PER_DEG_LON_EQUATOR: f64 = 111.320;

/// A station position in an R-tree, associated with a station by index.
#[derive(Debug, Clone)]
struct StationPoint {
    idx: usize,
    position: [f64; 2], // (lon, lat)
}

impl RTreeObject for StationPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Exact radius queries over all stations.
///
/// The R-tree narrows candidates to a lon/lat box that contains the query
/// circle; candidates are then filtered by geodesic distance.
#[derive(Debug, Clone)]
pub struct StationTree {
    stations: Vec<Station>,
    rtree: RTree<StationPoint>,
}

impl StationTree {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                stations.iter().enumerate()
                    .map(|(idx, s)| StationPoint { idx, position: [s.coordinate.lon, s.coordinate.lat] })
                    .collect()
            ),
            stations,
        }
    }

    #[inline] pub fn len(&self) -> usize { self.stations.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.stations.is_empty() }

    /// Stations whose geodesic distance to `center` is at most `radius_km`.
    pub fn within(&self, center: &Coordinate, radius_km: f64) -> impl Iterator<Item = &Station> {
        self.rtree.locate_in_envelope(&search_box(center, radius_km))
            .map(|point| &self.stations[point.idx])
            .filter(move |station| station.coordinate.geodesic_km(center) <= radius_km)
    }

    /// Same semantics as the bucketed count, without the district approximation.
    pub fn count_within(&self, center: &Coordinate, radius_km: f64) -> NearbyCounts {
        self.within(center, radius_km)
            .fold(NearbyCounts::default(), |mut acc, station| {
                acc += NearbyCounts::of(station);
                acc
            })
    }
}

/// A lon/lat box guaranteed to contain every point within `radius_km` of `center`.
fn search_box(center: &Coordinate, radius_km: f64) -> AABB<[f64; 2]> {
    // Slightly widened so rounding never excludes a point on the circle.
    let radius_km = radius_km.max(0.0) * 1.001;
    let dlat = radius_km / MIN_KM_PER_DEG_LAT;

    let max_abs_lat = center.lat.abs() + dlat;
    let dlon = if max_abs_lat >= 89.0 {
        180.0
    } else {
        (radius_km / (KM_PER_DEG_LON_EQUATOR * max_abs_lat.to_radians().cos())).min(180.0)
    };

    AABB::from_corners(
        [center.lon - dlon, center.lat - dlat],
        [center.lon + dlon, center.lat + dlat],
    )
}

#[cfg(test)]
mod tests {
    use rstar::Envelope;

    use super::*;
    use crate::{districts::DistrictCenters, housing::HousingUnit, proximity::ProximityIndex, stations::LineCounts};

    fn station(name: &str, lat: f64, lon: f64, metro: u32, train: u32) -> Station {
        Station { name: name.into(), coordinate: Coordinate::new(lat, lon), lines: LineCounts::new(0, train, 0, metro) }
    }

    /// A small grid of stations around central Paris.
    fn grid() -> Vec<Station> {
        let mut stations = Vec::new();
        for i in 0..12 {
            for j in 0..12 {
                let lat = 48.80 + i as f64 * 0.008;
                let lon = 2.28 + j as f64 * 0.012;
                stations.push(station(&format!("s{i}_{j}"), lat, lon, (i + j) as u32 % 3, (i * j) as u32 % 2));
            }
        }
        stations
    }

    fn brute_force(stations: &[Station], center: &Coordinate, radius_km: f64) -> NearbyCounts {
        stations.iter()
            .filter(|s| s.coordinate.geodesic_km(center) <= radius_km)
            .fold(NearbyCounts::default(), |mut acc, s| { acc += NearbyCounts::of(s); acc })
    }

    #[test]
    fn matches_exhaustive_scan() {
        let stations = grid();
        let tree = StationTree::new(stations.clone());
        assert_eq!(tree.len(), 144);

        for (lat, lon) in [(48.85, 2.35), (48.80, 2.28), (48.891, 2.412), (48.70, 2.10)] {
            let center = Coordinate::new(lat, lon);
            for radius in [0.0, 0.3, 0.5, 1.2, 3.0] {
                assert_eq!(tree.count_within(&center, radius), brute_force(&stations, &center, radius));
            }
        }
    }

    #[test]
    fn search_box_contains_circle() {
        let center = Coordinate::new(48.85, 2.35);
        let bbox = search_box(&center, 1.0);
        // 1 km east and 1 km north must fall inside.
        let east = 1.0 / (111.320 * 48.85f64.to_radians().cos());
        assert!(bbox.contains_point(&[2.35 + east * 0.999, 48.85]));
        assert!(bbox.contains_point(&[2.35, 48.85 + 1.0 / 111.2]));
    }

    #[test]
    fn empty_tree_counts_zero() {
        let tree = StationTree::new(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.count_within(&Coordinate::new(48.85, 2.35), 10.0), NearbyCounts::default());
    }

    /// The bucket filter assumes units sit close to their district center.
    /// A unit 1 km from its center with a station 0.4 km beyond it shows the
    /// assumption failing at the default radii (1.2 km coarse, 0.5 km fine).
    #[test]
    fn bucket_filter_misses_stations_for_spread_out_districts() {
        let center = Coordinate::new(48.85, 2.35);
        let unit = HousingUnit::new(Coordinate::new(48.85 + 1.0 / 111.2, 2.35), Some("d"), None);
        let stations = vec![station("edge", 48.85 + 1.4 / 111.2, 2.35, 1, 0)];
        let centers: DistrictCenters = [("d".to_string(), center)].into_iter().collect();

        let index = ProximityIndex::build_buckets(&centers, stations.clone(), 1.2);
        let tree = StationTree::new(stations);

        assert_eq!(index.count_nearby(&unit, 0.5), NearbyCounts::default());
        assert_eq!(tree.count_within(&unit.coordinate, 0.5), NearbyCounts::new(1, 0));

        // With coarse >= fine + spread the two agree.
        let index = ProximityIndex::build_buckets(&centers, tree.within(&center, 10.0).cloned().collect(), 1.6);
        assert_eq!(index.count_nearby(&unit, 0.5), tree.count_within(&unit.coordinate, 0.5));
    }
}
