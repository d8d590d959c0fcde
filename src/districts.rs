use std::collections::BTreeMap;

use anyhow::{Result, bail};

use crate::{coords::Coordinate, housing::HousingUnit};

/// Mean position of the training units of each district, keyed by district name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictCenters {
    centers: BTreeMap<String, Coordinate>,
}

impl DistrictCenters {
    /// Average latitude and longitude independently per district.
    ///
    /// This is an arithmetic mean, not a geodesic centroid, which is accurate
    /// enough at the scale of a district. Units must carry a district; null
    /// districts are filtered out during preprocessing.
    pub fn compute(training_units: &[HousingUnit]) -> Result<Self> {
        let mut sums: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();

        for (row, unit) in training_units.iter().enumerate() {
            let Some(district) = unit.district.as_deref() else {
                bail!("[districts] training unit at row {row} has no district");
            };
            let entry = sums.entry(district).or_insert((0.0, 0.0, 0));
            entry.0 += unit.coordinate.lat;
            entry.1 += unit.coordinate.lon;
            entry.2 += 1;
        }

        Ok(Self {
            centers: sums.into_iter()
                .map(|(district, (lat, lon, n))| {
                    (district.to_string(), Coordinate::new(lat / n as f64, lon / n as f64))
                })
                .collect(),
        })
    }

    #[inline] pub fn len(&self) -> usize { self.centers.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.centers.is_empty() }

    #[inline] pub fn get(&self, district: &str) -> Option<&Coordinate> { self.centers.get(district) }

    /// Iterate centers in district name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Coordinate)> {
        self.centers.iter().map(|(district, center)| (district.as_str(), center))
    }

    /// Largest geodesic distance (km) between a unit and its own district center.
    ///
    /// Units whose district has no center are ignored. Returns 0 when nothing matches.
    pub fn max_spread_km(&self, units: &[HousingUnit]) -> f64 {
        units.iter()
            .filter_map(|unit| {
                let center = self.get(unit.district.as_deref()?)?;
                Some(unit.coordinate.geodesic_km(center))
            })
            .fold(0.0, f64::max)
    }
}

impl FromIterator<(String, Coordinate)> for DistrictCenters {
    fn from_iter<I: IntoIterator<Item = (String, Coordinate)>>(iter: I) -> Self {
        Self { centers: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(lat: f64, lon: f64, district: &str) -> HousingUnit {
        HousingUnit::new(Coordinate::new(lat, lon), Some(district), None)
    }

    #[test]
    fn averages_each_district_independently() {
        let units = vec![
            unit(48.80, 2.30, "a"),
            unit(48.90, 2.40, "b"),
            unit(48.82, 2.34, "a"),
            unit(48.84, 2.32, "a"),
        ];
        let centers = DistrictCenters::compute(&units).unwrap();

        assert_eq!(centers.len(), 2);
        let a = centers.get("a").unwrap();
        assert!((a.lat - 48.82).abs() < 1e-12);
        assert!((a.lon - 2.32).abs() < 1e-12);
        assert_eq!(centers.get("b"), Some(&Coordinate::new(48.90, 2.40)));
        assert_eq!(centers.get("c"), None);
    }

    #[test]
    fn null_district_is_rejected() {
        let units = vec![HousingUnit::new(Coordinate::new(48.8, 2.3), None, None)];
        assert!(DistrictCenters::compute(&units).is_err());
    }

    #[test]
    fn empty_training_set_gives_no_centers() {
        assert!(DistrictCenters::compute(&[]).unwrap().is_empty());
    }

    #[test]
    fn spread_is_distance_to_farthest_unit() {
        let units = vec![unit(48.80, 2.30, "a"), unit(48.82, 2.30, "a")];
        let centers = DistrictCenters::compute(&units).unwrap();
        let spread = centers.max_spread_km(&units);
        // Each unit sits 0.01 degree of latitude (about 1.11 km) from the center.
        assert!((spread - 1.112).abs() < 0.01, "got {spread}");
        assert_eq!(centers.max_spread_km(&[unit(48.0, 2.0, "unknown")]), 0.0);
    }
}
