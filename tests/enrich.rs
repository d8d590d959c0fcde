// End-to-end enrichment of small train/test tables.

use dvf_enrich::{FormatError, ProximityConfig, enrich};
use polars::{df, prelude::*};

const CENTER_LAT: f64 = 48.85;
const LON: f64 = 2.35;

/// Latitude `km` north of the district center; one degree is about 111.2 km here.
fn north(km: f64) -> f64 { CENTER_LAT + km / 111.2 }

fn geo_point(lat: f64) -> String { format!("{lat}, {LON}") }

/// Stations 0.3 km (metro x2, split over two platforms), 2.0 km (train) and
/// 0.6 km (metro + RER) north of the center of district "d1".
fn stops() -> DataFrame {
    df!(
        "nom_long" => ["s1", "s2", "s1", "s3"],
        "Geo Point" => [geo_point(north(0.3)), geo_point(north(2.0)), geo_point(north(0.31)), geo_point(north(0.6))],
        "fer" => [0i64, 0, 0, 0],
        "train" => [0i64, 1, 0, 0],
        "rer" => [0i64, 0, 0, 1],
        "metro" => [1i64, 0, 1, 1],
    ).unwrap()
}

fn train() -> DataFrame {
    df!(
        "lat" => [north(-0.05), north(0.05)],
        "lon" => [LON, LON],
        "district" => ["d1", "d1"],
        "code_iris" => [751010101.0, 751010199.0],
        "nb_pieces" => [2i64, 3],
        "valeur" => [400000.0, 520000.0],
    ).unwrap()
}

fn test() -> DataFrame {
    df!(
        "lat" => [CENTER_LAT, 45.76],
        "lon" => [LON, 4.84],
        "district" => ["d1", "d9"],
        "code_iris" => [Some(751010102.0), None],
        "nb_pieces" => [1i64, 4],
    ).unwrap()
}

fn income() -> DataFrame {
    df!(
        "IRIS" => ["751010101", "751010102", "930010101"],
        "DISP_MED18" => ["30000", "42000", "ns"],
    ).unwrap()
}

fn u32_values(df: &DataFrame, name: &str) -> Vec<Option<u32>> {
    df.column(name).unwrap().as_materialized_series().u32().unwrap().into_iter().collect()
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name).unwrap().as_materialized_series().f64().unwrap().into_iter().collect()
}

#[test]
fn enriches_train_and_test_alike() {
    let (train, test) = enrich(train(), test(), &stops(), &income(), &ProximityConfig::default()).unwrap();

    // Only station 1 lies within 0.5 km of any d1 unit.
    assert_eq!(u32_values(&train, "n_metros_within_0.5km"), vec![Some(2), Some(2)]);
    assert_eq!(u32_values(&train, "n_trains_within_0.5km"), vec![Some(0), Some(0)]);

    // "d9" has no center in the training set, so its unit gets zero counts.
    assert_eq!(u32_values(&test, "n_metros_within_0.5km"), vec![Some(2), Some(0)]);
    assert_eq!(u32_values(&test, "n_trains_within_0.5km"), vec![Some(0), Some(0)]);
}

#[test]
fn income_uses_nearest_available_zone() {
    let (train, test) = enrich(train(), test(), &stops(), &income(), &ProximityConfig::default()).unwrap();

    // 751010199 is missing from the reference; its units sit nearest to 751010102 (a test-set zone).
    assert_eq!(f64_values(&train, "med_revenue_iris_2018"), vec![Some(30000.0), Some(42000.0)]);
    assert_eq!(f64_values(&test, "med_revenue_iris_2018"), vec![Some(42000.0), None]);

    assert!(train.column("code_iris").is_err());
    assert!(test.column("code_iris").is_err());
    assert_eq!(train.height(), 2);
    assert!(train.column("valeur").is_ok());
}

#[test]
fn column_names_follow_fine_radius() {
    let config = ProximityConfig { coarse_radius_km: 2.5, fine_radius_km: 1.0 };
    let (train, _) = enrich(train(), test(), &stops(), &income(), &config).unwrap();

    // Station 3 (metro + RER) joins at 1 km.
    assert_eq!(u32_values(&train, "n_metros_within_1.0km"), vec![Some(3), Some(3)]);
    assert_eq!(u32_values(&train, "n_trains_within_1.0km"), vec![Some(1), Some(1)]);
}

#[test]
fn malformed_station_geopoint_aborts() {
    let mut stops = stops();
    stops.with_column(Series::new("Geo Point".into(), ["48.85 2.35", "48.86, 2.35", "48.85, 2.35", "48.87, 2.35"])).unwrap();

    let err = enrich(train(), test(), &stops, &income(), &ProximityConfig::default()).unwrap_err();
    assert!(err.chain().any(|e| e.downcast_ref::<FormatError>().is_some()), "{err:#}");
}

#[test]
fn invalid_radii_are_rejected() {
    let config = ProximityConfig { coarse_radius_km: 0.2, fine_radius_km: 0.5 };
    assert!(enrich(train(), test(), &stops(), &income(), &config).is_err());
}
