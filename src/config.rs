use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveTime};

/// Hub address sentinel for the canonical scenario.
pub const HUB_ADDRESS: &str = "4001 South 700 East";

/// Paths and physical constants for one simulation run. `SimConfig::default`
/// reproduces the canonical WGUPS scenario; tests and the CLI's `--data-dir`
/// flag override the ingest paths without touching the constants.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub packages_csv: PathBuf,
    pub addresses_csv: PathBuf,
    pub distances_csv: PathBuf,

    pub hub_address: String,
    pub max_capacity: usize,
    pub avg_speed_mph: f64,
    pub mileage_budget: f64,
    pub truck_count: u32,

    pub base_date: NaiveDate,
    pub simulation_start: NaiveTime,
    pub delayed_release: NaiveTime,
    pub correction_instant: NaiveTime,
    pub correction_parcel_id: String,
    pub corrected_address: (String, String, String, String),
}

impl SimConfig {
    pub fn canonical(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            packages_csv: data_dir.join("packages.csv"),
            addresses_csv: data_dir.join("addresses.csv"),
            distances_csv: data_dir.join("distances.csv"),

            hub_address: HUB_ADDRESS.to_string(),
            max_capacity: 16,
            avg_speed_mph: 18.0,
            mileage_budget: 140.0,
            truck_count: 2,

            base_date: NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid canonical base date"),
            simulation_start: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            delayed_release: NaiveTime::from_hms_opt(9, 5, 0).expect("valid time"),
            correction_instant: NaiveTime::from_hms_opt(10, 20, 0).expect("valid time"),
            correction_parcel_id: "9".to_string(),
            corrected_address: (
                "410 S State St".to_string(),
                "Salt Lake City".to_string(),
                "UT".to_string(),
                "84111".to_string(),
            ),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::canonical("data")
    }
}
