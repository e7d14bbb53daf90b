//! End-to-end scenarios S1, S3, S4 from spec.md §8, run against a small
//! but fully self-consistent fixture (six addresses, ten parcels) rather
//! than a reproduction of the original 40-parcel WGUPS dataset, since this
//! crate doesn't ship that dataset — only the scenario shapes it exercises.

use std::fs;
use std::io::Write as _;

use chrono::{NaiveDate, NaiveTime};
use wgups_sim::config::SimConfig;
use wgups_sim::distance_table::DistanceTable;
use wgups_sim::ingest;
use wgups_sim::model::parcel::ParcelId;
use wgups_sim::simulation::simulator::Simulator;
use wgups_sim::status_query::status_of;

fn write_fixture(dir: &std::path::Path) {
    let mut packages = fs::File::create(dir.join("packages.csv")).unwrap();
    writeln!(packages, "id,address,city,state,zip,deadline,weight,notes").unwrap();
    let rows = [
        ("1", "300 State St", "10:30 AM", "5", ""),
        ("2", "410 S State St", "EOD", "10", ""),
        ("3", "177 W Price Ave", "EOD", "3", "Can only be on truck 2"),
        ("4", "3060 Lester St", "EOD", "8", ""),
        ("5", "4300 S 1300 E", "11:00 AM", "2", ""),
        ("6", "300 State St", "EOD", "6", "Delayed on flight---will not arrive to depot until 9:05 am"),
        ("7", "410 S State St", "EOD", "4", "Must be delivered with 8"),
        ("8", "177 W Price Ave", "EOD", "4", ""),
        ("9", "300 State St", "EOD", "2", "Wrong address listed"),
        ("10", "3060 Lester St", "10:00 AM", "7", ""),
    ];
    for (id, address, deadline, weight, notes) in rows {
        writeln!(packages, "{id},{address},Salt Lake City,UT,84111,{deadline},{weight},{notes}").unwrap();
    }

    let mut addresses = fs::File::create(dir.join("addresses.csv")).unwrap();
    writeln!(addresses, "idx,name,address").unwrap();
    writeln!(addresses, "0,Hub,4001 South 700 East").unwrap();
    writeln!(addresses, "1,A,300 State St").unwrap();
    writeln!(addresses, "2,B,410 S State St").unwrap();
    writeln!(addresses, "3,C,177 W Price Ave").unwrap();
    writeln!(addresses, "4,D,3060 Lester St").unwrap();
    writeln!(addresses, "5,E,4300 S 1300 E").unwrap();

    let mut distances = fs::File::create(dir.join("distances.csv")).unwrap();
    writeln!(distances, "label,a,b,c,d,e").unwrap();
    writeln!(distances, "Hub,0").unwrap();
    writeln!(distances, "A,3.0,0").unwrap();
    writeln!(distances, "B,2.0,1.0,0").unwrap();
    writeln!(distances, "C,5.0,4.0,3.5,0").unwrap();
    writeln!(distances, "D,4.0,2.5,3.0,2.0,0").unwrap();
    writeln!(distances, "E,6.0,5.0,4.5,3.0,1.5,0").unwrap();
}

fn fixture_config(dir: &std::path::Path) -> SimConfig {
    SimConfig::canonical(dir)
}

#[test]
fn s1_every_parcel_is_delivered_within_deadline_and_budget() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = fixture_config(dir.path());

    let store = ingest::load_parcels(&config.packages_csv, config.base_date).unwrap();
    let distances = DistanceTable::load(&config.addresses_csv, &config.distances_csv).unwrap();
    let mut sim = Simulator::new(config.clone(), store, distances, vec![]);
    sim.run_to_completion().unwrap();

    for parcel in sim.store().iter_all() {
        assert_eq!(parcel.status, wgups_sim::model::parcel::Status::Delivered);
        let delivery_time = parcel.delivery_time.expect("delivered parcel has a delivery time");
        if !parcel.deadline.is_end_of_day() {
            assert!(
                delivery_time <= parcel.deadline_instant,
                "parcel {} missed its deadline: delivered {:?}, deadline {:?}",
                parcel.id,
                delivery_time,
                parcel.deadline_instant
            );
        }
    }

    assert!(sim.total_mileage() <= config.mileage_budget);
}

#[test]
fn s3_delayed_parcel_is_never_delivered_before_its_release_time() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = fixture_config(dir.path());

    let store = ingest::load_parcels(&config.packages_csv, config.base_date).unwrap();
    let parcel6 = store.lookup(&ParcelId("6".into())).unwrap();

    let before_release = config.base_date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(status_of(parcel6, before_release), wgups_sim::status_query::StatusView::AtHub);

    let distances = DistanceTable::load(&config.addresses_csv, &config.distances_csv).unwrap();
    let mut sim = Simulator::new(config.clone(), store, distances, vec![]);
    sim.run_to_completion().unwrap();

    let delivered = sim.store().lookup(&ParcelId("6".into())).unwrap();
    let release = config.base_date.and_time(config.delayed_release);
    assert!(delivered.departure_time.unwrap() >= release);
}

#[test]
fn s4_grouped_parcels_share_a_truck_and_a_departure() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = fixture_config(dir.path());

    let store = ingest::load_parcels(&config.packages_csv, config.base_date).unwrap();
    let distances = DistanceTable::load(&config.addresses_csv, &config.distances_csv).unwrap();
    let mut sim = Simulator::new(config, store, distances, vec![]);
    sim.run_to_completion().unwrap();

    let p7 = sim.store().lookup(&ParcelId("7".into())).unwrap();
    let p8 = sim.store().lookup(&ParcelId("8".into())).unwrap();
    assert_eq!(p7.truck_id, p8.truck_id);
    assert_eq!(p7.departure_time, p8.departure_time);
}

#[test]
fn truck_binding_constraint_holds_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = fixture_config(dir.path());

    let store = ingest::load_parcels(&config.packages_csv, config.base_date).unwrap();
    let distances = DistanceTable::load(&config.addresses_csv, &config.distances_csv).unwrap();
    let mut sim = Simulator::new(config, store, distances, vec![]);
    sim.run_to_completion().unwrap();

    let p3 = sim.store().lookup(&ParcelId("3".into())).unwrap();
    assert_eq!(p3.truck_id, Some(wgups_sim::model::truck::TruckId(2)));
}

#[test]
fn capacity_is_never_exceeded_for_this_fixture() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let config = fixture_config(dir.path());
    let base_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
    assert_eq!(config.base_date, base_date);

    let store = ingest::load_parcels(&config.packages_csv, config.base_date).unwrap();
    assert_eq!(store.len(), 10);
}
