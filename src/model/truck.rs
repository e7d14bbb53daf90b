use std::fmt::{self, Display};

use chrono::NaiveDateTime;

use crate::model::parcel::ParcelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TruckId(pub u32);

impl Display for TruckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A delivery truck. `mileage` is cumulative across the whole run (spec
/// invariant: non-decreasing across trips); `clock` is this truck's local
/// simulation time, which the Simulator reads to compute the global
/// earliest-return advance.
#[derive(Debug, Clone)]
pub struct Truck {
    pub id: TruckId,
    pub max_capacity: usize,
    pub avg_speed_mph: f64,
    pub current_location: String,
    pub loaded: Vec<ParcelId>,
    pub mileage: f64,
    pub clock: NaiveDateTime,
    pub departure_time: NaiveDateTime,
}

impl Truck {
    pub fn new(
        id: TruckId,
        max_capacity: usize,
        avg_speed_mph: f64,
        hub_address: &str,
        start: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            max_capacity,
            avg_speed_mph,
            current_location: hub_address.to_string(),
            loaded: Vec::new(),
            mileage: 0.0,
            clock: start,
            departure_time: start,
        }
    }

    pub fn is_idle_at_hub(&self, hub_address: &str) -> bool {
        self.loaded.is_empty() && self.current_location == hub_address
    }

    pub fn has_capacity(&self) -> bool {
        self.loaded.len() < self.max_capacity
    }

    pub fn reset_for_next_trip(&mut self, new_departure: NaiveDateTime, hub_address: &str) {
        self.departure_time = new_departure;
        self.clock = new_departure;
        self.current_location = hub_address.to_string();
    }
}
