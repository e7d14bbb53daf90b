use chrono::NaiveDateTime;

use crate::model::parcel::{Destination, Parcel};
use crate::model::truck::TruckId;

/// A point-in-time view of a parcel's status, as produced by `status_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusView {
    AtHub,
    EnRoute { truck_id: TruckId },
    Delivered { truck_id: TruckId, delivery_time: NaiveDateTime },
}

impl StatusView {
    pub fn render(&self) -> String {
        match self {
            StatusView::AtHub => "At Hub".to_string(),
            StatusView::EnRoute { truck_id } => format!("En Route on Truck {truck_id}"),
            StatusView::Delivered {
                truck_id,
                delivery_time,
            } => format!(
                "Delivered by Truck {} at {}",
                truck_id,
                delivery_time.format("%I:%M %p")
            ),
        }
    }
}

/// Pure, read-only projection of `(parcel, as_of)` to a point-in-time view.
/// Never mutates the parcel — this is what keeps the address-correction
/// event from rewriting history (spec.md §4.8).
pub fn status_of(parcel: &Parcel, as_of: NaiveDateTime) -> StatusView {
    match parcel.departure_time {
        None => StatusView::AtHub,
        Some(departure_time) if as_of < departure_time => StatusView::AtHub,
        Some(_) => match parcel.delivery_time {
            Some(delivery_time) if as_of >= delivery_time => StatusView::Delivered {
                truck_id: parcel.truck_id.expect("delivered parcel was loaded onto a truck"),
                delivery_time,
            },
            _ => StatusView::EnRoute {
                truck_id: parcel.truck_id.expect("en route parcel was loaded onto a truck"),
            },
        },
    }
}

/// The destination to display for a point-in-time query: the original
/// address if `as_of` precedes the correction instant and this is the
/// corrected parcel, else the current (possibly corrected) address. This
/// decoupling from the mutated state is what lets a query asked before
/// 10:20 still see the pre-correction address even after the correction has
/// since been applied.
pub fn destination_as_of<'a>(
    parcel: &'a Parcel,
    as_of: NaiveDateTime,
    correction_instant: NaiveDateTime,
    correction_parcel_id: &str,
) -> &'a Destination {
    let is_corrected_parcel = parcel.id.0 == correction_parcel_id;
    if is_corrected_parcel && as_of < correction_instant {
        &parcel.original_destination
    } else {
        &parcel.destination
    }
}
