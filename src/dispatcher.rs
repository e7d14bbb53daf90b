use chrono::NaiveDateTime;

use crate::config::SimConfig;
use crate::model::parcel::{Constraint, ParcelId, Status};
use crate::model::truck::{Truck, TruckId};
use crate::parcel_store::ParcelStore;

/// The assignment policy: given the current simulation time, one idle
/// truck, and the parcel store, selects which parcels that truck takes on
/// its next trip. Implements the six-stage pipeline from spec.md §4.5.
pub struct Dispatcher<'a> {
    config: &'a SimConfig,
}

impl<'a> Dispatcher<'a> {
    pub fn new(config: &'a SimConfig) -> Self {
        Self { config }
    }

    /// Selects parcels for `truck`, flipping each accepted parcel's status
    /// to `EnRoute` immediately so a second truck filled in the same tick
    /// cannot double-allocate it. Callers must assign truck 1 before truck 2
    /// within a tick to keep this race-free (spec.md §5).
    pub fn assign(&self, truck: &Truck, store: &mut ParcelStore, now: NaiveDateTime) -> Vec<ParcelId> {
        let already_queued: std::collections::HashSet<ParcelId> =
            truck.loaded.iter().cloned().collect();

        // Stage 1+2+3: eligibility, temporal gates, truck-binding.
        let mut candidates: Vec<ParcelId> = store
            .iter_all()
            .filter(|p| p.status == Status::AtHub)
            .filter(|p| !already_queued.contains(&p.id))
            .filter(|p| self.passes_temporal_gates(p.has_constraint(|c| *c == Constraint::Delayed), p.id.0 == self.config.correction_parcel_id, now))
            .filter(|p| self.passes_truck_binding(p, truck.id))
            .map(|p| p.id.clone())
            .collect();

        // Stage 4: ordering by (deadline_instant asc, id asc).
        candidates.sort_by(|a, b| {
            let pa = store.lookup(a).expect("candidate exists");
            let pb = store.lookup(b).expect("candidate exists");
            pa.deadline_instant
                .cmp(&pb.deadline_instant)
                .then_with(|| a.0.cmp(&b.0))
        });

        let mut assigned: Vec<ParcelId> = Vec::new();
        let mut remaining_capacity = truck.max_capacity - truck.loaded.len();

        let mut i = 0;
        while i < candidates.len() && remaining_capacity > 0 {
            let id = candidates[i].clone();
            if assigned.contains(&id) {
                i += 1;
                continue;
            }
            let parcel = store.lookup(&id).expect("candidate exists");

            // Stage 5: group constraint.
            if let Some(group_ids) = parcel
                .constraints
                .iter()
                .find_map(|c| match c {
                    Constraint::MustBeDeliveredWith(ids) => Some(ids.clone()),
                    _ => None,
                })
            {
                let mut group: Vec<ParcelId> = group_ids
                    .into_iter()
                    .filter(|id| store.lookup(id).map(|p| p.status == Status::AtHub).unwrap_or(false))
                    .collect();
                if !group.contains(&id) {
                    group.push(id.clone());
                }
                group.sort();
                group.dedup();

                if group.len() <= remaining_capacity {
                    for member in &group {
                        if !assigned.contains(member) {
                            assigned.push(member.clone());
                            remaining_capacity -= 1;
                        }
                    }
                }
                // else: skip this group this round, it remains a candidate next round.
            } else {
                assigned.push(id);
                remaining_capacity -= 1;
            }

            i += 1;
        }

        // Stage 6 is enforced implicitly by `remaining_capacity` above.
        for id in &assigned {
            store.update_status(id, Status::EnRoute, None);
        }

        assigned
    }

    fn passes_temporal_gates(&self, delayed: bool, is_correction_parcel: bool, now: NaiveDateTime) -> bool {
        let base_date = self.config.base_date;
        if delayed && now < base_date.and_time(self.config.delayed_release) {
            return false;
        }
        if is_correction_parcel && now < base_date.and_time(self.config.correction_instant) {
            return false;
        }
        true
    }

    fn passes_truck_binding(&self, parcel: &crate::model::parcel::Parcel, truck_id: TruckId) -> bool {
        match parcel.constraints.iter().find_map(|c| match c {
            Constraint::OnlyTruck(n) => Some(*n),
            _ => None,
        }) {
            Some(n) => n == truck_id.0,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parcel::{Deadline, Destination, Parcel};
    use chrono::{NaiveDate, NaiveTime};

    fn config() -> SimConfig {
        SimConfig::canonical("data")
    }

    fn parcel(id: &str, deadline: Deadline, notes: &str, base_date: NaiveDate) -> Parcel {
        Parcel::new(
            ParcelId(id.to_string()),
            Destination {
                address: "300 State St".to_string(),
                city: "Salt Lake City".to_string(),
                state: "UT".to_string(),
                zip: "84103".to_string(),
            },
            deadline,
            base_date,
            5.0,
            notes.to_string(),
        )
        .unwrap()
    }

    #[test]
    fn delayed_parcel_excluded_before_release_time() {
        let cfg = config();
        let mut store = ParcelStore::new(40);
        store.insert(
            ParcelId("6".into()),
            parcel("6", Deadline::EndOfDay, "Delayed on flight", cfg.base_date),
        );
        let truck = Truck::new(TruckId(1), 16, 18.0, &cfg.hub_address, cfg.base_date.and_time(cfg.simulation_start));
        let dispatcher = Dispatcher::new(&cfg);

        let before = cfg.base_date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert!(dispatcher.assign(&truck, &mut store, before).is_empty());

        let after = cfg.base_date.and_time(NaiveTime::from_hms_opt(9, 6, 0).unwrap());
        let assigned = dispatcher.assign(&truck, &mut store, after);
        assert_eq!(assigned, vec![ParcelId("6".into())]);
    }

    #[test]
    fn truck_binding_constraint_is_enforced() {
        let cfg = config();
        let mut store = ParcelStore::new(40);
        store.insert(
            ParcelId("3".into()),
            parcel("3", Deadline::EndOfDay, "Can only be on truck 2", cfg.base_date),
        );
        let dispatcher = Dispatcher::new(&cfg);
        let now = cfg.base_date.and_time(cfg.simulation_start);

        let truck1 = Truck::new(TruckId(1), 16, 18.0, &cfg.hub_address, now);
        assert!(dispatcher.assign(&truck1, &mut store, now).is_empty());

        let truck2 = Truck::new(TruckId(2), 16, 18.0, &cfg.hub_address, now);
        assert_eq!(dispatcher.assign(&truck2, &mut store, now), vec![ParcelId("3".into())]);
    }

    #[test]
    fn group_constraint_loads_atomically_or_not_at_all() {
        let cfg = config();
        let mut store = ParcelStore::new(40);
        store.insert(
            ParcelId("13".into()),
            parcel("13", Deadline::EndOfDay, "Must be delivered with 15", cfg.base_date),
        );
        store.insert(
            ParcelId("15".into()),
            parcel("15", Deadline::EndOfDay, "", cfg.base_date),
        );
        let dispatcher = Dispatcher::new(&cfg);
        let now = cfg.base_date.and_time(cfg.simulation_start);
        let mut truck = Truck::new(TruckId(1), 16, 18.0, &cfg.hub_address, now);
        truck.max_capacity = 1; // not enough room for the pair

        let assigned = dispatcher.assign(&truck, &mut store, now);
        assert!(assigned.is_empty());
        assert_eq!(store.lookup(&ParcelId("13".into())).unwrap().status, Status::AtHub);

        truck.max_capacity = 16;
        let assigned = dispatcher.assign(&truck, &mut store, now);
        assert_eq!(assigned.len(), 2);
        assert!(assigned.contains(&ParcelId("13".into())));
        assert!(assigned.contains(&ParcelId("15".into())));
    }

    #[test]
    fn ordering_prefers_earlier_deadline_then_lower_id() {
        let cfg = config();
        let mut store = ParcelStore::new(40);
        store.insert(
            ParcelId("29".into()),
            parcel(
                "29",
                Deadline::At(NaiveTime::from_hms_opt(10, 30, 0).unwrap()),
                "",
                cfg.base_date,
            ),
        );
        store.insert(
            ParcelId("1".into()),
            parcel("1", Deadline::At(NaiveTime::from_hms_opt(9, 0, 0).unwrap()), "", cfg.base_date),
        );
        let dispatcher = Dispatcher::new(&cfg);
        let now = cfg.base_date.and_time(cfg.simulation_start);
        let mut truck = Truck::new(TruckId(1), 1, 18.0, &cfg.hub_address, now);

        let assigned = dispatcher.assign(&truck, &mut store, now);
        assert_eq!(assigned, vec![ParcelId("1".into())]);
        truck.loaded = assigned;
    }
}
