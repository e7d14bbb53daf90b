use chrono::{Duration as ChronoDuration, NaiveDateTime};
use tracing::{info, warn};

use crate::callback::SimulationCallback;
use crate::config::SimConfig;
use crate::dispatcher::Dispatcher;
use crate::distance_table::DistanceTable;
use crate::model::parcel::{Destination, ParcelId};
use crate::model::truck::{Truck, TruckId};
use crate::parcel_store::ParcelStore;
use crate::simulation::event::{Event, EventLog};

/// The top-level clock-advancing loop. Owns the clock, the fleet, and the
/// parcel store; consults the Dispatcher to fill idle trucks and the
/// DistanceTable (via each Truck) to order deliveries.
pub struct Simulator {
    config: SimConfig,
    store: ParcelStore,
    distances: DistanceTable,
    trucks: Vec<Truck>,
    clock: NaiveDateTime,
    address_corrected: bool,
    log: EventLog,
    callbacks: Vec<Box<dyn SimulationCallback>>,
}

impl Simulator {
    pub fn new(
        config: SimConfig,
        store: ParcelStore,
        distances: DistanceTable,
        callbacks: Vec<Box<dyn SimulationCallback>>,
    ) -> Self {
        let start = config.base_date.and_time(config.simulation_start);
        let trucks = (1..=config.truck_count)
            .map(|n| Truck::new(TruckId(n), config.max_capacity, config.avg_speed_mph, &config.hub_address, start))
            .collect();

        Self {
            clock: start,
            config,
            store,
            distances,
            trucks,
            address_corrected: false,
            log: EventLog::new(),
            callbacks,
        }
    }

    pub fn clock(&self) -> NaiveDateTime {
        self.clock
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn store(&self) -> &ParcelStore {
        &self.store
    }

    pub fn total_mileage(&self) -> f64 {
        self.trucks.iter().map(|t| t.mileage).sum()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Runs the main loop to completion: while any parcel is not
    /// `Delivered`, perform one tick (address correction, assignment,
    /// dispatch-or-wait, clock advance, trip reset). Termination is
    /// guaranteed because each tick either delivers ≥ 1 parcel or advances
    /// the clock by at least one minute.
    pub fn run_to_completion(&mut self) -> anyhow::Result<()> {
        while !self.store.all_delivered() {
            self.tick()?;
        }

        if self.total_mileage() > self.config.mileage_budget {
            warn!(
                total_mileage = self.total_mileage(),
                budget = self.config.mileage_budget,
                "fleet mileage exceeds budget"
            );
        } else {
            info!(total_mileage = self.total_mileage(), "run complete within mileage budget");
        }
        Ok(())
    }

    fn tick(&mut self) -> anyhow::Result<()> {
        for cb in &mut self.callbacks {
            cb.on_tick(self.clock);
        }

        self.apply_address_correction_if_due();

        let mut any_loaded = false;
        let mut new_events = Vec::new();

        // Assignment: truck 1 before truck 2, so the eager status flip in
        // the Dispatcher stays race-free within one tick (spec.md §5).
        let truck_ids: Vec<TruckId> = self.trucks.iter().map(|t| t.id).collect();
        for truck_id in truck_ids {
            let idle = {
                let truck = self.truck(truck_id);
                truck.clock <= self.clock && truck.is_idle_at_hub(&self.config.hub_address)
            };
            if !idle {
                continue;
            }

            let assigned = {
                let truck = self.truck(truck_id);
                let dispatcher = Dispatcher::new(&self.config);
                dispatcher.assign(truck, &mut self.store, self.clock)
            };

            if assigned.is_empty() {
                continue;
            }

            for cb in &mut self.callbacks {
                cb.on_dispatch(truck_id, assigned.len(), self.clock);
            }

            let load_events = self.load_truck(truck_id, assigned);
            new_events.extend(load_events);
            any_loaded = true;
        }

        // Dispatch-or-wait: if nothing was loaded this tick, advance the
        // clock by one minute and skip straight to the next tick — no
        // trucks moved, so there is nothing to return-time or reset.
        if !any_loaded {
            for event in &new_events {
                for cb in &mut self.callbacks {
                    cb.on_event(event);
                }
            }
            self.log.extend(new_events);
            self.clock += ChronoDuration::minutes(1);
            return Ok(());
        }

        let truck_ids: Vec<TruckId> = self.trucks.iter().map(|t| t.id).collect();
        for truck_id in truck_ids {
            if self.truck(truck_id).loaded.is_empty() {
                continue;
            }
            let delivery_events = self.deliver_truck(truck_id)?;
            new_events.extend(delivery_events);
        }

        for event in &new_events {
            for cb in &mut self.callbacks {
                cb.on_event(event);
            }
        }
        self.log.extend(new_events);

        // Clock advance: earliest truck-return time among trucks whose
        // local clock is ahead of the global clock, else +1 minute.
        let earliest_return = self
            .trucks
            .iter()
            .map(|t| t.clock)
            .filter(|&t| t > self.clock)
            .min();
        self.clock = match earliest_return {
            Some(t) => t,
            None => self.clock + ChronoDuration::minutes(1),
        };

        // Trip reset: any truck now at the hub with nothing loaded starts
        // its next trip from the new global clock.
        for truck in &mut self.trucks {
            if truck.loaded.is_empty() && truck.current_location == self.config.hub_address {
                truck.reset_for_next_trip(self.clock, &self.config.hub_address);
            }
        }

        Ok(())
    }

    fn apply_address_correction_if_due(&mut self) {
        if self.address_corrected {
            return;
        }
        let correction_time = self.config.base_date.and_time(self.config.correction_instant);
        if self.clock < correction_time {
            return;
        }

        let id = ParcelId(self.config.correction_parcel_id.clone());
        let (street, city, state, zip) = self.config.corrected_address.clone();
        if let Some(parcel) = self.store.lookup_mut(&id) {
            parcel.correct_address(Destination {
                address: street,
                city,
                state,
                zip,
            });
        }
        self.address_corrected = true;

        let message = format!(
            "Updated address for Package {} at {}.",
            self.config.correction_parcel_id,
            correction_time.format("%I:%M %p")
        );
        let event = Event::update(id, correction_time, message);
        for cb in &mut self.callbacks {
            cb.on_event(&event);
        }
        self.log.push(event);
    }

    fn truck(&self, id: TruckId) -> &Truck {
        self.trucks.iter().find(|t| t.id == id).expect("truck id exists")
    }

    fn truck_mut(&mut self, id: TruckId) -> &mut Truck {
        self.trucks.iter_mut().find(|t| t.id == id).expect("truck id exists")
    }

    fn load_truck(&mut self, truck_id: TruckId, parcel_ids: Vec<ParcelId>) -> Vec<Event> {
        let departure_time = self.truck(truck_id).clock;
        let mut events = Vec::new();

        let truck = self.truck_mut(truck_id);
        for id in parcel_ids {
            if !truck.has_capacity() {
                break;
            }
            truck.loaded.push(id.clone());
            events.push(Event::load(id, truck_id, departure_time));
        }

        for event in &events {
            if let Some(id) = &event.parcel_id {
                if let Some(parcel) = self.store.lookup_mut(id) {
                    parcel.mark_en_route(truck_id, departure_time);
                }
            }
        }

        events
    }

    /// Runs one trip for `truck_id`: deadline-bearing parcels first, then
    /// flexible ones, nearest-neighbor within each phase, then returns to
    /// the hub. No rounding happens mid-trip; only the rendered event text
    /// is minute-resolved.
    fn deliver_truck(&mut self, truck_id: TruckId) -> anyhow::Result<Vec<Event>> {
        let mut events = Vec::new();

        let loaded = self.truck(truck_id).loaded.clone();
        let (mut deadlined, mut flexible): (Vec<ParcelId>, Vec<ParcelId>) = loaded.into_iter().partition(|id| {
            !self.store.lookup(id).expect("loaded parcel exists").deadline.is_end_of_day()
        });

        for phase in [&mut deadlined, &mut flexible] {
            while !phase.is_empty() {
                let current_location = self.truck(truck_id).current_location.clone();
                let addresses: Vec<String> = phase
                    .iter()
                    .map(|id| self.store.lookup(id).expect("phase parcel exists").destination.address.clone())
                    .collect();
                let refs: Vec<&str> = addresses.iter().map(String::as_str).collect();

                let (idx, distance) = self
                    .distances
                    .nearest(&current_location, refs.into_iter())?
                    .expect("non-empty phase has a nearest candidate");

                let id = phase.remove(idx);
                let truck = self.truck_mut(truck_id);
                truck.mileage += distance;
                let hours = distance / truck.avg_speed_mph;
                truck.clock += ChronoDuration::nanoseconds((hours * 3_600_000_000_000.0).round() as i64);
                let arrival = truck.clock;

                let destination_address = self
                    .store
                    .lookup(&id)
                    .expect("delivered parcel exists")
                    .destination
                    .address
                    .clone();
                self.truck_mut(truck_id).current_location = destination_address;
                self.store.lookup_mut(&id).expect("delivered parcel exists").mark_delivered(arrival);

                events.push(Event::delivery(id, truck_id, arrival));
            }
        }

        // Return to hub.
        let current_location = self.truck(truck_id).current_location.clone();
        let distance_home = self.distances.get(&current_location, &self.config.hub_address)?;
        let truck = self.truck_mut(truck_id);
        truck.mileage += distance_home;
        let hours = distance_home / truck.avg_speed_mph;
        truck.clock += ChronoDuration::nanoseconds((hours * 3_600_000_000_000.0).round() as i64);
        truck.current_location = self.config.hub_address.clone();
        truck.loaded.clear();

        Ok(events)
    }
}
