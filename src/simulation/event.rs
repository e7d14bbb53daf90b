use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::{parcel::ParcelId, truck::TruckId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Load,
    Delivery,
    Update,
}

/// One `load`, `delivery`, or `update` record. `Truck::load`/`Truck::deliver`
/// return these rather than calling a global logger, matching the teacher's
/// pattern of returning `SimulatorEventData` values for the caller to collect
/// — the Simulator is the sole owner of the log.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub kind: EventKind,
    pub parcel_id: Option<ParcelId>,
    pub time: NaiveDateTime,
    pub truck_id: Option<TruckId>,
    pub message: Option<String>,
}

impl Event {
    pub fn load(parcel_id: ParcelId, truck_id: TruckId, time: NaiveDateTime) -> Self {
        Self {
            kind: EventKind::Load,
            parcel_id: Some(parcel_id),
            time,
            truck_id: Some(truck_id),
            message: None,
        }
    }

    pub fn delivery(parcel_id: ParcelId, truck_id: TruckId, time: NaiveDateTime) -> Self {
        Self {
            kind: EventKind::Delivery,
            parcel_id: Some(parcel_id),
            time,
            truck_id: Some(truck_id),
            message: None,
        }
    }

    pub fn update(parcel_id: ParcelId, time: NaiveDateTime, message: String) -> Self {
        Self {
            kind: EventKind::Update,
            parcel_id: Some(parcel_id),
            time,
            truck_id: None,
            message: Some(message),
        }
    }

    /// Renders this event in the canonical output format from spec.md §6.
    pub fn render(&self) -> String {
        let hhmm = |t: NaiveDateTime| t.format("%I:%M %p").to_string();
        match self.kind {
            EventKind::Load => format!(
                "Package {} loaded onto Truck {} at {}.",
                self.parcel_id.as_ref().expect("load event has a parcel id"),
                self.truck_id.expect("load event has a truck id"),
                hhmm(self.time),
            ),
            EventKind::Delivery => format!(
                "Delivered Package {} at {} by Truck {}.",
                self.parcel_id.as_ref().expect("delivery event has a parcel id"),
                hhmm(self.time),
                self.truck_id.expect("delivery event has a truck id"),
            ),
            EventKind::Update => self
                .message
                .clone()
                .unwrap_or_else(|| "update event".to_string()),
        }
    }
}

/// Append-only, chronologically sortable record of every emitted event.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.extend(events);
    }

    /// Stable sort by time: coincident-time events retain insertion order,
    /// so load events for a trip precede that trip's delivery events
    /// whenever they share a timestamp.
    pub fn sorted(&self) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().collect();
        events.sort_by_key(|e| e.time);
        events
    }

    pub fn render_all(&self) -> Vec<String> {
        self.sorted().into_iter().map(Event::render).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }
}
