use std::fmt::{self, Display};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::truck::TruckId;

/// End-of-day deadline, materialised as 23:59 on the simulation's base date.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).expect("23:59:00 is a valid time")
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParcelId(pub String);

impl Display for ParcelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParcelId {
    fn from(s: &str) -> Self {
        ParcelId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    AtHub,
    EnRoute,
    Delivered,
}

/// A parcel's delivery deadline: either end-of-day or a specific wall-clock
/// time-of-day on the simulation's base date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    EndOfDay,
    At(NaiveTime),
}

impl Deadline {
    pub fn instant(&self, base_date: NaiveDate) -> NaiveDateTime {
        match self {
            Deadline::EndOfDay => base_date.and_time(end_of_day()),
            Deadline::At(t) => base_date.and_time(*t),
        }
    }

    pub fn is_end_of_day(&self) -> bool {
        matches!(self, Deadline::EndOfDay)
    }

    /// Parses the packages.csv deadline column: `"EOD"` or `"h:mm AM/PM"`.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("eod") {
            return Ok(Deadline::EndOfDay);
        }
        let t = NaiveTime::parse_from_str(raw, "%I:%M %p")
            .map_err(|e| anyhow::anyhow!("unparsable deadline '{raw}': {e}"))?;
        Ok(Deadline::At(t))
    }
}

/// Directives recognized in a parcel's free-text notes column, parsed once at
/// ingest time so the Dispatcher's runtime checks stay declarative (spec
/// design note: avoid re-parsing notes on every tick).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Delayed,
    WrongAddress,
    OnlyTruck(u32),
    MustBeDeliveredWith(Vec<ParcelId>),
}

/// Parses a notes cell into zero or more constraints. Unrecognized text is
/// silently treated as no constraint — ingest tolerates malformed notes
/// rather than failing the whole run.
pub fn parse_notes(notes: &str) -> Vec<Constraint> {
    let lower = notes.to_lowercase();
    let mut constraints = Vec::new();

    if lower.contains("delayed") {
        constraints.push(Constraint::Delayed);
    }
    if lower.contains("wrong address") {
        constraints.push(Constraint::WrongAddress);
    }
    if let Some(idx) = lower.find("can only be on truck") {
        let tail = &lower[idx + "can only be on truck".len()..];
        if let Some(n) = tail.split_whitespace().next().and_then(|s| {
            s.trim_matches(|c: char| !c.is_ascii_digit()).parse::<u32>().ok()
        }) {
            constraints.push(Constraint::OnlyTruck(n));
        }
    }
    if let Some(idx) = lower.find("must be delivered with") {
        let tail = &lower[idx + "must be delivered with".len()..];
        let ids: Vec<ParcelId> = tail
            .split(',')
            .map(|s| s.trim().trim_matches('"').trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                // keep only the leading numeric token, in case trailing prose follows
                let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
                ParcelId(if digits.is_empty() { s.to_string() } else { digits })
            })
            .collect();
        if !ids.is_empty() {
            constraints.push(Constraint::MustBeDeliveredWith(ids));
        }
    }

    constraints
}

/// A parcel's mutable destination snapshot: address/city/state/zip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone)]
pub struct Parcel {
    pub id: ParcelId,
    pub destination: Destination,
    pub original_destination: Destination,

    pub deadline: Deadline,
    pub deadline_instant: NaiveDateTime,
    pub weight: f64,
    pub notes: String,
    pub constraints: Vec<Constraint>,

    pub status: Status,
    pub departure_time: Option<NaiveDateTime>,
    pub delivery_time: Option<NaiveDateTime>,
    pub truck_id: Option<TruckId>,
}

impl Parcel {
    pub fn new(
        id: ParcelId,
        destination: Destination,
        deadline: Deadline,
        base_date: NaiveDate,
        weight: f64,
        notes: String,
    ) -> anyhow::Result<Self> {
        if destination.address.trim().is_empty() {
            anyhow::bail!("parcel {id} has an empty delivery address");
        }
        let constraints = parse_notes(&notes);
        let deadline_instant = deadline.instant(base_date);
        Ok(Self {
            id,
            original_destination: destination.clone(),
            destination,
            deadline,
            deadline_instant,
            weight,
            notes,
            constraints,
            status: Status::AtHub,
            departure_time: None,
            delivery_time: None,
            truck_id: None,
        })
    }

    pub fn has_constraint(&self, pred: impl Fn(&Constraint) -> bool) -> bool {
        self.constraints.iter().any(pred)
    }

    pub fn mark_en_route(&mut self, truck_id: TruckId, departure_time: NaiveDateTime) {
        self.status = Status::EnRoute;
        self.departure_time = Some(departure_time);
        self.truck_id = Some(truck_id);
    }

    pub fn mark_delivered(&mut self, delivery_time: NaiveDateTime) {
        self.status = Status::Delivered;
        self.delivery_time = Some(delivery_time);
    }

    /// Applies the late address-correction event. Only ever called for the
    /// one distinguished parcel once the simulation clock reaches the
    /// correction instant; `original_destination` is left untouched so
    /// `StatusQuery` can still answer historical queries correctly.
    pub fn correct_address(&mut self, corrected: Destination) {
        self.destination = corrected;
    }
}
