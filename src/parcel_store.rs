use chrono::NaiveDateTime;
use tracing::warn;

use crate::model::parcel::{Parcel, ParcelId, Status};

/// A keyed collection of parcels backed by a hand-rolled chained hash table,
/// grounded on `original_source/hash_table.py`'s `HashTable` (bucket array +
/// linked chaining, `int(key) % size` hash). Spec.md §4.1 mandates that the
/// surface API not delegate to a language-provided hash map; the teacher's
/// own `Map`/`define_map!` idiom (a thin wrapper over `BTreeMap`) is
/// deliberately not reused here for that reason — see DESIGN.md.
///
/// Expected load factor is ≤ 1 for the canonical 40-parcel scenario against
/// 40 buckets, matching the original's `HashTable(size=40)`.
pub struct ParcelStore {
    buckets: Vec<Vec<(ParcelId, Parcel)>>,
}

fn bucket_index(id: &ParcelId, bucket_count: usize) -> usize {
    // Parcel ids are small decimal integers in the canonical scenario, but
    // ids are opaque strings in general; hash every byte so non-numeric ids
    // still spread across buckets instead of all landing in bucket 0.
    let mut acc: u64 = 0;
    for byte in id.0.bytes() {
        acc = acc.wrapping_mul(31).wrapping_add(byte as u64);
    }
    (acc % bucket_count as u64) as usize
}

impl ParcelStore {
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: (0..bucket_count.max(1)).map(|_| Vec::new()).collect(),
        }
    }

    /// Inserts a parcel, replacing any existing value for the same id —
    /// parcels are rebuildable by reload, so a duplicate id is an update,
    /// not an error.
    pub fn insert(&mut self, id: ParcelId, parcel: Parcel) {
        let bucket = &mut self.buckets[bucket_index(&id, self.buckets.len())];
        if let Some(slot) = bucket.iter_mut().find(|(k, _)| k == &id) {
            slot.1 = parcel;
        } else {
            bucket.push((id, parcel));
        }
    }

    pub fn lookup(&self, id: &ParcelId) -> Option<&Parcel> {
        let bucket = &self.buckets[bucket_index(id, self.buckets.len())];
        bucket.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn lookup_mut(&mut self, id: &ParcelId) -> Option<&mut Parcel> {
        let bucket = &mut self.buckets[bucket_index(id, self.buckets.len())];
        bucket.iter_mut().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// Thin convenience wrapper around `lookup_mut`; no-ops and logs a
    /// warning if the id is missing rather than failing the run.
    pub fn update_status(
        &mut self,
        id: &ParcelId,
        status: Status,
        delivery_time: Option<NaiveDateTime>,
    ) {
        match self.lookup_mut(id) {
            Some(parcel) => {
                parcel.status = status;
                if let Some(t) = delivery_time {
                    parcel.delivery_time = Some(t);
                }
            }
            None => warn!(parcel_id = %id, "update_status on unknown parcel id"),
        }
    }

    pub fn iter_all(&self) -> impl Iterator<Item = &Parcel> {
        self.buckets.iter().flat_map(|b| b.iter().map(|(_, v)| v))
    }

    pub fn iter_all_mut(&mut self) -> impl Iterator<Item = &mut Parcel> {
        self.buckets
            .iter_mut()
            .flat_map(|b| b.iter_mut().map(|(_, v)| v))
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all_delivered(&self) -> bool {
        self.iter_all().all(|p| p.status == Status::Delivered)
    }
}
