use std::path::Path;

use chrono::NaiveDate;

use crate::error::DispatchError;
use crate::model::parcel::{Deadline, Destination, Parcel, ParcelId};
use crate::parcel_store::ParcelStore;

/// Reads `packages.csv` positionally — id, street, city, state, zip,
/// deadline, weight, notes — mirroring the original `load_packages_from_csv`,
/// which indexes `csv.reader` rows by column rather than by header name.
/// Builds a `ParcelStore` sized for the row count, matching the original's
/// `HashTable(size=40)` for the canonical 40-parcel scenario.
pub fn load_parcels(packages_csv: impl AsRef<Path>, base_date: NaiveDate) -> anyhow::Result<ParcelStore> {
    let path = packages_csv.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|_| DispatchError::MissingFile {
            path: path.to_path_buf(),
        })?;

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<csv::Result<_>>()
        .map_err(|e| DispatchError::MalformedRow {
            file: path.display().to_string(),
            detail: e.to_string(),
        })?;

    let mut store = ParcelStore::new(rows.len().max(1));

    for record in rows {
        let cell = |idx: usize| -> anyhow::Result<&str> {
            record.get(idx).map(str::trim).ok_or_else(|| {
                DispatchError::MalformedRow {
                    file: path.display().to_string(),
                    detail: format!("expected a column at index {idx}"),
                }
                .into()
            })
        };

        let id = ParcelId(cell(0)?.to_string());
        let address = cell(1)?.to_string();
        let city = cell(2)?.to_string();
        let state = cell(3)?.to_string();
        let zip = cell(4)?.to_string();
        let deadline = Deadline::parse(cell(5)?)?;
        let weight: f64 = cell(6)?
            .parse()
            .map_err(|e| anyhow::anyhow!("parcel {id} has an unparsable weight: {e}"))?;
        let notes = record.get(7).unwrap_or("").trim().to_string();

        let parcel = Parcel::new(
            id.clone(),
            Destination {
                address,
                city,
                state,
                zip,
            },
            deadline,
            base_date,
            weight,
            notes,
        )?;
        store.insert(id, parcel);
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_canonical_columns() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "id,address,city,state,zip,deadline,weight,notes\n\
             1,195 W Oakland Ave,Salt Lake City,UT,84115,10:30 AM,21,\n\
             9,300 State St,Salt Lake City,UT,84103,EOD,2,Wrong address listed"
        )
        .unwrap();

        let base_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let store = load_parcels(f.path(), base_date).unwrap();

        assert_eq!(store.len(), 2);
        let p9 = store.lookup(&ParcelId("9".into())).unwrap();
        assert!(p9.has_constraint(|c| *c == crate::model::parcel::Constraint::WrongAddress));
    }

    #[test]
    fn missing_file_is_reported() {
        let base_date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let err = load_parcels("/nonexistent/packages.csv", base_date).unwrap_err();
        assert!(err.downcast_ref::<DispatchError>().is_some());
    }
}
