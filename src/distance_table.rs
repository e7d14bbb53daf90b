use std::collections::HashMap;
use std::path::Path;

use ordered_float::OrderedFloat;

use crate::error::DispatchError;

/// Symmetric address-indexed distance matrix. Addresses are indexed in
/// first-seen order from `addresses.csv`; `distances.csv` is a lower
/// triangular matrix (blanks parse as 0.0) whose row order is assumed to
/// match the address list, per the original `DistanceData` loader.
pub struct DistanceTable {
    addresses: Vec<String>,
    index: HashMap<String, usize>,
    matrix: Vec<Vec<f64>>,
}

impl DistanceTable {
    pub fn load(addresses_csv: impl AsRef<Path>, distances_csv: impl AsRef<Path>) -> anyhow::Result<Self> {
        let addresses = Self::load_addresses(addresses_csv)?;
        let matrix = Self::load_distances(distances_csv)?;
        let index = addresses
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();
        Ok(Self {
            addresses,
            index,
            matrix,
        })
    }

    /// Reads the addressed-list CSV, extracting the address column (column
    /// index 2, 0-indexed) and de-duplicating while preserving first-seen
    /// order.
    fn load_addresses(path: impl AsRef<Path>) -> anyhow::Result<Vec<String>> {
        let path = path.as_ref();
        let mut reader =
            csv::ReaderBuilder::new()
                .has_headers(true)
                .from_path(path)
                .map_err(|_| DispatchError::MissingFile {
                    path: path.to_path_buf(),
                })?;

        let mut addresses = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DispatchError::MalformedRow {
                file: path.display().to_string(),
                detail: e.to_string(),
            })?;
            let address = record
                .get(2)
                .ok_or_else(|| DispatchError::MalformedRow {
                    file: path.display().to_string(),
                    detail: "expected an address column at index 2".to_string(),
                })?
                .trim()
                .to_string();
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }
        Ok(addresses)
    }

    /// Reads the lower-triangular distance matrix; blank cells parse as 0.0.
    fn load_distances(path: impl AsRef<Path>) -> anyhow::Result<Vec<Vec<f64>>> {
        let path = path.as_ref();
        let mut reader =
            csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .from_path(path)
                .map_err(|_| DispatchError::MissingFile {
                    path: path.to_path_buf(),
                })?;

        let mut matrix = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DispatchError::MalformedRow {
                file: path.display().to_string(),
                detail: e.to_string(),
            })?;
            let mut row = Vec::with_capacity(record.len().saturating_sub(1));
            for cell in record.iter().skip(1) {
                let cell = cell.trim();
                let value = if cell.is_empty() {
                    0.0
                } else {
                    cell.parse::<f64>().map_err(|e| DispatchError::MalformedRow {
                        file: path.display().to_string(),
                        detail: format!("bad distance cell '{cell}': {e}"),
                    })?
                };
                row.push(value);
            }
            matrix.push(row);
        }
        Ok(matrix)
    }

    fn index_of(&self, address: &str) -> Result<usize, DispatchError> {
        self.index
            .get(address)
            .copied()
            .ok_or_else(|| DispatchError::UnknownAddress {
                address: address.to_string(),
            })
    }

    /// Returns the distance between two addresses. The matrix is treated as
    /// symmetric: `d[i][j]` is returned if it is positive, else `d[j][i]`.
    pub fn get(&self, a: &str, b: &str) -> Result<f64, DispatchError> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        if i == j {
            return Ok(0.0);
        }
        let forward = self.matrix.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0);
        if forward > 0.0 {
            return Ok(forward);
        }
        let backward = self.matrix.get(j).and_then(|row| row.get(i)).copied().unwrap_or(0.0);
        Ok(backward)
    }

    pub fn addresses(&self) -> &[String] {
        &self.addresses
    }

    /// Finds the nearest of `candidates` to `from`, breaking ties by input
    /// order (pure nearest-neighbor, no look-ahead). Returns the candidate's
    /// index into `candidates` and the distance.
    pub fn nearest<'a>(
        &self,
        from: &str,
        candidates: impl Iterator<Item = &'a str>,
    ) -> Result<Option<(usize, f64)>, DispatchError> {
        let mut best: Option<(usize, OrderedFloat<f64>)> = None;
        for (idx, addr) in candidates.enumerate() {
            let d = OrderedFloat(self.get(from, addr)?);
            match &best {
                Some((_, best_d)) if *best_d <= d => {}
                _ => best = Some((idx, d)),
            }
        }
        Ok(best.map(|(idx, d)| (idx, d.into_inner())))
    }
}
