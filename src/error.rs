use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors surfaced by the dispatch/routing engine. Everything here
/// indicates the loaded data cannot produce a meaningful schedule; there is
/// no recovery path below the CLI boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("input file not found: {path}")]
    MissingFile { path: PathBuf },

    #[error("address not indexed in distance table: {address}")]
    UnknownAddress { address: String },

    #[error("malformed row in {file}: {detail}")]
    MalformedRow { file: String, detail: String },
}
