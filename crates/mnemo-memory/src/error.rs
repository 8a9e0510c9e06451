//! Failures raised while talking to the graph engine.

use thiserror::Error;

/// Anything that goes wrong between issuing a query and holding a typed
/// record: connection setup, engine rejection, or a row that does not decode.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("cannot open graph session at {uri}: {reason}")]
    Connect { uri: String, reason: String },

    #[error("graph engine error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot decode field `{field}` of stored memory: {reason}")]
    Decode { field: &'static str, reason: String },

    #[error("cannot encode field `{field}` for storage: {reason}")]
    Encode { field: &'static str, reason: String },
}
