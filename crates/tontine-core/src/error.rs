use crate::types::RecordId;
use thiserror::Error;

/// Ledger domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("no record with id {0}")]
    UnknownRecord(RecordId),

    #[error("no funding record with id {0}")]
    UnknownFunding(RecordId),
}
