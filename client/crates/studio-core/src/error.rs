use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid project status: {value} {location}")]
    InvalidProjectStatus {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid dev server health state: {value} {location}")]
    InvalidHealthState {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid build status: {value} {location}")]
    InvalidBuildStatus {
        value: String,
        location: ErrorLocation,
    },

    #[error("Invalid push message: {source} {location}")]
    PushMessage {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },
}

pub type Result<T> = StdResult<T, CoreError>;
