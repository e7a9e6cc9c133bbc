//! Booking request files.
//!
//! A request bundles everything one booking needs: what to search for, the
//! preferred departure windows, the passenger's details and whether to stop
//! short of the final button. It is read from JSON:
//!
//! ```json
//! {
//!   "criteria": {
//!     "origin": "Taipei",
//!     "destination": "左營",
//!     "travel_date": "2026-02-14",
//!     "departure_label": "10:00",
//!     "passengers": 1
//!   },
//!   "preferences": ["09:00-10:00", "14:00-15:00"],
//!   "passenger": { "person_id": "A123456789", "phone": "0912345678" },
//!   "dry_run": false
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{PassengerInfo, PreferenceList, SearchCriteria};

fn dry_run_by_default() -> bool {
    true
}

/// Everything needed to run one booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub criteria: SearchCriteria,

    /// Missing or empty means "earliest available".
    #[serde(default)]
    pub preferences: PreferenceList,

    pub passenger: PassengerInfo,

    /// Stop before the final booking button. On unless the file turns it off.
    #[serde(default = "dry_run_by_default")]
    pub dry_run: bool,
}

/// Error loading a [`BookingRequest`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("failed to read request {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON, or values that fail validation
    #[error("invalid request {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BookingRequest {
    /// Read and validate a request file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RequestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| RequestError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
