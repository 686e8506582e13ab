use serde::Serialize;

use lode_core::{Cursor, FilterConfig};

/// Response for the filters endpoint.
#[derive(Debug, Serialize)]
pub struct GetFiltersResponse {
    pub connector: String,
    /// Rendered exclusion fragment; `null` when absent.
    pub exclusion: Option<String>,
    /// Rendered inclusion fragment; `null` when absent.
    pub inclusion: Option<String>,
    pub config: FilterConfig,
}

/// Response for the checkpoint endpoint.
#[derive(Debug, Serialize)]
pub struct GetCheckpointResponse {
    pub connector: String,
    /// Persisted form, exactly as stored.
    pub checkpoint: Option<String>,
    /// Decoded position; `null` for no checkpoint or one that does not decode.
    pub position: Option<Cursor>,
}
