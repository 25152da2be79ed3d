//! JSON output of the request state.
//!
//! The serialized [`RequestState`] keeps the wire names the result view
//! consumes: `url`, `article`, `result` (keyed by aspect, items with
//! `Title`/`Source`/`SourceUrl`/`Description`) and `trustLevel`.

use crate::models::RequestState;
use crate::utils::ensure_parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Pretty-printed JSON for a request state.
pub fn request_state_to_json(state: &RequestState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

/// Write a [`RequestState`] to a JSON file.
///
/// Creates the parent directory when needed.
///
/// # Arguments
///
/// * `state` - The finished request state
/// * `path` - Destination file
///
/// # Returns
///
/// `Ok(())` on success, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_request_state(state: &RequestState, path: &str) -> Result<(), Box<dyn Error>> {
    let json = request_state_to_json(state)?;
    let path = Path::new(path);

    if let Err(e) = ensure_parent_dir(path).await {
        error!(error = %e, "Failed to create JSON output directory");
        return Err(e);
    }

    fs::write(path, json).await?;
    info!("Wrote JSON request state");
    Ok(())
}
