use std::path::Path;

use rattha_core::{LegacyEdition, LegacyMap};
use tracing::{info, warn};

use crate::StoreError;
use crate::output::read_json;

/// Load the legacy sections of `edition_id` from the reference collection at `path`.
///
/// A missing file or an edition absent from the collection yields an empty map.
/// A file that exists but does not parse is an error.
pub fn load_legacy_map(path: &Path, edition_id: &str) -> Result<LegacyMap, StoreError> {
    if !path.exists() {
        warn!(path = %path.display(), "legacy collection not found, continuing without reference");
        return Ok(LegacyMap::default());
    }
    let editions: Vec<LegacyEdition> = read_json(path)?;
    let map = LegacyMap::from_editions(editions, edition_id);
    if map.is_empty() {
        warn!(edition = edition_id, "edition not present in legacy collection");
    } else {
        info!(edition = edition_id, sections = map.len(), "loaded legacy reference");
    }
    Ok(map)
}
