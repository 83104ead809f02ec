//! Size-bound eviction.

use tracing::debug;

use crate::error::Result;
use crate::store::ExpiringStore;

// == Trim To Size ==
/// Evicts the oldest entries until at most `max_size` remain.
///
/// `keys` is ordered oldest first, so the evicted entries are the prefix.
/// Each evicted key is removed from the mechanism exactly once; a removal
/// failure aborts the trim and is returned to the caller. Returns the
/// surviving suffix.
pub fn trim_to_size(
    store: &mut ExpiringStore,
    mut keys: Vec<String>,
    max_size: usize,
) -> Result<Vec<String>> {
    if keys.len() <= max_size {
        return Ok(keys);
    }

    let excess = keys.len() - max_size;
    for key in &keys[..excess] {
        debug!("Evicting '{}' to stay within {} entries", key, max_size);
        store.remove(key)?;
    }

    keys.drain(..excess);
    Ok(keys)
}
