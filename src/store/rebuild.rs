//! Index Rebuild Module
//!
//! Reconstructs the key index from scratch by scanning the mechanism. The
//! creation timestamp inside each envelope is the only ordering signal the
//! mechanism offers, so the index is always recoverable from the data.

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::envelope;
use crate::store::{ExpiringStore, INDEX_KEY};

// == Rebuild ==
/// Scans every entry and returns the live keys ordered by creation time.
///
/// Entries whose envelope is malformed are skipped. Any other failure
/// aborts the rebuild. Keys created in the same millisecond are ordered
/// lexicographically.
pub fn rebuild_index(store: &ExpiringStore) -> Result<Vec<String>> {
    let mut records: Vec<(String, u64)> = Vec::new();
    let mut skipped = 0usize;

    for (key, raw) in store.mechanism().entries()? {
        if key == INDEX_KEY {
            continue;
        }

        match envelope::unwrap(&key, &raw) {
            Ok(env) => records.push((key, env.created_at)),
            Err(StoreError::InvalidValue { key, reason }) => {
                debug!("Skipping '{}' during index rebuild: {}", key, reason);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    records.sort_unstable_by(|(ka, ta), (kb, tb)| ta.cmp(tb).then_with(|| ka.cmp(kb)));

    debug!(
        "Rebuilt index with {} keys ({} skipped)",
        records.len(),
        skipped
    );

    Ok(records.into_iter().map(|(key, _)| key).collect())
}
