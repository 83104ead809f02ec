//! Subsequence removal over ordered key lists.

use crate::error::{Result, StoreError};

/// Removes `to_remove` from `keys`, keeping the survivors in order.
///
/// `to_remove` must be an order-preserving subsequence of `keys`. Both lists
/// are walked once in lockstep, so the cost is `O(keys + to_remove)`. If
/// `to_remove` is not a subsequence the walk runs off the end of `keys` with
/// unmatched elements left over, which is reported as a `ContractViolation`.
pub fn remove_subsequence<T>(keys: &[T], to_remove: &[T]) -> Result<Vec<T>>
where
    T: PartialEq + Clone,
{
    if to_remove.is_empty() {
        return Ok(keys.to_vec());
    }

    let mut survivors = Vec::with_capacity(keys.len().saturating_sub(to_remove.len()));
    let mut pending = to_remove.iter().peekable();

    for key in keys {
        match pending.peek() {
            Some(&next) if next == key => {
                pending.next();
            }
            _ => survivors.push(key.clone()),
        }
    }

    let unmatched = pending.count();
    if unmatched > 0 {
        return Err(StoreError::ContractViolation(format!(
            "{} of {} keys to remove are not an ordered subsequence of the index",
            unmatched,
            to_remove.len()
        )));
    }

    Ok(survivors)
}
