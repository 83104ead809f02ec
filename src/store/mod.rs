//! Store Module
//!
//! Bounded key/value storage with expiration and oldest-first eviction over a
//! pluggable key/value mechanism.

mod bounded;
mod clock;
mod envelope;
mod expiring;
mod key_index;
mod mechanism;
mod rebuild;
mod size;
mod stats;
mod subsequence;


// Re-export public types
pub use bounded::BoundedIndexStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::Envelope;
pub use expiring::ExpiringStore;
pub use key_index::{KeyIndex, INDEX_KEY};
pub use mechanism::{JsonFileMechanism, Mechanism, MemoryMechanism};
pub use rebuild::rebuild_index;
pub use size::trim_to_size;
pub use stats::StoreStats;
pub use subsequence::remove_subsequence;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
