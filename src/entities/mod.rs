// Entity Models
//
// Each entity has:
// - Stable identity that never changes (UUID for customers, row id for entries)
// - Values that the ledger reads and writes
// - serde shapes that double as the JSON wire contract

pub mod customer;
pub mod statement;

pub use customer::Customer;
pub use statement::{EntryKind, NewEntry, StatementEntry};

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the precision the SQLite store keeps
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
