// 💰 Balance Calculator
// Balance is derived, never stored: credits minus debits over the statement

use crate::entities::StatementEntry;

/// Net balance of a statement
///
/// Credits add their amount, debits subtract it. Entries are trusted as-is
/// (amounts are validated when they are written). Empty statement → 0.0.
pub fn get_balance(statement: &[StatementEntry]) -> f64 {
    statement.iter().fold(0.0, |acc, entry| acc + entry.signed_amount())
}
