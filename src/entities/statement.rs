// 🧾 Statement Entry - One append-only line of a customer's ledger
//
// Entries are never mutated after creation. The balance is derived from
// them (see balance.rs), never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// ENTRY KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money in (deposit)
    Credit,

    /// Money out (withdrawal)
    Debit,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Credit => "credit",
            EntryKind::Debit => "debit",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(EntryKind::Credit),
            "debit" => Ok(EntryKind::Debit),
            other => Err(format!("unknown entry type '{}', expected 'credit' or 'debit'", other)),
        }
    }
}

// ============================================================================
// STATEMENT ENTRY
// ============================================================================

/// Stored statement line, as returned by the ledger store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementEntry {
    /// Row id, assigned by the store in insertion order
    pub id: i64,

    /// Owning customer (UUID); internal, not part of the wire shape
    #[serde(skip)]
    pub customer_id: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub amount: f64,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    pub created_at: DateTime<Utc>,
}

impl StatementEntry {
    /// Signed contribution of this entry to the balance
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            EntryKind::Credit => self.amount,
            EntryKind::Debit => -self.amount,
        }
    }
}

/// Entry about to be appended; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub description: Option<String>,
    pub amount: f64,
    pub kind: EntryKind,
}

impl NewEntry {
    pub fn credit(amount: f64, description: Option<String>) -> Self {
        NewEntry {
            description,
            amount,
            kind: EntryKind::Credit,
        }
    }

    pub fn debit(amount: f64, description: Option<String>) -> Self {
        NewEntry {
            description,
            amount,
            kind: EntryKind::Debit,
        }
    }

    /// Materialize into a stored entry
    pub fn into_entry(self, id: i64, customer_id: &str, created_at: DateTime<Utc>) -> StatementEntry {
        StatementEntry {
            id,
            customer_id: customer_id.to_string(),
            description: self.description,
            amount: self.amount,
            kind: self.kind,
            created_at,
        }
    }
}
