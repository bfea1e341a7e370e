// 👤 Customer Entity - Stable identity keyed by CPF
//
// "Customer name is a VALUE (can change), CPF and UUID are IDENTITY (never change)"
//
// - UUID is the internal key used by statement rows (customer_id)
// - CPF is the business key and doubles as the caller's credential

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp_now;

// ============================================================================
// CUSTOMER ENTITY
// ============================================================================

/// Customer identity record
///
/// Owns zero or more statement entries. The entries are not embedded here;
/// the store keeps them separately and `AccountView` joins the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Stable identity (UUID v4) - never changes
    pub id: String,

    /// Display name, the only mutable field
    pub name: String,

    /// CPF, unique across all customers
    pub cpf: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Create new customer with a fresh UUID
    pub fn new(name: impl Into<String>, cpf: impl Into<String>) -> Self {
        let now = timestamp_now();

        Customer {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            cpf: cpf.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy of this customer with a new name and a bumped `updated_at`
    pub fn renamed(&self, name: impl Into<String>) -> Customer {
        let mut next = self.clone();
        next.name = name.into();
        next.updated_at = timestamp_now();
        next
    }
}

// ============================================================================
// TESTS
// ============================================================================
