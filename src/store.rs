// 🗄️ Ledger Store - persistence contract for customers and their statements
//
// Two implementations:
// - SqliteLedgerStore (db.rs): durable, the default
// - InMemoryLedgerStore (memory.rs): tests and throwaway servers

use async_trait::async_trait;

use crate::entities::{Customer, NewEntry, StatementEntry};
use crate::error::LedgerResult;

/// Keyed storage of customers and their append-only statements
///
/// Implementations must enforce CPF uniqueness atomically: two concurrent
/// `insert_customer` calls with the same CPF yield exactly one customer and
/// one `DuplicateCredential`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fails with `DuplicateCredential` if the CPF is taken
    async fn insert_customer(&self, name: &str, cpf: &str) -> LedgerResult<Customer>;

    async fn find_customer_by_cpf(&self, cpf: &str) -> LedgerResult<Option<Customer>>;

    /// Fails with `NotFound` if the id is unknown
    async fn rename_customer(&self, id: &str, name: &str) -> LedgerResult<Customer>;

    /// Removes the customer and every entry it owns
    async fn delete_customer(&self, id: &str) -> LedgerResult<()>;

    /// Fails with `NotFound` if the customer is unknown
    async fn append_entry(&self, customer_id: &str, entry: NewEntry) -> LedgerResult<StatementEntry>;

    /// Newest first
    async fn list_entries(&self, customer_id: &str) -> LedgerResult<Vec<StatementEntry>>;
}
