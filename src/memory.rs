// In-memory ledger store
// Used by tests and by `FIN_API_STORE=memory`; nothing survives a restart

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::entities::{timestamp_now, Customer, NewEntry, StatementEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

#[derive(Default)]
struct Ledger {
    /// customer id → customer
    customers: HashMap<String, Customer>,

    /// cpf → customer id
    by_cpf: HashMap<String, String>,

    /// customer id → entries in insertion order
    statements: HashMap<String, Vec<StatementEntry>>,

    next_entry_id: i64,
}

/// Ledger store held in process memory
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<RwLock<Ledger>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Ledger>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Ledger>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_customer(&self, name: &str, cpf: &str) -> LedgerResult<Customer> {
        // Check and insert under the same write lock
        let mut ledger = self.write()?;

        if ledger.by_cpf.contains_key(cpf) {
            return Err(LedgerError::DuplicateCredential);
        }

        let customer = Customer::new(name, cpf);
        ledger.by_cpf.insert(customer.cpf.clone(), customer.id.clone());
        ledger.customers.insert(customer.id.clone(), customer.clone());

        Ok(customer)
    }

    async fn find_customer_by_cpf(&self, cpf: &str) -> LedgerResult<Option<Customer>> {
        let ledger = self.read()?;

        Ok(ledger
            .by_cpf
            .get(cpf)
            .and_then(|id| ledger.customers.get(id))
            .cloned())
    }

    async fn rename_customer(&self, id: &str, name: &str) -> LedgerResult<Customer> {
        let mut ledger = self.write()?;

        let customer = ledger.customers.get_mut(id).ok_or(LedgerError::NotFound)?;
        *customer = customer.renamed(name);

        Ok(customer.clone())
    }

    async fn delete_customer(&self, id: &str) -> LedgerResult<()> {
        let mut ledger = self.write()?;

        let customer = ledger.customers.remove(id).ok_or(LedgerError::NotFound)?;
        ledger.by_cpf.remove(&customer.cpf);
        ledger.statements.remove(id);

        Ok(())
    }

    async fn append_entry(&self, customer_id: &str, entry: NewEntry) -> LedgerResult<StatementEntry> {
        let mut ledger = self.write()?;

        if !ledger.customers.contains_key(customer_id) {
            return Err(LedgerError::NotFound);
        }

        ledger.next_entry_id += 1;
        let stored = entry.into_entry(ledger.next_entry_id, customer_id, timestamp_now());

        ledger
            .statements
            .entry(customer_id.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn list_entries(&self, customer_id: &str) -> LedgerResult<Vec<StatementEntry>> {
        let mut entries = self
            .read()?
            .statements
            .get(customer_id)
            .cloned()
            .unwrap_or_default();

        // Newest first, ties broken by id; same order as the SQLite store
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}
