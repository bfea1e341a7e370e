// 💸 Transaction Service - deposits, withdrawals, statements, balance
//
// Validation happens before any write, so every operation either fully
// succeeds or fails without touching the ledger.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::balance::get_balance;
use crate::entities::{Customer, EntryKind, NewEntry, StatementEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

// ============================================================================
// PER-CUSTOMER WRITE LOCKS
// ============================================================================

/// One async mutex per customer id
///
/// Serializes balance-check-then-append within this process, so two
/// concurrent withdrawals cannot both see the same balance.
#[derive(Clone, Default)]
pub struct CustomerLocks {
    locks: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl CustomerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, customer_id: &str) -> LedgerResult<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().map_err(|_| LedgerError::LockPoisoned)?;
            // Drop entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(customer_id.to_string()).or_default())
        };

        Ok(lock.lock_owned().await)
    }
}

// ============================================================================
// VALIDATION & FILTERS
// ============================================================================

/// Amount must be a finite number strictly greater than zero
pub fn validate_amount(amount: f64) -> LedgerResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::validation("invalid amount: must be greater than zero"));
    }
    Ok(amount)
}

/// Parse a `YYYY-MM-DD` query date
pub fn parse_statement_date(date: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| LedgerError::validation(format!("invalid date '{}': expected YYYY-MM-DD", date)))
}

/// Entries created on `date` (UTC calendar day), time of day ignored
pub fn entries_on(statement: Vec<StatementEntry>, date: NaiveDate) -> Vec<StatementEntry> {
    statement
        .into_iter()
        .filter(|entry| entry.created_at.date_naive() == date)
        .collect()
}

/// Blank descriptions are stored as absent
fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

// ============================================================================
// TRANSACTION SERVICE
// ============================================================================

#[derive(Clone)]
pub struct TransactionService {
    store: Arc<dyn LedgerStore>,
    locks: CustomerLocks,
}

impl TransactionService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            locks: CustomerLocks::new(),
        }
    }

    /// Append a credit entry, unless the balance would no longer be finite
    pub async fn deposit(
        &self,
        customer: &Customer,
        amount: f64,
        description: Option<String>,
    ) -> LedgerResult<StatementEntry> {
        let amount = validate_amount(amount)?;
        let _guard = self.locks.acquire(&customer.id).await?;

        let balance = get_balance(&self.store.list_entries(&customer.id).await?);

        if !(balance + amount).is_finite() {
            tracing::info!(customer_id = %customer.id, balance, amount, "deposit rejected: balance overflow");
            return Err(LedgerError::validation("invalid amount: balance would exceed the representable maximum"));
        }

        let entry = self
            .store
            .append_entry(&customer.id, NewEntry::credit(amount, normalize_description(description)))
            .await?;

        tracing::info!(customer_id = %customer.id, amount, entry_id = entry.id, "deposit");
        Ok(entry)
    }

    /// Append a debit entry if the current balance covers it
    pub async fn withdraw(
        &self,
        customer: &Customer,
        amount: f64,
        description: Option<String>,
    ) -> LedgerResult<StatementEntry> {
        let amount = validate_amount(amount)?;
        let _guard = self.locks.acquire(&customer.id).await?;

        let balance = get_balance(&self.store.list_entries(&customer.id).await?);

        if balance < amount {
            tracing::info!(customer_id = %customer.id, balance, amount, "withdrawal rejected: insufficient funds");
            return Err(LedgerError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }

        let entry = self
            .store
            .append_entry(&customer.id, NewEntry::debit(amount, normalize_description(description)))
            .await?;

        tracing::info!(customer_id = %customer.id, amount, entry_id = entry.id, "withdrawal");
        Ok(entry)
    }

    /// Unified entry point: `credit` deposits, `debit` withdraws
    pub async fn create_transaction(
        &self,
        customer: &Customer,
        kind: &str,
        amount: f64,
        description: Option<String>,
    ) -> LedgerResult<StatementEntry> {
        let kind = kind.trim().parse::<EntryKind>().map_err(LedgerError::Validation)?;

        match kind {
            EntryKind::Credit => self.deposit(customer, amount, description).await,
            EntryKind::Debit => self.withdraw(customer, amount, description).await,
        }
    }

    pub async fn statement(&self, customer: &Customer) -> LedgerResult<Vec<StatementEntry>> {
        self.store.list_entries(&customer.id).await
    }

    pub async fn statement_on(&self, customer: &Customer, date: &str) -> LedgerResult<Vec<StatementEntry>> {
        let date = parse_statement_date(date)?;
        Ok(entries_on(self.statement(customer).await?, date))
    }

    pub async fn balance(&self, customer: &Customer) -> LedgerResult<f64> {
        Ok(get_balance(&self.statement(customer).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedgerStore;
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    async fn setup() -> (TransactionService, Customer) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let customer = store.insert_customer("Ana", "111").await.unwrap();
        (TransactionService::new(store), customer)
    }

    fn entry_at(id: i64, created_at: &str) -> StatementEntry {
        let created_at: DateTime<Utc> = created_at.parse().unwrap();
        NewEntry::credit(1.0, None).into_entry(id, "c", created_at)
    }

    #[rstest]
    #[case(0.0)]
    #[case(-10.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_invalid_amounts(#[case] amount: f64) {
        assert!(matches!(validate_amount(amount), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_valid_amount() {
        assert_eq!(validate_amount(0.01).unwrap(), 0.01);
    }

    #[tokio::test]
    async fn test_deposit_increases_balance() {
        let (service, ana) = setup().await;

        service.deposit(&ana, 100.0, Some("salary".into())).await.unwrap();

        assert_eq!(service.balance(&ana).await.unwrap(), 100.0);
    }

    #[tokio::test]
    async fn test_deposit_rejects_non_positive_amount() {
        let (service, ana) = setup().await;

        let err = service.deposit(&ana, 0.0, None).await.unwrap_err();

        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(service.statement(&ana).await.unwrap().is_empty(), "Nothing written");
    }

    #[tokio::test]
    async fn test_deposit_cannot_overflow_balance() {
        let (service, ana) = setup().await;
        service.deposit(&ana, 1e308, None).await.unwrap();

        let err = service.deposit(&ana, 1e308, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(service.statement(&ana).await.unwrap().len(), 1, "Nothing written");
        assert_eq!(service.balance(&ana).await.unwrap(), 1e308);

        // The whole balance can still leave, and the account stays usable
        service.withdraw(&ana, 1e308, None).await.unwrap();
        let err = service.withdraw(&ana, 1.0, None).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { balance, .. } if balance == 0.0
        ));
        service.deposit(&ana, 1e308, None).await.unwrap();
        assert_eq!(service.balance(&ana).await.unwrap(), 1e308);
    }

    #[tokio::test]
    async fn test_withdraw_scenario() {
        let (service, ana) = setup().await;
        service.deposit(&ana, 100.0, None).await.unwrap();

        let err = service.withdraw(&ana, 150.0, None).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { balance, requested } if balance == 100.0 && requested == 150.0
        ));

        service.withdraw(&ana, 40.0, None).await.unwrap();
        assert_eq!(service.balance(&ana).await.unwrap(), 60.0);
    }

    #[tokio::test]
    async fn test_withdraw_entire_balance_allowed() {
        let (service, ana) = setup().await;
        service.deposit(&ana, 50.0, None).await.unwrap();

        service.withdraw(&ana, 50.0, None).await.unwrap();

        assert_eq!(service.balance(&ana).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_withdrawals_cannot_overdraw() {
        let (service, ana) = setup().await;
        service.deposit(&ana, 100.0, None).await.unwrap();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let service = service.clone();
                let ana = ana.clone();
                tokio::spawn(async move { service.withdraw(&ana, 60.0, None).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 1, "Only one 60.0 withdrawal fits in 100.0");
        assert_eq!(service.balance(&ana).await.unwrap(), 40.0);
    }

    #[tokio::test]
    async fn test_create_transaction_dispatches_on_type() {
        let (service, ana) = setup().await;

        let credit = service.create_transaction(&ana, "credit", 80.0, None).await.unwrap();
        let debit = service.create_transaction(&ana, "debit", 30.0, None).await.unwrap();

        assert_eq!(credit.kind, EntryKind::Credit);
        assert_eq!(debit.kind, EntryKind::Debit);
        assert_eq!(service.balance(&ana).await.unwrap(), 50.0);

        let err = service.create_transaction(&ana, "debit", 51.0, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn test_create_transaction_rejects_unknown_type() {
        let (service, ana) = setup().await;

        let err = service.create_transaction(&ana, "transfer", 10.0, None).await.unwrap_err();

        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_blank_description_dropped() {
        let (service, ana) = setup().await;

        let entry = service.deposit(&ana, 10.0, Some("   ".into())).await.unwrap();

        assert_eq!(entry.description, None);
    }

    #[test]
    fn test_entries_on_ignores_time_of_day() {
        let statement = vec![
            entry_at(4, "2025-11-24T00:00:00Z"),
            entry_at(3, "2025-11-23T23:59:59.999999Z"),
            entry_at(2, "2025-11-23T00:00:00Z"),
            entry_at(1, "2025-11-22T23:59:59Z"),
        ];
        let date = parse_statement_date("2025-11-23").unwrap();

        let ids: Vec<i64> = entries_on(statement, date).iter().map(|e| e.id).collect();

        assert_eq!(ids, vec![3, 2]);
    }

    #[rstest]
    #[case("23/11/2025")]
    #[case("2025-13-01")]
    #[case("")]
    fn test_parse_statement_date_rejects_garbage(#[case] date: &str) {
        assert!(matches!(parse_statement_date(date), Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_statement_on_entry_day() {
        let (service, ana) = setup().await;
        let entry = service.deposit(&ana, 10.0, None).await.unwrap();

        let day = entry.created_at.date_naive().format("%Y-%m-%d").to_string();

        assert_eq!(service.statement_on(&ana, &day).await.unwrap(), vec![entry]);
        assert!(service.statement_on(&ana, "1999-01-01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_locks_are_released() {
        let locks = CustomerLocks::new();

        drop(locks.acquire("a").await.unwrap());
        let _again = locks.acquire("a").await.unwrap();
        let _other = locks.acquire("b").await.unwrap();
    }
}
