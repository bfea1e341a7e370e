// 📇 Account Directory
// Request-shape validation on top of the ledger store: create, find, rename, delete

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::balance::get_balance;
use crate::entities::{Customer, StatementEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

/// Full account as returned by `GET /account`
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub balance: f64,
    pub statement: Vec<StatementEntry>,
}

impl AccountView {
    pub fn new(customer: Customer, statement: Vec<StatementEntry>) -> Self {
        Self {
            balance: get_balance(&statement),
            id: customer.id,
            name: customer.name,
            cpf: customer.cpf,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
            statement,
        }
    }
}

/// Returns the trimmed value, or a validation error naming the field
fn required<'a>(field: &str, value: &'a str) -> LedgerResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LedgerError::validation(format!("{} is required", field)));
    }
    Ok(value)
}

#[derive(Clone)]
pub struct AccountDirectory {
    store: Arc<dyn LedgerStore>,
}

impl AccountDirectory {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Register a new customer; name and CPF must be non-blank
    pub async fn create_account(&self, name: &str, cpf: &str) -> LedgerResult<Customer> {
        let name = required("name", name)?;
        let cpf = required("cpf", cpf)?;

        let customer = self.store.insert_customer(name, cpf).await?;
        tracing::info!(customer_id = %customer.id, "account created");

        Ok(customer)
    }

    pub async fn find_by_cpf(&self, cpf: &str) -> LedgerResult<Option<Customer>> {
        self.store.find_customer_by_cpf(cpf).await
    }

    pub async fn rename(&self, customer: &Customer, name: &str) -> LedgerResult<Customer> {
        let name = required("name", name)?;

        let renamed = self.store.rename_customer(&customer.id, name).await?;
        tracing::info!(customer_id = %customer.id, "account renamed");

        Ok(renamed)
    }

    /// Delete by identifier; entries go with the customer, balance is not checked
    pub async fn delete(&self, customer: &Customer) -> LedgerResult<()> {
        self.store.delete_customer(&customer.id).await?;
        tracing::info!(customer_id = %customer.id, "account deleted");
        Ok(())
    }

    pub async fn account(&self, customer: Customer) -> LedgerResult<AccountView> {
        let statement = self.store.list_entries(&customer.id).await?;
        Ok(AccountView::new(customer, statement))
    }
}
