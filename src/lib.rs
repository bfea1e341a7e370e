// Fin API - Core Library
// Exposes all modules for use in the API server, the admin CLI, and tests

pub mod api;
pub mod auth;
pub mod balance;
pub mod config;
pub mod db;
pub mod directory;
pub mod entities;
pub mod error;
pub mod memory;
pub mod store;
pub mod transactions;

// Re-export commonly used types
pub use api::{create_router, AppState};
pub use auth::{authenticate, extract_credential, AuthenticatedCustomer};
pub use balance::get_balance;
pub use config::{Config, StoreKind};
pub use db::{setup_database, SqliteLedgerStore};
pub use directory::{AccountDirectory, AccountView};
pub use entities::{Customer, EntryKind, NewEntry, StatementEntry};
pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryLedgerStore;
pub use store::LedgerStore;
pub use transactions::{CustomerLocks, TransactionService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
