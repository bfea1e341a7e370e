use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::entities::{timestamp_now, Customer, EntryKind, NewEntry, StatementEntry};
use crate::error::{LedgerError, LedgerResult};
use crate::store::LedgerStore;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // statements.customer_id must point at a live customer
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Customers Table (cpf is the business key and the credential)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            cpf TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Statements Table (append-only ledger)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS statements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL,
            description TEXT,
            amount REAL NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('credit', 'debit')),
            created_at TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_statements_customer ON statements(customer_id, created_at)",
        [],
    )?;

    Ok(())
}

/// Fixed-width RFC 3339 so that text order in SQLite equals time order
fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn customer_from_row(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        cpf: row.get(2)?,
        created_at: parse_time(row, 3)?,
        updated_at: parse_time(row, 4)?,
    })
}

fn entry_from_row(row: &Row) -> rusqlite::Result<StatementEntry> {
    let kind: String = row.get(4)?;

    Ok(StatementEntry {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        kind: kind
            .parse::<EntryKind>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?,
        created_at: parse_time(row, 5)?,
    })
}

fn find_customer_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Customer>> {
    conn.query_row(
        "SELECT id, name, cpf, created_at, updated_at FROM customers WHERE id = ?1",
        [id],
        customer_from_row,
    )
    .optional()
}

// ============================================================================
// SQLITE LEDGER STORE
// ============================================================================

/// SQLite-backed ledger store
///
/// A single connection guarded by a mutex. The guard is taken and released
/// inside each call, never held across an await point.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteLedgerStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        // Writers on other connections to the same file wait instead of failing
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        setup_database(&conn).context("Failed to set up database schema")?;

        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Number of registered customers
    pub fn customer_count(&self) -> LedgerResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn insert_customer(&self, name: &str, cpf: &str) -> LedgerResult<Customer> {
        let customer = Customer::new(name, cpf);
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO customers (id, name, cpf, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                customer.id,
                customer.name,
                customer.cpf,
                format_time(&customer.created_at),
                format_time(&customer.updated_at),
            ],
        );

        // The UNIQUE constraint on cpf makes duplicate detection atomic
        match result {
            Ok(_) => Ok(customer),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::DuplicateCredential)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_customer_by_cpf(&self, cpf: &str) -> LedgerResult<Option<Customer>> {
        let conn = self.conn()?;

        let customer = conn
            .query_row(
                "SELECT id, name, cpf, created_at, updated_at FROM customers WHERE cpf = ?1",
                [cpf],
                customer_from_row,
            )
            .optional()?;

        Ok(customer)
    }

    async fn rename_customer(&self, id: &str, name: &str) -> LedgerResult<Customer> {
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE customers SET name = ?1, updated_at = ?2 WHERE id = ?3",
            params![name, format_time(&timestamp_now()), id],
        )?;

        if changed == 0 {
            return Err(LedgerError::NotFound);
        }

        find_customer_by_id(&conn, id)?.ok_or(LedgerError::NotFound)
    }

    async fn delete_customer(&self, id: &str) -> LedgerResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM statements WHERE customer_id = ?1", [id])?;
        let removed = tx.execute("DELETE FROM customers WHERE id = ?1", [id])?;

        if removed == 0 {
            // Dropping `tx` rolls back
            return Err(LedgerError::NotFound);
        }

        tx.commit()?;
        Ok(())
    }

    async fn append_entry(&self, customer_id: &str, entry: NewEntry) -> LedgerResult<StatementEntry> {
        let conn = self.conn()?;

        if find_customer_by_id(&conn, customer_id)?.is_none() {
            return Err(LedgerError::NotFound);
        }

        let created_at = timestamp_now();

        conn.execute(
            "INSERT INTO statements (customer_id, description, amount, type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                customer_id,
                entry.description,
                entry.amount,
                entry.kind.as_str(),
                format_time(&created_at),
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(entry.into_entry(id, customer_id, created_at))
    }

    async fn list_entries(&self, customer_id: &str) -> LedgerResult<Vec<StatementEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, customer_id, description, amount, type, created_at
             FROM statements
             WHERE customer_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let entries = stmt
            .query_map([customer_id], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}
