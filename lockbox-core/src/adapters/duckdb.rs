//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::types::Type;
use duckdb::{params_from_iter, Connection};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{CredentialFields, CredentialRecord, NoteFields, NoteRecord, Record};
use crate::ports::RecordStorage;
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB repository implementation
///
/// Stores both record kinds. The connection sits behind a mutex and every
/// query runs on tokio's blocking pool.
pub struct DuckDbRepository {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
    encrypted: bool,
}

impl DuckDbRepository {
    /// Open (or create) the vault database
    ///
    /// For encrypted databases, uses DuckDB's ATTACH with ENCRYPTION_KEY.
    /// The key is hex-encoded.
    ///
    /// Retries with exponential backoff on file locking errors. This blocks
    /// the calling thread, so async callers should wrap it in
    /// `spawn_blocking`.
    pub fn new(db_path: &Path, encryption_key: Option<&str>) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path, encryption_key) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Arc::new(Mutex::new(conn)),
                        db_path: db_path.to_path_buf(),
                        encrypted: encryption_key.is_some(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        tracing::warn!(
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max = MAX_RETRIES,
                            "database busy, retrying: {}",
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(Error::storage(err_msg));
                }
            }
        }

        Err(last_error
            .map(|e| Error::storage(e.to_string()))
            .unwrap_or_else(|| {
                Error::storage(format!("Failed to open database after {} retries", MAX_RETRIES))
            }))
    }

    /// Attempt to open a database connection (called by new() with retry logic)
    fn try_open_connection(
        db_path: &Path,
        encryption_key: Option<&str>,
    ) -> duckdb::Result<Connection> {
        // Extension autoloading stays off; JSON is statically linked via the
        // "json" Cargo feature.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        match encryption_key {
            Some(key) => {
                let conn = Connection::open_in_memory_with_flags(config)?;
                conn.execute(
                    &format!(
                        "ATTACH '{}' AS vault_db (ENCRYPTION_KEY '{}')",
                        db_path.display(),
                        key
                    ),
                    [],
                )?;
                conn.execute("USE vault_db", [])?;
                Ok(conn)
            }
            None => Connection::open_with_flags(db_path, config),
        }
    }

    /// Open a private in-memory database (tests and ephemeral hosts)
    pub fn in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: PathBuf::from(":memory:"),
            encrypted: false,
        })
    }

    /// Run database migrations using the MigrationService
    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        MigrationService::new(&conn).run_pending()
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        self.run_migrations()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| Error::storage(format!("Storage task failed: {}", e)))?
    }
}

/// Column mapping for a record kind stored by [`DuckDbRepository`]
pub trait DuckDbTable: Record {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    /// Mutable columns, in the order produced by `values` and read by `from_row`
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<String>;

    /// Build a record from a row laid out as `id, COLUMNS..., created_at, updated_at`
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self>;
}

impl DuckDbTable for CredentialRecord {
    const TABLE: &'static str = "sys_credentials";
    const ID_COLUMN: &'static str = "credential_id";
    const COLUMNS: &'static [&'static str] = &["label", "username", "secret", "category"];

    fn values(&self) -> Vec<String> {
        vec![
            self.label.clone(),
            self.username.clone(),
            self.secret.clone(),
            self.category.clone(),
        ]
    }

    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        let fields = CredentialFields {
            label: row.get(1)?,
            username: row.get(2)?,
            secret: row.get(3)?,
            category: row.get(4)?,
        };
        Ok(Self::assemble(
            parse_id(row, 0)?,
            fields,
            parse_timestamp(row, 5)?,
            parse_timestamp(row, 6)?,
        ))
    }
}

impl DuckDbTable for NoteRecord {
    const TABLE: &'static str = "sys_notes";
    const ID_COLUMN: &'static str = "note_id";
    const COLUMNS: &'static [&'static str] = &["title", "body", "category"];

    fn values(&self) -> Vec<String> {
        vec![self.title.clone(), self.body.clone(), self.category.clone()]
    }

    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        let fields = NoteFields {
            title: row.get(1)?,
            body: row.get(2)?,
            category: row.get(3)?,
        };
        Ok(Self::assemble(
            parse_id(row, 0)?,
            fields,
            parse_timestamp(row, 4)?,
            parse_timestamp(row, 5)?,
        ))
    }
}

fn select_sql<R: DuckDbTable>() -> String {
    format!(
        "SELECT {}, {}, created_at, updated_at FROM {}",
        R::ID_COLUMN,
        R::COLUMNS.join(", "),
        R::TABLE
    )
}

fn insert_sql<R: DuckDbTable>() -> String {
    let placeholders = vec!["?"; R::COLUMNS.len() + 3].join(", ");
    format!(
        "INSERT INTO {} ({}, {}, created_at, updated_at) VALUES ({})",
        R::TABLE,
        R::ID_COLUMN,
        R::COLUMNS.join(", "),
        placeholders
    )
}

fn update_sql<R: DuckDbTable>() -> String {
    let assignments: Vec<String> = R::COLUMNS
        .iter()
        .chain(["updated_at"].iter())
        .map(|c| format!("{} = ?", c))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?",
        R::TABLE,
        assignments.join(", "),
        R::ID_COLUMN
    )
}

#[async_trait]
impl<R: DuckDbTable> RecordStorage<R> for DuckDbRepository {
    async fn insert(&self, records: Vec<R>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.with_conn(move |conn| {
            let sql = insert_sql::<R>();
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(&sql)?;
                for record in &records {
                    let mut values = vec![record.id().to_string()];
                    values.extend(record.values());
                    values.push(record.created_at().to_rfc3339());
                    values.push(record.updated_at().to_rfc3339());
                    stmt.execute(params_from_iter(values))?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn update(&self, record: R) -> Result<bool> {
        self.with_conn(move |conn| {
            let mut values = record.values();
            values.push(record.updated_at().to_rfc3339());
            values.push(record.id().to_string());
            let changed = conn.execute(&update_sql::<R>(), params_from_iter(values))?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.with_conn(move |conn| {
            let changed = conn.execute(
                &format!("DELETE FROM {} WHERE {} = ?", R::TABLE, R::ID_COLUMN),
                [id.to_string()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn get(&self, id: Uuid) -> Result<Option<R>> {
        self.with_conn(move |conn| {
            let sql = format!("{} WHERE {} = ?", select_sql::<R>(), R::ID_COLUMN);
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id.to_string()])?;
            match rows.next()? {
                Some(row) => Ok(Some(R::from_row(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list(&self) -> Result<Vec<R>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY seq", select_sql::<R>());
            let mut stmt = conn.prepare(&sql)?;
            let records = stmt
                .query_map([], |row| R::from_row(row))?
                .collect::<duckdb::Result<Vec<R>>>()?;
            Ok(records)
        })
        .await
    }
}

// Helper functions

fn parse_id(row: &duckdb::Row, idx: usize) -> duckdb::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(row: &duckdb::Row, idx: usize) -> duckdb::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| duckdb::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
