//! Scoped catalog connections
//!
//! Every catalog operation gets its own connection and its own transaction.
//! The connection is closed before `with_catalog` returns, whether the
//! operation succeeded or not.

use std::time::Duration;

use futures_util::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::{Connection, SqliteConnection};
use tracing::{debug, warn};

use crate::Result;
use crate::layout::StoreLayout;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How a scoped operation intends to use the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Deferred transaction; takes no lock until the first statement needs one
    Read,
    /// Takes the write lock up front so a lookup-then-insert cannot be
    /// invalidated by another writer between the two statements
    Write,
}

impl Intent {
    fn begin_statement(self) -> &'static str {
        match self {
            Intent::Read => "BEGIN",
            Intent::Write => "BEGIN IMMEDIATE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    layout: StoreLayout,
    busy_timeout: Duration,
}

impl Catalog {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(self.layout.catalog_path())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Competing writers wait for the lock instead of failing with "database is locked".
            .busy_timeout(self.busy_timeout)
    }

    /// Run `operation` inside one transaction on a fresh connection.
    ///
    /// Commits when `operation` returns `Ok`, rolls back otherwise, and always
    /// closes the connection.
    pub async fn with_catalog<T, F>(&self, intent: Intent, operation: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>>,
    {
        self.layout.ensure_locations().await?;
        let mut conn = SqliteConnection::connect_with(&self.connect_options()).await?;
        debug!(?intent, "catalog connection opened");

        let outcome = run_in_transaction(&mut conn, intent, operation).await;
        let closed = conn.close().await;
        settle(outcome, closed)
    }
}

// The transaction outcome is final by the time the connection closes; a
// failed close is only logged.
fn settle<T>(outcome: Result<T>, closed: std::result::Result<(), sqlx::Error>) -> Result<T> {
    if let Err(close_err) = closed {
        warn!(error = %close_err, "failed to close catalog connection");
    }
    outcome
}

async fn run_in_transaction<T, F>(
    conn: &mut SqliteConnection,
    intent: Intent,
    operation: F,
) -> Result<T>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T>>,
{
    sqlx::query(intent.begin_statement())
        .execute(&mut *conn)
        .await?;

    match operation(&mut *conn).await {
        Ok(value) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!(error = %rollback_err, "catalog rollback failed");
            }
            Err(err)
        }
    }
}
