//! Storage layer. One [`Db`] handle is constructed in `main` and shared with
//! the handlers through `web::Data`; nothing here is process-global.

pub mod codegen;
mod schema;

mod catalog;
mod customers;
mod opportunities;
mod org;
mod pricing;
mod quotations;
mod taxonomy;
mod users;

pub use taxonomy::{TaxonomyTables, CARE, REJECT};
pub use users::AuthUser;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use common::requests::ListQuery;
use common::response::Pagination;
use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    NotFound(String),

    /// A domain rule refused the write (e.g. deleting a group that still has
    /// children).
    #[error("{0}")]
    Constraint(String),

    /// The payload itself is unusable (missing field, dangling reference).
    #[error("{0}")]
    Validation(String),
}

impl DbError {
    /// True for SQLite UNIQUE/constraint failures, surfaced to clients as 400.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Shared SQLite handle. Queries serialize on the inner mutex, which also
/// makes the generate-code-then-insert write paths race-free.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    /// Open the database at `path`, creating the schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-query;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Current timestamp in the text format every table stores.
pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Sanitized paging window derived from the request query.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn from_query(q: &ListQuery) -> Self {
        Self {
            page: q.page.unwrap_or(1).max(1),
            limit: q.limit.unwrap_or(20).clamp(1, 100),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination::new(self.page, self.limit, total)
    }
}

/// Incremental WHERE-clause builder for the list endpoints, so each store
/// declares only its own filters instead of re-deriving SQL assembly.
pub(crate) struct Filters {
    clauses: Vec<String>,
    params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl Filters {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn push(&mut self, clause: &str, value: impl rusqlite::ToSql + 'static) {
        self.clauses.push(clause.to_string());
        self.params.push(Box::new(value));
    }

    pub fn push_clause(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// Adds a `LIKE` filter over the given columns when `search` is present.
    pub fn push_search(&mut self, search: &Option<String>, columns: &[&str]) {
        if let Some(s) = search {
            let s = s.trim();
            if !s.is_empty() {
                let like: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
                    .collect();
                self.clauses.push(format!("({})", like.join(" OR ")));
                let pattern = format!(
                    "%{}%",
                    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
                );
                for _ in columns {
                    self.params.push(Box::new(pattern.clone()));
                }
            }
        }
    }

    pub fn push_active(&mut self, active: Option<bool>) {
        if let Some(a) = active {
            self.push("is_active = ?", a as i64);
        }
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    pub fn params(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_initializes_schema() {
        let db = Db::open_in_memory().unwrap();
        let conn = db.lock();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for expected in [
            "customers",
            "service_groups",
            "services",
            "price_packages",
            "service_prices",
            "care_groups",
            "care_results",
            "reject_groups",
            "reject_reasons",
            "departments",
            "positions",
            "opportunities",
            "quotations",
            "quotation_lines",
            "users",
            "sequences",
            "import_files",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn page_sanitizes_bounds() {
        let q = ListQuery {
            page: Some(0),
            limit: Some(10_000),
            ..Default::default()
        };
        let page = Page::from_query(&q);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset(), 0);
    }
}
