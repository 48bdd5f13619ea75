use std::path::Path;

use rusqlite::{params, Connection};
use tracing::info;

use super::{ProblemStore, StoredProblem};
use crate::error::{Result, SyncError};
use crate::parser::Problem;

/// Local stand-in for the document store: one table, rows keyed by
/// generated ids and grouped by collection name.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|e| SyncError::store(format!("create {:?}: {}", dir, e)))?;
        }
        info!("Opening SQLite store at {:?}", path);
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS problems (
            id         TEXT PRIMARY KEY,
            collection TEXT NOT NULL,
            topic      TEXT NOT NULL,
            question   TEXT NOT NULL,
            link       TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_problems_collection ON problems(collection);
        ",
    )?;
    Ok(())
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

impl ProblemStore for SqliteStore {
    fn list(&self, collection: &str) -> Result<Vec<StoredProblem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, topic, question, link FROM problems WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok(StoredProblem {
                    id: row.get(0)?,
                    problem: Problem {
                        topic: row.get(1)?,
                        question: row.get(2)?,
                        link: row.get(3)?,
                    },
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM problems WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )?;
        Ok(())
    }

    fn insert(&self, collection: &str, problem: &Problem) -> Result<String> {
        let id = new_id();
        self.conn.execute(
            "INSERT INTO problems (id, collection, topic, question, link) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, collection, problem.topic, problem.question, problem.link],
        )?;
        Ok(id)
    }

    fn clear(&self, collection: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM problems WHERE collection = ?1", params![collection])?;
        Ok(removed)
    }

    fn insert_all(&self, collection: &str, problems: &[Problem]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO problems (id, collection, topic, question, link) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in problems {
                count += stmt.execute(params![new_id(), collection, p.topic, p.question, p.link])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }
}
