use std::path::PathBuf;

use anyhow::Context;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use super::schema::apply_migrations;

/// Where the embedding cache database lives.
pub enum DatabaseDriver {
    /// A database file, created with its parent directories on first open.
    File(PathBuf),
    /// A named shared in-memory database. The anchor connection keeps it
    /// alive for as long as the driver exists.
    InMemory { uri: String, _anchor: Connection },
}

impl DatabaseDriver {
    pub fn file(path: PathBuf) -> Self {
        Self::File(path)
    }

    /// Create a named in-memory database.
    ///
    /// Connections opened through the same driver see the same data. The
    /// `name` must be unique per test to keep databases apart.
    pub fn in_memory(name: &str) -> anyhow::Result<Self> {
        let uri = format!("file:{name}?mode=memory&cache=shared");
        let mut anchor = open_uri(&uri)?;
        apply_migrations(&mut anchor)?;
        Ok(Self::InMemory {
            uri,
            _anchor: anchor,
        })
    }

    /// Open a connection with the schema migrated to the latest version.
    pub fn open(&self) -> anyhow::Result<Connection> {
        let mut conn = match self {
            Self::File(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create cache directory {}", parent.display())
                    })?;
                }
                debug!(path = %path.display(), "Opening cache database");
                Connection::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?
            }
            Self::InMemory { uri, .. } => open_uri(uri)?,
        };
        apply_migrations(&mut conn)?;
        Ok(conn)
    }
}

fn open_uri(uri: &str) -> anyhow::Result<Connection> {
    Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
    )
    .with_context(|| format!("Failed to open {uri}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_driver_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("cache").join("embeddings.db");
        let driver = DatabaseDriver::file(path.clone());
        assert!(!path.exists());

        driver.open().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn in_memory_connections_share_data() {
        let driver = DatabaseDriver::in_memory("driver_share_data").unwrap();
        let first = driver.open().unwrap();
        first
            .execute(
                "INSERT INTO embeddings (fingerprint, model_name, rows, dims, data)
                 VALUES ('k', 'm', 0, 0, x'')",
                [],
            )
            .unwrap();

        let second = driver.open().unwrap();
        let count: i64 = second
            .query_row("SELECT count(*) FROM embeddings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
