use std::collections::HashMap;
use std::fmt;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use super::matrix::EmbeddingMatrix;
use crate::db::queries::{get_embeddings, put_embeddings};

/// Content address of an embedding matrix: SHA-256 over the model name and
/// the exact ordered sentence list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    hex: String,
    model_name: String,
}

impl Fingerprint {
    pub fn new(model_name: &str, sentences: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        // Length prefixes keep ["ab", "c"] and ["a", "bc"] apart.
        hasher.update((model_name.len() as u64).to_le_bytes());
        hasher.update(model_name.as_bytes());
        hasher.update((sentences.len() as u64).to_le_bytes());
        for sentence in sentences {
            hasher.update((sentence.len() as u64).to_le_bytes());
            hasher.update(sentence.as_bytes());
        }
        Self {
            hex: format!("{:x}", hasher.finalize()),
            model_name: model_name.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Storage for computed embedding matrices, keyed by [`Fingerprint`].
///
/// A hit must return exactly what was stored.
pub trait EmbeddingCache {
    fn get(&self, key: &Fingerprint) -> anyhow::Result<Option<EmbeddingMatrix>>;
    fn put(&mut self, key: &Fingerprint, matrix: &EmbeddingMatrix) -> anyhow::Result<()>;
}

impl EmbeddingCache for Box<dyn EmbeddingCache> {
    fn get(&self, key: &Fingerprint) -> anyhow::Result<Option<EmbeddingMatrix>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &Fingerprint, matrix: &EmbeddingMatrix) -> anyhow::Result<()> {
        (**self).put(key, matrix)
    }
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl EmbeddingCache for NoCache {
    fn get(&self, _key: &Fingerprint) -> anyhow::Result<Option<EmbeddingMatrix>> {
        Ok(None)
    }

    fn put(&mut self, _key: &Fingerprint, _matrix: &EmbeddingMatrix) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<Fingerprint, EmbeddingMatrix>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EmbeddingCache for MemoryCache {
    fn get(&self, key: &Fingerprint) -> anyhow::Result<Option<EmbeddingMatrix>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &Fingerprint, matrix: &EmbeddingMatrix) -> anyhow::Result<()> {
        self.entries.insert(key.clone(), matrix.clone());
        Ok(())
    }
}

/// Persistent cache in the `embeddings` table of a SQLite database.
pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    /// Wrap a connection whose schema is already migrated.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

impl EmbeddingCache for SqliteCache {
    fn get(&self, key: &Fingerprint) -> anyhow::Result<Option<EmbeddingMatrix>> {
        get_embeddings(&self.conn, key.as_str())
    }

    fn put(&mut self, key: &Fingerprint, matrix: &EmbeddingMatrix) -> anyhow::Result<()> {
        put_embeddings(&self.conn, key.as_str(), key.model_name(), matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::driver::DatabaseDriver;

    fn matrix() -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(vec![vec![0.5, 0.5], vec![1.0, 0.0]]).unwrap()
    }

    #[test]
    fn fingerprint_depends_on_order_model_and_boundaries() {
        let base = Fingerprint::new("m", &["a", "b"]);
        assert_eq!(base, Fingerprint::new("m", &["a", "b"]));
        assert_ne!(base, Fingerprint::new("m", &["b", "a"]));
        assert_ne!(base, Fingerprint::new("other", &["a", "b"]));
        assert_ne!(
            Fingerprint::new("m", &["ab", "c"]),
            Fingerprint::new("m", &["a", "bc"])
        );
        assert_eq!(base.as_str().len(), 64);
    }

    #[test]
    fn no_cache_never_hits() {
        let mut cache = NoCache;
        let key = Fingerprint::new("m", &["a"]);
        cache.put(&key, &matrix()).unwrap();
        assert!(cache.get(&key).unwrap().is_none());
    }

    #[test]
    fn memory_cache_round_trips() {
        let mut cache = MemoryCache::new();
        let key = Fingerprint::new("m", &["a"]);
        assert!(cache.get(&key).unwrap().is_none());
        cache.put(&key, &matrix()).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(matrix()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn sqlite_cache_persists_across_connections() {
        let tmp = tempfile::tempdir().unwrap();
        let driver = DatabaseDriver::file(tmp.path().join("embeddings.db"));
        let key = Fingerprint::new("m", &["a", "b"]);

        let mut writer = SqliteCache::new(driver.open().unwrap());
        writer.put(&key, &matrix()).unwrap();
        drop(writer);

        let reader = SqliteCache::new(driver.open().unwrap());
        assert_eq!(reader.get(&key).unwrap(), Some(matrix()));
    }
}
