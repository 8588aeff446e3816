#![allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::embedding::matrix::EmbeddingMatrix;

/// Look up a cached embedding matrix by fingerprint.
pub fn get_embeddings(
    conn: &Connection,
    fingerprint: &str,
) -> anyhow::Result<Option<EmbeddingMatrix>> {
    let row = conn
        .query_row(
            "SELECT rows, dims, data FROM embeddings WHERE fingerprint = ?1",
            params![fingerprint],
            |row| {
                Ok((
                    row.get::<_, i64>(0)? as usize,
                    row.get::<_, i64>(1)? as usize,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            },
        )
        .optional()
        .context("Failed to query cached embeddings")?;

    row.map(|(rows, dims, data)| {
        EmbeddingMatrix::from_le_bytes(rows, dims, &data)
            .with_context(|| format!("Corrupt cache entry {fingerprint}"))
    })
    .transpose()
}

/// Store an embedding matrix. An existing entry for the same fingerprint is
/// replaced; equal fingerprints imply equal content.
pub fn put_embeddings(
    conn: &Connection,
    fingerprint: &str,
    model_name: &str,
    matrix: &EmbeddingMatrix,
) -> anyhow::Result<()> {
    debug!(
        fingerprint = %fingerprint,
        model = %model_name,
        rows = matrix.rows(),
        dims = matrix.dims(),
        "Storing embeddings"
    );
    conn.execute(
        "INSERT OR REPLACE INTO embeddings (fingerprint, model_name, rows, dims, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            fingerprint,
            model_name,
            matrix.rows() as i64,
            matrix.dims() as i64,
            matrix.to_le_bytes(),
        ],
    )
    .context("Failed to store embeddings")?;
    Ok(())
}

/// Number of cached matrices.
pub fn count_embeddings(conn: &Connection) -> anyhow::Result<usize> {
    let count: i64 = conn
        .query_row("SELECT count(*) FROM embeddings", [], |row| row.get(0))
        .context("Failed to count cached embeddings")?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::apply_migrations;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn missing_fingerprint_returns_none() {
        let conn = conn();
        assert!(get_embeddings(&conn, "absent").unwrap().is_none());
    }

    #[test]
    fn put_then_get_returns_identical_matrix() {
        let conn = conn();
        let matrix = EmbeddingMatrix::from_rows(vec![vec![0.3, 0.1], vec![-0.2, 0.9]]).unwrap();
        put_embeddings(&conn, "fp", "model", &matrix).unwrap();

        assert_eq!(get_embeddings(&conn, "fp").unwrap(), Some(matrix));
    }

    #[test]
    fn put_replaces_existing_entry() {
        let conn = conn();
        let first = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0]]).unwrap();
        let second = EmbeddingMatrix::from_rows(vec![vec![0.0, 1.0]]).unwrap();
        put_embeddings(&conn, "fp", "model", &first).unwrap();
        put_embeddings(&conn, "fp", "model", &second).unwrap();

        assert_eq!(count_embeddings(&conn).unwrap(), 1);
        assert_eq!(get_embeddings(&conn, "fp").unwrap(), Some(second));
    }

    #[test]
    fn corrupt_blob_is_an_error() {
        let conn = conn();
        conn.execute(
            "INSERT INTO embeddings (fingerprint, model_name, rows, dims, data)
             VALUES ('bad', 'model', 2, 2, x'0000')",
            [],
        )
        .unwrap();
        assert!(get_embeddings(&conn, "bad").is_err());
    }
}
