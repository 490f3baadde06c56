//! Similarity index persisted in SQLite
//!
//! One table holds the chunks of every collection; each row carries the
//! chunk text, its metadata and the embedding as a little-endian f32 BLOB.
//! Nearest neighbours are found by a cosine scan in Rust, which is fine for
//! catalogues of a few thousand documents.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};

use super::embedding::cosine_similarity;
use crate::core::document::TagSet;
use crate::error::{Result, RetrievalError};

/// A chunk ready to be written into a collection
#[derive(Debug, Clone)]
pub struct ChunkEntry {
    pub doc_id: i64,
    pub chunk_index: usize,
    pub module: String,
    pub path: String,
    pub tags: TagSet,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl ChunkEntry {
    /// Unique key within a collection
    pub fn key(&self) -> String {
        format!("{}_{}", self.doc_id, self.chunk_index)
    }
}

/// A chunk returned by a nearest-neighbour lookup
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub doc_id: i64,
    pub chunk_index: usize,
    pub module: String,
    pub path: String,
    pub tags: TagSet,
    pub text: String,
    /// Cosine distance, `1 - cosine_similarity`, in `[0, 2]`
    pub distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub name: String,
    pub chunk_count: usize,
    pub document_count: usize,
    pub last_indexed: Option<i64>,
}

pub struct VectorStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl VectorStore {
    /// Open or create the store at `db_path`, creating parent directories
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            conn: Some(Connection::open(db_path)?),
            path: Some(db_path.to_path_buf()),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Some(Connection::open_in_memory()?),
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Close the connection. Later operations fail with `StoreClosed`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| RetrievalError::Storage(e))?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Backing file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(RetrievalError::StoreClosed)
    }

    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    fn init_schema(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                collection TEXT NOT NULL,
                chunk_key TEXT NOT NULL,
                doc_id INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                module TEXT NOT NULL,
                path TEXT NOT NULL,
                tags TEXT NOT NULL,  -- JSON array, normalized
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                indexed_at INTEGER NOT NULL,
                PRIMARY KEY (collection, chunk_key)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_module ON chunks(collection, module);
            "#,
        )?;
        Ok(())
    }

    /// Number of chunks stored in `collection`
    pub fn count(&self, collection: &str) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Write one batch in a single transaction. Either every entry lands or none does.
    pub fn insert_batch(&mut self, collection: &str, entries: &[ChunkEntry]) -> Result<usize> {
        let conn = self.conn.as_mut().ok_or(RetrievalError::StoreClosed)?;
        let now = chrono::Utc::now().timestamp();

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks
                    (collection, chunk_key, doc_id, chunk_index, module, path, tags, text, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(collection, chunk_key) DO UPDATE SET
                    doc_id = excluded.doc_id,
                    chunk_index = excluded.chunk_index,
                    module = excluded.module,
                    path = excluded.path,
                    tags = excluded.tags,
                    text = excluded.text,
                    embedding = excluded.embedding,
                    indexed_at = excluded.indexed_at
                "#,
            )?;

            for entry in entries {
                stmt.execute(params![
                    collection,
                    entry.key(),
                    entry.doc_id,
                    entry.chunk_index as i64,
                    entry.module,
                    entry.path,
                    serde_json::to_string(&entry.tags)?,
                    entry.text,
                    embedding_to_blob(&entry.embedding),
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(entries.len())
    }

    /// Up to `limit` chunks of `collection` closest to `query_embedding`,
    /// optionally restricted to one module. Ordered by ascending distance,
    /// then `doc_id`, then `chunk_index`.
    pub fn nearest(
        &self,
        collection: &str,
        query_embedding: &[f32],
        limit: usize,
        module: Option<&str>,
    ) -> Result<Vec<Neighbor>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT doc_id, chunk_index, module, path, tags, text, embedding
            FROM chunks
            WHERE collection = ?1 AND (?2 IS NULL OR module = ?2)
            "#,
        )?;

        let rows = stmt.query_map(params![collection, module], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Vec<u8>>(6)?,
            ))
        })?;

        let mut neighbors = Vec::new();
        for row in rows {
            let (doc_id, chunk_index, module, path, tags_json, text, blob) = row?;
            let embedding = blob_to_embedding(&blob);
            neighbors.push(Neighbor {
                doc_id,
                chunk_index: chunk_index as usize,
                module,
                path,
                tags: serde_json::from_str(&tags_json)?,
                text,
                distance: 1.0 - cosine_similarity(query_embedding, &embedding),
            });
        }

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        neighbors.truncate(limit);

        Ok(neighbors)
    }

    /// Remove every chunk of `collection`, returning how many were deleted
    pub fn clear(&self, collection: &str) -> Result<usize> {
        let deleted = self
            .conn()?
            .execute("DELETE FROM chunks WHERE collection = ?1", params![collection])?;
        Ok(deleted)
    }

    pub fn collections(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT collection FROM chunks ORDER BY collection")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    /// Per-collection statistics
    pub fn stats(&self) -> Result<Vec<CollectionStats>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT collection, COUNT(*), COUNT(DISTINCT doc_id), MAX(indexed_at)
            FROM chunks
            GROUP BY collection
            ORDER BY collection
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CollectionStats {
                name: row.get(0)?,
                chunk_count: row.get::<_, i64>(1)? as usize,
                document_count: row.get::<_, i64>(2)? as usize,
                last_indexed: row.get(3)?,
            })
        })?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(doc_id: i64, chunk_index: usize, module: &str, embedding: Vec<f32>) -> ChunkEntry {
        ChunkEntry {
            doc_id,
            chunk_index,
            module: module.to_string(),
            path: format!("docs/{}.txt", doc_id),
            tags: TagSet::parse("policy"),
            text: format!("chunk {} of {}", chunk_index, doc_id),
            embedding,
        }
    }

    #[test]
    fn test_blob_conversion() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        assert_eq!(blob_to_embedding(&embedding_to_blob(&embedding)), embedding);
    }

    #[test]
    fn test_insert_and_count_per_collection() -> Result<()> {
        let mut store = VectorStore::open_in_memory()?;
        store.insert_batch(
            "policy_documents",
            &[entry(1, 0, "finance", vec![1.0, 0.0]), entry(1, 1, "finance", vec![0.0, 1.0])],
        )?;
        store.insert_batch("sales_documents", &[entry(2, 0, "sales", vec![1.0, 0.0])])?;

        assert_eq!(store.count("policy_documents")?, 2);
        assert_eq!(store.count("sales_documents")?, 1);
        assert_eq!(store.count("unknown")?, 0);
        assert_eq!(store.collections()?, vec!["policy_documents", "sales_documents"]);

        // Same key overwrites instead of duplicating
        store.insert_batch("sales_documents", &[entry(2, 0, "sales", vec![0.0, 1.0])])?;
        assert_eq!(store.count("sales_documents")?, 1);
        Ok(())
    }

    #[test]
    fn test_nearest_orders_and_filters() -> Result<()> {
        let mut store = VectorStore::open_in_memory()?;
        store.insert_batch(
            "docs",
            &[
                entry(3, 0, "sales", vec![0.0, 1.0]),
                entry(2, 0, "inventory", vec![1.0, 0.0]),
                entry(1, 0, "sales", vec![1.0, 0.0]),
                entry(4, 0, "sales", vec![0.6, 0.8]),
            ],
        )?;

        let all = store.nearest("docs", &[1.0, 0.0], 10, None)?;
        let ids: Vec<i64> = all.iter().map(|n| n.doc_id).collect();
        assert_eq!(ids, vec![1, 2, 4, 3]);
        assert!(all[0].distance.abs() < 1e-6);
        assert!(all[0].tags.contains("policy"));

        let sales = store.nearest("docs", &[1.0, 0.0], 2, Some("sales"))?;
        let ids: Vec<i64> = sales.iter().map(|n| n.doc_id).collect();
        assert_eq!(ids, vec![1, 4]);
        Ok(())
    }

    #[test]
    fn test_clear_and_stats() -> Result<()> {
        let mut store = VectorStore::open_in_memory()?;
        store.insert_batch(
            "docs",
            &[entry(1, 0, "sales", vec![1.0]), entry(1, 1, "sales", vec![1.0]), entry(2, 0, "sales", vec![1.0])],
        )?;

        let stats = store.stats()?;
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].chunk_count, 3);
        assert_eq!(stats[0].document_count, 2);
        assert!(stats[0].last_indexed.is_some());

        assert_eq!(store.clear("docs")?, 3);
        assert_eq!(store.count("docs")?, 0);
        Ok(())
    }

    #[test]
    fn test_closed_store_rejects_operations() -> Result<()> {
        let mut store = VectorStore::open_in_memory()?;
        store.close()?;

        assert!(!store.is_open());
        assert!(matches!(store.count("docs"), Err(RetrievalError::StoreClosed)));
        assert!(matches!(
            store.nearest("docs", &[1.0], 1, None),
            Err(RetrievalError::StoreClosed)
        ));
        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/index.db");

        let mut store = VectorStore::open(&path)?;
        store.insert_batch("docs", &[entry(1, 0, "sales", vec![1.0, 0.0])])?;
        store.close()?;

        let reopened = VectorStore::open(&path)?;
        assert_eq!(reopened.count("docs")?, 1);
        assert_eq!(reopened.path(), Some(path.as_path()));
        Ok(())
    }
}
