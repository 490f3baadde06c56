//! Document catalogue access
//!
//! The catalogue is owned by the business database; the retrieval engine only
//! reads it. File contents are resolved from each row's path on demand.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::warn;

use super::document::Document;
use crate::error::Result;

/// Source of the documents to index and to scan in keyword mode
pub trait DocumentSource: Send + Sync {
    fn documents(&self) -> Result<Vec<Document>>;
}

/// `documents` table in the business SQLite database
pub struct SqliteCatalog {
    db_path: PathBuf,
}

impl SqliteCatalog {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl DocumentSource for SqliteCatalog {
    fn documents(&self) -> Result<Vec<Document>> {
        // Opened per call so edits to the catalogue are always visible
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let mut stmt = conn.prepare("SELECT id, module, path, tags FROM documents ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            let tags: Option<String> = row.get(3)?;
            Ok(Document::new(
                row.get(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                tags.as_deref().unwrap_or(""),
            ))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?);
        }
        Ok(documents)
    }
}

/// Fixed in-memory catalogue
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    documents: Vec<Document>,
}

impl StaticCatalog {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }
}

impl DocumentSource for StaticCatalog {
    fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.documents.clone())
    }
}

/// Read a document's text. Returns `None` for missing, unreadable or blank files.
pub fn read_content(doc: &Document) -> Option<String> {
    if !doc.path.is_file() {
        warn!(doc_id = doc.id, path = %doc.path.display(), "Document file not found, skipping");
        return None;
    }

    match fs::read(&doc.path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if text.trim().is_empty() {
                None
            } else {
                Some(text)
            }
        }
        Err(e) => {
            warn!(doc_id = doc.id, path = %doc.path.display(), error = %e, "Failed to read document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_catalog(db_path: &Path) {
        let conn = Connection::open(db_path).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE documents (
                id INTEGER PRIMARY KEY,
                module TEXT NOT NULL,
                path TEXT NOT NULL,
                tags TEXT
            );
            INSERT INTO documents (id, module, path, tags) VALUES
                (2, 'finance', 'docs/refunds.txt', 'Policy, Refunds'),
                (1, 'sales', 'docs/crm.txt', NULL);
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_sqlite_catalog_reads_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("erp.db");
        create_catalog(&db_path);

        let docs = SqliteCatalog::new(&db_path).documents().unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, 1);
        assert!(docs[0].tags.is_empty());
        assert_eq!(docs[1].module, "finance");
        assert!(docs[1].tags.contains("refunds"));
    }

    #[test]
    fn test_sqlite_catalog_missing_db_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SqliteCatalog::new(dir.path().join("absent.db"));
        assert!(catalog.documents().is_err());
    }

    #[test]
    fn test_read_content_skips_missing_and_blank() {
        let dir = tempfile::tempdir().unwrap();
        let blank = dir.path().join("blank.txt");
        let full = dir.path().join("full.txt");
        fs::write(&blank, "  \n\n ").unwrap();
        fs::write(&full, "Quarterly targets").unwrap();

        let missing = Document::new(1, "sales", dir.path().join("nope.txt"), "");
        let blank = Document::new(2, "sales", blank, "");
        let full = Document::new(3, "sales", full, "");

        assert!(read_content(&missing).is_none());
        assert!(read_content(&blank).is_none());
        assert_eq!(read_content(&full).as_deref(), Some("Quarterly targets"));
    }
}
