//! Similarity retrieval over one collection of the vector store

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::backend::{Query, RetrievalBackend, SearchResult};
use super::embedding::EmbeddingBackend;
use super::vectordb::{ChunkEntry, VectorStore};
use crate::config::Settings;
use crate::core::catalog::{read_content, DocumentSource};
use crate::core::chunker::Chunker;
use crate::core::document::Document;
use crate::core::text::excerpt;
use crate::error::Result;

/// Outcome of populating a collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    /// The collection already had entries, nothing was written
    pub already_populated: bool,
    /// Documents whose chunks were all written
    pub documents_indexed: usize,
    pub documents_skipped: usize,
    pub chunks_written: usize,
    pub batches_failed: usize,
    pub duration_ms: u128,
}

pub struct VectorBackend {
    embedder: Box<dyn EmbeddingBackend>,
    store: VectorStore,
    collection: String,
    chunker: Chunker,
    batch_size: usize,
    excerpt_chars: usize,
    max_overfetch: usize,
}

impl VectorBackend {
    pub fn new(
        collection: impl Into<String>,
        store: VectorStore,
        embedder: Box<dyn EmbeddingBackend>,
        settings: &Settings,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            chunker: Chunker::new(settings.chunk_size),
            batch_size: settings.batch_size.max(1),
            excerpt_chars: settings.excerpt_chars,
            max_overfetch: settings.max_overfetch,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub fn entry_count(&self) -> Result<usize> {
        self.store.count(&self.collection)
    }

    /// Populate the collection unless it already has entries
    pub fn build(&mut self, source: &dyn DocumentSource) -> Result<BuildReport> {
        let existing = self.entry_count()?;
        if existing > 0 {
            debug!(collection = %self.collection, entries = existing, "Collection already populated");
            return Ok(BuildReport {
                already_populated: true,
                ..BuildReport::default()
            });
        }
        let start = Instant::now();
        let documents = source.documents()?;
        Ok(self.populate(&documents, start))
    }

    /// Drop every entry of the collection and index the catalogue again.
    /// The catalogue is read before anything is removed, so a failing
    /// catalogue leaves the existing entries in place.
    pub fn rebuild(&mut self, source: &dyn DocumentSource) -> Result<BuildReport> {
        let start = Instant::now();
        let documents = source.documents()?;
        let removed = self.store.clear(&self.collection)?;
        info!(collection = %self.collection, removed, "Cleared collection for rebuild");
        Ok(self.populate(&documents, start))
    }

    pub fn close(&mut self) -> Result<()> {
        self.store.close()
    }

    fn populate(&mut self, documents: &[Document], start: Instant) -> BuildReport {
        info!(
            collection = %self.collection,
            documents = documents.len(),
            embedder = self.embedder.name(),
            "Loading documents into vector index"
        );

        let mut report = BuildReport::default();
        let mut pending: Vec<ChunkEntry> = Vec::with_capacity(self.batch_size);
        let mut batch_no = 0;
        let mut embedded = 0;
        // Documents with at least one chunk in a failed batch
        let mut incomplete: HashSet<i64> = HashSet::new();

        for doc in documents {
            let Some(content) = read_content(doc) else {
                report.documents_skipped += 1;
                continue;
            };

            let chunks = self.chunker.split(&content);
            let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
            let embeddings = match self.embedder.embed_batch(&texts) {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    warn!(doc_id = doc.id, error = %e, "Failed to embed document, skipping");
                    report.documents_skipped += 1;
                    continue;
                }
            };
            embedded += 1;

            for (chunk_index, (text, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
                pending.push(ChunkEntry {
                    doc_id: doc.id,
                    chunk_index,
                    module: doc.module.clone(),
                    path: doc.path.to_string_lossy().to_string(),
                    tags: doc.tags.clone(),
                    text,
                    embedding,
                });

                if pending.len() == self.batch_size {
                    self.flush_batch(batch_no, &mut pending, &mut report, &mut incomplete);
                    batch_no += 1;
                }
            }
        }

        if !pending.is_empty() {
            self.flush_batch(batch_no, &mut pending, &mut report, &mut incomplete);
        }

        report.documents_indexed = embedded - incomplete.len();
        report.duration_ms = start.elapsed().as_millis();
        info!(
            collection = %self.collection,
            documents = report.documents_indexed,
            chunks = report.chunks_written,
            skipped = report.documents_skipped,
            failed_batches = report.batches_failed,
            "Loaded document chunks into vector index"
        );
        report
    }

    /// A failed batch is logged and dropped; the build carries on
    fn flush_batch(
        &mut self,
        batch_no: usize,
        pending: &mut Vec<ChunkEntry>,
        report: &mut BuildReport,
        incomplete: &mut HashSet<i64>,
    ) {
        match self.store.insert_batch(&self.collection, pending) {
            Ok(written) => report.chunks_written += written,
            Err(e) => {
                warn!(collection = %self.collection, batch = batch_no, error = %e, "Failed to add batch");
                report.batches_failed += 1;
                incomplete.extend(pending.iter().map(|entry| entry.doc_id));
            }
        }
        pending.clear();
    }
}

impl RetrievalBackend for VectorBackend {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        let embedding = self.embedder.embed(&query.text)?;

        // Overfetch so client-side tag filtering still has candidates left
        let fetch = query.k.saturating_mul(2).min(self.max_overfetch);
        let neighbors = self
            .store
            .nearest(&self.collection, &embedding, fetch, query.module.as_deref())?;
        debug!(collection = %self.collection, fetched = neighbors.len(), "Vector lookup");

        let mut results = Vec::with_capacity(query.k.min(neighbors.len()));
        for neighbor in neighbors {
            if let Some(wanted) = &query.tags {
                if !neighbor.tags.is_superset_of(wanted) {
                    continue;
                }
            }

            results.push(SearchResult {
                doc_id: neighbor.doc_id,
                module: neighbor.module,
                tags: neighbor.tags.to_vec(),
                score: (1.0 - neighbor.distance).clamp(0.0, 1.0),
                excerpt: excerpt(&neighbor.text, self.excerpt_chars),
                path: neighbor.path,
            });

            if results.len() >= query.k {
                break;
            }
        }

        Ok(results)
    }
}
