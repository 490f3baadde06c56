//! Retriever - picks the retrieval path for one collection
//!
//! The backend is chosen once at construction from [`BackendMode`]. When the
//! similarity path is active but fails for a single query, that query is
//! answered by keyword matching instead of surfacing the error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::backend::{Query, RetrievalBackend, SearchResult};
use super::embedding::EmbeddingBackend;
use super::keyword::KeywordBackend;
use super::vector::{BuildReport, VectorBackend};
use super::vectordb::VectorStore;
use crate::config::{BackendMode, Settings};
use crate::core::catalog::DocumentSource;
use crate::error::Result;

pub struct Retriever {
    collection: String,
    source: Arc<dyn DocumentSource>,
    vector: Option<VectorBackend>,
    keyword: KeywordBackend,
    last_build: Option<BuildReport>,
}

impl Retriever {
    /// Open the retriever for `collection`, opening the index at
    /// `settings.index_path` and populating the collection if it is empty.
    ///
    /// In `Auto` mode an index that cannot be opened or populated is reported
    /// once and the retriever runs on keyword matching; in `Vector` mode it is
    /// an error.
    pub fn open(
        collection: impl Into<String>,
        source: Arc<dyn DocumentSource>,
        settings: &Settings,
        embedder: Box<dyn EmbeddingBackend>,
    ) -> Result<Self> {
        let collection = collection.into();
        let keyword = KeywordBackend::new(Arc::clone(&source), settings.excerpt_chars);

        let connected = match settings.backend {
            BackendMode::Keyword => None,
            BackendMode::Vector => {
                Some(connect(&collection, source.as_ref(), settings, embedder)?)
            }
            BackendMode::Auto => match connect(&collection, source.as_ref(), settings, embedder) {
                Ok(connected) => Some(connected),
                Err(e) => {
                    warn!(
                        collection = %collection,
                        error = %e,
                        "Similarity index unavailable, falling back to keyword search"
                    );
                    None
                }
            },
        };

        let (vector, last_build) = match connected {
            Some((backend, report)) => (Some(backend), Some(report)),
            None => (None, None),
        };

        Ok(Self {
            collection,
            source,
            vector,
            keyword,
            last_build,
        })
    }

    /// Use an already opened store instead of `settings.index_path`
    pub fn with_store(
        collection: impl Into<String>,
        source: Arc<dyn DocumentSource>,
        store: VectorStore,
        settings: &Settings,
        embedder: Box<dyn EmbeddingBackend>,
    ) -> Result<Self> {
        let collection = collection.into();
        let mut vector = VectorBackend::new(collection.clone(), store, embedder, settings);
        let report = vector.build(source.as_ref())?;

        Ok(Self {
            keyword: KeywordBackend::new(Arc::clone(&source), settings.excerpt_chars),
            collection,
            source,
            vector: Some(vector),
            last_build: Some(report),
        })
    }

    /// Answer `query` with at most `query.k` results, best first
    pub fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        query.validate()?;

        match &self.vector {
            Some(vector) if vector.store().is_open() => match vector.search(query) {
                Ok(results) => return Ok(results),
                Err(e) => warn!(
                    collection = %self.collection,
                    error = %e,
                    "Vector search failed, answering with keyword search"
                ),
            },
            Some(_) => debug!(collection = %self.collection, "Similarity index closed, keyword search path"),
            None => debug!(collection = %self.collection, "Keyword search path"),
        }

        self.keyword.search(query)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Name of the configured path: "vector" or "keyword"
    pub fn active_backend(&self) -> &'static str {
        match &self.vector {
            Some(vector) => vector.name(),
            None => self.keyword.name(),
        }
    }

    /// Report of the population run done when the retriever was opened
    pub fn last_build(&self) -> Option<&BuildReport> {
        self.last_build.as_ref()
    }

    /// Chunks stored for this collection; zero in keyword mode
    pub fn entry_count(&self) -> Result<usize> {
        match &self.vector {
            Some(vector) => vector.entry_count(),
            None => Ok(0),
        }
    }

    /// Re-index the collection from scratch. `None` in keyword mode.
    pub fn rebuild(&mut self) -> Result<Option<BuildReport>> {
        let Some(vector) = self.vector.as_mut() else {
            return Ok(None);
        };
        let report = vector.rebuild(self.source.as_ref())?;
        self.last_build = Some(report.clone());
        Ok(Some(report))
    }

    /// Close the index connection. Later searches use keyword matching.
    pub fn close(&mut self) -> Result<()> {
        if let Some(vector) = self.vector.as_mut() {
            vector.close()?;
            info!(collection = %self.collection, "Closed similarity index");
        }
        Ok(())
    }
}

fn connect(
    collection: &str,
    source: &dyn DocumentSource,
    settings: &Settings,
    embedder: Box<dyn EmbeddingBackend>,
) -> Result<(VectorBackend, BuildReport)> {
    let store = VectorStore::open(&settings.index_path)?;
    let mut backend = VectorBackend::new(collection, store, embedder, settings);
    let report = backend.build(source)?;
    Ok((backend, report))
}
