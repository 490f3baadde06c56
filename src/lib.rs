//! bizrag library
//!
//! Retrieval engine for business documents: paragraph chunking, a persistent
//! similarity index per collection, filtered semantic search and a keyword
//! fallback when the index is unavailable.
//!
//! # Modules
//!
//! - `core`: Documents, tag sets, catalogue access, chunking
//! - `search`: Embedding, vector store, retrieval backends, domain adapters
//! - `config`: Settings loaded through Figment

pub mod config;
pub mod core;
pub mod error;
pub mod search;

// Re-exports for convenience
pub use crate::config::{BackendMode, Settings};
pub use crate::core::catalog::{DocumentSource, SqliteCatalog, StaticCatalog};
pub use crate::core::chunker::Chunker;
pub use crate::core::document::{Document, TagSet};
pub use crate::error::{Result, RetrievalError};
pub use crate::search::{
    AdapterKind, DomainAdapter, EmbeddingBackend, HarmonicEmbedder, Query, Retriever, SearchResult,
};
