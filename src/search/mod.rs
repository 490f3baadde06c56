//! Document retrieval engine
//!
//! Build time: catalogue → chunker → embedder → vector store.
//! Query time: query → embedder → vector store → tag filter → results, with
//! keyword matching standing in whenever the similarity path is unavailable.

pub mod adapters;
pub mod backend;
pub mod embedding;
pub mod keyword;
pub mod retriever;
pub mod vector;
pub mod vectordb;

pub use adapters::{AdapterKind, DomainAdapter};
pub use backend::{Query, RetrievalBackend, SearchResult, DEFAULT_K};
pub use embedding::{EmbeddingBackend, HarmonicEmbedder};
pub use keyword::KeywordBackend;
pub use retriever::Retriever;
pub use vector::{BuildReport, VectorBackend};
pub use vectordb::VectorStore;
