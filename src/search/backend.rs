//! Query and result types shared by both retrieval paths

use serde::Serialize;

use crate::core::document::TagSet;
use crate::core::text::tokenize;
use crate::error::{Result, RetrievalError};

/// Number of results returned when the caller does not ask for a specific count
pub const DEFAULT_K: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub text: String,
    pub k: usize,
    /// Exact-match module filter
    pub module: Option<String>,
    /// Every tag here must be present on a result
    pub tags: Option<TagSet>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            k: DEFAULT_K,
            module: None,
            tags: None,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Tag filter from a comma-separated list; an empty list means no filter
    pub fn with_tags(mut self, tags: &str) -> Self {
        let tags = TagSet::parse(tags);
        self.tags = if tags.is_empty() { None } else { Some(tags) };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery("query text is empty".to_string()));
        }
        if tokenize(&self.text).is_empty() {
            return Err(RetrievalError::InvalidQuery(
                "query text has no searchable words".to_string(),
            ));
        }
        if self.k == 0 {
            return Err(RetrievalError::InvalidQuery("k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// One retrieved document excerpt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    #[serde(rename = "id")]
    pub doc_id: i64,
    pub module: String,
    pub tags: Vec<String>,
    /// Similarity in `[0, 1]`, higher is better
    pub score: f32,
    pub excerpt: String,
    pub path: String,
}

/// A way of answering a [`Query`]; results are ordered best first, at most `k`
pub trait RetrievalBackend {
    fn name(&self) -> &'static str;

    fn search(&self, query: &Query) -> Result<Vec<SearchResult>>;
}
