//! Keyword-overlap retrieval used when the similarity index is unavailable
//!
//! Scores each whole document by Jaccard similarity between the query's word
//! set and the document's word set. Reads the catalogue and files on every
//! call; nothing is cached.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use super::backend::{Query, RetrievalBackend, SearchResult};
use crate::core::catalog::{read_content, DocumentSource};
use crate::core::text::{excerpt, word_set};
use crate::error::Result;

pub struct KeywordBackend {
    source: Arc<dyn DocumentSource>,
    excerpt_chars: usize,
}

impl KeywordBackend {
    pub fn new(source: Arc<dyn DocumentSource>, excerpt_chars: usize) -> Self {
        Self {
            source,
            excerpt_chars,
        }
    }
}

impl RetrievalBackend for KeywordBackend {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        let query_words = word_set(&query.text);
        if query_words.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.source.documents()?;
        let mut results: Vec<SearchResult> = documents
            .iter()
            .filter(|doc| doc.matches(query.module.as_deref(), query.tags.as_ref()))
            .filter_map(|doc| {
                let text = read_content(doc)?;
                let doc_words = word_set(&text);

                let overlap = query_words.intersection(&doc_words).count();
                if overlap == 0 {
                    return None;
                }
                let union = query_words.union(&doc_words).count();

                Some(SearchResult {
                    doc_id: doc.id,
                    module: doc.module.clone(),
                    tags: doc.tags.to_vec(),
                    score: overlap as f32 / union as f32,
                    excerpt: excerpt(&text, self.excerpt_chars),
                    path: doc.path.to_string_lossy().to_string(),
                })
            })
            .collect();

        // Score descending, ties by document id
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });
        results.truncate(query.k);

        debug!(matched = results.len(), "Keyword search");
        Ok(results)
    }
}
