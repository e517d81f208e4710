//! Read-only vector-store seam.
//!
//! The embedded vector store's implementation is out of scope for this
//! crate; this module only defines the contract DataInspector's chunk
//! expansion and PatternGenerator's retrieval augmentation call
//! through. Caps and "view" shaping keep hard size limits on anything
//! crossing the boundary back into the orchestrator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{Chunk, SourceType};
use crate::error::AgentError;

/// Document metadata returned alongside a similarity hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentView {
    /// Document identifier.
    pub id: String,
    /// Document title, if known.
    pub title: Option<String>,
    /// Filename, if known (used for approved-document matching).
    pub filename: Option<String>,
    /// Document owner/author, if known (used by `queryConstraints`).
    pub owner: Option<String>,
}

/// One similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    /// The document the matching chunk belongs to.
    pub document: DocumentView,
    /// The matching chunk, as a [`Chunk`].
    pub chunk: Chunk,
    /// Similarity score in `[0, 1]`.
    pub similarity: f32,
}

/// Read-only interface for similarity search and chunk enumeration.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns up to `k` chunks with similarity `>= threshold` for
    /// `query`, optionally restricted to chunks whose source matches
    /// `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] or [`AgentError::Advisor`]-shaped
    /// transport errors; callers treat either as "no additional hits".
    async fn search_similar(
        &self,
        query: &str,
        threshold: f32,
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<SimilarityHit>, AgentError>;

    /// Returns every chunk of the given source types, unfiltered by
    /// query relevance. Used by DataInspector's chunk-expansion step to
    /// replace a sampled set with the full approved set.
    ///
    /// # Errors
    ///
    /// Returns an [`AgentError`] on transport failure.
    async fn get_all_chunks(&self, source_types: &[SourceType]) -> Result<Vec<Chunk>, AgentError>;
}

/// An in-memory [`VectorStore`] backed by a fixed chunk list, for tests
/// and the demo CLI. Similarity search is a naive substring match over
/// `query`; this is a test double, not a retrieval engine.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    chunks: Vec<Chunk>,
    documents: Vec<DocumentView>,
}

impl InMemoryVectorStore {
    /// Builds a store over `chunks`, with no document metadata.
    #[must_use]
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            documents: Vec::new(),
        }
    }

    /// Attaches document metadata used to populate [`SimilarityHit::document`].
    #[must_use]
    pub fn with_documents(mut self, documents: Vec<DocumentView>) -> Self {
        self.documents = documents;
        self
    }

    fn document_for(&self, chunk: &Chunk) -> DocumentView {
        let filename = chunk.filename_hint();
        self.documents
            .iter()
            .find(|d| d.filename.as_deref() == Some(filename) || d.id == filename)
            .cloned()
            .unwrap_or(DocumentView {
                id: filename.to_string(),
                title: None,
                filename: Some(filename.to_string()),
                owner: None,
            })
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search_similar(
        &self,
        query: &str,
        threshold: f32,
        k: usize,
        filter: Option<&str>,
    ) -> Result<Vec<SimilarityHit>, AgentError> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut hits: Vec<SimilarityHit> = self
            .chunks
            .iter()
            .filter(|c| filter.is_none_or(|f| c.filename_hint().contains(f) || c.source.contains(f)))
            .filter_map(|c| {
                let text_lower = c.text.to_lowercase();
                let matched = terms.iter().filter(|t| text_lower.contains(*t)).count();
                if terms.is_empty() {
                    return None;
                }
                #[allow(clippy::cast_precision_loss)]
                let score = matched as f32 / terms.len() as f32;
                (score >= threshold).then(|| SimilarityHit {
                    document: self.document_for(c),
                    chunk: c.clone(),
                    similarity: score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn get_all_chunks(&self, source_types: &[SourceType]) -> Result<Vec<Chunk>, AgentError> {
        Ok(self
            .chunks
            .iter()
            .filter(|c| source_types.is_empty() || source_types.contains(&c.source_type))
            .cloned()
            .collect())
    }
}
