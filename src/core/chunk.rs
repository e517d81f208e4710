//! A pre-retrieved fragment of a source document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Provenance of a [`Chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Retrieved via the primary RAG similarity search.
    Rag,
    /// Retrieved via `WebSearchAgent`.
    Web,
    /// Retrieved during DataInspector's chunk-expansion pass.
    Document,
}

/// A single retrieved fragment with provenance and a similarity score.
///
/// `similarity` is expected in `[0, 1]`; callers constructing chunks from
/// untrusted sources should clamp it themselves (`Chunk` does not clamp on
/// construction, since chunks pre-date this crate and are handed in by the
/// caller rather than synthesized here).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier within the originating document store.
    pub id: String,
    /// Raw chunk text.
    pub text: String,
    /// Human-readable source label (filename, URL, title).
    pub source: String,
    /// Similarity score from retrieval, `[0, 1]`.
    pub similarity: f32,
    /// Free-form metadata (e.g. `filename`, `page`).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Document identifier this chunk belongs to, if known.
    #[serde(default)]
    pub source_document: Option<String>,
    /// How this chunk was retrieved.
    pub source_type: SourceType,
}

impl Chunk {
    /// Builds a chunk with `source_type: Rag` and no metadata, the shape
    /// most test fixtures and the demo CLI's chunk file use.
    #[must_use]
    pub fn rag(id: impl Into<String>, text: impl Into<String>, source: impl Into<String>, similarity: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
            similarity,
            metadata: HashMap::new(),
            source_document: None,
            source_type: SourceType::Rag,
        }
    }

    /// Returns `metadata["filename"]`, falling back to `source_document`
    /// then `source`. Used by chunk-expansion's approved-document match.
    #[must_use]
    pub fn filename_hint(&self) -> &str {
        self.metadata
            .get("filename")
            .map(String::as_str)
            .or(self.source_document.as_deref())
            .unwrap_or(self.source.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_hint_prefers_metadata() {
        let mut chunk = Chunk::rag("c1", "text", "source.pdf", 0.5);
        chunk.metadata.insert("filename".to_string(), "real.pdf".to_string());
        assert_eq!(chunk.filename_hint(), "real.pdf");
    }

    #[test]
    fn filename_hint_falls_back_to_source() {
        let chunk = Chunk::rag("c1", "text", "source.pdf", 0.5);
        assert_eq!(chunk.filename_hint(), "source.pdf");
    }
}
