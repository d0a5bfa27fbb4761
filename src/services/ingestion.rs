//! Writing fragments into an index: chunked documents and telemetry records.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{metadata_from_json, Fragment, IndexProfile};

use super::chunker::TextChunker;
use super::embedding_client::EmbeddingClient;
use super::vector_store::VectorStoreAdapter;

/// Chunk, embed and store whole documents.
pub struct DocumentIndexer {
    chunker: TextChunker,
    embeddings: Arc<EmbeddingClient>,
    store: Arc<VectorStoreAdapter>,
}

impl DocumentIndexer {
    pub fn new(chunker: TextChunker, embeddings: Arc<EmbeddingClient>, store: Arc<VectorStoreAdapter>) -> Self {
        Self {
            chunker,
            embeddings,
            store,
        }
    }

    /// Index one document, returning the ids of the stored fragments.
    /// Blank documents store nothing.
    #[instrument(skip(self, text, profile), fields(index = %profile.index_name, chars = text.len()))]
    pub async fn index_document(&self, text: &str, profile: &IndexProfile) -> DomainResult<Vec<String>> {
        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            info!("document has no content, nothing to index");
            return Ok(Vec::new());
        }

        let fragments = chunks
            .iter()
            .map(|chunk| Fragment::new(chunk, Default::default()))
            .collect::<DomainResult<Vec<_>>>()?;

        store_fragments(&self.embeddings, &self.store, profile, &fragments).await
    }
}

/// Turn telemetry records into searchable fragments.
pub struct RecordIngester {
    embeddings: Arc<EmbeddingClient>,
    store: Arc<VectorStoreAdapter>,
}

impl RecordIngester {
    pub fn new(embeddings: Arc<EmbeddingClient>, store: Arc<VectorStoreAdapter>) -> Self {
        Self { embeddings, store }
    }

    /// Ingest JSON object records. Every scalar member becomes filterable
    /// metadata; a string `id` member, when present, becomes the fragment id.
    #[instrument(skip(self, records, profile), fields(index = %profile.index_name, count = records.len()))]
    pub async fn ingest(&self, records: &[serde_json::Value], profile: &IndexProfile) -> DomainResult<Vec<String>> {
        let fragments = records
            .iter()
            .enumerate()
            .map(|(position, record)| record_to_fragment(position, record))
            .collect::<DomainResult<Vec<_>>>()?;

        if fragments.is_empty() {
            return Ok(Vec::new());
        }

        store_fragments(&self.embeddings, &self.store, profile, &fragments).await
    }
}

/// Render a record as `key: value` pairs in document order.
pub fn render_record(record: &serde_json::Map<String, serde_json::Value>) -> String {
    let metadata = metadata_from_json(record);
    record
        .keys()
        .filter_map(|key| metadata.get(key).map(|value| format!("{key}: {value}")))
        .collect::<Vec<_>>()
        .join(", ")
}

fn record_to_fragment(position: usize, record: &serde_json::Value) -> DomainResult<Fragment> {
    let object = record.as_object().ok_or_else(|| {
        DomainError::Validation(format!("record {position} is not a JSON object"))
    })?;

    let text = render_record(object);
    let mut metadata = metadata_from_json(object);
    let id = metadata.remove("id").map(|id| id.to_string());

    let fragment = match id {
        Some(id) => Fragment::with_id(id, &text, metadata),
        None => Fragment::new(&text, metadata),
    };
    fragment.map_err(|_| DomainError::Validation(format!("record {position} has no scalar fields")))
}

async fn store_fragments(
    embeddings: &EmbeddingClient,
    store: &VectorStoreAdapter,
    profile: &IndexProfile,
    fragments: &[Fragment],
) -> DomainResult<Vec<String>> {
    let texts: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
    let vectors = embeddings.embed_many_strict(&texts).await?;

    let handle = store.ensure_index(&profile.index_name).await?;
    store
        .upsert(&handle, &profile.text_field, fragments, &vectors)
        .await?;

    info!(count = fragments.len(), index = %profile.index_name, "stored fragments");
    Ok(fragments.iter().map(|f| f.id.clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Config, MetadataValue};
    use crate::infrastructure::http::RetryPolicy;
    use crate::services::test_support::{InMemoryIndex, StubEmbedder};
    use serde_json::json;

    fn parts() -> (Arc<EmbeddingClient>, Arc<VectorStoreAdapter>, Arc<InMemoryIndex>) {
        let mut config = Config::default();
        config.embedding.dimension = 4;
        let index = Arc::new(InMemoryIndex::new());
        let embeddings = Arc::new(EmbeddingClient::new(
            Arc::new(StubEmbedder::new(4)),
            &config.embedding,
            RetryPolicy::new(0, 1, 1),
        ));
        let store = Arc::new(VectorStoreAdapter::new(index.clone(), &config));
        (embeddings, store, index)
    }

    #[test]
    fn test_render_record_keeps_document_order() {
        let record = json!({"device_id": "abc", "battery_level": 15, "tags": ["x"], "tamper_detected": false});
        assert_eq!(
            render_record(record.as_object().unwrap()),
            "device_id: abc, battery_level: 15, tamper_detected: false"
        );
    }

    #[tokio::test]
    async fn test_index_document_stores_chunks() {
        let (embeddings, store, index) = parts();
        let indexer = DocumentIndexer::new(TextChunker::new(40, 5).unwrap(), embeddings, store);
        let profile = IndexProfile::documents("docs");

        let text = "First sentence of the document. Second sentence follows here. Third one ends it.";
        let ids = indexer.index_document(text, &profile).await.unwrap();

        assert!(ids.len() >= 2);
        let records = index.records("docs");
        assert_eq!(records.len(), ids.len());
        assert!(records.iter().all(|r| r.metadata.contains_key("TEXT")));
    }

    #[tokio::test]
    async fn test_index_blank_document_is_noop() {
        let (embeddings, store, index) = parts();
        let indexer = DocumentIndexer::new(TextChunker::new(40, 5).unwrap(), embeddings, store);

        let ids = indexer
            .index_document("   \n ", &IndexProfile::documents("docs"))
            .await
            .unwrap();
        assert!(ids.is_empty());
        assert_eq!(index.creates(), 0);
    }

    #[tokio::test]
    async fn test_ingest_records() {
        let (embeddings, store, index) = parts();
        let ingester = RecordIngester::new(embeddings, store);
        let records = vec![
            json!({"id": "r-1", "device_id": "abc", "battery_level": 15}),
            json!({"device_id": "def", "battery_level": 80}),
        ];

        let ids = ingester.ingest(&records, &IndexProfile::iot("iot")).await.unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "r-1");
        let stored = index.records("iot");
        let first = stored.iter().find(|r| r.id == "r-1").unwrap();
        assert_eq!(first.metadata["battery_level"], MetadataValue::Number(15.0));
        assert_eq!(first.metadata["TEXT"], MetadataValue::from("id: r-1, device_id: abc, battery_level: 15"));
        assert!(!first.metadata.contains_key("id"));
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_objects() {
        let (embeddings, store, index) = parts();
        let ingester = RecordIngester::new(embeddings, store);

        let err = ingester
            .ingest(&[json!([1, 2, 3])], &IndexProfile::iot("iot"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(index.creates(), 0);
    }
}
