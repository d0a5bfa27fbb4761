//! In-memory port implementations for service unit tests.
//!
//! `tests/common` carries matching fakes for the integration tests; keep the
//! index and re-ranker semantics of the two in step.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::errors::{DomainResult, ProviderError};
use crate::domain::ports::{
    ChatProvider, CompletionRequest, EmbeddingProvider, IndexDescription, IndexHandle, IndexSpec,
    QueryMatch, QueryRequest, RankedDocument, RerankProvider, VectorIndexProvider, VectorRecord,
};

fn unavailable(service: &'static str) -> ProviderError {
    ProviderError::Unavailable {
        service,
        status: 503,
        body: "stub failure".to_string(),
    }
}

/// Deterministic embedder with optional leading failures.
pub struct StubEmbedder {
    dimension: usize,
    batch_size: usize,
    fail_first: usize,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            batch_size: 16,
            fail_first: 0,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn failing_first(mut self, calls: usize) -> Self {
        self.fail_first = calls;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn vector_for(text: &str, dimension: usize) -> Vec<f32> {
        let seed: u32 = text.bytes().map(u32::from).sum();
        (0..dimension)
            .map(|i| ((seed + i as u32) % 17) as f32 / 17.0 + 0.01)
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(unavailable("stub").into());
        }
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts
            .iter()
            .map(|t| Self::vector_for(t, self.dimension))
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Chat provider answering from a queue; errors once the queue is empty.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<DomainResult<String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn push_error(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(ProviderError::Rejected {
                service: "chat",
                status: 400,
                body: "scripted".to_string(),
            }
            .into()));
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for ScriptedChat {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> DomainResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unavailable("chat").into()))
    }
}

/// Vector index held in memory. Scores are dot products; ties keep insertion order.
#[derive(Default)]
pub struct InMemoryIndex {
    indexes: Mutex<HashMap<String, (IndexDescription, Vec<VectorRecord>)>>,
    creates: AtomicUsize,
    upserts: AtomicUsize,
    pub fail_queries: AtomicBool,
    pub fail_upserts: AtomicBool,
    /// Report freshly created indexes as not ready
    pub never_ready: AtomicBool,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn records(&self, index: &str) -> Vec<VectorRecord> {
        self.indexes
            .lock()
            .unwrap()
            .get(index)
            .map(|(_, records)| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorIndexProvider for InMemoryIndex {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn describe_index(&self, name: &str) -> DomainResult<Option<IndexDescription>> {
        Ok(self
            .indexes
            .lock()
            .unwrap()
            .get(name)
            .map(|(description, _)| description.clone()))
    }

    async fn create_index(&self, spec: &IndexSpec) -> DomainResult<()> {
        let mut indexes = self.indexes.lock().unwrap();
        if indexes.contains_key(&spec.name) {
            return Err(ProviderError::Conflict {
                service: "memory",
                body: "already exists".to_string(),
            }
            .into());
        }
        self.creates.fetch_add(1, Ordering::SeqCst);
        let description = IndexDescription {
            name: spec.name.clone(),
            host: format!("{}.memory.local", spec.name),
            dimension: spec.dimension,
            ready: !self.never_ready.load(Ordering::SeqCst),
        };
        indexes.insert(spec.name.clone(), (description, Vec::new()));
        Ok(())
    }

    async fn upsert(&self, index: &IndexHandle, records: &[VectorRecord]) -> DomainResult<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(ProviderError::Rejected {
                service: "memory",
                status: 400,
                body: "upsert rejected".to_string(),
            }
            .into());
        }
        let mut indexes = self.indexes.lock().unwrap();
        let (_, stored) = indexes.get_mut(&index.name).ok_or_else(|| ProviderError::NotFound {
            service: "memory",
            body: index.name.clone(),
        })?;
        for record in records {
            stored.retain(|r| r.id != record.id);
            stored.push(record.clone());
        }
        Ok(())
    }

    async fn query(&self, index: &IndexHandle, request: &QueryRequest) -> DomainResult<Vec<QueryMatch>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(unavailable("memory").into());
        }
        let indexes = self.indexes.lock().unwrap();
        let Some((_, stored)) = indexes.get(&index.name) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<QueryMatch> = stored
            .iter()
            .filter(|r| request.filter.as_ref().is_none_or(|f| f.matches(&r.metadata)))
            .map(|r| QueryMatch {
                id: r.id.clone(),
                score: r.values.iter().zip(&request.vector).map(|(a, b)| a * b).sum(),
                metadata: r.metadata.clone(),
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(request.top_k);
        Ok(matches)
    }

    async fn delete(&self, index: &IndexHandle, ids: &[String]) -> DomainResult<()> {
        if let Some((_, stored)) = self.indexes.lock().unwrap().get_mut(&index.name) {
            stored.retain(|r| !ids.contains(&r.id));
        }
        Ok(())
    }
}

/// Re-ranker scoring by shared lowercase words with the query.
#[derive(Default)]
pub struct WordOverlapReranker {
    pub fail: AtomicBool,
    batch_sizes: Mutex<Vec<usize>>,
}

impl WordOverlapReranker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RerankProvider for WordOverlapReranker {
    fn name(&self) -> &'static str {
        "word-overlap"
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> DomainResult<Vec<RankedDocument>> {
        self.batch_sizes.lock().unwrap().push(documents.len());
        if self.fail.load(Ordering::SeqCst) {
            return Err(unavailable("rerank").into());
        }

        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut ranked: Vec<RankedDocument> = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let doc = doc.to_lowercase();
                let hits = words.iter().filter(|w| doc.contains(w.as_str())).count();
                RankedDocument {
                    index,
                    score: hits as f32,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);
        Ok(ranked)
    }
}
