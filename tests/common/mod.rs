//! Common test utilities for integration tests
//!
//! In-memory implementations of every provider port plus a helper that wires
//! them into an [`AppContext`].

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use vectorcase::cli::AppContext;
use vectorcase::domain::models::Config;
use vectorcase::domain::ports::{
    ChatProvider, CompletionRequest, EmbeddingProvider, IndexDescription, IndexHandle, IndexSpec,
    QueryMatch, QueryRequest, RankedDocument, RerankProvider, VectorIndexProvider, VectorRecord,
};
use vectorcase::{DomainResult, ProviderError};

pub const DIMENSION: usize = 8;

fn unavailable(service: &'static str) -> ProviderError {
    ProviderError::Unavailable {
        service,
        status: 503,
        body: "fake failure".to_string(),
    }
}

/// Config with a small dimension and millisecond backoff.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.embedding.dimension = DIMENSION;
    config.vector_store.ready_timeout_secs = 0;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 2;
    config
}

/// Bag-of-words embedder: each word bumps one of `DIMENSION` buckets.
#[derive(Default)]
pub struct FakeEmbedder {
    pub fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSION];
        for word in text.split_whitespace() {
            let bucket = word.to_lowercase().bytes().map(usize::from).sum::<usize>() % DIMENSION;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(unavailable("fake-embedder").into());
        }
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn max_batch_size(&self) -> usize {
        32
    }
}

/// Chat provider replaying queued replies; an empty queue is an outage.
#[derive(Default)]
pub struct FakeChat {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeChat {
    pub fn replying(replies: &[&str]) -> Self {
        let chat = Self::default();
        for reply in replies {
            chat.push(reply);
        }
        chat
    }

    pub fn push(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(reply.to_string());
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for FakeChat {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, request: &CompletionRequest) -> DomainResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| unavailable("fake-chat").into())
    }
}

/// Vector index kept in memory, scored by dot product.
///
/// Behaves like the unit-test `InMemoryIndex`: creating an existing index is
/// a conflict and writes to an unknown index are not found.
#[derive(Default)]
pub struct MemoryIndex {
    indexes: Mutex<HashMap<String, (IndexDescription, Vec<VectorRecord>)>>,
    creates: AtomicUsize,
    pub fail_queries: AtomicBool,
}

impl MemoryIndex {
    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
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
impl VectorIndexProvider for MemoryIndex {
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
            ready: true,
        };
        indexes.insert(spec.name.clone(), (description, Vec::new()));
        Ok(())
    }

    async fn upsert(&self, index: &IndexHandle, records: &[VectorRecord]) -> DomainResult<()> {
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

/// Re-ranker scoring documents by how many query words they contain.
#[derive(Default)]
pub struct OverlapReranker {
    pub fail: AtomicBool,
    batches: Mutex<Vec<usize>>,
}

impl OverlapReranker {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl RerankProvider for OverlapReranker {
    fn name(&self) -> &'static str {
        "overlap"
    }

    async fn rerank(&self, query: &str, documents: &[String], top_n: usize) -> DomainResult<Vec<RankedDocument>> {
        self.batches.lock().unwrap().push(documents.len());
        if self.fail.load(Ordering::SeqCst) {
            return Err(unavailable("overlap").into());
        }
        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let mut ranked: Vec<RankedDocument> = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let doc = doc.to_lowercase();
                RankedDocument {
                    index,
                    score: words.iter().filter(|w| doc.contains(w.as_str())).count() as f32,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

/// Fakes plus the context wired around them.
pub struct TestApp {
    pub ctx: AppContext,
    pub embedder: Arc<FakeEmbedder>,
    pub chat: Arc<FakeChat>,
    pub index: Arc<MemoryIndex>,
    pub reranker: Arc<OverlapReranker>,
}

pub fn test_app(config: Config, chat: FakeChat) -> TestApp {
    let embedder = Arc::new(FakeEmbedder::default());
    let chat = Arc::new(chat);
    let index = Arc::new(MemoryIndex::default());
    let reranker = Arc::new(OverlapReranker::default());
    let ctx = AppContext::with_providers(
        config,
        embedder.clone(),
        chat.clone(),
        index.clone(),
        reranker.clone(),
    )
    .expect("valid test configuration");

    TestApp {
        ctx,
        embedder,
        chat,
        index,
        reranker,
    }
}
