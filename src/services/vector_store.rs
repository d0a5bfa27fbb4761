//! Vector store adapter.
//!
//! Index bootstrap (create-if-absent plus readiness polling), batched upsert,
//! filtered and unfiltered queries, and deletion on top of a
//! [`VectorIndexProvider`]. Connected index handles are cached per name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult, ProviderError};
use crate::domain::models::{Config, FilterOp, FilterPredicate, Fragment, MetadataValue};
use crate::domain::ports::{
    IndexDescription, IndexHandle, IndexSpec, QueryRequest, VectorIndexProvider, VectorRecord,
};
use crate::infrastructure::http::RetryPolicy;

/// Ids per delete request.
const DELETE_BATCH_SIZE: usize = 1000;

/// A fragment returned by a query, with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f32,
}

pub struct VectorStoreAdapter {
    provider: Arc<dyn VectorIndexProvider>,
    dimension: usize,
    metric: String,
    cloud: String,
    region: String,
    upsert_batch_size: usize,
    ready_timeout: Duration,
    poll_interval: Duration,
    retry: RetryPolicy,
    handles: Mutex<HashMap<String, IndexHandle>>,
}

impl VectorStoreAdapter {
    pub fn new(provider: Arc<dyn VectorIndexProvider>, config: &Config) -> Self {
        let store = &config.vector_store;
        Self {
            provider,
            dimension: config.embedding.dimension,
            metric: store.metric.clone(),
            cloud: config.pinecone.cloud.clone(),
            region: config.pinecone.region.clone(),
            upsert_batch_size: store.upsert_batch_size.max(1),
            ready_timeout: Duration::from_secs(store.ready_timeout_secs),
            poll_interval: Duration::from_millis(store.ready_poll_interval_ms.max(1)),
            retry: RetryPolicy::from_config(store.max_retries, &config.retry),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Connect to an index, creating it when absent.
    ///
    /// Creation races are tolerated: a provider conflict on create counts as
    /// success. A new index that is still not ready after the configured
    /// timeout is used anyway.
    #[instrument(skip(self))]
    pub async fn ensure_index(&self, name: &str) -> DomainResult<IndexHandle> {
        if let Some(handle) = self.handles.lock().await.get(name) {
            return Ok(handle.clone());
        }

        // Bootstrap without the cache lock so a slow index does not stall
        // lookups of other indexes.
        let description = match self.describe(name).await? {
            Some(description) => {
                self.check_dimension(&description)?;
                if description.ready {
                    description
                } else {
                    self.wait_until_ready(name, Some(description)).await?
                }
            }
            None => {
                self.create(name).await?;
                self.wait_until_ready(name, None).await?
            }
        };

        let handle = IndexHandle {
            name: description.name,
            host: description.host,
        };
        let mut handles = self.handles.lock().await;
        Ok(handles.entry(name.to_string()).or_insert(handle).clone())
    }

    async fn describe(&self, name: &str) -> DomainResult<Option<IndexDescription>> {
        self.retry
            .execute("describe_index", || self.provider.describe_index(name))
            .await
    }

    async fn create(&self, name: &str) -> DomainResult<()> {
        let spec = IndexSpec {
            name: name.to_string(),
            dimension: self.dimension,
            metric: self.metric.clone(),
            cloud: self.cloud.clone(),
            region: self.region.clone(),
        };

        match self
            .retry
            .execute("create_index", || self.provider.create_index(&spec))
            .await
        {
            Ok(()) => {
                info!(index = name, dimension = self.dimension, "created index");
                Ok(())
            }
            Err(err) if err.is_conflict() => {
                debug!(index = name, "index created concurrently, reusing it");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn check_dimension(&self, description: &IndexDescription) -> DomainResult<()> {
        if description.dimension == self.dimension {
            Ok(())
        } else {
            Err(DomainError::Configuration(format!(
                "index '{}' has dimension {} but {} is configured",
                description.name, description.dimension, self.dimension
            )))
        }
    }

    /// Poll until the index reports ready or the timeout passes.
    async fn wait_until_ready(
        &self,
        name: &str,
        mut last: Option<IndexDescription>,
    ) -> DomainResult<IndexDescription> {
        let deadline = Instant::now() + self.ready_timeout;

        loop {
            if let Some(description) = self.describe(name).await? {
                if description.ready {
                    return Ok(description);
                }
                last = Some(description);
            }

            if Instant::now() >= deadline {
                break;
            }
            sleep(self.poll_interval).await;
        }

        match last {
            Some(description) => {
                warn!(
                    index = name,
                    timeout_secs = self.ready_timeout.as_secs(),
                    "index not ready before timeout, proceeding anyway"
                );
                Ok(description)
            }
            None => Err(ProviderError::NotFound {
                service: self.provider.name(),
                body: format!("index '{name}' did not appear after creation"),
            }
            .into()),
        }
    }

    /// Store fragments with their vectors in fixed-size batches.
    ///
    /// The fragment text is written under `text_field`. Any failed batch
    /// aborts the call; batches already written stay written.
    #[instrument(skip(self, fragments, vectors), fields(index = %handle.name, count = fragments.len()))]
    pub async fn upsert(
        &self,
        handle: &IndexHandle,
        text_field: &str,
        fragments: &[Fragment],
        vectors: &[Vec<f32>],
    ) -> DomainResult<usize> {
        if fragments.len() != vectors.len() {
            return Err(DomainError::Validation(format!(
                "{} fragments but {} vectors",
                fragments.len(),
                vectors.len()
            )));
        }
        self.check_vectors(vectors.iter())?;

        let records: Vec<VectorRecord> = fragments
            .iter()
            .zip(vectors)
            .map(|(fragment, values)| {
                let mut metadata = fragment.metadata.clone();
                metadata.insert(text_field.to_string(), MetadataValue::from(fragment.text.as_str()));
                VectorRecord {
                    id: fragment.id.clone(),
                    values: values.clone(),
                    metadata,
                }
            })
            .collect();

        for (batch_no, batch) in records.chunks(self.upsert_batch_size).enumerate() {
            self.retry
                .execute("upsert", || self.provider.upsert(handle, batch))
                .await
                .inspect_err(|err| warn!(batch = batch_no, error = %err, "upsert batch failed"))?;
            debug!(batch = batch_no, size = batch.len(), "upserted batch");
        }

        info!(count = records.len(), "upserted fragments");
        Ok(records.len())
    }

    /// Similarity query. Matches without text under `text_field` are skipped.
    #[instrument(skip(self, vector, filter), fields(index = %handle.name))]
    pub async fn query(
        &self,
        handle: &IndexHandle,
        text_field: &str,
        vector: Vec<f32>,
        top_k: usize,
        filter: Option<&FilterPredicate>,
    ) -> DomainResult<Vec<ScoredFragment>> {
        self.check_vectors(std::iter::once(&vector))?;

        let request = QueryRequest {
            vector,
            top_k,
            filter: filter.filter(|f| !f.is_empty()).cloned(),
        };
        let matches = self
            .retry
            .execute("query", || self.provider.query(handle, &request))
            .await?;

        let fragments: Vec<ScoredFragment> = matches
            .into_iter()
            .filter_map(|m| {
                let mut metadata = m.metadata;
                let text = metadata.remove(text_field).map(|v| v.to_string())?;
                match Fragment::with_id(m.id, &text, metadata) {
                    Ok(fragment) => Some(ScoredFragment {
                        fragment,
                        score: m.score,
                    }),
                    Err(err) => {
                        debug!(error = %err, "skipping match without usable text");
                        None
                    }
                }
            })
            .collect();

        debug!(matches = fragments.len(), "query complete");
        Ok(fragments)
    }

    /// Delete fragments by id. An empty list does nothing.
    #[instrument(skip(self, ids), fields(index = %handle.name, count = ids.len()))]
    pub async fn delete(&self, handle: &IndexHandle, ids: &[String]) -> DomainResult<()> {
        for batch in ids.chunks(DELETE_BATCH_SIZE) {
            self.retry
                .execute("delete", || self.provider.delete(handle, batch))
                .await?;
        }
        Ok(())
    }

    /// A vector that scores every record equally, used for full scans.
    pub fn neutral_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimension]
    }

    /// List up to `limit` stored fragments.
    pub async fn fetch_all(
        &self,
        handle: &IndexHandle,
        text_field: &str,
        limit: usize,
    ) -> DomainResult<Vec<Fragment>> {
        let scored = self
            .query(handle, text_field, self.neutral_vector(), limit, None)
            .await?;
        Ok(scored.into_iter().map(|s| s.fragment).collect())
    }

    /// Provider-side `$eq` lookup on one metadata field.
    pub async fn find_by_field(
        &self,
        handle: &IndexHandle,
        text_field: &str,
        field: &str,
        value: MetadataValue,
        limit: usize,
    ) -> DomainResult<Vec<Fragment>> {
        let filter = FilterPredicate::new().with(field, FilterOp::Eq, value);
        let scored = self
            .query(handle, text_field, self.neutral_vector(), limit, Some(&filter))
            .await?;
        Ok(scored.into_iter().map(|s| s.fragment).collect())
    }

    fn check_vectors<'a>(&self, mut vectors: impl Iterator<Item = &'a Vec<f32>>) -> DomainResult<()> {
        match vectors.find(|v| v.len() != self.dimension) {
            Some(bad) => Err(DomainError::Validation(format!(
                "vector dimension {} does not match configured dimension {}",
                bad.len(),
                self.dimension
            ))),
            None => Ok(()),
        }
    }
}
