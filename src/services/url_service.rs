//! URL shortening service
//!
//! Orchestrates validation, code generation, persistence, audit events and
//! deferred deletion. Every public operation is bounded by a timeout.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::code_generator::{CodeGenerator, GeneratedCode};
use crate::audit::{AuditEvent, AuditPublisher};
use crate::config::TimeoutConfig;
use crate::deletion::{DeleteTask, DeletionPipeline};
use crate::errors::{Result, TinylinkError};
use crate::storage::{UrlPair, UrlRepository};
use crate::utils::normalize_url;

/// How many times a lost save race is retried before giving up
const MAX_SAVE_ATTEMPTS: usize = 8;

// ============ Request/Response DTOs ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortenStatus {
    /// A new pair was stored
    Created,
    /// The URL was already shortened; the existing code is returned
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenResult {
    pub code: String,
    pub short_url: String,
    pub status: ShortenStatus,
}

impl ShortenResult {
    pub fn is_conflict(&self) -> bool {
        self.status == ShortenStatus::Conflict
    }
}

/// Single item of a batch shorten request
#[derive(Debug, Clone, Default)]
pub struct BatchItem {
    /// Opaque id echoed back in the result
    pub correlation_id: Option<String>,
    pub original_url: String,
}

impl BatchItem {
    pub fn new(correlation_id: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(correlation_id.into()),
            original_url: original_url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub correlation_id: Option<String>,
    pub short_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedUrl {
    pub short_url: String,
    pub original_url: String,
}

// ============ UrlService Implementation ============

pub struct UrlService {
    repository: Arc<dyn UrlRepository>,
    generator: CodeGenerator,
    publisher: Arc<dyn AuditPublisher>,
    deletion: Arc<DeletionPipeline>,
    base_url: String,
    shorten_timeout: Duration,
    resolve_timeout: Duration,
}

impl UrlService {
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        publisher: Arc<dyn AuditPublisher>,
        deletion: Arc<DeletionPipeline>,
        base_url: impl Into<String>,
        timeouts: &TimeoutConfig,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            repository,
            generator: CodeGenerator::new(),
            publisher,
            deletion,
            base_url,
            shorten_timeout: Duration::from_millis(timeouts.shorten_ms),
            resolve_timeout: Duration::from_millis(timeouts.resolve_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    async fn with_timeout<T>(
        &self,
        operation: &str,
        limit: Duration,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(limit, fut).await.map_err(|_| {
            warn!("UrlService: {} timed out after {:?}", operation, limit);
            TinylinkError::timeout(format!("{} timed out after {:?}", operation, limit))
        })?
    }

    fn validate(raw: &str) -> Result<String> {
        normalize_url(raw).map_err(|e| TinylinkError::invalid_url(format!("{}: {:?}", e, raw)))
    }

    // ============ Operations ============

    /// Shorten a single URL for `owner` (empty = anonymous)
    ///
    /// Shortening the same URL again returns the existing code with
    /// `ShortenStatus::Conflict` and publishes no event.
    pub async fn shorten(&self, raw_url: &str, owner: &str) -> Result<ShortenResult> {
        let url = Self::validate(raw_url)?;
        self.with_timeout("shorten", self.shorten_timeout, self.shorten_validated(&url, owner))
            .await
    }

    async fn shorten_validated(&self, url: &str, owner: &str) -> Result<ShortenResult> {
        let no_reservations = HashMap::new();

        for _ in 0..MAX_SAVE_ATTEMPTS {
            let code = match self
                .generator
                .generate(self.repository.as_ref(), url, &no_reservations)
                .await?
            {
                GeneratedCode::Existing(code) => {
                    debug!("UrlService: '{}' already shortened as '{}'", url, code);
                    return Ok(self.shorten_result(code, ShortenStatus::Conflict));
                }
                GeneratedCode::Fresh(code) => code,
            };

            match self.repository.save(UrlPair::new(&code, url, owner)).await {
                Ok(()) => {
                    self.publisher.notify(AuditEvent::shorten(owner, url));
                    info!("UrlService: created '{}' -> '{}'", code, url);
                    return Ok(self.shorten_result(code, ShortenStatus::Created));
                }
                Err(TinylinkError::Conflict(_)) => {
                    // 并发写入抢先：同一 URL 视为已存在，否则重新生成
                    match self.repository.get_by_short(&code).await? {
                        Some(pair) if pair.long == url => {
                            return Ok(self.shorten_result(code, ShortenStatus::Conflict));
                        }
                        _ => debug!("UrlService: lost save race on '{}', regenerating", code),
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(TinylinkError::storage_operation(format!(
            "Could not store a short code for {} after {} attempts",
            url, MAX_SAVE_ATTEMPTS
        )))
    }

    fn shorten_result(&self, code: String, status: ShortenStatus) -> ShortenResult {
        ShortenResult {
            short_url: self.short_url(&code),
            code,
            status,
        }
    }

    /// Shorten many URLs at once
    ///
    /// All items are validated before anything is generated; one invalid
    /// item rejects the whole batch. New pairs are persisted with a single
    /// `save_many`, so either all of them are stored or none.
    pub async fn batch_shorten(
        &self,
        items: Vec<BatchItem>,
        owner: &str,
    ) -> Result<Vec<BatchResult>> {
        let urls = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Self::validate(&item.original_url).map_err(|e| {
                    TinylinkError::invalid_url(format!("item {}: {}", i, e.message()))
                })
            })
            .collect::<Result<Vec<String>>>()?;

        self.with_timeout(
            "batch_shorten",
            self.shorten_timeout,
            self.batch_shorten_validated(items, urls, owner),
        )
        .await
    }

    async fn batch_shorten_validated(
        &self,
        items: Vec<BatchItem>,
        urls: Vec<String>,
        owner: &str,
    ) -> Result<Vec<BatchResult>> {
        let mut reserved: HashMap<String, String> = HashMap::with_capacity(items.len());
        let mut new_pairs = Vec::new();
        let mut results = Vec::with_capacity(items.len());

        for (item, url) in items.into_iter().zip(urls) {
            let generated = self
                .generator
                .generate(self.repository.as_ref(), &url, &reserved)
                .await?;

            let code = match generated {
                GeneratedCode::Existing(code) => code,
                GeneratedCode::Fresh(code) => {
                    reserved.insert(code.clone(), url.clone());
                    new_pairs.push(UrlPair::new(&code, url, owner));
                    code
                }
            };

            results.push(BatchResult {
                correlation_id: item.correlation_id,
                short_url: self.short_url(&code),
            });
        }

        if !new_pairs.is_empty() {
            let events: Vec<AuditEvent> = new_pairs
                .iter()
                .map(|pair| AuditEvent::shorten(owner, pair.long.clone()))
                .collect();

            let stored = new_pairs.len();
            self.repository.save_many(new_pairs).await?;
            for event in events {
                self.publisher.notify(event);
            }
            info!(
                "UrlService: batch stored {} new of {} items",
                stored,
                results.len()
            );
        }

        Ok(results)
    }

    /// Resolve a short code to its original URL
    pub async fn resolve(&self, code: &str) -> Result<String> {
        self.resolve_as(code, "").await
    }

    /// Resolve on behalf of `requester`, who is recorded on the follow event
    pub async fn resolve_as(&self, code: &str, requester: &str) -> Result<String> {
        let pair = self
            .with_timeout(
                "resolve",
                self.resolve_timeout,
                self.repository.get_by_short(code),
            )
            .await?
            .ok_or_else(|| TinylinkError::not_found(format!("Short code '{}' not found", code)))?;

        if pair.is_deleted {
            return Err(TinylinkError::gone(format!(
                "Short code '{}' has been deleted",
                code
            )));
        }

        self.publisher.notify(AuditEvent::follow(requester, &pair.long));
        Ok(pair.long)
    }

    /// All live URLs owned by `owner`
    pub async fn list_owned(&self, owner: &str) -> Result<Vec<OwnedUrl>> {
        let pairs = self
            .with_timeout(
                "list_owned",
                self.resolve_timeout,
                self.repository.get_all_by_owner(owner),
            )
            .await?;

        Ok(pairs
            .into_iter()
            .map(|pair| OwnedUrl {
                short_url: self.short_url(&pair.short),
                original_url: pair.long,
            })
            .collect())
    }

    /// Queue codes of `owner` for soft deletion
    ///
    /// Returns the number of queued tasks; storage is updated later by the
    /// deletion pipeline.
    pub async fn request_delete(&self, owner: &str, shorts: &[String]) -> Result<usize> {
        if self.deletion.is_closed() {
            return Err(TinylinkError::queue_closed("Deletion pipeline is shut down"));
        }

        let mut queued = 0;
        for short in shorts.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            self.deletion.enqueue(DeleteTask::new(owner, short)).await?;
            queued += 1;
        }

        debug!("UrlService: queued {} deletions for '{}'", queued, owner);
        Ok(queued)
    }
}
