//! Bounded fan-out of per-slide model calls.
//!
//! At most `concurrency` calls are in flight. Each call gets its own timeout
//! and is retried on transient failures with exponential backoff plus random
//! jitter. One slide running out of attempts fails the whole deck.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::assist::cache::{ContentKey, SlideSummary, SummaryCache};
use crate::config::AssistConfig;
use crate::error::AssistError;
use crate::slides::{Slide, SlideSet};

/// Something that can describe a slide image, typically a vision model
pub trait SlideSummarizer: Send + Sync + 'static {
    fn summarize(&self, slide: &Slide) -> impl Future<Output = Result<String, AssistError>> + Send;
}

/// Timeout and backoff settings for a single call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl From<&AssistConfig> for RetryPolicy {
    fn from(config: &AssistConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&AssistConfig::default())
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`, without jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff plus up to one base delay of random jitter
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter_ms = self.base_delay.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.backoff(attempt) + Duration::from_millis(jitter)
    }
}

/// Run `call` under the policy's timeout, retrying transient failures
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, slide: u32, mut call: F) -> Result<T, AssistError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AssistError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match tokio::time::timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(error)) => error,
            Err(_) => AssistError::Timeout {
                seconds: policy.timeout.as_secs(),
            },
        };
        attempt += 1;

        if attempt >= max_attempts || !error.is_transient() {
            return Err(AssistError::Exhausted {
                slide,
                attempts: attempt,
                reason: error.to_string(),
            });
        }

        let delay = policy.delay_for(attempt - 1);
        warn!(
            "Slide {} attempt {}/{} failed ({}); retrying in {}ms",
            slide,
            attempt,
            max_attempts,
            error,
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }
}

/// Summarize every slide with at most `concurrency` calls in flight.
/// Results come back ordered by slide index.
pub async fn summarize_deck<S: SlideSummarizer>(
    summarizer: Arc<S>,
    slides: &SlideSet,
    policy: &RetryPolicy,
    concurrency: usize,
) -> Result<Vec<SlideSummary>, AssistError> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    info!("Summarizing {} slides, {} at a time", slides.len(), concurrency.max(1));

    for slide in slides.iter().cloned() {
        let semaphore = Arc::clone(&semaphore);
        let summarizer = Arc::clone(&summarizer);
        let policy = policy.clone();

        tasks.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| AssistError::Upstream { reason: e.to_string() })?;

            let summary = with_retry(&policy, slide.index, || summarizer.summarize(&slide)).await?;
            debug!("Slide {} summarized ({} chars)", slide.index, summary.len());

            Ok::<_, AssistError>(SlideSummary {
                slide: slide.index,
                summary,
            })
        });
    }

    let mut summaries = Vec::with_capacity(slides.len());
    while let Some(joined) = tasks.join_next().await {
        let summary = joined.map_err(|e| AssistError::Upstream { reason: e.to_string() })??;
        summaries.push(summary);
    }

    summaries.sort_by_key(|s| s.slide);
    Ok(summaries)
}

/// Summarizer front end that remembers results per document
pub struct DeckSummarizer<S> {
    summarizer: Arc<S>,
    policy: RetryPolicy,
    concurrency: usize,
    cache: SummaryCache,
}

impl<S: SlideSummarizer> DeckSummarizer<S> {
    pub fn new(summarizer: S, config: &AssistConfig) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
            policy: RetryPolicy::from(config),
            concurrency: config.concurrency,
            cache: SummaryCache::new(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Summaries for the document identified by `key`, calling out only on a cache miss
    pub async fn summaries(&mut self, key: ContentKey, slides: &SlideSet) -> Result<Vec<SlideSummary>, AssistError> {
        if let Some(cached) = self.cache.get(&key) {
            debug!("Summary cache hit for {:?}", key);
            return Ok(cached.to_vec());
        }

        let summaries = summarize_deck(Arc::clone(&self.summarizer), slides, &self.policy, self.concurrency).await?;
        self.cache.insert(key, summaries.clone());
        Ok(summaries)
    }

    pub fn cache_mut(&mut self) -> &mut SummaryCache {
        &mut self.cache
    }
}
