//! Bounded-concurrency batch embedding.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::chunk::{Chunk, EmbeddedChunk};
use crate::config::EmbedderConfig;
use crate::provider::EmbeddingProvider;
use crate::validate::Validator;

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Validated chunks, in completion order.
    pub chunks: Vec<EmbeddedChunk>,

    /// Number of chunks submitted.
    pub total: usize,

    /// Chunks whose request could not be built, sent, or decoded.
    pub failed: usize,

    /// Chunks embedded but rejected by the validator.
    pub invalid: usize,
}

impl BatchReport {
    pub fn kept(&self) -> usize {
        self.chunks.len()
    }
}

/// Embeds many chunks concurrently, never exceeding a fixed number of
/// in-flight provider calls.
///
/// One chunk failing never affects the others: failures are logged and the
/// chunk is left out of the report.
pub struct BatchScheduler<P> {
    provider: Arc<P>,
    permits: Arc<Semaphore>,
    concurrency: usize,
    validator: Validator,
}

impl<P> BatchScheduler<P>
where
    P: EmbeddingProvider + 'static,
{
    /// Create a scheduler using the concurrency cap and dimension from `config`.
    pub fn new(provider: Arc<P>, config: &EmbedderConfig) -> Self {
        Self::with_limits(
            provider,
            config.concurrency,
            Validator::new(config.dimension),
        )
    }

    pub fn with_limits(provider: Arc<P>, concurrency: usize, validator: Validator) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            provider,
            permits: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            validator,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Embed every chunk and return the validated subset.
    ///
    /// Waits for all jobs to finish before returning.
    pub async fn run(&self, chunks: Vec<Chunk>) -> BatchReport {
        let total = chunks.len();
        info!(
            total,
            concurrency = self.concurrency,
            provider = self.provider.name(),
            model = self.provider.model(),
            "Embedding chunks"
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<EmbeddedChunk>();
        let mut jobs = JoinSet::new();

        for chunk in chunks {
            let provider = Arc::clone(&self.provider);
            let permits = Arc::clone(&self.permits);
            let tx = tx.clone();

            jobs.spawn(async move {
                let request = match provider.prepare(&chunk.code) {
                    Ok(request) => request,
                    Err(e) => {
                        warn!(chunk_id = %chunk.id, "Failed to build request: {e}");
                        return;
                    }
                };

                let result = {
                    let Ok(_permit) = permits.acquire_owned().await else {
                        warn!(chunk_id = %chunk.id, "Concurrency limiter closed");
                        return;
                    };
                    provider.embed_with_retry(request).await
                };

                match result {
                    Ok(embedding) => {
                        debug!(chunk_id = %chunk.id, "Successfully embedded chunk");
                        // The receiver outlives every job.
                        let _ = tx.send(chunk.with_embedding(embedding));
                    }
                    Err(e) => warn!(chunk_id = %chunk.id, "Final failure: {e}"),
                }
            });
        }
        drop(tx);

        while let Some(joined) = jobs.join_next().await {
            if let Err(e) = joined {
                warn!("Embedding job aborted: {e}");
            }
        }

        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };
        let mut embedded = 0;

        while let Some(chunk) = rx.recv().await {
            embedded += 1;
            match self.validator.check(&chunk.embedding) {
                Ok(()) => report.chunks.push(chunk),
                Err(e) => {
                    warn!(chunk_id = %chunk.id, "Invalid embedding skipped: {e}");
                    report.invalid += 1;
                }
            }
        }
        report.failed = total - embedded;

        info!(
            failed = report.failed,
            invalid = report.invalid,
            "Validated and retained {} of {} embeddings",
            report.kept(),
            report.total
        );
        report
    }
}
