//! Fetch strategies.
//!
//! | Strategy | Requests | Expected latency |
//! |----------|----------|------------------|
//! | `Sequential` | one per symbol, one at a time | sum of calls |
//! | `Concurrent` | one per symbol, all in flight | slowest call |
//! | `BatchedSequential` | one for all symbols | one round trip |
//! | `BatchedConcurrent` | one per chunk, all in flight | slowest chunk |
//!
//! Every strategy deduplicates its input first and resolves an empty symbol
//! list without touching the network. Otherwise one session is opened on the
//! source per resolution and every request shares it; it is released before
//! `resolve` returns, whether it succeeds or fails.
//!
//! Concurrent fan-out runs on a [`JoinSet`]; quotes are keyed by symbol on
//! fan-in, so arrival order never affects the result. If the caller drops a
//! `resolve` future, the join set aborts the in-flight fetches and nothing is
//! returned.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

use crate::error::FetchError;
use crate::quote_client::QuoteSource;
use crate::{PriceTable, Symbol, ValidationError};

/// Strategy tag recorded in timing samples and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Sequential,
    Concurrent,
    BatchedSequential,
    BatchedConcurrent,
}

impl StrategyKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
            Self::BatchedSequential => "batched_sequential",
            Self::BatchedConcurrent => "batched_concurrent",
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution model used to turn a symbol list into a [`PriceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    Sequential,
    Concurrent,
    BatchedSequential,
    BatchedConcurrent { batch_size: NonZeroUsize },
}

impl FetchStrategy {
    pub fn batched_concurrent(batch_size: usize) -> Result<Self, ValidationError> {
        let batch_size = NonZeroUsize::new(batch_size).ok_or(ValidationError::ZeroBatchSize)?;
        Ok(Self::BatchedConcurrent { batch_size })
    }

    /// Build a strategy from its tag; `batch_size` only affects
    /// `BatchedConcurrent`.
    pub fn from_kind(kind: StrategyKind, batch_size: usize) -> Result<Self, ValidationError> {
        match kind {
            StrategyKind::Sequential => Ok(Self::Sequential),
            StrategyKind::Concurrent => Ok(Self::Concurrent),
            StrategyKind::BatchedSequential => Ok(Self::BatchedSequential),
            StrategyKind::BatchedConcurrent => Self::batched_concurrent(batch_size),
        }
    }

    pub const fn kind(self) -> StrategyKind {
        match self {
            Self::Sequential => StrategyKind::Sequential,
            Self::Concurrent => StrategyKind::Concurrent,
            Self::BatchedSequential => StrategyKind::BatchedSequential,
            Self::BatchedConcurrent { .. } => StrategyKind::BatchedConcurrent,
        }
    }

    /// Price every distinct symbol in `symbols`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::TransportFatal`] when the quote service cannot be
    /// reached, and [`FetchError::TaskFailed`] when a fan-out task panics.
    /// Per-symbol misses are reported through each quote's status instead.
    pub async fn resolve(
        self,
        source: &Arc<dyn QuoteSource>,
        symbols: &[Symbol],
    ) -> Result<PriceTable, FetchError> {
        let symbols = dedupe_symbols(symbols);
        if symbols.is_empty() {
            debug!(strategy = %self.kind(), "nothing to resolve");
            return Ok(PriceTable::new());
        }

        debug!(strategy = %self.kind(), count = symbols.len(), "resolving prices");
        let session = source.open_session();
        match self {
            Self::Sequential => resolve_sequential(session.as_ref(), &symbols).await,
            Self::Concurrent => resolve_concurrent(&session, symbols).await,
            Self::BatchedSequential => session.fetch_batch(&symbols).await,
            Self::BatchedConcurrent { batch_size } => {
                resolve_batches_concurrent(&session, symbols, batch_size.get()).await
            }
        }
    }
}

impl Display for FetchStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchedConcurrent { batch_size } => {
                write!(f, "{}({batch_size})", self.kind())
            }
            other => f.write_str(other.kind().as_str()),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            "batched_sequential" => Ok(Self::BatchedSequential),
            "batched_concurrent" => Ok(Self::BatchedConcurrent),
            other => Err(format!(
                "unknown strategy '{other}', expected one of sequential, concurrent, \
                 batched_sequential, batched_concurrent"
            )),
        }
    }
}

async fn resolve_sequential(
    source: &dyn QuoteSource,
    symbols: &[Symbol],
) -> Result<PriceTable, FetchError> {
    let mut table = PriceTable::new();
    for symbol in symbols {
        table.insert(source.fetch_one(symbol).await?);
    }
    Ok(table)
}

async fn resolve_concurrent(
    source: &Arc<dyn QuoteSource>,
    symbols: Vec<Symbol>,
) -> Result<PriceTable, FetchError> {
    let mut tasks = JoinSet::new();
    for symbol in symbols {
        let source = Arc::clone(source);
        tasks.spawn(async move { source.fetch_one(&symbol).await });
    }

    Ok(join_all(tasks).await?.into_iter().collect())
}

async fn resolve_batches_concurrent(
    source: &Arc<dyn QuoteSource>,
    symbols: Vec<Symbol>,
    batch_size: usize,
) -> Result<PriceTable, FetchError> {
    if symbols.len() <= batch_size {
        return source.fetch_batch(&symbols).await;
    }

    let mut tasks = JoinSet::new();
    for chunk in symbols.chunks(batch_size) {
        let source = Arc::clone(source);
        let chunk = chunk.to_vec();
        tasks.spawn(async move { source.fetch_batch(&chunk).await });
    }

    let mut table = PriceTable::new();
    for batch in join_all(tasks).await? {
        table.extend(batch);
    }
    Ok(table)
}

/// Collect every task's output, stopping at the first failure.
///
/// On failure the remaining tasks are aborted and awaited, so none of them
/// still holds the session once this returns.
async fn join_all<T: 'static>(
    mut tasks: JoinSet<Result<T, FetchError>>,
) -> Result<Vec<T>, FetchError> {
    let mut outputs = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(join_failure).and_then(|outcome| outcome) {
            Ok(output) => outputs.push(output),
            Err(error) => {
                tasks.shutdown().await;
                return Err(error);
            }
        }
    }
    Ok(outputs)
}

fn join_failure(error: JoinError) -> FetchError {
    FetchError::task_failed(error.to_string())
}

/// Drop repeated symbols, keeping first-seen order.
pub fn dedupe_symbols(symbols: &[Symbol]) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    let mut output = Vec::with_capacity(symbols.len());

    for symbol in symbols {
        if seen.insert(symbol) {
            output.push(symbol.clone());
        }
    }

    output
}
