//! Optimistic execution with conflict retries.

use tracing::trace;

use crate::{BlockMetrics, ExecutionError};

/// Outcome of one speculative attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The attempt's reads were valid; its result stands.
    Done(T),
    /// The attempt read state a sibling transaction has since changed.
    Conflict,
}

/// Run `attempt` until it completes without a conflict.
///
/// Every conflict is counted in `metrics` and retried; any error aborts. There is no retry
/// cap, since each retry observes strictly more committed predecessors.
pub fn speculate<T, F>(index: usize, metrics: &BlockMetrics, mut attempt: F) -> Result<T, ExecutionError>
where
    F: FnMut() -> Result<Attempt<T>, ExecutionError>,
{
    loop {
        match attempt()? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Conflict => {
                trace!(index, "speculative conflict, retrying");
                metrics.inc_retries();
            }
        }
    }
}
