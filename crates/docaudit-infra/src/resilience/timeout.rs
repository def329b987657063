//! Deadlines for calls to external services

use docaudit_core::InferenceError;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A deadline elapsed before the operation finished
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{operation} exceeded its {}ms deadline", .deadline.as_millis())]
pub struct DeadlineExceeded {
    pub operation: String,
    pub deadline: Duration,
}

/// Outcome of an operation run under a deadline that did not succeed
#[derive(Debug, PartialEq, Eq)]
pub enum Bounded<E> {
    /// The deadline elapsed first
    Elapsed(DeadlineExceeded),
    /// The operation finished with its own error
    Failed(E),
}

/// Run `operation` under `deadline`, keeping an elapsed deadline apart from
/// the operation's own errors
pub async fn within_deadline<Fut, T, E>(
    deadline: Duration,
    operation: &str,
    future: Fut,
) -> Result<T, Bounded<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    match tokio::time::timeout(deadline, future).await {
        Ok(outcome) => {
            debug!(
                operation,
                elapsed_ms = started.elapsed().as_millis() as u64,
                ok = outcome.is_ok(),
                "Bounded call finished"
            );
            outcome.map_err(Bounded::Failed)
        }
        Err(_) => {
            warn!(operation, deadline_ms = deadline.as_millis() as u64, "Deadline elapsed");
            Err(Bounded::Elapsed(DeadlineExceeded {
                operation: operation.to_string(),
                deadline,
            }))
        }
    }
}

impl From<Bounded<InferenceError>> for InferenceError {
    fn from(err: Bounded<InferenceError>) -> Self {
        match err {
            Bounded::Elapsed(e) => InferenceError::Timeout(e.deadline),
            Bounded::Failed(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finished_operations_keep_their_outcome() {
        let ok: Result<u32, Bounded<&str>> =
            within_deadline(Duration::from_secs(1), "quick", async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));

        let failed: Result<u32, Bounded<&str>> =
            within_deadline(Duration::from_secs(1), "quick", async { Err("refused") }).await;
        assert_eq!(failed, Err(Bounded::Failed("refused")));
    }

    #[tokio::test]
    async fn test_elapsed_deadline_names_the_operation() {
        let result: Result<u32, Bounded<&str>> =
            within_deadline(Duration::from_millis(10), "runpod", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(7)
            })
            .await;

        let Err(Bounded::Elapsed(elapsed)) = result else {
            panic!("expected elapsed deadline");
        };
        assert_eq!(elapsed.operation, "runpod");
        assert_eq!(elapsed.to_string(), "runpod exceeded its 10ms deadline");
    }

    #[test]
    fn test_conversion_to_inference_error() {
        let elapsed = Bounded::Elapsed(DeadlineExceeded {
            operation: "runpod".into(),
            deadline: Duration::from_secs(180),
        });
        assert_eq!(
            InferenceError::from(elapsed),
            InferenceError::Timeout(Duration::from_secs(180))
        );

        let failed = Bounded::Failed(InferenceError::Transport("reset".into()));
        assert_eq!(
            InferenceError::from(failed),
            InferenceError::Transport("reset".into())
        );
    }
}
