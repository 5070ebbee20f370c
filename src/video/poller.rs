//! Poll-until-done loop for long-running operations.

use crate::error::{Result, VeoNodeError};
use crate::video::client::VideoClient;
use crate::video::operation::Operation;
use crate::video::types::PollConfig;
use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation signal. Sending `true` aborts polling at the next suspension point.
pub type CancelSignal = watch::Receiver<bool>;

/// Polls `operation` until it reports `done`.
///
/// An operation that is already done is returned without any poll or delay.
/// Otherwise each round waits `config.interval` and replaces the operation
/// with a fresh status. Polling stops as soon as `done` is observed.
pub async fn poll_until_done<C>(
    client: &C,
    mut operation: Operation,
    config: &PollConfig,
    cancel: Option<&CancelSignal>,
) -> Result<Operation>
where
    C: VideoClient + ?Sized,
{
    let start = Instant::now();
    let mut attempts: u32 = 0;

    while !operation.done {
        if cancel.is_some_and(|rx| *rx.borrow()) {
            return Err(VeoNodeError::Cancelled);
        }
        if config.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(VeoNodeError::Timeout(start.elapsed()));
        }
        // The last wait is shortened so one final poll lands on the deadline.
        let wait = match config.timeout {
            Some(timeout) => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Err(VeoNodeError::Timeout(timeout));
                }
                config.interval.min(timeout - elapsed)
            }
            None => config.interval,
        };

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancelled(cancel.cloned()) => return Err(VeoNodeError::Cancelled),
        }

        operation = client.poll(&operation).await?;
        attempts += 1;

        tracing::debug!(
            operation = %operation.name,
            attempt = attempts,
            done = operation.done,
            elapsed_secs = start.elapsed().as_secs(),
            "polling Veo video generation"
        );
    }

    Ok(operation)
}

/// Resolves once the signal is raised. Never resolves without a signal or
/// after the sender is dropped.
async fn cancelled(cancel: Option<CancelSignal>) {
    if let Some(mut rx) = cancel {
        if rx.wait_for(|c| *c).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}
