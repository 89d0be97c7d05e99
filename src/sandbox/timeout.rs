//! Wall-clock bound for a sandbox run.
//!
//! The run happens on its own OS thread with a large stack (the interpreter recurses on the host stack).
//! The caller awaits the result with [`tokio::time::timeout`]. When the budget expires first, the guard
//! raises the interrupt flag, which the interpreter observes at its next loop or call checkpoint and unwinds,
//! so a tight `while (true) {}` is stopped rather than left spinning in the background.

use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::EngineError;
use crate::runtime::InterruptHandle;

/// Run `job` on a fresh thread and wait at most `budget` for it.
///
/// `interrupt` must be the handle the job's interpreter observes.
pub async fn run_bounded<T, F>(
    job: F,
    budget: Duration,
    stack_size: usize,
    interrupt: InterruptHandle,
) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name("proctor-sandbox".to_string())
        .stack_size(stack_size)
        .spawn(move || {
            // The receiver is gone once the guard has given up; the result is dropped.
            let _ = tx.send(job());
        });
    if let Err(err) = spawned {
        tracing::error!(error = %err, "failed to spawn sandbox thread");
        return Err(EngineError::Internal(format!("Failed to start sandbox: {err}")));
    }

    match tokio::time::timeout(budget, rx).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => {
            tracing::error!("sandbox thread exited without a result");
            Err(EngineError::Internal("Sandbox stopped unexpectedly".to_string()))
        }
        Err(_) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "evaluation timed out; interrupting");
            interrupt.trigger();
            Err(EngineError::Timeout)
        }
    }
}

/// [`run_bounded`] for synchronous callers.
///
/// Waits on a single-threaded timer runtime of its own. Inside an async runtime, where `block_on` cannot
/// nest, that runtime lives on a short-lived waiter thread and the calling thread blocks on it.
pub fn run_bounded_blocking<T, F>(
    job: F,
    budget: Duration,
    stack_size: usize,
    interrupt: InterruptHandle,
) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let wait = move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|err| EngineError::Internal(format!("Failed to start timer runtime: {err}")))?;
        runtime.block_on(run_bounded(job, budget, stack_size, interrupt))
    };
    if tokio::runtime::Handle::try_current().is_err() {
        return wait();
    }

    tracing::debug!("blocking evaluation requested from inside an async runtime");
    let waiter = thread::Builder::new()
        .name("proctor-wait".to_string())
        .spawn(wait)
        .map_err(|err| EngineError::Internal(format!("Failed to start sandbox: {err}")))?;
    waiter.join().unwrap_or_else(|_| {
        tracing::error!("sandbox waiter thread panicked");
        Err(EngineError::Internal("Sandbox stopped unexpectedly".to_string()))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Instant;

    use super::*;

    const STACK: usize = 8 * 1024 * 1024;

    #[tokio::test]
    async fn test_fast_job_returns_its_result() {
        let value = run_bounded(|| 42, Duration::from_secs(5), STACK, InterruptHandle::new()).await;
        assert_eq!(value, Ok(42));
    }

    #[tokio::test]
    async fn test_slow_job_is_interrupted() {
        let interrupt = InterruptHandle::new();
        let seen = interrupt.clone();
        let (stopped_tx, stopped_rx) = mpsc::channel();
        let started = Instant::now();
        let result = run_bounded(
            move || {
                while !seen.is_triggered() {
                    thread::sleep(Duration::from_millis(1));
                }
                let _ = stopped_tx.send(());
            },
            Duration::from_millis(50),
            STACK,
            interrupt,
        )
        .await;
        assert_eq!(result, Err(EngineError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(5));
        // The worker saw the flag and exited.
        assert!(stopped_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_blocking_wait_inside_current_thread_runtime() {
        let value = run_bounded_blocking(|| 7, Duration::from_secs(5), STACK, InterruptHandle::new());
        assert_eq!(value, Ok(7));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_timeout_inside_multi_thread_runtime() {
        let interrupt = InterruptHandle::new();
        let seen = interrupt.clone();
        let result = run_bounded_blocking(
            move || {
                while !seen.is_triggered() {
                    thread::sleep(Duration::from_millis(1));
                }
            },
            Duration::from_millis(50),
            STACK,
            interrupt,
        );
        assert_eq!(result, Err(EngineError::Timeout));
    }

    #[test]
    fn test_panicking_job_is_internal() {
        let result: Result<(), _> =
            run_bounded_blocking(|| panic!("boom"), Duration::from_secs(5), STACK, InterruptHandle::new());
        assert!(matches!(result, Err(EngineError::Internal(_))));
    }
}
