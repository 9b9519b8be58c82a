use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

/// Fired by a surface when its transition finishes.
pub type CompletionSignal = oneshot::Receiver<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEnd {
    Completed,
    TimedOut,
}

/// Waits for a transition to finish, bounded by `fallback`.
///
/// A dropped sender (e.g. the animated element was removed mid-transition)
/// counts as "never fires", so the timer alone decides.
pub async fn race_completion(signal: CompletionSignal, fallback: Duration) -> TransitionEnd {
    let completed = async {
        if signal.await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = completed => TransitionEnd::Completed,
        _ = tokio::time::sleep(fallback) => {
            debug!(?fallback, "Transition signal missed, continuing on timer");
            TransitionEnd::TimedOut
        }
    }
}
