//! Cancellation handles for callback-style execution.
//!
//! The handle owns the [`CancellationToken`] threaded through every layer
//! of an in-flight call, plus a phase lock that arbitrates the race
//! between cancellation and natural completion: whichever transition
//! commits first wins, so a completion callback can never fire after a
//! cancel has been observed.

use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Cancelled,
    Completed,
}

struct Shared {
    token: CancellationToken,
    phase: Mutex<Phase>,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Token for aborting an in-flight callback-style call.
///
/// Returned by [`Client::execute_with_callback`](crate::Client::execute_with_callback).
/// The caller owns it and may cancel from any thread at any time;
/// cancelling is idempotent and a no-op once the call has completed
/// naturally. A successful cancel reaches whichever sub-operation is
/// currently pending — a live network attempt or a backoff wait — and
/// guarantees the completion callback never runs.
pub struct CancellationHandle {
    shared: Arc<Shared>,
}

impl CancellationHandle {
    pub(crate) fn new() -> (Self, CompletionGate) {
        let shared = Arc::new(Shared {
            token: CancellationToken::new(),
            phase: Mutex::new(Phase::Pending),
        });
        (
            Self {
                shared: Arc::clone(&shared),
            },
            CompletionGate { shared },
        )
    }

    /// Cancels the operation.
    pub fn cancel(&self) {
        {
            let mut phase = self.shared.lock();
            if *phase == Phase::Completed {
                return;
            }
            *phase = Phase::Cancelled;
        }
        self.shared.token.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has taken effect.
    ///
    /// `false` when the call completed before any cancel arrived.
    pub fn is_cancelled(&self) -> bool {
        *self.shared.lock() == Phase::Cancelled
    }
}

impl std::fmt::Debug for CancellationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationHandle")
            .field("phase", &*self.shared.lock())
            .finish()
    }
}

/// The executing task's side of a [`CancellationHandle`].
pub(crate) struct CompletionGate {
    shared: Arc<Shared>,
}

impl CompletionGate {
    /// The token to thread through the executor layers.
    pub(crate) fn token(&self) -> CancellationToken {
        self.shared.token.clone()
    }

    /// Commits natural completion. Returns `false` when a cancel won the
    /// race, in which case the completion callback must not run.
    pub(crate) fn try_complete(&self) -> bool {
        let mut phase = self.shared.lock();
        if *phase == Phase::Pending {
            *phase = Phase::Completed;
            true
        } else {
            false
        }
    }
}
