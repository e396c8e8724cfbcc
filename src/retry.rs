//! Retry policy and the retry decorator.
//!
//! [`RetryExecutor`] wraps any [`Executor`] with the same contract, so
//! decorators stack freely. The wrapped executor is invoked up to
//! `max_retries + 1` times; between attempts the loop suspends for an
//! exponentially growing delay without blocking a thread, and the wait
//! itself is cancellable — a cancellation during backoff aborts the whole
//! sequence, not just one delay.

use crate::builder::WireRequest;
use crate::error::{NetworkError, TransportError, TransportErrorKind};
use crate::executor::{Executor, SendOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Decides whether a classified network error is worth another attempt.
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the request should be retried after `error`.
    fn should_retry(&self, error: &NetworkError) -> bool;
}

impl<F> RetryPredicate for F
where
    F: Fn(&NetworkError) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &NetworkError) -> bool {
        self(error)
    }
}

/// Default predicate: retries server errors (500–599) and transient
/// transport failures (timeout, unresolved or unreachable host, lost or
/// absent connection). Everything else — including 401 and other client
/// errors — is terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryTransient;

impl RetryPredicate for RetryTransient {
    fn should_retry(&self, error: &NetworkError) -> bool {
        match error {
            NetworkError::UnexpectedStatus { status, .. } => status.is_server_error(),
            NetworkError::RequestFailed(transport) => matches!(
                transport.kind,
                TransportErrorKind::Timeout
                    | TransportErrorKind::HostUnresolved
                    | TransportErrorKind::HostUnreachable
                    | TransportErrorKind::ConnectionLost
                    | TransportErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}

/// Retries only on 5xx server errors.
#[derive(Debug, Clone, Copy)]
pub struct RetryOn5xx;

impl RetryPredicate for RetryOn5xx {
    fn should_retry(&self, error: &NetworkError) -> bool {
        matches!(
            error,
            NetworkError::UnexpectedStatus { status, .. } if status.is_server_error()
        )
    }
}

/// Combines predicates with OR logic: retries if any member says so.
pub struct OrPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl OrPredicate {
    /// Creates an `OrPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for OrPredicate {
    fn should_retry(&self, error: &NetworkError) -> bool {
        self.predicates.iter().any(|p| p.should_retry(error))
    }
}

/// Combines predicates with AND logic: retries only if every member says so.
pub struct AndPredicate {
    predicates: Vec<Box<dyn RetryPredicate>>,
}

impl AndPredicate {
    /// Creates an `AndPredicate` from a list of predicates.
    pub fn new(predicates: Vec<Box<dyn RetryPredicate>>) -> Self {
        Self { predicates }
    }
}

impl RetryPredicate for AndPredicate {
    fn should_retry(&self, error: &NetworkError) -> bool {
        self.predicates.iter().all(|p| p.should_retry(error))
    }
}

/// How many times to retry and how long to wait between attempts.
///
/// A request runs `max_retries + 1` attempts in total; the delay before
/// retry `k` (1-indexed) is `initial_delay × backoff_factor^(k-1)`,
/// capped by `max_delay` when one is set.
///
/// # Examples
///
/// ```
/// use courier::RetryPolicy;
/// use std::time::Duration;
///
/// // 100ms, 200ms, 400ms between the four attempts.
/// let policy = RetryPolicy::new(3, Duration::from_millis(100), 2.0);
/// assert_eq!(policy.total_attempts(), 4);
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    backoff_factor: f64,
    max_delay: Option<Duration>,
    predicate: Arc<dyn RetryPredicate>,
}

impl RetryPolicy {
    /// Creates a policy with the default [`RetryTransient`] predicate.
    ///
    /// `max_retries` of 0 means a single attempt with no retries. A
    /// negative `backoff_factor` is clamped to zero.
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_factor: backoff_factor.max(0.0),
            max_delay: None,
            predicate: Arc::new(RetryTransient),
        }
    }

    /// Replaces the retry predicate.
    pub fn with_predicate(mut self, predicate: impl RetryPredicate + 'static) -> Self {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Caps the delay between attempts.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Maximum number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total attempts this policy allows, including the first.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry `retry` (1-indexed).
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let delay = Duration::try_from_secs_f64(scaled).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Consults the policy's predicate.
    pub fn should_retry(&self, error: &NetworkError) -> bool {
        self.predicate.should_retry(error)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("initial_delay", &self.initial_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

/// Decorator adding retry-with-backoff to any executor.
pub struct RetryExecutor<E> {
    inner: E,
    policy: Option<RetryPolicy>,
}

impl<E: Executor> RetryExecutor<E> {
    /// Wraps `inner`. With no policy the decorator delegates directly.
    pub fn new(inner: E, policy: Option<RetryPolicy>) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<E: Executor> Executor for RetryExecutor<E> {
    async fn send(&self, request: &WireRequest, cancel: &CancellationToken) -> SendOutcome {
        let policy = match &self.policy {
            Some(policy) if policy.max_retries() > 0 => policy,
            _ => return self.inner.send(request, cancel).await,
        };

        let mut last_error: Option<NetworkError> = None;
        for attempt in 0..=policy.max_retries() {
            if cancel.is_cancelled() {
                return SendOutcome::Cancelled;
            }

            match self.inner.send(request, cancel).await {
                SendOutcome::Success(mut delivery) => {
                    delivery.attempts = attempt + 1;
                    return SendOutcome::Success(delivery);
                }
                SendOutcome::Cancelled => return SendOutcome::Cancelled,
                SendOutcome::Failure(error) => {
                    if !policy.should_retry(&error) {
                        return SendOutcome::Failure(error);
                    }

                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = policy.total_attempts(),
                        url = %request.url,
                        error = %error,
                        "attempt failed with a retryable error"
                    );
                    last_error = Some(error);

                    if attempt == policy.max_retries() {
                        break;
                    }

                    let delay = policy.delay_before_retry(attempt + 1);
                    tracing::info!(
                        delay_ms = delay.as_millis() as u64,
                        attempt = attempt + 1,
                        "waiting before next attempt"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return SendOutcome::Cancelled,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| {
            // The loop above records an error before every exit path that
            // reaches here.
            debug_assert!(false, "retry loop exhausted without a recorded error");
            NetworkError::RequestFailed(TransportError::new(
                TransportErrorKind::Other,
                "retry loop exhausted without a recorded error",
            ))
        });
        SendOutcome::Failure(NetworkError::RetriesExhausted {
            attempts: policy.total_attempts(),
            last_error: Box::new(last_error),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Delivery;
    use http::{HeaderMap, Method, StatusCode};
    use std::sync::atomic::{AtomicU32, Ordering};
    use url::Url;

    fn request() -> WireRequest {
        WireRequest {
            method: Method::GET,
            url: Url::parse("https://api.test.com/users").unwrap(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    fn status_error(status: u16) -> NetworkError {
        NetworkError::UnexpectedStatus {
            status: StatusCode::from_u16(status).unwrap(),
            body: Vec::new(),
        }
    }

    fn transport_error(kind: TransportErrorKind) -> NetworkError {
        NetworkError::RequestFailed(TransportError::new(kind, "boom"))
    }

    /// Fails with the given status `fail_times` times, then succeeds.
    struct FlakyExecutor {
        calls: AtomicU32,
        fail_times: u32,
        status: u16,
    }

    impl FlakyExecutor {
        fn new(fail_times: u32, status: u16) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_times,
                status,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Executor for FlakyExecutor {
        async fn send(&self, _: &WireRequest, _: &CancellationToken) -> SendOutcome {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_times {
                SendOutcome::Failure(status_error(self.status))
            } else {
                SendOutcome::Success(Delivery {
                    status: StatusCode::OK,
                    headers: HeaderMap::new(),
                    body: b"ok".to_vec(),
                    attempts: 1,
                })
            }
        }
    }

    fn quick_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), 2.0)
    }

    #[test]
    fn delay_grows_by_the_backoff_factor() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 2.0);
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before_retry(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before_retry(3), Duration::from_millis(400));
        assert_eq!(policy.delay_before_retry(4), Duration::from_millis(800));
    }

    #[test]
    fn max_delay_caps_the_schedule() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 10.0)
            .with_max_delay(Duration::from_millis(250));
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before_retry(2), Duration::from_millis(250));
        assert_eq!(policy.delay_before_retry(3), Duration::from_millis(250));
    }

    #[test]
    fn default_predicate_retries_server_errors_and_transient_transport() {
        let predicate = RetryTransient;
        assert!(predicate.should_retry(&status_error(500)));
        assert!(predicate.should_retry(&status_error(503)));
        assert!(predicate.should_retry(&status_error(599)));
        assert!(predicate.should_retry(&transport_error(TransportErrorKind::Timeout)));
        assert!(predicate.should_retry(&transport_error(TransportErrorKind::HostUnresolved)));
        assert!(predicate.should_retry(&transport_error(TransportErrorKind::HostUnreachable)));
        assert!(predicate.should_retry(&transport_error(TransportErrorKind::ConnectionLost)));
        assert!(predicate.should_retry(&transport_error(TransportErrorKind::NotConnected)));

        assert!(!predicate.should_retry(&status_error(400)));
        assert!(!predicate.should_retry(&status_error(404)));
        assert!(!predicate.should_retry(&NetworkError::Unauthorized { body: Vec::new() }));
        assert!(!predicate.should_retry(&NetworkError::InvalidResponse));
        assert!(!predicate.should_retry(&transport_error(TransportErrorKind::MalformedResponse)));
        assert!(!predicate.should_retry(&transport_error(TransportErrorKind::Other)));
    }

    #[test]
    fn closures_compose_with_or_and_and() {
        let on_500: Box<dyn RetryPredicate> =
            Box::new(|e: &NetworkError| matches!(e.status().map(|s| s.as_u16()), Some(500)));
        let on_503: Box<dyn RetryPredicate> =
            Box::new(|e: &NetworkError| matches!(e.status().map(|s| s.as_u16()), Some(503)));

        let either = OrPredicate::new(vec![on_500, on_503]);
        assert!(either.should_retry(&status_error(500)));
        assert!(either.should_retry(&status_error(503)));
        assert!(!either.should_retry(&status_error(502)));

        let both = AndPredicate::new(vec![
            Box::new(RetryOn5xx),
            Box::new(|e: &NetworkError| e.body().is_some_and(<[u8]>::is_empty)),
        ]);
        assert!(both.should_retry(&status_error(500)));
        assert!(!both.should_retry(&NetworkError::UnexpectedStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: b"details".to_vec(),
        }));
    }

    #[tokio::test]
    async fn exhaustion_makes_exactly_max_retries_plus_one_attempts() {
        let inner = FlakyExecutor::new(u32::MAX, 503);
        let retry = RetryExecutor::new(inner, Some(quick_policy(3)));

        match retry.send(&request(), &CancellationToken::new()).await {
            SendOutcome::Failure(NetworkError::RetriesExhausted {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(
                    *last_error,
                    NetworkError::UnexpectedStatus { status, .. } if status.as_u16() == 503
                ));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(retry.inner.calls(), 4);
    }

    #[tokio::test]
    async fn success_on_attempt_k_stops_the_loop() {
        let inner = FlakyExecutor::new(2, 503);
        let retry = RetryExecutor::new(inner, Some(quick_policy(5)));

        match retry.send(&request(), &CancellationToken::new()).await {
            SendOutcome::Success(delivery) => {
                assert_eq!(delivery.attempts, 3);
                assert_eq!(delivery.body, b"ok");
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(retry.inner.calls(), 3);
    }

    #[tokio::test]
    async fn non_retryable_failure_is_terminal_after_one_attempt() {
        let inner = FlakyExecutor::new(u32::MAX, 400);
        let retry = RetryExecutor::new(inner, Some(quick_policy(5)));

        match retry.send(&request(), &CancellationToken::new()).await {
            SendOutcome::Failure(NetworkError::UnexpectedStatus { status, .. }) => {
                assert_eq!(status.as_u16(), 400);
            }
            other => panic!("expected the original failure, got {other:?}"),
        }
        assert_eq!(retry.inner.calls(), 1);
    }

    #[tokio::test]
    async fn zero_retries_delegates_without_wrapping() {
        let inner = FlakyExecutor::new(u32::MAX, 503);
        let retry = RetryExecutor::new(inner, Some(quick_policy(0)));

        match retry.send(&request(), &CancellationToken::new()).await {
            SendOutcome::Failure(NetworkError::UnexpectedStatus { status, .. }) => {
                assert_eq!(status.as_u16(), 503);
            }
            other => panic!("expected the original failure, got {other:?}"),
        }
        assert_eq!(retry.inner.calls(), 1);
    }

    #[tokio::test]
    async fn no_policy_delegates_directly() {
        let inner = FlakyExecutor::new(0, 0);
        let retry = RetryExecutor::new(inner, None);

        match retry.send(&request(), &CancellationToken::new()).await {
            SendOutcome::Success(delivery) => assert_eq!(delivery.attempts, 1),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelling_during_backoff_aborts_the_sequence() {
        let inner = FlakyExecutor::new(u32::MAX, 503);
        let policy = RetryPolicy::new(5, Duration::from_secs(60), 2.0);
        let retry = RetryExecutor::new(inner, Some(policy));

        let token = CancellationToken::new();
        let request = request();
        let send = retry.send(&request, &token);
        tokio::pin!(send);

        tokio::select! {
            _ = &mut send => panic!("should be parked in backoff"),
            () = tokio::time::sleep(Duration::from_millis(20)) => token.cancel(),
        }

        match send.await {
            SendOutcome::Cancelled => {}
            other => panic!("expected cancelled, got {other:?}"),
        }
        assert_eq!(retry.inner.calls(), 1);
    }

    #[tokio::test]
    async fn cancelling_before_the_first_attempt_prevents_it() {
        let inner = FlakyExecutor::new(0, 0);
        let retry = RetryExecutor::new(inner, Some(quick_policy(3)));

        let token = CancellationToken::new();
        token.cancel();

        match retry.send(&request(), &token).await {
            SendOutcome::Cancelled => {}
            other => panic!("expected cancelled, got {other:?}"),
        }
        assert_eq!(retry.inner.calls(), 0);
    }
}
