//! Custom retry predicates and per-request policies.
//!
//! Run with: `cargo run --example custom_retry`

use courier::retry::{AndPredicate, OrPredicate, RetryOn5xx};
use courier::{Client, NetworkError, RequestDescriptor, RetryPolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), courier::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("courier=info,custom_retry=info")
        .init();

    println!("=== Example 1: retry only while the service is overloaded ===");
    let on_503 = |error: &NetworkError| matches!(error.status().map(|s| s.as_u16()), Some(503));
    let client = Client::builder("https://jsonplaceholder.typicode.com")
        .retry_policy(
            RetryPolicy::new(4, Duration::from_millis(100), 2.0).with_predicate(on_503),
        )
        .build()?;

    match client.get::<serde_json::Value>("/posts/1").await {
        Ok(response) => println!("succeeded after {} attempt(s)", response.attempts),
        Err(error) => println!("failed: {error}"),
    }

    println!("=== Example 2: combined predicates ===");
    // 5xx, or anything that never reached the server.
    let predicate = OrPredicate::new(vec![
        Box::new(RetryOn5xx),
        Box::new(|error: &NetworkError| matches!(error, NetworkError::RequestFailed(_))),
    ]);
    let client = Client::builder("https://jsonplaceholder.typicode.com")
        .retry_policy(
            RetryPolicy::new(3, Duration::from_millis(100), 2.0)
                .with_max_delay(Duration::from_secs(5))
                .with_predicate(predicate),
        )
        .build()?;

    match client.get::<serde_json::Value>("/posts/2").await {
        Ok(response) => println!("succeeded after {} attempt(s)", response.attempts),
        Err(error) => println!("failed: {error}"),
    }

    println!("=== Example 3: a request-level override ===");
    // The sensitive endpoint retries 5xx only when the body is empty, and
    // only once, regardless of the client default.
    let careful = AndPredicate::new(vec![
        Box::new(RetryOn5xx),
        Box::new(|error: &NetworkError| error.body().is_some_and(<[u8]>::is_empty)),
    ]);
    let descriptor = RequestDescriptor::get("/posts/3").with_retry_policy(
        RetryPolicy::new(1, Duration::from_millis(50), 1.0).with_predicate(careful),
    );

    match client.execute::<serde_json::Value>(descriptor).await {
        Ok(response) => println!("succeeded after {} attempt(s)", response.attempts),
        Err(error) => println!("failed: {error}"),
    }

    Ok(())
}
