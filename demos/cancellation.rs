//! Callback-style execution with cancellation.
//!
//! Run with: `cargo run --example cancellation`

use courier::{Client, RequestDescriptor, RetryPolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), courier::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("courier=debug,cancellation=info")
        .init();

    // An unroutable address: every attempt fails, so the call sits in
    // retry backoff long enough to cancel it.
    let client = Client::builder("http://10.255.255.1")
        .timeout(Duration::from_secs(2))
        .retry_policy(RetryPolicy::new(5, Duration::from_secs(10), 2.0))
        .build()?;

    let handle = client
        .execute_with_callback::<serde_json::Value, _>(
            RequestDescriptor::get("/never"),
            |outcome| match outcome {
                Ok(response) => println!("unexpectedly succeeded: {:?}", response.data),
                Err(error) => println!("completed with error: {error}"),
            },
        )
        .expect("request should dispatch");

    println!("request is in flight; cancelling in 3 seconds");
    tokio::time::sleep(Duration::from_secs(3)).await;

    handle.cancel();
    println!("cancelled: {}", handle.is_cancelled());

    // The callback stays silent after a cancel; give it a moment to prove
    // the point before exiting.
    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("done, no callback fired");

    Ok(())
}
