//! Basic typed requests.
//!
//! Run with: `cargo run --example basic_call`

use courier::{Client, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), courier::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("courier=debug,basic_call=info")
        .init();

    let client = Client::builder("https://jsonplaceholder.typicode.com")
        .timeout(Duration::from_secs(30))
        .retry_policy(RetryPolicy::new(3, Duration::from_millis(100), 2.0))
        .build()?;

    let post = client.get::<Post>("/posts/1").await?;
    println!(
        "GET /posts/1 -> {:?} ({} attempt(s), {:?})",
        post.title, post.attempts, post.latency
    );

    let created = client
        .post::<NewPost, Post>(
            "/posts",
            NewPost {
                title: "hello".to_string(),
                body: "from courier".to_string(),
                user_id: 1,
            },
        )
        .await?;
    println!("POST /posts -> id {}", created.id);

    Ok(())
}
