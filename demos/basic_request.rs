//! Basic example demonstrating GET, POST and content loading.
//!
//! This example shows how to:
//! - Issue a GET with a query payload and a JSON response
//! - Issue a synchronous POST with a form body
//! - Load an HTML fragment into an in-memory document
//!
//! Run with: `cargo run --example basic_request`

use std::sync::Arc;
use xhrkit::dom::memory::MemoryDocument;
use xhrkit::{Client, Error, Payload, RequestOptions, ResponseType};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("xhrkit=debug,basic_request=info")
        .init();

    let client = Client::builder()
        .base_url("https://jsonplaceholder.typicode.com")?
        .build()?;

    println!("=== GET Request Example ===");
    let handle = client
        .request(
            RequestOptions::new()
                .url("/posts")
                .payload(Payload::new().with("userId", 1))
                .response_type(ResponseType::Json)
                .on_success(|_settings, body, status, _handle| {
                    let count = body
                        .as_json()
                        .and_then(|v| v.as_array())
                        .map(|posts| posts.len())
                        .unwrap_or_default();
                    println!("Status {}: {} posts", status, count);
                })
                .on_error(|_settings, handle, status| {
                    println!("{} failed with status {}", handle.url(), status);
                }),
        )
        .await;
    handle.wait().await?;
    println!();

    println!("=== Synchronous POST Example ===");
    let handle = client
        .request(
            RequestOptions::new()
                .url("/posts")
                .method(http::Method::POST)
                .is_async(false)
                .payload(Payload::new().with("title", "Hello").with("userId", 1))
                .on_complete(|_settings, _handle, status| {
                    println!("POST completed with status {}", status);
                }),
        )
        .await;
    println!("Response body: {:?}", handle.response_text());
    println!();

    println!("=== Load Into Example ===");
    let document = Arc::new(MemoryDocument::new());
    let panel = document.insert_element("panel", "div");
    client
        .load_into(document.clone(), "panel", "/posts/1", None, None)
        .await
        .wait()
        .await?;
    println!("Panel content: {}", document.inner_html(&panel));

    Ok(())
}
