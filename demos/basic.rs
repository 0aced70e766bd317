use resilient_http::{Backoff, Method, Request, RetryClient};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("RESILIENT_HTTP_DEMO_URL")?;

    let client = RetryClient::from_env()?.with_backoff(Backoff::new(50, 2_000));

    let mut probe = Request::get(&url)?;
    let outcome = client.send(&mut probe, 3).await;
    println!("GET took {} attempt(s)", outcome.attempts);
    let response = outcome.into_result()?;
    println!("{} {}", response.status, response.text());

    let mut create = Request::json(Method::POST, &url, &json!({ "name": "Kit" }))?;
    let outcome = client.send(&mut create, 5).await;
    println!("POST took {} attempt(s)", outcome.attempts);
    let response = outcome.into_result()?;
    println!("{} {}", response.status, response.text());

    Ok(())
}
