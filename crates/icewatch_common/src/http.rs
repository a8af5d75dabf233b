// --- File: crates/icewatch_common/src/http.rs ---
use reqwest::Response;

pub mod client;

/// Drains a non-success response into `"<status>: <body>"` for error messages.
pub async fn describe_failure(response: Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    format!("{}: {}", status, body.trim())
}
