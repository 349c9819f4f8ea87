use std::time::Duration;

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

// Archive downloads are tens of megabytes.
const REQUEST_TIMEOUT_SECS: u64 = 180;
const USER_AGENT: &str = "ipl-live-states/0.1";

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Fetches `url` as a binary body. A success status carrying an HTML page (a login wall or
/// an error page served as 200) is rejected, as is an empty body.
pub fn fetch_binary(url: &str) -> Result<Vec<u8>> {
    let res = http_client()?
        .get(url)
        .send()
        .with_context(|| format!("request {url}"))?
        .error_for_status()
        .with_context(|| format!("status for {url}"))?;
    let content_type = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = res.bytes().with_context(|| format!("read body {url}"))?;
    check_binary_body(url, &content_type, &bytes)?;
    Ok(bytes.to_vec())
}

fn check_binary_body(url: &str, content_type: &str, body: &[u8]) -> Result<()> {
    if content_type.starts_with("text/html") {
        bail!("{url} returned an html page instead of a file");
    }
    if body.is_empty() {
        bail!("{url} returned an empty body");
    }
    Ok(())
}
