use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use tracing::info;

use crate::error::{Result, SyncError};

// The sheet host serves a bot wall to default client agents
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(client_setup_error)?;
        Ok(Self { client })
    }

    /// GET `url` and return the body as text. Anything but a 2xx is an error.
    pub fn fetch(&self, url: &str) -> Result<String> {
        info!("Fetching sheet: {}", url);
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SyncError::fetch(url, describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::fetch(url, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .map_err(|e| SyncError::fetch(url, format!("unreadable body: {}", e)))?;

        info!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched sheet"
        );
        Ok(body)
    }
}

fn client_setup_error(e: reqwest::Error) -> SyncError {
    SyncError::Config(format!("failed to build HTTP client: {}", e))
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {}", e)
    } else {
        e.to_string()
    }
}
