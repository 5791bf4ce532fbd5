//! Fetching remote rule lists.

use flate2::read::GzDecoder;
use std::io::Read;
use std::time::Duration;

use crate::{Error, Result};

/// Source of raw rule list snapshots.
pub trait RuleFetcher {
    /// Fetch the body of a rule list.
    ///
    /// Transport failures and non-success statuses are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("qxrule/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl RuleFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let raw = response.bytes()?.to_vec();
        log::debug!("Fetched {} bytes from {}", raw.len(), url);
        decode_body(raw)
    }
}

/// Check if data is gzip compressed.
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

/// Decompress a gzip body; other bodies are returned as-is.
pub fn decode_body(raw: Vec<u8>) -> Result<Vec<u8>> {
    if !is_gzip(&raw) {
        return Ok(raw);
    }

    let mut decoder = GzDecoder::new(&raw[..]);
    let mut data = Vec::new();
    decoder.read_to_end(&mut data)?;
    log::debug!(
        "Decompressed rule list: {} bytes (compressed: {} bytes)",
        data.len(),
        raw.len()
    );
    Ok(data)
}
