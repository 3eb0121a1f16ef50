//! # Remote Fetching
//!
//! This module provides the byte-stream fetch primitive the configuration
//! sources are built on. It is designed around a trait so the transport can
//! be swapped out:
//!
//! - **`Fetcher`**: fetch a URL with a caller-supplied timeout and return the
//!   exact bytes received.
//! - **`HttpFetcher`**: the default implementation, a blocking HTTP(S) GET.
//!
//! In tests a mock `Fetcher` serves documents from memory and counts calls,
//! so the caching and integrity logic can be exercised without a network.
//!
//! There are no retries at this layer: a timeout or transport error is
//! returned to the caller as is.

use std::time::Duration;

use log::debug;
use md5::{Digest, Md5};

use crate::error::{Error, Result};

/// Timeout used when fetching the `.md5` sibling of a document.
pub const HASH_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Trait for fetching remote resources - allows mocking in tests
pub trait Fetcher {
    /// Fetches `url`, failing if the transfer does not finish within `timeout`.
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}

/// The default `Fetcher`, performing blocking HTTP(S) GET requests.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let network_error = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Timeout {
                    url: url.to_string(),
                    seconds: timeout.as_secs(),
                }
            } else {
                Error::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(network_error)?;

        debug!("Fetching {} (timeout {}s)", url, timeout.as_secs());
        let response = client.get(url).send().map_err(network_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(Error::Network {
                url: url.to_string(),
                message: format!("HTTP status {}", status),
            });
        }

        let expected = response.content_length();
        let body = response.bytes().map_err(network_error)?;
        if let Some(expected) = expected {
            if body.len() as u64 != expected {
                return Err(Error::Network {
                    url: url.to_string(),
                    message: format!(
                        "Truncated transfer: received {} of {} bytes",
                        body.len(),
                        expected
                    ),
                });
            }
        }

        Ok(body.to_vec())
    }
}

/// Hex-encoded MD5 digest of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Locator of the `.md5` sibling of a document: the locator with its last
/// four characters (the extension) replaced by `.md5`.
pub fn hash_locator(locator: &str) -> Option<String> {
    let cut = locator.char_indices().rev().nth(3)?.0;
    Some(format!("{}.md5", &locator[..cut]))
}

/// Extracts the digest from the content of a `.md5` file.
///
/// The first whitespace-separated token is the digest; anything after it
/// (such as `md5sum`'s file name column) is ignored.
pub fn parse_hash_file(content: &[u8]) -> Option<String> {
    String::from_utf8_lossy(content)
        .split_whitespace()
        .next()
        .map(str::to_lowercase)
}
