//! # Configuration Sources
//!
//! `ConfigSource` turns a locator (a URL or a local path) into a parsed
//! [`ConfigTree`].
//!
//! 1. A locator naming an existing local file (directly or as a `file://`
//!    URL) is read and parsed every time; local files bypass both the cache
//!    and integrity checks.
//! 2. Otherwise the locator cache is consulted; a hit is returned as is.
//! 3. Otherwise the document is fetched with the configured timeout, parsed,
//!    optionally verified against its `.md5` sibling, and cached.
//!
//! Only parsed trees are cached, never raw bytes.

use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};

use crate::cache::TreeCache;
use crate::cfg::ConfigTree;
use crate::error::{Error, Result};
use crate::fetch::{self, Fetcher, HttpFetcher, HASH_FETCH_TIMEOUT};

/// Default timeout for fetching configuration documents.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Loads ConfigTrees from URLs or local paths, caching remote documents.
pub struct ConfigSource {
    fetcher: Box<dyn Fetcher>,
    cache: TreeCache,
    timeout: Duration,
}

impl ConfigSource {
    /// Creates a source that fetches over HTTP with the given timeout.
    pub fn new(timeout: Duration) -> Self {
        Self::with_fetcher(Box::new(HttpFetcher), timeout)
    }

    /// Creates a source with a custom `Fetcher`.
    pub fn with_fetcher(fetcher: Box<dyn Fetcher>, timeout: Duration) -> Self {
        Self {
            fetcher,
            cache: TreeCache::new(),
            timeout,
        }
    }

    /// Returns true if `locator` has already been fetched and cached.
    pub fn is_cached(&self, locator: &str) -> bool {
        self.cache.contains(locator)
    }

    /// Loads the document at `locator`.
    ///
    /// With `verify_hash`, a remote document must match the MD5 digest
    /// published next to it or the load fails with [`Error::Integrity`].
    pub fn load(&mut self, locator: &str, verify_hash: bool) -> Result<ConfigTree> {
        if let Some(path) = local_path(locator) {
            debug!("Reading local configuration {}", path.display());
            let bytes = std::fs::read(&path)?;
            return parse_document(locator, &String::from_utf8_lossy(&bytes));
        }

        let fetcher = self.fetcher.as_ref();
        let timeout = self.timeout;
        self.cache.get_or_load(locator, || {
            info!("Fetching configuration from {}", locator);
            let body = fetcher.fetch(locator, timeout)?;
            if body.is_empty() {
                return Err(Error::Network {
                    url: locator.to_string(),
                    message: "Empty response".to_string(),
                });
            }
            if verify_hash {
                verify_digest(fetcher, locator, &body)?;
            }
            parse_document(locator, &String::from_utf8_lossy(&body))
        })
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Resolves `locator` to an existing local file, if it names one.
fn local_path(locator: &str) -> Option<PathBuf> {
    let path = match url::Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok()?,
        // Windows drive letters parse as one-letter URL schemes
        Ok(url) if url.scheme().len() > 1 => return None,
        _ => PathBuf::from(locator),
    };
    path.is_file().then_some(path)
}

fn parse_document(locator: &str, text: &str) -> Result<ConfigTree> {
    ConfigTree::parse(text).map_err(|e| Error::ConfigLoad {
        locator: locator.to_string(),
        source: Box::new(e),
    })
}

fn verify_digest(fetcher: &dyn Fetcher, locator: &str, body: &[u8]) -> Result<()> {
    let hash_url = fetch::hash_locator(locator).ok_or_else(|| Error::NotFound {
        url: format!("{} (no .md5 sibling)", locator),
    })?;
    let published = fetcher.fetch(&hash_url, HASH_FETCH_TIMEOUT)?;
    let expected = fetch::parse_hash_file(&published).ok_or_else(|| Error::Network {
        url: hash_url.clone(),
        message: "Empty hash file".to_string(),
    })?;
    let actual = fetch::md5_hex(body);
    if expected != actual {
        return Err(Error::Integrity {
            url: locator.to_string(),
            expected,
            actual,
        });
    }
    debug!("Verified MD5 of {}", locator);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Mock fetcher serving documents from memory and recording calls.
    #[derive(Clone, Default)]
    pub(crate) struct MockFetcher {
        pub documents: Rc<RefCell<HashMap<String, Vec<u8>>>>,
        pub calls: Rc<RefCell<Vec<String>>>,
    }

    impl MockFetcher {
        pub fn serve(&self, url: &str, content: &str) {
            self.documents
                .borrow_mut()
                .insert(url.to_string(), content.as_bytes().to_vec());
        }

        pub fn serve_with_hash(&self, url: &str, content: &str) {
            self.serve(url, content);
            let hash_url = fetch::hash_locator(url).unwrap();
            self.serve(&hash_url, &fetch::md5_hex(content.as_bytes()));
        }

        pub fn call_count(&self, url: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == url).count()
        }
    }

    impl Fetcher for MockFetcher {
        fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            self.documents
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| Error::NotFound {
                    url: url.to_string(),
                })
        }
    }

    fn source(mock: &MockFetcher) -> ConfigSource {
        ConfigSource::with_fetcher(Box::new(mock.clone()), DEFAULT_TIMEOUT)
    }

    #[test]
    fn test_remote_load_is_cached() {
        let mock = MockFetcher::default();
        mock.serve("https://host/a.cfg", "A = 1\n");
        let mut src = source(&mock);

        let first = src.load("https://host/a.cfg", false).unwrap();
        let second = src.load("https://host/a.cfg", false).unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.call_count("https://host/a.cfg"), 1);
        assert!(src.is_cached("https://host/a.cfg"));
    }

    #[test]
    fn test_first_load_wins() {
        let mock = MockFetcher::default();
        mock.serve("https://host/a.cfg", "A = 1\n");
        let mut src = source(&mock);
        src.load("https://host/a.cfg", false).unwrap();

        mock.serve("https://host/a.cfg", "A = 2\n");
        let again = src.load("https://host/a.cfg", false).unwrap();
        assert_eq!(again.get("A").unwrap(), "1");
    }

    #[test]
    fn test_missing_remote_is_fetch_failure() {
        let mock = MockFetcher::default();
        let mut src = source(&mock);
        let err = src.load("https://host/missing.cfg", false).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(!src.is_cached("https://host/missing.cfg"));
    }

    #[test]
    fn test_empty_remote_is_fetch_failure() {
        let mock = MockFetcher::default();
        mock.serve("https://host/empty.cfg", "");
        let mut src = source(&mock);
        let err = src.load("https://host/empty.cfg", false).unwrap_err();
        assert!(matches!(err, Error::Network { ref message, .. } if message.contains("Empty")));
    }

    #[test]
    fn test_parse_failure_names_locator() {
        let mock = MockFetcher::default();
        mock.serve("https://host/bad.cfg", "A = 1\n}\n");
        let mut src = source(&mock);
        let err = src.load("https://host/bad.cfg", false).unwrap_err();
        match err {
            Error::ConfigLoad { locator, source } => {
                assert_eq!(locator, "https://host/bad.cfg");
                assert!(matches!(*source, Error::ConfigParse { line: 2, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_hash_verification_success() {
        let mock = MockFetcher::default();
        mock.serve_with_hash("https://host/release-A-v1.cfg", "A = 1\n");
        let mut src = source(&mock);

        let tree = src.load("https://host/release-A-v1.cfg", true).unwrap();
        assert_eq!(tree.get("A").unwrap(), "1");
        assert_eq!(mock.call_count("https://host/release-A-v1.md5"), 1);
    }

    #[test]
    fn test_hash_mismatch_is_integrity_failure() {
        let mock = MockFetcher::default();
        mock.serve("https://host/release-A-v1.cfg", "A = 1\n");
        mock.serve("https://host/release-A-v1.md5", "0123456789abcdef0123456789abcdef");
        let mut src = source(&mock);

        let err = src.load("https://host/release-A-v1.cfg", true).unwrap_err();
        assert!(matches!(err, Error::Integrity { .. }));
        assert!(!src.is_cached("https://host/release-A-v1.cfg"));
    }

    #[test]
    fn test_tampered_unparsable_document_is_integrity_failure() {
        let mock = MockFetcher::default();
        mock.serve("https://host/release-A-v1.cfg", "A = 1\n}\n");
        mock.serve("https://host/release-A-v1.md5", &fetch::md5_hex(b"A = 1\n"));
        let mut src = source(&mock);

        let err = src.load("https://host/release-A-v1.cfg", true).unwrap_err();
        assert!(matches!(err, Error::Integrity { ref url, .. } if url == "https://host/release-A-v1.cfg"));
    }

    #[test]
    fn test_missing_hash_file_fails() {
        let mock = MockFetcher::default();
        mock.serve("https://host/release-A-v1.cfg", "A = 1\n");
        let mut src = source(&mock);
        let err = src.load("https://host/release-A-v1.cfg", true).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref url } if url.ends_with(".md5")));
    }

    #[test]
    fn test_local_file_bypasses_cache_and_fetcher() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("local.cfg");
        std::fs::write(&file, "A = 1\n").unwrap();
        let locator = file.to_str().unwrap().to_string();

        let mock = MockFetcher::default();
        let mut src = source(&mock);
        assert_eq!(src.load(&locator, true).unwrap().get("A").unwrap(), "1");

        std::fs::write(&file, "A = 2\n").unwrap();
        assert_eq!(src.load(&locator, true).unwrap().get("A").unwrap(), "2");

        assert!(mock.calls.borrow().is_empty());
        assert!(!src.is_cached(&locator));
    }

    #[test]
    fn test_local_file_with_invalid_utf8() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("latin1.cfg");
        std::fs::write(&file, b"Comment = caf\xe9\nA = 1\n").unwrap();
        let locator = file.to_str().unwrap().to_string();

        let mock = MockFetcher::default();
        let mut src = source(&mock);
        let tree = src.load(&locator, false).unwrap();
        assert_eq!(tree.get("A").unwrap(), "1");
        assert_eq!(tree.get("Comment").unwrap(), "caf\u{fffd}");
    }

    #[test]
    fn test_file_url_is_local() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("local.cfg");
        std::fs::write(&file, "A = 1\n").unwrap();
        let locator = url::Url::from_file_path(&file).unwrap().to_string();

        let mock = MockFetcher::default();
        let mut src = source(&mock);
        assert_eq!(src.load(&locator, false).unwrap().get("A").unwrap(), "1");
        assert!(mock.calls.borrow().is_empty());
    }
}
