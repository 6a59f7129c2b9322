//! Seam to the resource-retrieval collaborator. The pipeline never performs I/O itself.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use url::Url;

use crate::config::WorkerConfig;
use crate::error::ResourceError;

/// Delivers the bytes behind a resolved reference (URL or file path).
pub trait ResourceProvider: fmt::Debug {
    fn retrieve(&self, reference: &str) -> Result<Vec<u8>, ResourceError>;
}

/// Resolves references against configured base URLs and root directories and asks the
/// provider for each candidate in turn.
#[derive(Clone, Debug)]
pub struct ResourceLocator {
    provider: Rc<dyn ResourceProvider>,
    base_urls: Vec<Url>,
    roots: Vec<PathBuf>,
}

impl ResourceLocator {
    pub fn new(provider: impl ResourceProvider + 'static) -> Self {
        Self {
            provider: Rc::new(provider),
            base_urls: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Locator using the roots and base URLs of `config`.
    pub fn from_config(provider: impl ResourceProvider + 'static, config: &WorkerConfig) -> Self {
        Self::new(provider)
            .with_base_urls(config.base_urls.clone())
            .with_roots(config.resource_roots.clone())
    }

    pub fn with_base_urls(mut self, base_urls: Vec<Url>) -> Self {
        self.base_urls = base_urls;
        self
    }

    pub fn with_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.roots = roots;
        self
    }

    /// References to try for `reference`, in order: absolute URLs as they are, otherwise
    /// every base URL join, then every root directory join, then the reference itself.
    pub fn candidates(&self, reference: &str) -> Result<Vec<String>, ResourceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ResourceError::InvalidReference {
                reference: reference.to_string(),
            });
        }
        if let Ok(absolute) = Url::parse(reference) {
            return Ok(vec![absolute.to_string()]);
        }
        let mut candidates: Vec<String> = self
            .base_urls
            .iter()
            .filter_map(|base| base.join(reference).ok())
            .map(|url| url.to_string())
            .collect();
        candidates.extend(
            self.roots
                .iter()
                .map(|root| root.join(reference).to_string_lossy().into_owned()),
        );
        candidates.push(reference.to_string());
        candidates.dedup();
        Ok(candidates)
    }

    /// Bytes of the first candidate the provider delivers. A candidate that is merely
    /// missing moves on to the next; any other failure ends the search.
    pub fn retrieve(&self, reference: &str) -> Result<Vec<u8>, ResourceError> {
        for candidate in self.candidates(reference)? {
            match self.provider.retrieve(&candidate) {
                Ok(bytes) => {
                    log::debug!(target: "tagflow.pipeline", "retrieved {candidate} ({} bytes)", bytes.len());
                    return Ok(bytes);
                }
                Err(ResourceError::NotFound { .. }) => {
                    log::trace!(target: "tagflow.pipeline", "no resource at {candidate}");
                }
                Err(err) => return Err(err),
            }
        }
        Err(ResourceError::NotFound {
            reference: reference.to_string(),
        })
    }
}

/// In-memory provider keyed by exact reference.
#[derive(Clone, Debug, Default)]
pub struct MemoryProvider {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(reference.into(), bytes.into());
    }

    pub fn with(mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(reference, bytes);
        self
    }
}

impl ResourceProvider for MemoryProvider {
    fn retrieve(&self, reference: &str) -> Result<Vec<u8>, ResourceError> {
        self.entries
            .get(reference)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound {
                reference: reference.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Broken;

    impl ResourceProvider for Broken {
        fn retrieve(&self, reference: &str) -> Result<Vec<u8>, ResourceError> {
            Err(ResourceError::Io {
                reference: reference.to_string(),
                message: "disk on fire".to_string(),
            })
        }
    }

    #[test]
    fn relative_references_use_bases_then_roots() {
        let locator = ResourceLocator::new(MemoryProvider::new())
            .with_base_urls(vec![Url::parse("http://example.com/css/").unwrap()])
            .with_roots(vec![PathBuf::from("/srv/site")]);
        let candidates = locator.candidates("main.css").unwrap();
        assert_eq!(
            candidates,
            vec![
                "http://example.com/css/main.css".to_string(),
                PathBuf::from("/srv/site").join("main.css").to_string_lossy().into_owned(),
                "main.css".to_string(),
            ]
        );
    }

    #[test]
    fn absolute_urls_are_used_directly() {
        let locator = ResourceLocator::new(MemoryProvider::new())
            .with_base_urls(vec![Url::parse("http://example.com/").unwrap()]);
        assert_eq!(
            locator.candidates("https://cdn.test/a.css").unwrap(),
            vec!["https://cdn.test/a.css".to_string()]
        );
        assert!(matches!(
            locator.candidates("  "),
            Err(ResourceError::InvalidReference { .. })
        ));
    }

    #[test]
    fn retrieve_falls_through_missing_candidates() {
        let provider = MemoryProvider::new().with("/srv/site/a.css", "p {}");
        let locator = ResourceLocator::new(provider)
            .with_base_urls(vec![Url::parse("http://example.com/").unwrap()])
            .with_roots(vec![PathBuf::from("/srv/site")]);
        assert_eq!(locator.retrieve("a.css").unwrap(), b"p {}".to_vec());
        assert!(matches!(
            locator.retrieve("b.css"),
            Err(ResourceError::NotFound { reference }) if reference == "b.css"
        ));
    }

    #[test]
    fn hard_failures_stop_the_search() {
        let locator = ResourceLocator::new(Broken);
        assert!(matches!(locator.retrieve("x"), Err(ResourceError::Io { .. })));
    }
}
