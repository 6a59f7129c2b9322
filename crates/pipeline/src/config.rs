use std::path::PathBuf;

use html::TokenizerConfig;
use url::Url;

/// Page dimensions in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Log and record elements the document builder rejects instead of aborting the run.
    pub continue_on_element_error: bool,
    /// Tags whose loose text becomes paragraphs of its own.
    pub root_tags: Vec<String>,
    pub page_size: PageSize,
    /// Character set of linked stylesheets that do not name one.
    pub default_charset: String,
    /// Directories relative references are tried against.
    pub resource_roots: Vec<PathBuf>,
    /// Base URLs relative references are resolved against.
    pub base_urls: Vec<Url>,
    pub tokenizer: TokenizerConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            continue_on_element_error: false,
            root_tags: vec!["html".to_string(), "body".to_string()],
            page_size: PageSize::A4,
            default_charset: "utf-8".to_string(),
            resource_roots: Vec::new(),
            base_urls: Vec::new(),
            tokenizer: TokenizerConfig::default(),
        }
    }
}
