//! Configuration for content extraction

/// Configuration for the extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Minimum visible text, in characters, for a strategy to count as successful
    pub min_text_length: usize,

    /// Maximum excerpt length in characters before `...` is appended
    pub excerpt_length: usize,

    /// Whether to resolve relative links and image sources against the page URL
    pub absolutize_links: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
            excerpt_length: 300,
            absolutize_links: true,
        }
    }
}

/// Builder for ExtractorConfig
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    /// Set the minimum text length
    pub fn min_text_length(mut self, min_text_length: usize) -> Self {
        self.config.min_text_length = min_text_length;
        self
    }

    /// Set the excerpt length
    pub fn excerpt_length(mut self, excerpt_length: usize) -> Self {
        self.config.excerpt_length = excerpt_length;
        self
    }

    /// Set whether relative URLs are resolved
    pub fn absolutize_links(mut self, absolutize_links: bool) -> Self {
        self.config.absolutize_links = absolutize_links;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl ExtractorConfig {
    /// Create a new builder
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }
}
