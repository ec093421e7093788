use std::time::Duration;

use crate::preview::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Simulated latency of the local export fallback.
    pub export_delay: Duration,
    /// Column width of the text export.
    pub wrap_width: usize,
    /// Nesting beyond this depth renders the preview error block.
    pub max_preview_depth: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            export_delay: Duration::from_millis(1000),
            wrap_width: 80,
            max_preview_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl SessionOptions {
    pub fn with_export_delay(mut self, delay: Duration) -> Self {
        self.export_delay = delay;
        self
    }

    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    pub fn with_max_preview_depth(mut self, depth: usize) -> Self {
        self.max_preview_depth = depth;
        self
    }
}
