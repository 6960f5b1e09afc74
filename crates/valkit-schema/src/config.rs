use std::fmt;
use std::sync::Arc;

use valkit_issue::{ErrorOverride, Locale};

/// Per-call parse settings.
#[derive(Clone)]
pub struct ParseConfig {
    /// Maximum nesting of schema frames before the parse is aborted.
    pub max_depth: usize,
    /// When true, finalised issues keep the offending input.
    pub report_input: bool,
    /// Message override consulted after per-issue and per-schema overrides.
    pub error: Option<ErrorOverride>,
    /// Locale used instead of the global one.
    pub locale: Option<Arc<dyn Locale>>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            report_input: true,
            error: None,
            locale: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("max_depth", &self.max_depth)
            .field("report_input", &self.report_input)
            .field("error", &self.error)
            .field("locale", &self.locale.as_ref().map(|_| ".."))
            .finish()
    }
}
