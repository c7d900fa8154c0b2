use std::fmt;

/// Explainer failure that keeps whatever the model sent back, for diagnostics.
#[derive(Debug, Clone)]
pub struct ExplainerDiagnosticsError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl fmt::Display for ExplainerDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "explainer error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for ExplainerDiagnosticsError {}
