/// Errors that can occur when moving values across representations.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A float that JSON cannot represent (NaN or infinite).
    #[error("non-finite float cannot be represented as JSON: {0}")]
    NonFiniteFloat(f64),

    /// A keyed map whose keys are not all strings.
    #[error("map key is not a string (found {0})")]
    NonStringKey(&'static str),

    /// The source text is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ValueError>;
