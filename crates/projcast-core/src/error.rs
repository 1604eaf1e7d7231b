use thiserror::Error;

/// Aggregate of disposal steps that failed. Cleanup always runs to
/// completion; one failed release never blocks the rest.
#[derive(Debug, Error)]
#[error("disposal finished with {} failed step(s): {steps:?}", steps.len())]
pub struct DisposeError {
    pub steps: Vec<String>,
}

impl DisposeError {
    /// `None` when every step succeeded.
    pub fn from_steps(steps: Vec<String>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Self { steps })
        }
    }
}
