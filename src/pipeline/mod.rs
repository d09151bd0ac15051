pub mod credential;
pub mod language_detect;
pub mod orchestrator;
pub mod reference_store;
pub mod skills;
pub mod state;
pub mod validation;
pub mod workflow;

pub use credential::Credential;
pub use language_detect::*;
pub use orchestrator::InvoiceOrchestrator;
pub use reference_store::*;
pub use state::*;
pub use validation::*;
pub use workflow::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Run state field `{0}` was already written")]
    FieldAlreadySet(&'static str),

    #[error("Run state field `{0}` is required but unset")]
    FieldUnset(&'static str),

    #[error("Workflow definition error: {0}")]
    Workflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_offending_field() {
        assert_eq!(
            PipelineError::FieldAlreadySet("summary").to_string(),
            "Run state field `summary` was already written"
        );
        assert!(PipelineError::FieldUnset("extracted")
            .to_string()
            .contains("`extracted`"));
    }
}
