use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid spec field `{field}`: {reason}")]
    SpecInvalid { field: String, reason: String },

    #[error("criterion references unknown aggregate `{tag}`")]
    UnknownCriterion { tag: String },

    #[error("simulation already complete")]
    AlreadyComplete,

    #[error("solver error: {message}")]
    SolverError { message: String },

    #[error("baseline incompatible: {reason}")]
    BaselineIncompatible { reason: String },
}

impl HarnessError {
    pub fn spec_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpecInvalid { field: field.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
