use thiserror::Error;

use crate::ast::{AstKind, LanguageDialect};

/// Tree invariant violations raised by fallible node factories.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AstError {
    #[error("{kind:?} requires at least one target")]
    EmptyTargets { kind: AstKind },

    #[error("{kind:?} requires at least one value")]
    EmptyValues { kind: AstKind },
}

/// Pipeline configuration errors. Raised before any tree is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown step '{step}'")]
    UnknownStep { step: String },

    #[error("Unknown preset '{preset}'")]
    UnknownPreset { preset: String },

    #[error("Step '{step}': unknown option '{option}'")]
    UnknownOption { step: String, option: String },

    #[error("Step '{step}': option '{option}' must be {expected}, got {actual}")]
    WrongType {
        step: String,
        option: String,
        expected: String,
        actual: String,
    },

    #[error("Step '{step}': option '{option}' = {value} is outside [{min}, {max}]")]
    OutOfRange {
        step: String,
        option: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Step '{step}': option '{option}' must be one of {choices:?}, got '{value}'")]
    InvalidChoice {
        step: String,
        option: String,
        value: String,
        choices: Vec<String>,
    },

    #[error("Step '{step}': option '{option}' is missing")]
    MissingOption { step: String, option: String },
}

impl ConfigError {
    pub fn wrong_type(step: &str, option: &str, expected: &str, actual: &str) -> Self {
        Self::WrongType {
            step: step.to_string(),
            option: option.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn missing_option(step: &str, option: &str) -> Self {
        Self::MissingOption {
            step: step.to_string(),
            option: option.to_string(),
        }
    }
}

/// Source generation failures: constructs the target dialect cannot express.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodeGenError {
    #[error("{kind:?} is not supported by {dialect:?}")]
    Unsupported {
        kind: AstKind,
        dialect: LanguageDialect,
    },

    #[error("Variable {id} of scope {scope} does not exist")]
    UnknownVariable { scope: usize, id: usize },
}
