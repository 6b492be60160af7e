//! # Shroud Core
//!
//! Core of the shroud Lua obfuscator, including:
//! - Abstract Syntax Tree (AST) definitions with constant-folding factories
//! - Operator precedence table and source generation
//! - Scope arena and the tree traversal engine
//! - The obfuscation step contract, settings validation and step catalog
//! - The pipeline that runs configured steps over a tree
//!
//! Parsing is not part of this crate: trees arrive already built, usually
//! deserialized from JSON.

#![warn(clippy::all)]

pub mod ast;
pub mod errors;
pub mod names;
pub mod pipeline;
pub mod random;
pub mod step;
pub mod visit;

// Re-export commonly used types
pub use ast::{Ast, AstKind, Block, Expression, LanguageDialect, SourceGenerator, Statement};
pub use errors::{AstError, CodeGenError, ConfigError};
pub use names::NameGeneratorKind;
pub use pipeline::{Pipeline, PipelineConfig, Preset, StepConfig, StepStats};
pub use random::Random;
pub use step::{Step, StepDescriptor, STEPS};
pub use visit::{visit_ast, VisitData, Visitor};

/// Shroud version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for shroud components.
///
/// `RUST_LOG` overrides the default `shroud_core=info` filter. Calling this
/// more than once is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shroud_core=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Error types for shroud core operations
#[derive(thiserror::Error, Debug)]
pub enum ShroudError {
    /// Invalid tree construction
    #[error("AST error: {0}")]
    Ast(#[from] AstError),

    /// Invalid pipeline or step configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tree not expressible in the target dialect
    #[error("Code generation error: {0}")]
    CodeGen(#[from] CodeGenError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed tree or preset JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for shroud core operations
pub type Result<T> = std::result::Result<T, ShroudError>;
