//! Crate error types.
//!
//! Two error domains, mirroring the split between setup-time and parse-time
//! failure in the matcher design: [`CompileError`] for pattern compilation,
//! [`EngineError`] for everything else (registry, config, custom lexical
//! registration). A successful or failed *parse* is never an [`Err`] — see
//! [`crate::matcher::MatchOutcome`], which is returned by value.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures while compiling a grammar pattern into the syntax tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("nested option group in pattern")]
    NestedOption,
    #[error("nested alternation group in pattern")]
    NestedAlternation,
    #[error("empty option group `[ ]`")]
    EmptyOption,
    #[error("empty alternation group `{{ }}`")]
    EmptyAlternation,
    #[error("alternation group missing `|` separator")]
    MissingPipe,
    #[error("`|` outside an open alternation group")]
    MisplacedPipe,
    #[error("`*` used outside an option group")]
    StarOutsideOption,
    #[error("branch slot overflow: a node may have at most {max} children")]
    BranchOverflow { max: usize },
    #[error("alternation slot overflow: at most {max} alternatives")]
    AltOverflow { max: usize },
    #[error("option slot overflow: at most {max} elements")]
    OptionOverflow { max: usize },
    #[error("unknown symbol `{0}` referenced in pattern")]
    UnknownSymbol(String),
    #[error("compiler state left open groups from a previous pattern")]
    DirtyState,
}

/// Setup and registry-level failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("command `{0}` already registered")]
    DuplicateCommand(String),
    #[error("no command named `{0}`")]
    UnknownCommand(String),
    #[error("custom lexical id {0} is outside the reserved custom range")]
    CustomLexOutOfRange(u16),
    #[error("failed to compile pattern for `{command}`: {source}")]
    Compile {
        command: String,
        #[source]
        source: CompileError,
    },
    #[error("failed to read config file: {0}")]
    ConfigRead(#[source] std::io::Error),
    #[error("failed to parse YAML config: {0}")]
    ConfigYaml(#[source] serde_yaml::Error),
    #[error("failed to parse TOML config: {0}")]
    ConfigToml(#[source] toml::de::Error),
    #[error("failed to parse JSON config: {0}")]
    ConfigJson(#[source] serde_json::Error),
    #[error("no configuration file found")]
    ConfigNotFound,
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn other(msg: impl Into<String>) -> Self {
        EngineError::Other(msg.into())
    }
}
