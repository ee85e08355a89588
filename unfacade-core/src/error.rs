/// Top-level unfacade error type.
///
/// All fallible operations in `unfacade-core` return [`Result<T, UnfacadeError>`](Result).
/// Each variant wraps a layer-specific error enum.
#[derive(thiserror::Error, Debug)]
pub enum UnfacadeError {
    /// Error from the semantic model (tree-sitter parsing, scope graphs).
    #[error("Graph engine error: {0}")]
    Graph(#[from] unfacade_graphs::GraphError),

    /// A rule could not process a matched call.
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A fix could not be applied to its source.
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    /// Filesystem I/O error while loading or writing sources.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while rewriting a matched call. Fatal for the file.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A matched wrapper was called through a member with no rewrite.
    #[error("{file}: unsupported member `{member}` in `{call_text}`")]
    UnsupportedMember {
        /// File containing the call.
        file: String,
        /// The accessed member name.
        member: String,
        /// Full text of the offending call.
        call_text: String,
    },

    /// A failure location or fix edit falls outside its source.
    #[error("{file}: invalid span {start}+{width} (source length {len})")]
    InvalidSpan {
        file: String,
        start: usize,
        width: usize,
        len: usize,
    },
}

/// Errors applying an edit buffer to a source string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Edit at {offset}..{end} is outside the source (length {len})")]
    OutOfBounds { offset: usize, end: usize, len: usize },

    #[error("Edit at {offset} overlaps a previous edit ending at {previous_end}")]
    Overlap { offset: usize, previous_end: usize },

    #[error("Edit offset {0} is not on a UTF-8 character boundary")]
    NotCharBoundary(usize),
}

/// Errors in unfacade configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Convenience alias for `Result<T, UnfacadeError>`.
pub type Result<T> = std::result::Result<T, UnfacadeError>;
