use thiserror::Error;

/// The result type for the `streamlex` crate.
pub type Result<T> = std::result::Result<T, StreamlexError>;

/// The error type for the `streamlex` crate.
///
/// Errors are only raised while readers and tokenizers are constructed or while generated code is
/// emitted. Scanning itself never fails with a `StreamlexError`; application errors and
/// unrecognized input are reported through the [`crate::Handler`].
#[derive(Error, Debug)]
pub struct StreamlexError {
    /// The source of the error.
    pub source: Box<StreamlexErrorKind>,
}

impl StreamlexError {
    /// Create a new `StreamlexError`.
    pub fn new(kind: StreamlexErrorKind) -> Self {
        StreamlexError {
            source: Box::new(kind),
        }
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> &StreamlexErrorKind {
        &self.source
    }
}

impl std::fmt::Display for StreamlexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// The error kind type.
#[derive(Error, Debug)]
pub enum StreamlexErrorKind {
    /// An error occurred during the parsing of the regex syntax.
    #[error("'{1}' {0}")]
    RegexSyntaxError(regex_syntax::ast::Error, String),

    /// The regex engine refused to build a pattern that parsed fine.
    #[error("Regex build error: {0}")]
    RegexBuildError(String),

    /// A case-insensitive character whose upper and lower case forms differ in length.
    #[error("Case-insensitive match of '{0}' is not possible: its case forms differ in length")]
    CaseMismatch(char),

    /// A character range whose lower bound exceeds its upper bound.
    #[error("Invalid character range {0:#04x}..={1:#04x}")]
    InvalidRange(u8, u8),

    /// A stage name that no rule refers to.
    #[error("Unknown stage '{0}'")]
    UnknownStage(String),

    /// A reader that has to be imported by generated code but has no import path.
    #[error("No import path given for bound reader {0}")]
    MissingImport(String),

    /// A std::io error occurred.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl From<regex_syntax::ast::Error> for StreamlexError {
    fn from(error: regex_syntax::ast::Error) -> Self {
        let pattern = error.pattern().to_string();
        StreamlexError::new(StreamlexErrorKind::RegexSyntaxError(error, pattern))
    }
}

impl From<std::io::Error> for StreamlexError {
    fn from(error: std::io::Error) -> Self {
        StreamlexError::new(StreamlexErrorKind::IoError(error))
    }
}

impl From<StreamlexErrorKind> for StreamlexError {
    fn from(kind: StreamlexErrorKind) -> Self {
        StreamlexError::new(kind)
    }
}
