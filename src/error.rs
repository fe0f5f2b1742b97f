use thiserror::Error;

/// Convenience alias for results whose error type is [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong in this crate. The variants fall into three groups. Configuration
/// errors concern graph attributes which select unknown acceptance conditions, malformed input covers
/// unreadable or broken interchange files and rewrite rules, and invariant violations indicate a
/// defect in the calling code. None of them is transient, so none of them should be retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The `type` attribute of a graph is neither `ba` nor `gba`.
    #[error("invalid graph type: \"{0}\"")]
    UnknownGraphType(String),
    /// The `ac` attribute of a graph is neither `nodes` nor `edges`.
    #[error("invalid accepting type: \"{0}\"")]
    UnknownAcceptancePlacement(String),
    /// The `nsets` attribute does not fit the graph type.
    #[error("invalid number of acceptance sets: {0}")]
    InvalidSetCount(String),

    /// Reading the input failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The input ended before the graph was complete.
    #[error("unexpected end of input after line {line}")]
    UnexpectedEnd {
        /// The last line that could be read.
        line: usize,
    },
    /// A line of the input could not be understood.
    #[error("line {line}: {message}")]
    Parse {
        /// The offending line, counting from 1.
        line: usize,
        /// What was wrong with it.
        message: String,
    },
    /// A rewrite rule can not be used.
    #[error("malformed rewrite rule: {0}")]
    MalformedRule(String),

    /// A formula that is not a literal was used where a literal is required.
    #[error("bad literal: {0}")]
    NotALiteral(String),
    /// The equality on an atom type is not transitive, which breaks the ordering of literals.
    #[error("atom {0} has a non-transitive equality")]
    NonTransitiveAtom(String),
}
