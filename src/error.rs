use std::fmt;
use std::io;

/// The type of error that can occur when reading or parsing spintax.
///
/// Malformed notation is never an error: unbalanced braces and stray pipes are absorbed by the
/// parser. An `Error` is either a failure of the underlying reader ([`ErrorKind::Io`]) or a
/// broken internal invariant ([`ErrorKind::Internal`]), which indicates a bug in this crate.
#[derive(Debug)]
pub struct Error(pub(crate) ErrorRepr);

/// The class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input could not be read.
    Io,
    /// The parser or tree reached an inconsistent state.
    Internal,
}

#[derive(Debug)]
pub(crate) enum ErrorRepr {
    Io(io::Error),
    Internal(Invariant),
}

/// Internal invariants whose violation is reported as [`ErrorKind::Internal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Invariant {
    /// Something tried to add a child to a literal.
    AppendToLiteral,
    /// The open-node pile did not reduce to the root at the end of a record.
    PileNotReduced(usize),
    /// The pile ran empty while parsing.
    EmptyPile,
    /// A literal was moved out of an alternation it was not the last child of.
    Reparent,
    /// A finished tree contains an alternation with no alternatives.
    EmptyAlternation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match &self.0 {
            ErrorRepr::Io(_) => ErrorKind::Io,
            ErrorRepr::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn internal(invariant: Invariant) -> Self {
        Self(ErrorRepr::Internal(invariant))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.0 {
            ErrorRepr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self(ErrorRepr::Io(e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ErrorRepr::Io(e) => write!(f, "Failed to read spintax: {}", e),
            ErrorRepr::Internal(i) => write!(f, "Internal parser error: {}", i),
        }
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendToLiteral => write!(f, "cannot append a child to a literal"),
            Self::PileNotReduced(n) => write!(f, "{} open nodes left at end of record", n),
            Self::EmptyPile => write!(f, "open node pile is empty"),
            Self::Reparent => write!(f, "literal is not the last alternative of its parent"),
            Self::EmptyAlternation => write!(f, "alternation without alternatives"),
        }
    }
}
