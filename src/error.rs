//! Diagnostic error taxonomy shared by Sema and Codegen.

use std::fmt;

use crate::ast::NodeId;

/// A single compiler diagnostic.
///
/// Every variant corresponds to one entry in the spec's error taxonomy. All of them
/// are fatal to the current compilation: there is no local catch-and-continue, so a
/// `CcError` propagates with `?` until the driver prints it and exits non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CcError {
    Redefined(String),
    Undefined(String),
    IncompleteType(String),
    ConversionError(String),
    InvalidInitializer(String),
    NonConstantInitializer(String),
    InvalidOperand(String),
    DuplicatedCase(String),
    InvalidBreak(String),
    InvalidContinue(String),
    InvalidDefault(String),
    UnknownLabel(String),
    /// A deliberate feature gap (64-bit div/mod/shift, struct by value, `union`, ...).
    /// Kept distinct from the other variants so tests can filter it out with
    /// `matches!(err, CcError::NotImplemented(_))`.
    NotImplemented(String),
    /// Reading/writing a source, assembly, object, or archive file failed.
    Io(String),
    /// An external tool the driver shelled out to (preprocessor, assembler, linker)
    /// exited non-zero or could not be spawned.
    ExternalToolFailed { tool: String, detail: String },
}

impl fmt::Display for CcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CcError::Redefined(s) => write!(f, "redefined: {s}"),
            CcError::Undefined(s) => write!(f, "undefined: {s}"),
            CcError::IncompleteType(s) => write!(f, "incomplete type: {s}"),
            CcError::ConversionError(s) => write!(f, "cannot convert: {s}"),
            CcError::InvalidInitializer(s) => write!(f, "invalid initializer: {s}"),
            CcError::NonConstantInitializer(s) => write!(f, "non-constant initializer: {s}"),
            CcError::InvalidOperand(s) => write!(f, "invalid operand: {s}"),
            CcError::DuplicatedCase(s) => write!(f, "duplicated case: {s}"),
            CcError::InvalidBreak(s) => write!(f, "invalid break: {s}"),
            CcError::InvalidContinue(s) => write!(f, "invalid continue: {s}"),
            CcError::InvalidDefault(s) => write!(f, "invalid default: {s}"),
            CcError::UnknownLabel(s) => write!(f, "unknown label: {s}"),
            CcError::NotImplemented(s) => write!(f, "not implemented: {s}"),
            CcError::Io(s) => write!(f, "i/o error: {s}"),
            CcError::ExternalToolFailed { tool, detail } => write!(f, "{tool} failed: {detail}"),
        }
    }
}

impl From<std::io::Error> for CcError {
    fn from(e: std::io::Error) -> Self {
        CcError::Io(e.to_string())
    }
}

impl std::error::Error for CcError {}

/// A `CcError` plus the path of AST nodes from the translation-unit root down to the
/// node where it fired, for the multi-line diagnostic the driver prints. Mirrors the
/// `self._path` node stack the original Python `Compiler.visit` maintained.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub error: CcError,
    pub path: Vec<NodeId>,
}

impl Diagnostic {
    pub fn new(error: CcError, path: Vec<NodeId>) -> Self {
        Diagnostic { error, path }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.error)?;
        for (depth, node) in self.path.iter().rev().enumerate() {
            writeln!(f, "{}at {node:?}", "  ".repeat(depth + 1))?;
        }
        Ok(())
    }
}

/// Print a non-fatal warning the way the original's `semaWarn` printed to stderr:
/// out-of-range integer literals and comparisons of distinct object-pointer types use
/// this instead of returning an error.
pub fn warn(msg: &str) {
    eprintln!("warning: {msg}");
}

pub type CcResult<T> = Result<T, CcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_stable_per_variant() {
        assert_eq!(
            CcError::Redefined("x".into()).to_string(),
            "redefined: x"
        );
        assert_eq!(
            CcError::NotImplemented("union".into()).to_string(),
            "not implemented: union"
        );
    }

    #[test]
    fn not_implemented_is_filterable() {
        let e = CcError::NotImplemented("64-bit shift".into());
        assert!(matches!(e, CcError::NotImplemented(_)));
    }
}
