//! Shared error kinds for the symlogic workspace.
//!
//! Every fallible boundary in symlogic — expression construction, type
//! reflection, symbolic lowering, solving — returns a [`Result`] built on the
//! same [`Error`] type so callers see one consistent shape regardless of
//! which crate raised it.
//!
//! # Example
//!
//! ```
//! use symlogic_base::error::Error;
//!
//! let err = Error::type_mismatch("Int", "Bool");
//! assert!(err.to_string().contains("expected Int"));
//! ```

use std::fmt;

/// Alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The six error kinds a symlogic operation can fail with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A combinator was applied to a value of the wrong element kind.
    TypeMismatch,
    /// A Rust type has no corresponding element kind in the closed universe.
    UnsupportedType,
    /// A backend was asked for a feature it does not implement (e.g. the BDD
    /// backend asked to encode a `Seq` regex constraint).
    BackendUnsupported,
    /// The solver exceeded its configured timeout before reaching a verdict.
    SolverTimeout,
    /// The backend reported an internal failure distinct from `unknown`.
    SolverError,
    /// An internal invariant that the type system should have prevented was
    /// violated. Always a bug; never expected in normal operation.
    InvariantViolation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::UnsupportedType => "unsupported type",
            ErrorKind::BackendUnsupported => "backend unsupported",
            ErrorKind::SolverTimeout => "solver timeout",
            ErrorKind::SolverError => "solver error",
            ErrorKind::InvariantViolation => "invariant violation",
        };
        write!(f, "{name}")
    }
}

/// A symlogic error: a kind, a human-readable explanation, and (for solver
/// failures) an optional counterexample witness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    explanation: String,
    witness: Option<String>,
}

impl Error {
    /// Returns the error's kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns the counterexample witness, if the failure carried one.
    pub fn witness(&self) -> Option<&str> {
        self.witness.as_deref()
    }

    /// A combinator expected `expected` but was given `found`.
    pub fn type_mismatch(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Error {
            kind: ErrorKind::TypeMismatch,
            explanation: format!("expected {expected}, found {found}"),
            witness: None,
        }
    }

    /// A Rust type has no element kind in the closed universe.
    pub fn unsupported_type(type_name: impl fmt::Display) -> Self {
        Error {
            kind: ErrorKind::UnsupportedType,
            explanation: format!("`{type_name}` has no symlogic element kind"),
            witness: None,
        }
    }

    /// A backend cannot encode `feature`.
    pub fn backend_unsupported(backend: impl fmt::Display, feature: impl fmt::Display) -> Self {
        Error {
            kind: ErrorKind::BackendUnsupported,
            explanation: format!("backend `{backend}` does not support {feature}"),
            witness: None,
        }
    }

    /// The solver timed out after `millis` milliseconds.
    pub fn solver_timeout(millis: u64) -> Self {
        Error {
            kind: ErrorKind::SolverTimeout,
            explanation: format!("solver did not reach a verdict within {millis}ms"),
            witness: None,
        }
    }

    /// The backend reported an internal failure.
    pub fn solver_error(message: impl fmt::Display) -> Self {
        Error {
            kind: ErrorKind::SolverError,
            explanation: message.to_string(),
            witness: None,
        }
    }

    /// An invariant the type system should have enforced was violated.
    pub fn invariant_violation(explanation: impl fmt::Display) -> Self {
        Error {
            kind: ErrorKind::InvariantViolation,
            explanation: explanation.to_string(),
            witness: None,
        }
    }

    /// Attaches a counterexample witness (e.g. a rendered model assignment)
    /// to an existing error.
    pub fn with_witness(mut self, witness: impl fmt::Display) -> Self {
        self.witness = Some(witness.to_string());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.explanation)?;
        if let Some(witness) = &self.witness {
            write!(f, "\n  witness: {witness}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_mentions_both_types() {
        let err = Error::type_mismatch("Int", "Bool");
        assert_eq!(err.kind(), &ErrorKind::TypeMismatch);
        assert!(err.to_string().contains("Int"));
        assert!(err.to_string().contains("Bool"));
    }

    #[test]
    fn unsupported_type_names_the_type() {
        let err = Error::unsupported_type("std::net::TcpStream");
        assert_eq!(err.kind(), &ErrorKind::UnsupportedType);
        assert!(err.to_string().contains("TcpStream"));
    }

    #[test]
    fn backend_unsupported_names_backend_and_feature() {
        let err = Error::backend_unsupported("bdd", "regex constraints");
        assert!(err.to_string().contains("bdd"));
        assert!(err.to_string().contains("regex constraints"));
    }

    #[test]
    fn solver_timeout_mentions_millis() {
        let err = Error::solver_timeout(5000);
        assert_eq!(err.kind(), &ErrorKind::SolverTimeout);
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn with_witness_appends_to_display() {
        let err = Error::solver_error("Z3 returned unknown").with_witness("x = 7");
        assert_eq!(err.witness(), Some("x = 7"));
        assert!(err.to_string().contains("x = 7"));
    }

    #[test]
    fn invariant_violation_has_no_witness_by_default() {
        let err = Error::invariant_violation("merge of mismatched SymbolicValue shapes");
        assert!(err.witness().is_none());
    }
}
