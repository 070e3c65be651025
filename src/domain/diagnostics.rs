//! Error and diagnostic types for the binding generator.
//!
//! Two severities exist. `GenError` variants are fatal: a malformed
//! document or an ambiguous symbol aborts the run, and an unmapped
//! marshaling type aborts the affected renderer. `Diagnostic` records
//! declarations that were dropped under the partial-failure policy
//! (unresolvable types); the run still succeeds and reports them
//! alongside the generated artifacts.

use serde::Serialize;
use thiserror::Error;

use crate::domain::ast::SourceLocation;

/// Fatal generation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenError {
    /// A required field is missing or has the wrong shape. Structural,
    /// aborts the whole run.
    #[error("malformed AST: {detail}")]
    MalformedAst { detail: String },

    /// Two declarations collapsed onto the same catalog key.
    #[error("ambiguous symbol '{symbol}' at {location}")]
    AmbiguousSymbol {
        symbol: String,
        location: SourceLocation,
    },

    /// A catalogued symbol needs a marshaling strategy that does not
    /// exist. Fatal for the render phase: a partially-bound function
    /// would silently break the calling convention.
    #[error("no marshaling strategy for type '{type_name}' required by '{symbol}'")]
    UnsupportedType { symbol: String, type_name: String },
}

/// A declaration excluded from the catalogs, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub symbol: String,
    pub location: SourceLocation,
    pub detail: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "skipped '{}' at {}: {}",
            self.symbol, self.location, self.detail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            symbol: "Point::u".to_string(),
            location: SourceLocation {
                file: PathBuf::from("main.cpp"),
                line: 7,
                column: 3,
            },
            detail: "unresolved type '(anonymous union)'".to_string(),
        };
        let text = diag.to_string();
        assert!(text.contains("Point::u"));
        assert!(text.contains("main.cpp:7:3"));
    }

    #[test]
    fn test_error_messages_name_the_symbol() {
        let err = GenError::UnsupportedType {
            symbol: "send".to_string(),
            type_name: "int *".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("send"));
        assert!(text.contains("int *"));
    }
}
