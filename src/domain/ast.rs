//! AST document model.
//!
//! A clang `-ast-dump=json` document is lowered into a closed set of
//! node kinds. Declarations the generator cares about (functions,
//! records, fields, parameters) become dedicated variants; every other
//! clang node lands in `Other` and is only traversed, never
//! interpreted, so an unexpected node shape cannot be mistaken for a
//! declaration. Structural problems (missing required fields, wrong
//! shapes) are fatal `MalformedAst` errors.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::domain::diagnostics::GenError;

/// Location of a declaration in the parsed translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// One node of the lowered document.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    TranslationUnit {
        inner: Vec<AstNode>,
    },
    Function {
        name: String,
        qual_type: String,
        location: SourceLocation,
        inner: Vec<AstNode>,
    },
    Param {
        name: Option<String>,
        qual_type: String,
        location: SourceLocation,
    },
    Record {
        name: Option<String>,
        location: SourceLocation,
        inner: Vec<AstNode>,
    },
    Field {
        name: Option<String>,
        qual_type: String,
        location: SourceLocation,
    },
    Other {
        kind: String,
        inner: Vec<AstNode>,
    },
}

/// Read-only representation of one parsed translation unit. Built once
/// per generation run, immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AstDocument {
    pub root: AstNode,
}

impl AstDocument {
    /// Lower a raw clang JSON document.
    pub fn from_json(raw: &Value) -> Result<Self, GenError> {
        let kind = node_kind(raw)?;
        if kind != "TranslationUnitDecl" {
            return Err(GenError::MalformedAst {
                detail: format!("expected TranslationUnitDecl at document root, found {kind}"),
            });
        }
        let mut lowering = Lowering::default();
        let root = lowering.lower(raw)?.ok_or_else(|| GenError::MalformedAst {
            detail: "document root is an implicit node".to_string(),
        })?;
        Ok(Self { root })
    }

    /// Parse JSON text and lower it.
    pub fn from_str(text: &str) -> Result<Self, GenError> {
        let raw: Value = serde_json::from_str(text).map_err(|e| GenError::MalformedAst {
            detail: format!("document is not valid JSON: {e}"),
        })?;
        Self::from_json(&raw)
    }
}

#[derive(Default)]
struct Lowering {
    current_file: PathBuf,
    current_line: u32,
}

impl Lowering {
    fn lower(&mut self, raw: &Value) -> Result<Option<AstNode>, GenError> {
        let kind = node_kind(raw)?;
        // Compiler-injected declarations (the record's injected class
        // name, implicit special members) are not user code.
        if raw
            .get("isImplicit")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return Ok(None);
        }
        let location = self.location_of(raw);
        let node = match kind {
            "TranslationUnitDecl" => AstNode::TranslationUnit {
                inner: self.lower_children(raw)?,
            },
            "FunctionDecl" => AstNode::Function {
                name: require_str(raw, "name", kind, &location)?,
                qual_type: require_qual_type(raw, kind, &location)?,
                location,
                inner: self.lower_children(raw)?,
            },
            "ParmVarDecl" => AstNode::Param {
                name: opt_str(raw, "name"),
                qual_type: require_qual_type(raw, kind, &location)?,
                location,
            },
            "RecordDecl" | "CXXRecordDecl" => AstNode::Record {
                name: opt_str(raw, "name"),
                location,
                inner: self.lower_children(raw)?,
            },
            "FieldDecl" => AstNode::Field {
                name: opt_str(raw, "name"),
                qual_type: require_qual_type(raw, kind, &location)?,
                location,
            },
            other => AstNode::Other {
                kind: other.to_string(),
                inner: self.lower_children(raw)?,
            },
        };
        Ok(Some(node))
    }

    fn lower_children(&mut self, raw: &Value) -> Result<Vec<AstNode>, GenError> {
        let mut children = Vec::new();
        if let Some(items) = raw.get("inner").and_then(Value::as_array) {
            for item in items {
                if let Some(node) = self.lower(item)? {
                    children.push(node);
                }
            }
        }
        Ok(children)
    }

    /// clang elides `file` and `line` when unchanged from the previous
    /// node, so the last seen values are carried forward.
    fn location_of(&mut self, raw: &Value) -> SourceLocation {
        let loc = raw.get("loc");
        let file = loc
            .and_then(|l| {
                l.get("file")
                    .or_else(|| l.get("expansionLoc").and_then(|e| e.get("file")))
            })
            .and_then(Value::as_str);
        if let Some(file) = file {
            self.current_file = PathBuf::from(file);
        }
        let line = loc
            .and_then(|l| {
                l.get("line")
                    .or_else(|| l.get("expansionLoc").and_then(|e| e.get("line")))
            })
            .and_then(Value::as_u64);
        if let Some(line) = line {
            self.current_line = line as u32;
        }
        let column = loc
            .and_then(|l| l.get("col"))
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        SourceLocation {
            file: self.current_file.clone(),
            line: self.current_line,
            column,
        }
    }
}

fn node_kind(raw: &Value) -> Result<&str, GenError> {
    let obj = raw.as_object().ok_or_else(|| GenError::MalformedAst {
        detail: "AST node is not a JSON object".to_string(),
    })?;
    obj.get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| GenError::MalformedAst {
            detail: "AST node has no 'kind'".to_string(),
        })
}

fn opt_str(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn require_str(
    raw: &Value,
    key: &str,
    kind: &str,
    location: &SourceLocation,
) -> Result<String, GenError> {
    opt_str(raw, key).ok_or_else(|| GenError::MalformedAst {
        detail: format!("{kind} at {location} missing '{key}'"),
    })
}

fn require_qual_type(
    raw: &Value,
    kind: &str,
    location: &SourceLocation,
) -> Result<String, GenError> {
    raw.get("type")
        .and_then(|t| t.get("qualType"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GenError::MalformedAst {
            detail: format!("{kind} at {location} missing 'type.qualType'"),
        })
}
