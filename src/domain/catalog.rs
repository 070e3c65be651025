//! Symbol catalogs and the catalog builder.
//!
//! A depth-first walk over the AST document materializes two catalogs:
//! callable function signatures and addressable record members. Only
//! function and field declarations become entries; every other node is
//! structural and skipped. Iteration order equals declaration order,
//! which the renderers depend on for stable output.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::ast::{AstDocument, AstNode, SourceLocation};
use crate::domain::diagnostics::{Diagnostic, GenError};
use crate::domain::types::{self, TypeDescriptor};

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
}

/// A callable signature. Parameter order is preserved exactly as
/// declared; it determines call-site packing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Parameter>,
    pub ret: TypeDescriptor,
    pub location: SourceLocation,
}

/// An addressable record field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberAttribute {
    pub record: String,
    pub field: String,
    pub ty: TypeDescriptor,
    pub location: SourceLocation,
}

/// Insertion-ordered catalog keyed by a stable symbol key. Built once
/// per run and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Catalog<T> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Insert under a unique key; the key is handed back on collision.
    pub fn insert(&mut self, key: String, value: T) -> Result<(), String> {
        if self.index.contains_key(&key) {
            return Err(key);
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }
}

impl<T: Clone> Catalog<T> {
    /// New catalog keeping only entries the predicate accepts, in the
    /// same order.
    pub fn retain_entries<F>(&self, keep: F) -> Self
    where
        F: Fn(&str, &T) -> bool,
    {
        let mut out = Self::default();
        for (key, value) in self.iter() {
            if keep(key, value) {
                // Keys were unique in the source catalog.
                let _ = out.insert(key.to_string(), value.clone());
            }
        }
        out
    }
}

pub type FunctionCatalog = Catalog<FunctionSignature>;
pub type MemberCatalog = Catalog<MemberAttribute>;

/// Everything one build pass produces: both catalogs plus the
/// declarations dropped under the partial-failure policy.
#[derive(Debug, Default)]
pub struct CatalogSet {
    pub functions: FunctionCatalog,
    pub members: MemberCatalog,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walk the AST document and build both catalogs.
pub fn build_catalogs(doc: &AstDocument) -> Result<CatalogSet, GenError> {
    let mut builder = Builder::default();
    builder.walk(&doc.root);
    builder.finish()
}

#[derive(Default)]
struct Builder {
    functions: Vec<FunctionSignature>,
    members: Vec<MemberAttribute>,
    diagnostics: Vec<Diagnostic>,
}

impl Builder {
    fn walk(&mut self, node: &AstNode) {
        match node {
            AstNode::TranslationUnit { inner } | AstNode::Other { inner, .. } => {
                for child in inner {
                    self.walk(child);
                }
            }
            AstNode::Function {
                name,
                qual_type,
                location,
                inner,
            } => self.collect_function(name, qual_type, location, inner),
            AstNode::Record {
                name,
                location: _,
                inner,
            } => self.collect_record(name.as_deref(), inner),
            // Parameters and fields only carry meaning inside their
            // owning function or record.
            AstNode::Param { .. } | AstNode::Field { .. } => {}
        }
    }

    fn collect_function(
        &mut self,
        name: &str,
        qual_type: &str,
        location: &SourceLocation,
        inner: &[AstNode],
    ) {
        let ret = match types::parse(return_spelling(qual_type)) {
            Ok(ty) => ty,
            Err(opaque) => {
                self.skip(
                    name,
                    location,
                    format!("unresolved return type '{}'", opaque.spelling),
                );
                return;
            }
        };
        let mut params = Vec::new();
        for child in inner {
            if let AstNode::Param {
                name: param_name,
                qual_type: param_type,
                ..
            } = child
            {
                let ty = match types::parse(param_type) {
                    Ok(ty) => ty,
                    Err(opaque) => {
                        self.skip(
                            name,
                            location,
                            format!(
                                "unresolved type '{}' for parameter {}",
                                opaque.spelling,
                                params.len()
                            ),
                        );
                        return;
                    }
                };
                let pname = param_name
                    .clone()
                    .unwrap_or_else(|| format!("arg{}", params.len()));
                params.push(Parameter { name: pname, ty });
            }
        }
        self.functions.push(FunctionSignature {
            name: name.to_string(),
            params,
            ret,
            location: location.clone(),
        });
    }

    fn collect_record(&mut self, name: Option<&str>, inner: &[AstNode]) {
        // Anonymous records are reachable only through a field of the
        // enclosing record, which is where the diagnostic lands.
        let Some(record) = name else {
            return;
        };
        for child in inner {
            match child {
                AstNode::Field {
                    name: field_name,
                    qual_type,
                    location,
                } => {
                    let Some(field) = field_name.as_deref() else {
                        self.skip(
                            &format!("{record}::(anonymous)"),
                            location,
                            "unnamed field".to_string(),
                        );
                        continue;
                    };
                    match types::parse(qual_type) {
                        Ok(ty) => self.members.push(MemberAttribute {
                            record: record.to_string(),
                            field: field.to_string(),
                            ty,
                            location: location.clone(),
                        }),
                        Err(opaque) => self.skip(
                            &format!("{record}::{field}"),
                            location,
                            format!("unresolved type '{}'", opaque.spelling),
                        ),
                    }
                }
                // Nested records and anything else a record body holds.
                other => self.walk(other),
            }
        }
    }

    fn skip(&mut self, symbol: &str, location: &SourceLocation, detail: String) {
        self.diagnostics.push(Diagnostic {
            symbol: symbol.to_string(),
            location: location.clone(),
            detail,
        });
    }

    fn finish(self) -> Result<CatalogSet, GenError> {
        let mut name_counts: HashMap<&str, usize> = HashMap::new();
        for sig in &self.functions {
            *name_counts.entry(sig.name.as_str()).or_insert(0) += 1;
        }

        let mut functions = FunctionCatalog::default();
        for sig in &self.functions {
            let key = if name_counts[sig.name.as_str()] == 1 {
                sig.name.clone()
            } else {
                overload_key(sig)
            };
            if let Err(key) = functions.insert(key, sig.clone()) {
                return Err(GenError::AmbiguousSymbol {
                    symbol: key,
                    location: sig.location.clone(),
                });
            }
        }

        let mut members = MemberCatalog::default();
        for attr in &self.members {
            let key = format!("{}::{}", attr.record, attr.field);
            if let Err(key) = members.insert(key, attr.clone()) {
                return Err(GenError::AmbiguousSymbol {
                    symbol: key,
                    location: attr.location.clone(),
                });
            }
        }

        Ok(CatalogSet {
            functions,
            members,
            diagnostics: self.diagnostics,
        })
    }
}

/// Deterministic key for overloaded functions: the name plus the
/// declared parameter type sequence.
fn overload_key(sig: &FunctionSignature) -> String {
    if sig.params.is_empty() {
        return format!("{}__void", sig.name);
    }
    let frags: Vec<String> = sig.params.iter().map(|p| p.ty.key_fragment()).collect();
    format!("{}__{}", sig.name, frags.join("_"))
}

/// The return type is the `qualType` prefix before the parameter list.
fn return_spelling(qual_type: &str) -> &str {
    qual_type.split('(').next().unwrap_or(qual_type).trim()
}
