//! Generation pipeline.
//!
//! Wires the external parser, the catalog builder, the provenance
//! filter, and the two renderers together, and owns all file output:
//! the raw AST dump, the address-of header, and the Python bindings
//! module.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::ast::AstDocument;
use crate::domain::catalog;
use crate::domain::diagnostics::Diagnostic;
use crate::domain::provenance;
use crate::infrastructure::build_env::BuildEnv;
use crate::infrastructure::clang_runner;
use crate::ports::{BindingRenderer, HeaderRenderer};

pub struct GenerateUsecase {
    pub env: BuildEnv,
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub header_path: PathBuf,
    pub bindings_path: PathBuf,
    pub functions: usize,
    pub members_total: usize,
    pub members_kept: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerateUsecase {
    /// Run the whole pipeline. With `ast_override`, a pre-serialized
    /// AST document is consumed instead of invoking clang.
    pub fn run(&self, ast_override: Option<&Path>) -> Result<RunSummary> {
        let project_dir = self.env.project_dir()?;
        let project_name = self.env.project_name()?;
        let lib_dir = project_dir.join("lib").join(&project_name);
        let bindings_dir = project_dir
            .join("bindings")
            .join("python")
            .join(&project_name);
        fs::create_dir_all(&lib_dir)
            .with_context(|| format!("Failed to create {}", lib_dir.display()))?;
        fs::create_dir_all(&bindings_dir)
            .with_context(|| format!("Failed to create {}", bindings_dir.display()))?;

        let (doc, raw) = match ast_override {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read AST document {}", path.display()))?;
                let raw: serde_json::Value = serde_json::from_str(&text)
                    .with_context(|| format!("AST document {} is not valid JSON", path.display()))?;
                (AstDocument::from_json(&raw)?, raw)
            }
            None => clang_runner::parse_cpp_ast(&self.env.main_source()?, &self.env)?,
        };

        let ast_path = lib_dir.join("cpp_ast.json");
        fs::write(&ast_path, serde_json::to_string_pretty(&raw)?)
            .with_context(|| format!("Failed to write {}", ast_path.display()))?;
        println!("[GEN] AST document written to {}", ast_path.display());

        let catalogs = catalog::build_catalogs(&doc)?;
        let kept = provenance::filter_members(&catalogs.members, &self.env.toolchain_dir()?);

        let header = HeaderRenderer::render(&kept);
        let bindings = BindingRenderer::render(&catalogs.functions)?;

        let header_path = lib_dir.join("AddressOf.h");
        fs::write(&header_path, header)
            .with_context(|| format!("Failed to write {}", header_path.display()))?;
        println!("[GEN] Header written to {}", header_path.display());

        let bindings_path = bindings_dir.join("execute.py");
        fs::write(&bindings_path, bindings)
            .with_context(|| format!("Failed to write {}", bindings_path.display()))?;
        println!("[GEN] Bindings written to {}", bindings_path.display());

        // Package marker so the generated module is importable.
        let init_path = bindings_dir.join("__init__.py");
        if !init_path.exists() {
            fs::write(&init_path, "")
                .with_context(|| format!("Failed to write {}", init_path.display()))?;
        }

        for diag in &catalogs.diagnostics {
            eprintln!("[GEN] {diag}");
        }

        Ok(RunSummary {
            header_path,
            bindings_path,
            functions: catalogs.functions.len(),
            members_total: catalogs.members.len(),
            members_kept: kept.len(),
            diagnostics: catalogs.diagnostics,
        })
    }

    /// Write the sorted environment snapshot next to the project.
    pub fn dump_env(&self) -> Result<PathBuf> {
        let path = self.env.project_dir()?.join("env.json");
        self.env.dump_snapshot(&path)?;
        Ok(path)
    }
}
