//! External AST parser runner.
//!
//! The translation unit itself is parsed by clang; this module builds
//! and runs the `-ast-dump=json` invocation with the include and
//! define flags from the build environment, then hands the raw
//! document to the domain layer.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::domain::ast::AstDocument;
use crate::infrastructure::build_env::BuildEnv;

const CLANG: &str = "clang++";

/// Describes the command that would be run. Primarily for testing
/// without executing clang.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClangCommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

/// Build the clang invocation for a source file (testable mirror of
/// `parse_cpp_ast`).
pub fn build_command_spec(source: &Path, env: &BuildEnv) -> ClangCommandSpec {
    let mut args = vec![
        "-fsyntax-only".to_string(),
        "-Xclang".to_string(),
        "-ast-dump=json".to_string(),
    ];
    args.extend(env.define_flags());
    args.extend(env.include_flags());
    args.push(source.display().to_string());
    ClangCommandSpec {
        program: CLANG.to_string(),
        args,
    }
}

/// Check that clang is reachable before committing to a parse.
pub fn check_clang_available() -> Result<()> {
    let probe = Command::new(CLANG).arg("--version").output();
    match probe {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!(
                "[CLANG] Using {}",
                version.lines().next().unwrap_or("").trim()
            );
            Ok(())
        }
        Ok(output) => {
            bail!("{} found but returned exit code {:?}", CLANG, output.status.code());
        }
        Err(_) => {
            bail!("{} not found in PATH; install LLVM/clang to parse C++ sources", CLANG);
        }
    }
}

/// Parse a C++ source file into an AST document. Returns the lowered
/// document together with the raw JSON for the on-disk dump.
pub fn parse_cpp_ast(source: &Path, env: &BuildEnv) -> Result<(AstDocument, serde_json::Value)> {
    check_clang_available()?;
    let spec = build_command_spec(source, env);
    println!("[CLANG] Parsing {}", source.display());
    let output = Command::new(&spec.program)
        .args(&spec.args)
        .output()
        .with_context(|| format!("Failed to execute {}", spec.program))?;
    if !output.status.success() {
        bail!(
            "{} failed with exit code {:?}: {}",
            spec.program,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    let raw: serde_json::Value =
        serde_json::from_slice(&output.stdout).context("clang did not produce a JSON AST document")?;
    let doc = AstDocument::from_json(&raw)?;
    Ok((doc, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_spec_shape() {
        let env = BuildEnv::from_value(json!({
            "CPPPATH": ["/opt/core"],
            "CPPDEFINES": ["ARDUINO"],
        }))
        .unwrap();
        let spec = build_command_spec(Path::new("src/main.cpp"), &env);
        assert_eq!(spec.program, "clang++");
        assert_eq!(spec.args[0], "-fsyntax-only");
        assert!(spec.args.contains(&"-ast-dump=json".to_string()));
        assert!(spec.args.contains(&"-DARDUINO".to_string()));
        assert!(spec.args.contains(&"-I/opt/core".to_string()));
        assert_eq!(spec.args.last().unwrap(), "src/main.cpp");
    }

    #[test]
    fn test_flags_precede_the_source_file() {
        let env = BuildEnv::from_value(json!({"CPPDEFINES": ["A", "B"]})).unwrap();
        let spec = build_command_spec(Path::new("main.cpp"), &env);
        let source_pos = spec.args.iter().position(|a| a == "main.cpp").unwrap();
        let define_pos = spec.args.iter().position(|a| a == "-DA").unwrap();
        assert!(define_pos < source_pos);
    }
}
