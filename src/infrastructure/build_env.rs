//! Build-environment plumbing.
//!
//! The orchestration layer receives a JSON map describing the build
//! (project directories, include paths, preprocessor defines) and
//! turns it into clang flags, output locations, and a reproducibility
//! snapshot. Entries in `CPPPATH` and `CPPDEFINES` may be `$KEY`
//! references into the environment itself.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub struct BuildEnv {
    vars: serde_json::Map<String, Value>,
}

impl BuildEnv {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read build environment {}", path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Build environment {} is not valid JSON", path.display()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(vars) => Ok(Self { vars }),
            _ => bail!("build environment must be a JSON object"),
        }
    }

    fn str_var(&self, key: &str) -> Result<&str> {
        self.vars
            .get(key)
            .and_then(Value::as_str)
            .with_context(|| format!("missing '{key}' in build environment"))
    }

    pub fn project_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.str_var("PROJECT_DIR")?))
    }

    pub fn source_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.str_var("PROJECTSRC_DIR")?))
    }

    pub fn toolchain_dir(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(self.str_var("TOOLCHAIN_DIR")?))
    }

    pub fn main_source(&self) -> Result<PathBuf> {
        Ok(self.source_dir()?.join("main.cpp"))
    }

    /// Project name with `-` mapped to `__` so it stays a valid C and
    /// Python identifier.
    pub fn project_name(&self) -> Result<String> {
        let dir = self.project_dir()?;
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("PROJECT_DIR {} has no usable directory name", dir.display()))?;
        Ok(name.replace('-', "__"))
    }

    /// Expand a `$KEY` reference against the environment; anything
    /// else passes through unchanged.
    fn expand(&self, raw: &str) -> String {
        if let Some(key) = raw.strip_prefix('$') {
            if let Some(value) = self.vars.get(key).and_then(Value::as_str) {
                return value.to_string();
            }
        }
        raw.to_string()
    }

    pub fn include_dirs(&self) -> Vec<PathBuf> {
        self.vars
            .get("CPPPATH")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|s| PathBuf::from(self.expand(s)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Preprocessor defines as (name, optional value) pairs, with the
    /// implied platform defines appended.
    pub fn defines(&self) -> Vec<(String, Option<String>)> {
        let mut out = Vec::new();
        if let Some(items) = self.vars.get("CPPDEFINES").and_then(Value::as_array) {
            for item in items {
                match item {
                    Value::String(s) => out.push((self.expand(s), None)),
                    Value::Array(parts) => {
                        let mut it = parts.iter().map(|p| match p {
                            Value::String(s) => self.expand(s),
                            other => other.to_string(),
                        });
                        if let Some(name) = it.next() {
                            out.push((name, it.next()));
                        }
                    }
                    _ => {}
                }
            }
        }
        augment_implied_defines(&mut out);
        out
    }

    pub fn include_flags(&self) -> Vec<String> {
        self.include_dirs()
            .iter()
            .map(|p| format!("-I{}", p.display()))
            .collect()
    }

    pub fn define_flags(&self) -> Vec<String> {
        self.defines()
            .iter()
            .map(|(name, value)| match value {
                Some(v) => format!("-D{name}={v}"),
                None => format!("-D{name}"),
            })
            .collect()
    }

    /// Snapshot of the environment with keys sorted, for byte-stable
    /// reproducibility dumps.
    pub fn snapshot(&self) -> Value {
        let sorted: BTreeMap<&String, &Value> = self.vars.iter().collect();
        let mut map = serde_json::Map::new();
        for (key, value) in sorted {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    pub fn dump_snapshot(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.snapshot())
            .context("Failed to serialize environment snapshot")?;
        fs::write(path, text)
            .with_context(|| format!("Failed to write environment snapshot {}", path.display()))
    }
}

/// Teensy 3.x builds define TEENSYDUINO and __MK20DX256__, but the
/// board headers additionally expect KINETISK and __arm__.
fn augment_implied_defines(defines: &mut Vec<(String, Option<String>)>) {
    let teensy = defines.iter().any(|(d, _)| d == "TEENSYDUINO");
    let mk20 = defines.iter().any(|(d, _)| d == "__MK20DX256__");
    if teensy && mk20 {
        for extra in ["KINETISK", "__arm__"] {
            if !defines.iter().any(|(d, _)| d == extra) {
                defines.push((extra.to_string(), None));
            }
        }
    }
}
