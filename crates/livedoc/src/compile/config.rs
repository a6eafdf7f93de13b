// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compiler configuration.
//!
//! Supports both programmatic and file-based (TOML) configuration:
//!
//! ```toml
//! rustc = "/usr/local/bin/rustc"
//! opt_level = "3"
//! library_paths = ["target/release/deps"]
//!
//! [[externs]]
//! name = "livedoc_runtime"
//! path = "target/release/liblivedoc_runtime.rlib"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// `--extern name=path` passed to rustc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternCrate {
    pub name: String,
    pub path: PathBuf,
}

/// How generated units are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Path (or name on `PATH`) of the rustc binary.
    #[serde(default = "default_rustc")]
    pub rustc: PathBuf,

    #[serde(default = "default_edition")]
    pub edition: String,

    /// Value of `-C opt-level`.
    #[serde(default = "default_opt_level")]
    pub opt_level: String,

    /// Crates made available to the unit (at least `livedoc_runtime`).
    #[serde(default)]
    pub externs: Vec<ExternCrate>,

    /// `-L` search paths for transitive dependencies.
    #[serde(default)]
    pub library_paths: Vec<PathBuf>,

    /// Extra flags appended verbatim.
    #[serde(default)]
    pub extra_flags: Vec<String>,
}

fn default_rustc() -> PathBuf {
    PathBuf::from("rustc")
}

fn default_edition() -> String {
    "2021".to_string()
}

fn default_opt_level() -> String {
    "2".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            rustc: default_rustc(),
            edition: default_edition(),
            opt_level: default_opt_level(),
            externs: Vec::new(),
            library_paths: Vec::new(),
            extra_flags: Vec::new(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_extern(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.externs.push(ExternCrate {
            name: name.into(),
            path: path.into(),
        });
        self
    }

    #[must_use]
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_paths.push(path.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.edition.as_str(), "2015" | "2018" | "2021" | "2024") {
            return Err(ConfigError::Invalid(format!(
                "Unknown edition '{}'",
                self.edition
            )));
        }
        if !matches!(
            self.opt_level.as_str(),
            "0" | "1" | "2" | "3" | "s" | "z"
        ) {
            return Err(ConfigError::Invalid(format!(
                "Unknown opt_level '{}'",
                self.opt_level
            )));
        }
        for ext in &self.externs {
            if ext.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Extern at '{}' has an empty name",
                    ext.path.display()
                )));
            }
        }
        Ok(())
    }

    /// rustc arguments for building `source` as unit `unit_name` into
    /// `out_dir`.
    pub fn rustc_args(&self, unit_name: &str, source: &Path, out_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "--crate-type".to_string(),
            "cdylib".to_string(),
            "--crate-name".to_string(),
            unit_name.to_string(),
            "--edition".to_string(),
            self.edition.clone(),
            "-C".to_string(),
            format!("opt-level={}", self.opt_level),
            "--out-dir".to_string(),
            out_dir.display().to_string(),
        ];
        for ext in &self.externs {
            args.push("--extern".to_string());
            args.push(format!("{}={}", ext.name, ext.path.display()));
        }
        for path in &self.library_paths {
            args.push("-L".to_string());
            args.push(path.display().to_string());
        }
        args.extend(self.extra_flags.iter().cloned());
        args.push(source.display().to_string());
        args
    }
}
